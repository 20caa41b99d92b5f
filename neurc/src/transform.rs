use crate::convert::construct_ir_for_network;
use crate::lir::Function;
use crate::network::Network;
use anyhow::Result;
use clap::Arg;
use clap::ArgAction;
use clap::ArgMatches;
use std::fmt::Write;
use tracing::info;
use tracing::subscriber::SetGlobalDefaultError;
use tracing::Level;

/// Initialize logging with the given level.
pub fn init_subscriber(level: Level) -> Result<(), SetGlobalDefaultError> {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(level)
        .with_test_writer()
        .without_time()
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
}

/// What [compile] should include in its listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOptions {
    pub print_network: bool,
    pub print_ensembles: bool,
    pub print_ir: bool,
}

impl CompileOptions {
    /// Read the options that were declared by [default_arguments].
    ///
    /// When nothing is requested, only the lowered IR is printed.
    pub fn from_matches(matches: &ArgMatches) -> CompileOptions {
        let flag = |name: &str| matches.get_flag(name);
        let options = CompileOptions {
            print_network: flag("print-network"),
            print_ensembles: flag("print-ensembles"),
            print_ir: flag("print-ir"),
        };
        if options == CompileOptions::default() {
            CompileOptions {
                print_ir: true,
                ..options
            }
        } else {
            options
        }
    }
}

/// Default arguments that are available in neurc.
///
/// `--debug` is not included to allow downstream projects to handle the
/// logging differently.
pub fn default_arguments() -> Vec<Arg> {
    vec![
        Arg::new("print-network")
            .long("print-network")
            .help("Print the network listing")
            .action(ArgAction::SetTrue),
        Arg::new("print-ensembles")
            .long("print-ensembles")
            .help("Print the ensembles of every layer")
            .action(ArgAction::SetTrue),
        Arg::new("print-ir")
            .long("print-ir")
            .help("Print the lowered function")
            .action(ArgAction::SetTrue),
    ]
}

/// One line per ensemble, layer by layer.
pub fn display_ensembles(network: &Network) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    for layer in network.layers() {
        for ensemble in network.ensembles(layer.id()) {
            writeln!(
                out,
                "layer {}: [{}, {})",
                layer.id(),
                ensemble.start(),
                ensemble.end()
            )?;
        }
    }
    Ok(out)
}

/// Result of [compile].
pub struct Compiled {
    pub function: Function,
    /// The sections requested by the [CompileOptions], in pipeline order.
    pub listing: String,
}

/// Run the whole pipeline on `network`.
///
/// Groups every layer into ensembles, lowers the network and collects the
/// requested listings.
pub fn compile(network: &mut Network, options: &CompileOptions) -> Result<Compiled> {
    network.check_types()?;
    network.group_ensembles();
    let mut listing = String::new();
    if options.print_network {
        writeln!(listing, "{}", network.display())?;
    }
    if options.print_ensembles {
        writeln!(listing, "{}", display_ensembles(network)?)?;
    }
    let function = construct_ir_for_network(network)?;
    if options.print_ir {
        writeln!(listing, "{function}")?;
    }
    info!(
        "Compiled {} layers into {} value sets",
        network.num_layers(),
        function.value_sets().len()
    );
    Ok(Compiled { function, listing })
}
