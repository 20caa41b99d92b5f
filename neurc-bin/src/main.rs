use anyhow::Result;
use clap::Args;
use clap::ArgMatches;
use clap::Command;
use neurc::samples::simple_network;
use neurc::CompileOptions;
use tracing::Level;

/// Compile a sample multi-layer perceptron and print the result.
#[derive(Args, Debug)]
#[command(version, about)]
struct NeurcArgs {
    /// Number of neurons per layer
    #[arg(long, default_value_t = 3)]
    neurons: usize,
    /// Number of hidden layers
    #[arg(long, default_value_t = 1)]
    layers: usize,
    /// Print debug logs
    #[arg(long)]
    debug: bool,
}

fn cli() -> Command {
    let cli = Command::new("neurc").args(neurc::default_arguments());
    NeurcArgs::augment_args(cli)
}

fn run(matches: &ArgMatches) -> Result<String> {
    let neurons = matches.get_one::<usize>("neurons").copied().unwrap_or(3);
    let layers = matches.get_one::<usize>("layers").copied().unwrap_or(1);
    if neurons == 0 {
        return Err(anyhow::anyhow!("--neurons must be at least 1"));
    }
    let options = CompileOptions::from_matches(matches);
    let mut network = simple_network(neurons, layers);
    let compiled = neurc::compile(&mut network, &options)?;
    Ok(compiled.listing)
}

fn main() -> Result<()> {
    let matches = cli().get_matches();
    if matches.get_flag("debug") {
        let _ = neurc::init_subscriber(Level::DEBUG);
    }
    let listing = run(&matches)?;
    print!("{listing}");
    Ok(())
}
