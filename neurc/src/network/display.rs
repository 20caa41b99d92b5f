use crate::ir::Expressions;
use crate::ir::Value;
use crate::ir::ValueId;
use crate::network::Network;
use crate::network::NeuronId;
use crate::network::NeuronKind;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result;

/// Render a DSL expression on a single line, e.g. `sigmoid(add(...))`.
pub fn display_expression(exprs: &Expressions, id: ValueId) -> String {
    match &exprs[id] {
        Value::IntegerConstant(v) => v.to_string(),
        Value::BooleanConstant(v) => v.to_string(),
        Value::RealConstant(v) => format!("{v:?}"),
        Value::RealVectorConstant(v) => format!("{v:?}"),
        Value::GetInputValue(neuron) => format!("input({neuron})"),
        value => {
            let operands = value
                .operands()
                .into_iter()
                .map(|x| display_expression(exprs, x))
                .collect::<Vec<String>>()
                .join(", ");
            format!("{}({operands})", value.mnemonic())
        }
    }
}

/// Tree-shaped listing of a network, mostly useful for debugging.
pub struct NetworkDisplay<'a> {
    network: &'a Network,
}

impl<'a> NetworkDisplay<'a> {
    pub fn new(network: &'a Network) -> Self {
        NetworkDisplay { network }
    }
    fn neuron_ids(&self, f: &mut Formatter<'_>, tag: &str, ids: &[NeuronId]) -> Result {
        writeln!(f, "\t\t\t<{tag}>")?;
        for id in ids {
            writeln!(f, "\t\t\t\t<id>{}</id>", self.network.neuron(*id).position())?;
        }
        writeln!(f, "\t\t\t</{tag}>")
    }
    fn neuron(&self, f: &mut Formatter<'_>, id: NeuronId) -> Result {
        let neuron = self.network.neuron(id);
        let tag = match neuron.kind() {
            NeuronKind::Hidden => "neuron",
            NeuronKind::Input => "inputneuron",
            NeuronKind::Output => "outputneuron",
        };
        writeln!(f, "\t\t<{tag}>")?;
        if !neuron.is_input() {
            self.neuron_ids(f, "sources", neuron.sources())?;
        }
        if !neuron.is_output() {
            self.neuron_ids(f, "sinks", neuron.sinks())?;
        }
        if let Some(value) = neuron.forward_value() {
            let expr = display_expression(self.network.exprs(), value);
            writeln!(f, "\t\t\t<forwardvalue>{expr}</forwardvalue>")?;
        }
        writeln!(f, "\t\t</{tag}>")
    }
}

impl Display for NetworkDisplay<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        writeln!(f, "<net>")?;
        for layer in self.network.layers() {
            writeln!(f, "\t<layer>")?;
            for neuron in layer.neurons() {
                self.neuron(f, *neuron)?;
            }
            writeln!(f, "\t</layer>")?;
        }
        writeln!(f, "</net>")
    }
}
