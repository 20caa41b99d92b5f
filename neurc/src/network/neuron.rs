use crate::ir::ValueId;
use crate::network::LayerId;
use std::fmt::Display;
use std::fmt::Formatter;

/// Stable index of a [Neuron] inside a [crate::network::Network].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NeuronId(pub(crate) u32);

impl NeuronId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl Display for NeuronId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeuronKind {
    Hidden,
    /// Reads one element of the network input. Cannot be a sink.
    Input,
    /// Produces one element of the network output. Cannot be a source.
    Output,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Scalar(f64),
    Vector(Vec<f64>),
}

pub struct Neuron {
    pub(crate) kind: NeuronKind,
    pub(crate) layer: LayerId,
    pub(crate) position: usize,
    pub(crate) sources: Vec<NeuronId>,
    pub(crate) sinks: Vec<NeuronId>,
    pub(crate) forward: Option<ValueId>,
    pub(crate) properties: Vec<(String, PropertyValue)>,
}

impl Neuron {
    pub(crate) fn new(kind: NeuronKind, layer: LayerId, position: usize) -> Self {
        Neuron {
            kind,
            layer,
            position,
            sources: vec![],
            sinks: vec![],
            forward: None,
            properties: vec![],
        }
    }
    pub fn kind(&self) -> NeuronKind {
        self.kind
    }
    pub fn is_input(&self) -> bool {
        self.kind == NeuronKind::Input
    }
    pub fn is_output(&self) -> bool {
        self.kind == NeuronKind::Output
    }
    pub fn layer(&self) -> LayerId {
        self.layer
    }
    /// Position of the neuron inside its layer.
    pub fn position(&self) -> usize {
        self.position
    }
    pub fn sources(&self) -> &[NeuronId] {
        &self.sources
    }
    pub fn sinks(&self) -> &[NeuronId] {
        &self.sinks
    }
    pub fn num_inputs(&self) -> usize {
        self.sources.len()
    }
    pub fn forward_value(&self) -> Option<ValueId> {
        self.forward
    }
    pub fn properties(&self) -> &[(String, PropertyValue)] {
        &self.properties
    }
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }
}
