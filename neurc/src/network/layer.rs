use crate::network::Ensemble;
use crate::network::NeuronId;
use std::fmt::Display;
use std::fmt::Formatter;

/// Index of a [Layer] inside a [crate::network::Network].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub(crate) u32);

impl LayerId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl Display for LayerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub struct Layer {
    id: LayerId,
    neurons: Vec<NeuronId>,
    /// Derived by the grouping pass and dropped whenever the layer changes.
    ensembles: Option<Vec<Ensemble>>,
}

impl Layer {
    pub(crate) fn new(id: LayerId) -> Self {
        Layer {
            id,
            neurons: vec![],
            ensembles: None,
        }
    }
    pub fn id(&self) -> LayerId {
        self.id
    }
    pub fn neurons(&self) -> &[NeuronId] {
        &self.neurons
    }
    pub fn len(&self) -> usize {
        self.neurons.len()
    }
    pub fn is_empty(&self) -> bool {
        self.neurons.is_empty()
    }
    pub fn neuron(&self, position: usize) -> Option<NeuronId> {
        self.neurons.get(position).copied()
    }
    /// Ensembles from the last grouping, if the layer did not change since.
    pub fn ensembles(&self) -> Option<&[Ensemble]> {
        self.ensembles.as_deref()
    }
    pub(crate) fn push(&mut self, neuron: NeuronId) {
        self.neurons.push(neuron);
        self.invalidate();
    }
    pub(crate) fn set_ensembles(&mut self, ensembles: Vec<Ensemble>) {
        self.ensembles = Some(ensembles);
    }
    pub(crate) fn invalidate(&mut self) {
        self.ensembles = None;
    }
}
