use crate::ir::structurally_identical;
use crate::network::LayerId;
use crate::network::Network;
use crate::network::NeuronId;
use tracing::debug;

/// A contiguous run of neurons in one layer that share their code.
///
/// The first neuron is the representative: its expression is the one that
/// gets lowered, the other members only contribute their constants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ensemble {
    layer: LayerId,
    start: usize,
    neurons: Vec<NeuronId>,
}

impl Ensemble {
    fn new(layer: LayerId, start: usize, representative: NeuronId) -> Self {
        Ensemble {
            layer,
            start,
            neurons: vec![representative],
        }
    }
    pub fn layer(&self) -> LayerId {
        self.layer
    }
    /// Position of the representative inside the layer.
    pub fn start(&self) -> usize {
        self.start
    }
    /// One past the position of the last member.
    pub fn end(&self) -> usize {
        self.start + self.neurons.len()
    }
    pub fn len(&self) -> usize {
        self.neurons.len()
    }
    pub fn is_empty(&self) -> bool {
        self.neurons.is_empty()
    }
    pub fn representative(&self) -> NeuronId {
        self.neurons[0]
    }
    pub fn neurons(&self) -> &[NeuronId] {
        &self.neurons
    }
}

/// Whether `n1` and `n2` can be computed by the same loop body.
///
/// This needs structurally identical forward values and input wiring with the
/// same relative offsets, so that one index expression can address the
/// inputs of both neurons.
pub fn are_neurons_mergeable(network: &Network, n1: NeuronId, n2: NeuronId) -> bool {
    let (Some(v1), Some(v2)) = (network.forward_value(n1), network.forward_value(n2)) else {
        return false;
    };
    if !structurally_identical(network.exprs(), network, v1, v2) {
        return false;
    }
    let sources1 = network.neuron(n1).sources();
    let sources2 = network.neuron(n2).sources();
    assert_eq!(
        sources1.len(),
        sources2.len(),
        "internal invariant violation: neurons {n1} and {n2} have identical expressions \
         but a different number of inputs"
    );
    let Some((first1, first2)) = sources1.first().zip(sources2.first()) else {
        return true;
    };
    let base1 = network.neuron(*first1).position() as i64;
    let base2 = network.neuron(*first2).position() as i64;
    sources1.iter().zip(sources2.iter()).all(|(s1, s2)| {
        let offset1 = network.neuron(*s1).position() as i64 - base1;
        let offset2 = network.neuron(*s2).position() as i64 - base2;
        offset1 == offset2
    })
}

/// Split `layer` into maximal contiguous runs of mergeable neurons.
///
/// Each neuron is compared with the representative of the current run only.
/// Identical neurons that are separated by a different neuron end up in
/// different ensembles.
pub fn collect_ensembles(network: &Network, layer: LayerId) -> Vec<Ensemble> {
    let mut ensembles: Vec<Ensemble> = vec![];
    for (position, neuron) in network.layer(layer).neurons().iter().enumerate() {
        match ensembles.last_mut() {
            Some(current) if are_neurons_mergeable(network, *neuron, current.representative()) => {
                current.neurons.push(*neuron);
            }
            _ => ensembles.push(Ensemble::new(layer, position, *neuron)),
        }
    }
    for ensemble in ensembles.iter() {
        debug!(
            "Layer {layer}: ensemble [{}, {})",
            ensemble.start(),
            ensemble.end()
        );
    }
    ensembles
}
