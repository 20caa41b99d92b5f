//! The network graph.
//!
//! A [Network] owns its layers, its neurons and the arena holding all
//! forward propagation values. Everything is referenced by index, so ids
//! stay valid for as long as the network lives. Layers can only be appended.

mod display;
mod ensemble;
mod layer;
mod neuron;

pub use display::NetworkDisplay;
pub use ensemble::are_neurons_mergeable;
pub use ensemble::collect_ensembles;
pub use ensemble::Ensemble;
pub use layer::Layer;
pub use layer::LayerId;
pub use neuron::Neuron;
pub use neuron::NeuronId;
pub use neuron::NeuronKind;
pub use neuron::PropertyValue;

use crate::error::GraphError;
use crate::error::TypeError;
use crate::ir::Expr;
use crate::ir::Expressions;
use crate::ir::ScalarType;
use crate::ir::TypeEnv;
use crate::ir::ValueId;
use crate::ir::ValueType;
use std::collections::BTreeMap;
use tracing::debug;
use tracing::trace;

#[derive(Default)]
pub struct Network {
    layers: Vec<Layer>,
    neurons: Vec<Neuron>,
    exprs: Expressions,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn add_layer(&mut self) -> LayerId {
        let id = LayerId(self.layers.len() as u32);
        self.layers.push(Layer::new(id));
        id
    }
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }
    pub fn layer(&self, id: LayerId) -> &Layer {
        &self.layers[id.index()]
    }
    pub fn neuron(&self, id: NeuronId) -> &Neuron {
        &self.neurons[id.index()]
    }
    /// The neuron at `position` in `layer`.
    pub fn neuron_at(&self, layer: LayerId, position: usize) -> Result<NeuronId, GraphError> {
        self.layer(layer)
            .neuron(position)
            .ok_or(GraphError::UnknownNeuron {
                layer: layer.index(),
                neuron: position,
            })
    }
    pub fn exprs(&self) -> &Expressions {
        &self.exprs
    }
    fn push_neuron(&mut self, layer: LayerId, kind: NeuronKind) -> NeuronId {
        let id = NeuronId(self.neurons.len() as u32);
        let position = self.layer(layer).len();
        self.neurons.push(Neuron::new(kind, layer, position));
        self.layers[layer.index()].push(id);
        id
    }
    pub fn add_neuron(&mut self, layer: LayerId) -> NeuronId {
        self.push_neuron(layer, NeuronKind::Hidden)
    }
    pub fn add_input_neuron(&mut self, layer: LayerId) -> NeuronId {
        self.push_neuron(layer, NeuronKind::Input)
    }
    pub fn add_output_neuron(&mut self, layer: LayerId) -> NeuronId {
        self.push_neuron(layer, NeuronKind::Output)
    }
    /// Add an edge from `src` to `sink`.
    ///
    /// The edge is recorded on both neurons. Adding the same edge twice
    /// records it twice. On error, neither neuron is modified.
    pub fn connect(&mut self, src: NeuronId, sink: NeuronId) -> Result<(), GraphError> {
        if self.neuron(src).is_output() {
            return Err(GraphError::OutputCannotBeSource);
        }
        if self.neuron(sink).is_input() {
            return Err(GraphError::InputCannotBeSink);
        }
        self.neurons[src.index()].sinks.push(sink);
        self.neurons[sink.index()].sources.push(src);
        let sink_layer = self.neuron(sink).layer;
        self.layers[sink_layer.index()].invalidate();
        // The input type of `sink` depends on its number of sources.
        self.exprs.clear_types();
        Ok(())
    }
    /// Connect the neurons of two layers.
    ///
    /// `connections` maps each position in the sink layer to the positions in
    /// the source layer that feed it. Every sink neuron needs an entry. All
    /// entries are validated before any edge is added.
    pub fn connect_layers(
        &mut self,
        src_layer: LayerId,
        sink_layer: LayerId,
        connections: &BTreeMap<usize, Vec<usize>>,
    ) -> Result<(), GraphError> {
        let mut edges = vec![];
        for position in 0..self.layer(sink_layer).len() {
            let sources = connections
                .get(&position)
                .ok_or(GraphError::MissingConnections {
                    layer: sink_layer.index(),
                    neuron: position,
                })?;
            let sink = self.neuron_at(sink_layer, position)?;
            for src in sources {
                let src = self.neuron_at(src_layer, *src)?;
                if self.neuron(src).is_output() {
                    return Err(GraphError::OutputCannotBeSource);
                }
                if self.neuron(sink).is_input() {
                    return Err(GraphError::InputCannotBeSink);
                }
                edges.push((src, sink));
            }
        }
        debug!(
            "Connecting layer {src_layer} to layer {sink_layer} with {} edges",
            edges.len()
        );
        for (src, sink) in edges {
            self.connect(src, sink)?;
        }
        Ok(())
    }
    /// Set the expression that defines the output of `neuron`.
    pub fn set_forward_value(&mut self, neuron: NeuronId, value: &Expr) -> ValueId {
        let id = value.intern(&mut self.exprs);
        self.neurons[neuron.index()].forward = Some(id);
        let layer = self.neuron(neuron).layer;
        self.layers[layer.index()].invalidate();
        id
    }
    pub fn forward_value(&self, neuron: NeuronId) -> Option<ValueId> {
        self.neuron(neuron).forward
    }
    /// Attach a named constant to `neuron`.
    pub fn add_property(&mut self, neuron: NeuronId, name: &str, value: PropertyValue) -> usize {
        let properties = &mut self.neurons[neuron.index()].properties;
        properties.push((name.to_string(), value));
        properties.len() - 1
    }
    pub fn infer_type(&self, value: ValueId) -> Result<ValueType, TypeError> {
        self.exprs.infer_type(value, self)
    }
    /// Verify that every forward value is well typed and scalar, and only
    /// reads the inputs of its own neuron.
    ///
    /// Neurons are visited layer by layer in order and the first error is
    /// returned.
    pub fn check_types(&self) -> Result<(), TypeError> {
        for layer in self.layers.iter() {
            for (position, neuron) in layer.neurons().iter().enumerate() {
                let Some(value) = self.forward_value(*neuron) else {
                    continue;
                };
                if self.exprs.input_neurons(value).iter().any(|n| n != neuron) {
                    return Err(TypeError::ForeignInput {
                        layer: layer.id().index(),
                        neuron: position,
                    });
                }
                let typ = self.infer_type(value)?;
                trace!("Layer {} neuron {position} has type {typ}", layer.id());
                if !typ.is_scalar() {
                    return Err(TypeError::NeuronOutputMustBeScalar {
                        layer: layer.id().index(),
                        neuron: position,
                        typ,
                    });
                }
            }
        }
        Ok(())
    }
    /// Partition every layer into ensembles and store them on the layers.
    pub fn group_ensembles(&mut self) {
        for index in 0..self.layers.len() {
            let id = self.layers[index].id();
            let ensembles = collect_ensembles(self, id);
            debug!("Layer {id} has {} ensembles", ensembles.len());
            self.layers[index].set_ensembles(ensembles);
        }
    }
    /// The ensembles of `layer`, computed on the fly if not grouped yet.
    pub fn ensembles(&self, layer: LayerId) -> Vec<Ensemble> {
        match self.layer(layer).ensembles() {
            Some(ensembles) => ensembles.to_vec(),
            None => collect_ensembles(self, layer),
        }
    }
    pub fn display(&self) -> NetworkDisplay<'_> {
        NetworkDisplay::new(self)
    }
}

impl TypeEnv for Network {
    fn input_type(&self, neuron: NeuronId) -> ValueType {
        let neuron = self.neuron(neuron);
        if neuron.is_input() {
            ValueType::Real
        } else {
            ValueType::vector(ScalarType::Real, neuron.num_inputs())
        }
    }
}

/// See [Network::check_types].
pub fn check_types(network: &Network) -> Result<(), TypeError> {
    network.check_types()
}
