//! Small networks for the driver and for tests.

use crate::ir::Expr;
use crate::ir::ReductionKind;
use crate::network::LayerId;
use crate::network::Network;
use crate::network::NeuronId;
use crate::network::PropertyValue;
use std::collections::BTreeMap;

/// Weight of the edge from `src` to `sink`.
///
/// Arbitrary but reproducible, so that listings are stable.
fn weight(layer: usize, sink: usize, src: usize) -> f64 {
    let seed = (layer * 31 + sink * 7 + src * 3) % 17;
    seed as f64 / 8.0 - 1.0
}

/// `sigmoid(sum(weights * inputs) + bias)`, with `weights` and `bias` also
/// stored as properties on the neuron.
fn weighted_sum(network: &mut Network, neuron: NeuronId, weights: Vec<f64>, bias: f64) {
    network.add_property(neuron, "weights", PropertyValue::Vector(weights.clone()));
    network.add_property(neuron, "bias", PropertyValue::Scalar(bias));
    let inputs = Expr::input(neuron);
    let sum = (Expr::real_vector(weights) * inputs).reduce(ReductionKind::Sum);
    let value = (sum + Expr::real(bias)).activation("sigmoid");
    network.set_forward_value(neuron, &value);
}

fn fully_connected(width: usize) -> BTreeMap<usize, Vec<usize>> {
    (0..width).map(|sink| (sink, (0..width).collect())).collect()
}

fn connect_dense(network: &mut Network, src: LayerId, sink: LayerId, width: usize) {
    let connections = fully_connected(width);
    if let Err(err) = network.connect_layers(src, sink, &connections) {
        panic!("internal invariant violation: dense layers must connect: {err}");
    }
    for position in 0..width {
        let Some(neuron) = network.layer(sink).neuron(position) else {
            continue;
        };
        let weights = (0..width)
            .map(|src| weight(sink.index(), position, src))
            .collect();
        let bias = weight(sink.index(), position, width) / 2.0;
        weighted_sum(network, neuron, weights, bias);
    }
}

/// A multi-layer perceptron with `hidden_layers` fully connected sigmoid
/// layers between an input and an output layer, all `width` neurons wide.
pub fn simple_network(width: usize, hidden_layers: usize) -> Network {
    let mut network = Network::new();
    let input = network.add_layer();
    for _ in 0..width {
        let neuron = network.add_input_neuron(input);
        network.set_forward_value(neuron, &Expr::input(neuron));
    }
    let mut previous = input;
    for _ in 0..hidden_layers {
        let layer = network.add_layer();
        for _ in 0..width {
            network.add_neuron(layer);
        }
        connect_dense(&mut network, previous, layer, width);
        previous = layer;
    }
    let output = network.add_layer();
    for _ in 0..width {
        network.add_output_neuron(output);
    }
    connect_dense(&mut network, previous, output, width);
    network
}
