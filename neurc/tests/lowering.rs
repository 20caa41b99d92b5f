use indoc::indoc;
use neurc::construct_ir_for_network;
use neurc::ir::Expr;
use neurc::ir::ReductionKind;
use neurc::lir::Statement;
use neurc::network::LayerId;
use neurc::network::Network;
use neurc::network::NeuronId;
use neurc::tester::Tester;
use neurc::CompileError;
use neurc::GraphError;
use neurc::TypeError;
use std::collections::BTreeMap;
use std::panic::Location;

/// Input layer of `width` neurons that forward the network input.
fn input_layer(net: &mut Network, width: usize) -> LayerId {
    let layer = net.add_layer();
    for _ in 0..width {
        let n = net.add_input_neuron(layer);
        net.set_forward_value(n, &Expr::input(n));
    }
    layer
}

fn weighted(net: &mut Network, neuron: NeuronId, weights: Vec<f64>, bias: f64) {
    let sum = (Expr::real_vector(weights) * Expr::input(neuron)).reduce(ReductionKind::Sum);
    net.set_forward_value(neuron, &(sum + Expr::real(bias)).activation("sigmoid"));
}

/// Two inputs and two fully connected sigmoid neurons.
///
/// Without `forward_inputs` the input neurons have no forward value at all.
fn two_by_two(forward_inputs: bool) -> Network {
    let mut net = Network::new();
    let l0 = if forward_inputs {
        input_layer(&mut net, 2)
    } else {
        let layer = net.add_layer();
        net.add_input_neuron(layer);
        net.add_input_neuron(layer);
        layer
    };
    let l1 = net.add_layer();
    let a = net.add_neuron(l1);
    let b = net.add_neuron(l1);
    let connections = BTreeMap::from([(0, vec![0, 1]), (1, vec![0, 1])]);
    net.connect_layers(l0, l1, &connections).unwrap();
    weighted(&mut net, a, vec![0.1, 0.2], 0.5);
    weighted(&mut net, b, vec![0.3, 0.4], 0.6);
    net
}

/// Layer of neurons that sum their inputs, one neuron per entry in `sources`.
fn summing_layer(net: &mut Network, src: LayerId, sources: &[Vec<usize>]) -> LayerId {
    let layer = net.add_layer();
    let mut connections = BTreeMap::new();
    for (position, srcs) in sources.iter().enumerate() {
        let n = net.add_neuron(layer);
        net.set_forward_value(n, &Expr::input(n).reduce(ReductionKind::Sum));
        connections.insert(position, srcs.clone());
    }
    net.connect_layers(src, layer, &connections).unwrap();
    layer
}

/// Tabs are replaced so that the expected text can be written with spaces.
fn listing(net: &Network) -> String {
    Tester::init_tracing();
    let function = construct_ir_for_network(net).unwrap();
    Tester::verify(&function);
    let actual = function.to_string();
    Tester::print_heading("Lowered", &actual);
    actual.replace('\t', " ")
}

#[test]
fn test_fully_connected_sigmoid_layer() {
    let expected = indoc! {"
        function (input [ Vector [real], 2 ]) -> (output [ Vector [real], 2 ])
        valueset vs0 : [ Vector [real], 2 ] @ 0 = { [0.1, 0.2], [0.3, 0.4] }
        valueset vs1 : [real] @ 0 = { 0.5, 0.6 }
        for idx0 = 0 : 2 {
            t0 = getvalue(vs0, idx0) [ Vector [real], 2 ]
            define t1 [ Vector [real], 2 ]
            t2 = 0 [int]
            t1[0] = input[t2] [real]
            t3 = 1 [int]
            t1[1] = input[t3] [real]
            define t4 [ Vector [real], 2 ]
            for idx1 = 0 : 2 {
                t4[idx1] = mul(t0[idx1], t1[idx1]) [real]
            }
            t5 = t4[0] [real]
            for idx2 = 1 : 2 {
                t5 = add(t5, t4[idx2]) [real]
            }
            t6 = getvalue(vs1, idx0) [real]
            t7 = add(t5, t6) [real]
            t8 = sigmoid(t7) [real]
            output[idx0] = t8 [real]
        }
    "};
    let actual = listing(&two_by_two(true));
    Tester::check_lines_exact(&actual, expected, Location::caller());
}

#[test]
fn test_input_layer_without_forward_values() {
    let net = two_by_two(false);
    let function = construct_ir_for_network(&net).unwrap();
    Tester::verify(&function);
    assert_eq!(function.statements().len(), 1);
    let hidden = Statement::loops(function.statements()).collect::<Vec<_>>();
    assert_eq!(hidden.len(), 1);
    assert_eq!(function.display_value(hidden[0].start), "0");
    assert_eq!(function.display_value(hidden[0].end), "2");
    assert_eq!(listing(&net), listing(&two_by_two(true)));
}

#[test]
fn test_one_value_set_per_constant() {
    let net = two_by_two(false);
    let function = construct_ir_for_network(&net).unwrap();
    let sets = function.value_sets();
    assert_eq!(sets.len(), 2);
    for set in sets {
        assert_eq!(set.len(), 2);
        assert_eq!(set.first_index(), 0);
    }
}

#[test]
fn test_computing_input_layer_is_lowered() {
    let mut net = Network::new();
    let l0 = net.add_layer();
    for _ in 0..2 {
        let n = net.add_input_neuron(l0);
        net.set_forward_value(n, &(Expr::input(n) * Expr::real(2.0)));
    }
    summing_layer(&mut net, l0, &[vec![0, 1]]);
    let expected = indoc! {"
        define layer0 [ Vector [real], 2 ]
        for idx0 = 0 : 2 {
            layer0[idx0] = t3 [real]
        }
        for idx1 = 0 : 1 {
            t5 = 0 [int]
            t4[0] = layer0[t5] [real]
    "};
    let actual = listing(&net);
    Tester::check_lines_contain(&actual, expected, Location::caller());
}

#[test]
fn test_reduction_emits_single_inner_loop() {
    let mut net = Network::new();
    let l0 = input_layer(&mut net, 3);
    summing_layer(&mut net, l0, &[vec![0, 1, 2]]);
    let function = construct_ir_for_network(&net).unwrap();
    Tester::verify(&function);

    let outer = Statement::loops(function.statements()).last().unwrap();
    let inner = Statement::loops(&outer.body).collect::<Vec<_>>();
    assert_eq!(inner.len(), 1);
    assert_eq!(function.display_value(inner[0].start), "1");
    assert_eq!(function.display_value(inner[0].end), "3");
}

#[test]
fn test_sliding_window_uses_loop_index() {
    let mut net = Network::new();
    let l0 = input_layer(&mut net, 4);
    summing_layer(&mut net, l0, &[vec![0, 1, 2], vec![1, 2, 3]]);
    let expected = indoc! {"
        function (input [ Vector [real], 4 ]) -> (output [ Vector [real], 2 ])
        for idx0 = 0 : 2 {
            define t0 [ Vector [real], 3 ]
            t1 = idx0 [int]
            t0[0] = input[t1] [real]
            t2 = add(1, idx0) [int]
            t0[1] = input[t2] [real]
            t3 = add(2, idx0) [int]
            t0[2] = input[t3] [real]
            t4 = t0[0] [real]
            for idx1 = 1 : 3 {
                t4 = add(t4, t0[idx1]) [real]
            }
            output[idx0] = t4 [real]
        }
    "};
    let actual = listing(&net);
    Tester::check_lines_exact(&actual, expected, Location::caller());
}

#[test]
fn test_irregular_wiring_uses_base_table() {
    let mut net = Network::new();
    let l0 = input_layer(&mut net, 5);
    summing_layer(&mut net, l0, &[vec![0, 1], vec![1, 2], vec![3, 4]]);
    let expected = indoc! {"
        valueset vs0 : [int] @ 0 = { 0, 1, 3 }
        for idx0 = 0 : 3 {
            t1 = getvalue(vs0, idx0) [int]
            t0[0] = input[t1] [real]
            t2 = add(getvalue(vs0, idx0), 1) [int]
            t0[1] = input[t2] [real]
    "};
    let actual = listing(&net);
    Tester::check_lines_contain(&actual, expected, Location::caller());
}

#[test]
fn test_ensemble_with_offset() {
    let mut net = Network::new();
    let l0 = input_layer(&mut net, 2);
    let l1 = net.add_layer();
    let first = net.add_neuron(l1);
    net.set_forward_value(first, &Expr::input(first).reduce(ReductionKind::Max));
    for scale in [2.0, 3.0] {
        let n = net.add_neuron(l1);
        let value = Expr::input(n).reduce(ReductionKind::Sum) * Expr::real(scale);
        net.set_forward_value(n, &value);
    }
    let all = BTreeMap::from([(0, vec![0, 1]), (1, vec![0, 1]), (2, vec![0, 1])]);
    net.connect_layers(l0, l1, &all).unwrap();
    let expected = indoc! {"
        valueset vs0 : [real] @ 1 = { 2.0, 3.0 }
        for idx0 = 0 : 1 {
            t3 = max(t3, t0[idx1]) [real]
            output[idx0] = t3 [real]
        }
        for idx2 = 1 : 3 {
            t8 = getvalue(vs0, idx2) [real]
            t9 = mul(t7, t8) [real]
            output[idx2] = t9 [real]
        }
    "};
    let actual = listing(&net);
    Tester::check_lines_contain(&actual, expected, Location::caller());
}

#[test]
fn test_compilations_are_independent() {
    let net = two_by_two(true);
    let first = construct_ir_for_network(&net).unwrap().to_string();
    let second = construct_ir_for_network(&net).unwrap().to_string();
    assert_eq!(first, second);
}

#[test]
fn test_type_errors_stop_lowering() {
    let mut net = Network::new();
    let l0 = net.add_layer();
    let n = net.add_neuron(l0);
    net.set_forward_value(n, &Expr::real_vector(vec![1.0, 2.0]));
    let err = construct_ir_for_network(&net).unwrap_err();
    assert!(matches!(
        err,
        CompileError::Type(TypeError::NeuronOutputMustBeScalar { layer: 0, neuron: 0, .. })
    ));
}

#[test]
fn test_missing_forward_value() {
    let mut net = Network::new();
    let l0 = input_layer(&mut net, 1);
    let l1 = net.add_layer();
    net.add_neuron(l1);
    net.connect_layers(l0, l1, &BTreeMap::from([(0, vec![0])]))
        .unwrap();
    let err = construct_ir_for_network(&net).unwrap_err();
    assert_eq!(
        err,
        CompileError::Graph(GraphError::MissingForwardValue {
            layer: 1,
            neuron: 0
        })
    );
}

#[test]
fn test_foreign_inputs_are_rejected() {
    let mut net = Network::new();
    let l0 = input_layer(&mut net, 3);
    let l1 = summing_layer(&mut net, l0, &[vec![0], vec![0, 1, 2]]);
    let narrow = net.layer(l1).neurons()[0];
    let wide = net.layer(l1).neurons()[1];
    net.set_forward_value(narrow, &Expr::input(wide).reduce(ReductionKind::Sum));
    let Err(err) = construct_ir_for_network(&net) else {
        panic!("reading the inputs of another neuron must fail");
    };
    assert_eq!(
        err,
        CompileError::Type(TypeError::ForeignInput { layer: 1, neuron: 0 })
    );
}

#[test]
fn test_reduction_without_inputs_is_rejected() {
    let mut net = Network::new();
    let l0 = input_layer(&mut net, 1);
    let l1 = net.add_layer();
    let n = net.add_neuron(l1);
    net.set_forward_value(n, &Expr::input(n).reduce(ReductionKind::Sum));
    net.connect_layers(l0, l1, &BTreeMap::from([(0, vec![])]))
        .unwrap();
    let Err(err) = construct_ir_for_network(&net) else {
        panic!("an empty reduction must fail");
    };
    assert_eq!(err, CompileError::Type(TypeError::EmptyReduction));
}
