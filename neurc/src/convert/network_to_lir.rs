use crate::error::CompileError;
use crate::error::GraphError;
use crate::ir::ReductionKind;
use crate::ir::ScalarType;
use crate::ir::Value;
use crate::ir::ValueId;
use crate::ir::ValueType;
use crate::lir::Assignment;
use crate::lir::Constant;
use crate::lir::ForLoop;
use crate::lir::Function;
use crate::lir::Statement;
use crate::lir::ValueSetId;
use crate::lir::VariableId;
use crate::network::Ensemble;
use crate::network::Layer;
use crate::network::Network;
use crate::network::NeuronId;
use std::collections::HashMap;
use tracing::debug;
use tracing::info;

/// Counters for fresh names, scoped to a single compilation.
///
/// Two compilations never share a session, so the generated names only
/// depend on the network that is compiled.
#[derive(Default)]
pub struct Session {
    temporaries: u32,
    indices: u32,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }
    fn temporary(&mut self) -> String {
        let name = format!("t{}", self.temporaries);
        self.temporaries += 1;
        name
    }
    fn index(&mut self) -> String {
        let name = format!("idx{}", self.indices);
        self.indices += 1;
        name
    }
}

/// How the members of an ensemble find their inputs.
#[derive(Clone, Copy)]
enum InputWiring {
    /// The first source of the `k`-th member is `stride * k` positions after
    /// the first source of the representative.
    Affine { stride: i64 },
    /// First source of every member, stored per neuron.
    Table(ValueSetId),
}

/// Lowers the expression of one ensemble's representative.
struct EnsembleLowering<'a> {
    network: &'a Network,
    function: &'a mut Function,
    session: &'a mut Session,
    ensemble: &'a Ensemble,
    /// Output variable of the previous layer, or the function input.
    input: VariableId,
    /// Ensemble loop index.
    idx: VariableId,
    constant_sets: HashMap<ValueId, ValueSetId>,
    wiring: Option<InputWiring>,
    memo: HashMap<ValueId, VariableId>,
    /// Bodies of the loops that are open, innermost last.
    scopes: Vec<Vec<Statement>>,
}

fn position(network: &Network, neuron: NeuronId) -> i64 {
    network.neuron(neuron).position() as i64
}

fn missing_forward_value(network: &Network, neuron: NeuronId) -> GraphError {
    let neuron = network.neuron(neuron);
    GraphError::MissingForwardValue {
        layer: neuron.layer().index(),
        neuron: neuron.position(),
    }
}

impl<'a> EnsembleLowering<'a> {
    fn emit(&mut self, statement: Statement) {
        match self.scopes.last_mut() {
            Some(scope) => scope.push(statement),
            None => panic!("internal invariant violation: statement emitted outside a loop"),
        }
    }
    fn value(&mut self, value: Value) -> ValueId {
        self.function.push_value(value)
    }
    fn var(&mut self, var: VariableId) -> ValueId {
        self.value(Value::Variable(var))
    }
    fn int(&mut self, value: i64) -> ValueId {
        self.value(Value::IntegerConstant(value))
    }
    fn temporary(&mut self, typ: ValueType) -> VariableId {
        let name = self.session.temporary();
        self.function.declare(&name, typ)
    }
    fn assign(&mut self, lhs: Value, rhs: ValueId) {
        let lhs = self.value(lhs);
        self.emit(Statement::Assign(Assignment { lhs, rhs }));
    }
    /// Open a loop over `[start, end)` and return its index variable.
    fn open_loop(&mut self) -> VariableId {
        let name = self.session.index();
        let index = self.function.declare(&name, ValueType::Integer);
        self.scopes.push(vec![]);
        index
    }
    fn close_loop(&mut self, index: VariableId, start: i64, end: i64) {
        let body = match self.scopes.pop() {
            Some(body) => body,
            None => panic!("internal invariant violation: no loop to close"),
        };
        let start = self.int(start);
        let end = self.int(end);
        self.emit(Statement::Loop(ForLoop {
            index,
            start,
            end,
            body,
        }));
    }
    fn typ(&self, id: ValueId) -> ValueType {
        match self.network.infer_type(id) {
            Ok(typ) => typ,
            Err(err) => panic!("internal invariant violation: lowering ill-typed value: {err}"),
        }
    }
    fn vector_len(&self, id: ValueId, typ: &ValueType) -> i64 {
        match typ.len() {
            Some(len) => len as i64,
            None => panic!("internal invariant violation: {id} has a vector type without length"),
        }
    }
    /// Reference to `var` inside a loop over vector elements with index `element`.
    ///
    /// Scalars are broadcast, vectors are read element by element.
    fn element_ref(&mut self, var: VariableId, element: VariableId) -> ValueId {
        if self.function.variable(var).typ().is_vector() {
            let index = self.var(element);
            self.value(Value::IndexedValue(var, index))
        } else {
            self.var(var)
        }
    }
    fn lower(&mut self, id: ValueId) -> VariableId {
        if let Some(var) = self.memo.get(&id) {
            return *var;
        }
        let var = self.lower_uncached(id);
        self.memo.insert(id, var);
        var
    }
    fn lower_uncached(&mut self, id: ValueId) -> VariableId {
        let value = self.network.exprs()[id].clone();
        let typ = self.typ(id);
        match value {
            Value::IntegerConstant(_)
            | Value::BooleanConstant(_)
            | Value::RealConstant(_)
            | Value::RealVectorConstant(_) => self.lower_constant(id, typ),
            Value::UnaryPlus(x) | Value::UnaryMinus(x) => {
                let x = self.lower(x);
                self.lower_elementwise(id, typ, &[x])
            }
            Value::BinaryAdd(l, r)
            | Value::BinarySubtract(l, r)
            | Value::BinaryMultiply(l, r)
            | Value::BinaryDivide(l, r) => {
                let l = self.lower(l);
                let r = self.lower(r);
                self.lower_elementwise(id, typ, &[l, r])
            }
            Value::GetInputValue(_) => self.lower_input(id, typ),
            Value::Reduction(x, kind) => {
                let x = self.lower(x);
                self.lower_reduction(x, kind, typ)
            }
            Value::ActivationFunction(x, name) => {
                let x = self.lower(x);
                let operand = self.var(x);
                let rhs = self.value(Value::ActivationFunction(operand, name));
                let t = self.temporary(typ);
                self.assign(Value::Variable(t), rhs);
                t
            }
            Value::Variable(_)
            | Value::IndexedValue(_, _)
            | Value::GetValue(_, _)
            | Value::BinaryMax(_, _) => {
                panic!("internal invariant violation: lowered value {id} inside a network")
            }
        }
    }
    fn lower_constant(&mut self, id: ValueId, typ: ValueType) -> VariableId {
        let set = match self.constant_sets.get(&id) {
            Some(set) => *set,
            None => panic!("internal invariant violation: constant {id} has no value set"),
        };
        let index = self.var(self.idx);
        let rhs = self.value(Value::GetValue(set, index));
        let t = self.temporary(typ);
        self.assign(Value::Variable(t), rhs);
        t
    }
    /// Apply the operator of `id` to `operands`.
    ///
    /// Vector results are computed in a nested loop over their elements.
    fn lower_elementwise(&mut self, id: ValueId, typ: ValueType, operands: &[VariableId]) -> VariableId {
        let t = self.temporary(typ.clone());
        if typ.is_scalar() {
            let operands = operands.iter().map(|x| self.var(*x)).collect::<Vec<_>>();
            let rhs = self.rebuild(id, &operands);
            self.assign(Value::Variable(t), rhs);
            return t;
        }
        let len = self.vector_len(id, &typ);
        self.emit(Statement::Define(t));
        let element = self.open_loop();
        let operands = operands
            .iter()
            .map(|x| self.element_ref(*x, element))
            .collect::<Vec<_>>();
        let rhs = self.rebuild(id, &operands);
        let index = self.var(element);
        self.assign(Value::IndexedValue(t, index), rhs);
        self.close_loop(element, 0, len);
        t
    }
    /// The operator of network value `id` applied to lowered `operands`.
    fn rebuild(&mut self, id: ValueId, operands: &[ValueId]) -> ValueId {
        let value = match (&self.network.exprs()[id], operands) {
            (Value::UnaryPlus(_), [x]) => Value::UnaryPlus(*x),
            (Value::UnaryMinus(_), [x]) => Value::UnaryMinus(*x),
            (Value::BinaryAdd(_, _), [l, r]) => Value::BinaryAdd(*l, *r),
            (Value::BinarySubtract(_, _), [l, r]) => Value::BinarySubtract(*l, *r),
            (Value::BinaryMultiply(_, _), [l, r]) => Value::BinaryMultiply(*l, *r),
            (Value::BinaryDivide(_, _), [l, r]) => Value::BinaryDivide(*l, *r),
            (other, _) => panic!(
                "internal invariant violation: {} with {} operands is not elementwise",
                other.mnemonic(),
                operands.len()
            ),
        };
        self.value(value)
    }
    fn wiring(&mut self) -> InputWiring {
        if let Some(wiring) = self.wiring {
            return wiring;
        }
        let network = self.network;
        let bases = self
            .ensemble
            .neurons()
            .iter()
            .map(|n| network.neuron(*n).sources().first().map(|s| position(network, *s)))
            .collect::<Vec<Option<i64>>>();
        let first = bases[0].unwrap_or(0);
        let stride = match bases.get(1) {
            Some(Some(second)) => second - first,
            _ => 0,
        };
        let affine = bases
            .iter()
            .enumerate()
            .all(|(k, base)| *base == Some(first + stride * k as i64));
        let wiring = if affine {
            InputWiring::Affine { stride }
        } else {
            let set = self
                .function
                .create_value_set(ValueType::Integer, self.ensemble.start());
            for base in bases {
                let base = base.unwrap_or(0);
                self.function.value_set_mut(set).add_value(Constant::Integer(base));
            }
            InputWiring::Table(set)
        };
        debug!("Input wiring of ensemble at {}: {wiring:?}", self.ensemble.start());
        self.wiring = Some(wiring);
        wiring
    }
    /// Layer position of the `i`-th input of the neuron at loop index `idx`.
    fn source_index(&mut self, i: usize) -> ValueId {
        let network = self.network;
        let representative = network.neuron(self.ensemble.representative());
        let sources = representative.sources();
        let source = position(network, sources[i]);
        match self.wiring() {
            InputWiring::Affine { stride } => {
                let base = source - stride * self.ensemble.start() as i64;
                let scaled = match stride {
                    0 => None,
                    1 => Some(self.var(self.idx)),
                    _ => {
                        let stride = self.int(stride);
                        let idx = self.var(self.idx);
                        Some(self.value(Value::BinaryMultiply(stride, idx)))
                    }
                };
                match (base, scaled) {
                    (base, None) => self.int(base),
                    (0, Some(scaled)) => scaled,
                    (base, Some(scaled)) => {
                        let base = self.int(base);
                        self.value(Value::BinaryAdd(base, scaled))
                    }
                }
            }
            InputWiring::Table(set) => {
                let idx = self.var(self.idx);
                let first = self.value(Value::GetValue(set, idx));
                let offset = source - position(network, sources[0]);
                if offset == 0 {
                    return first;
                }
                let offset = self.int(offset);
                self.value(Value::BinaryAdd(first, offset))
            }
        }
    }
    /// Read the inputs of the current neuron into a fresh variable.
    fn lower_input(&mut self, id: ValueId, typ: ValueType) -> VariableId {
        let t = self.temporary(typ.clone());
        if typ.is_scalar() {
            // An input neuron reads the network input at its own position.
            let index = self.temporary(ValueType::Integer);
            let idx = self.var(self.idx);
            self.assign(Value::Variable(index), idx);
            let index = self.var(index);
            let rhs = self.value(Value::IndexedValue(self.input, index));
            self.assign(Value::Variable(t), rhs);
            return t;
        }
        let len = self.vector_len(id, &typ);
        self.emit(Statement::Define(t));
        for i in 0..len as usize {
            let source = self.source_index(i);
            let index = self.temporary(ValueType::Integer);
            self.assign(Value::Variable(index), source);
            let index = self.var(index);
            let rhs = self.value(Value::IndexedValue(self.input, index));
            let position = self.int(i as i64);
            self.assign(Value::IndexedValue(t, position), rhs);
        }
        t
    }
    /// Fold the elements of vector `x`, seeded with its first element.
    fn lower_reduction(&mut self, x: VariableId, kind: ReductionKind, typ: ValueType) -> VariableId {
        let x_typ = self.function.variable(x).typ().clone();
        let len = match x_typ.len() {
            Some(len) => len as i64,
            None => panic!("internal invariant violation: reduction over {x} without length"),
        };
        let acc = self.temporary(typ);
        let zero = self.int(0);
        let first = self.value(Value::IndexedValue(x, zero));
        self.assign(Value::Variable(acc), first);
        let element = self.open_loop();
        let lhs = self.var(acc);
        let rhs = self.element_ref(x, element);
        let combined = match kind {
            ReductionKind::Sum => Value::BinaryAdd(lhs, rhs),
            ReductionKind::Multiply => Value::BinaryMultiply(lhs, rhs),
            ReductionKind::Max => Value::BinaryMax(lhs, rhs),
        };
        let combined = self.value(combined);
        self.assign(Value::Variable(acc), combined);
        self.close_loop(element, 1, len);
        acc
    }
}

impl std::fmt::Debug for InputWiring {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputWiring::Affine { stride } => write!(f, "affine with stride {stride}"),
            InputWiring::Table(set) => write!(f, "table {set}"),
        }
    }
}

/// Create one value set per constant of the representative and fill it with
/// the matching constant of every member.
fn collect_value_sets(
    network: &Network,
    ensemble: &Ensemble,
    function: &mut Function,
) -> Result<HashMap<ValueId, ValueSetId>, CompileError> {
    let exprs = network.exprs();
    let representative = ensemble.representative();
    let root = network
        .forward_value(representative)
        .ok_or_else(|| missing_forward_value(network, representative))?;
    let constants = exprs.constants(root);
    let mut sets = vec![];
    for constant in constants.iter() {
        let typ = network.infer_type(*constant)?;
        sets.push(function.create_value_set(typ, ensemble.start()));
    }
    for neuron in ensemble.neurons() {
        let root = network
            .forward_value(*neuron)
            .ok_or_else(|| missing_forward_value(network, *neuron))?;
        let own = exprs.constants(root);
        assert_eq!(
            own.len(),
            sets.len(),
            "internal invariant violation: {neuron} has {} constants but its ensemble has {}",
            own.len(),
            sets.len()
        );
        for (set, constant) in sets.iter().zip(own) {
            let value = match Constant::from_value(&exprs[constant]) {
                Some(value) => value,
                None => panic!("internal invariant violation: {constant} is not a constant"),
            };
            function.value_set_mut(*set).add_value(value);
        }
    }
    Ok(constants.into_iter().zip(sets).collect())
}

fn lower_ensemble(
    network: &Network,
    ensemble: &Ensemble,
    input: VariableId,
    output: VariableId,
    function: &mut Function,
    session: &mut Session,
) -> Result<(), CompileError> {
    let constant_sets = collect_value_sets(network, ensemble, function)?;
    let representative = ensemble.representative();
    let root = network
        .forward_value(representative)
        .ok_or_else(|| missing_forward_value(network, representative))?;
    let name = session.index();
    let idx = function.declare(&name, ValueType::Integer);
    let mut lowering = EnsembleLowering {
        network,
        function,
        session,
        ensemble,
        input,
        idx,
        constant_sets,
        wiring: None,
        memo: HashMap::new(),
        scopes: vec![vec![]],
    };
    let result = lowering.lower(root);
    let index = lowering.var(idx);
    let rhs = lowering.var(result);
    lowering.assign(Value::IndexedValue(output, index), rhs);
    let start = lowering.int(ensemble.start() as i64);
    let end = lowering.int(ensemble.end() as i64);
    let Some(body) = lowering.scopes.pop() else {
        panic!("internal invariant violation: ensemble scope missing");
    };
    function.push_statement(Statement::Loop(ForLoop {
        index: idx,
        start,
        end,
        body,
    }));
    debug!(
        "Lowered ensemble [{}, {}) of layer {}",
        ensemble.start(),
        ensemble.end(),
        ensemble.layer()
    );
    Ok(())
}

/// Whether `layer` only hands the network input to the next layer.
///
/// That is the case for input neurons without a forward value and for input
/// neurons that forward their own input.
fn is_pass_through(network: &Network, layer: &Layer) -> bool {
    layer.neurons().iter().all(|id| {
        let neuron = network.neuron(*id);
        let forwards_input = match neuron.forward_value() {
            None => true,
            Some(value) => network.exprs()[value] == Value::GetInputValue(*id),
        };
        neuron.is_input() && forwards_input
    })
}

/// Lower `network` into a single [Function].
///
/// Types are checked first. Each layer writes its outputs into a vector
/// that is the input of the next layer; the last layer writes into the
/// function output. A first layer that only passes the network input on is
/// not lowered, the next layer reads the function input instead. Ensembles
/// that were not grouped yet are grouped on the fly.
pub fn construct_ir_for_network(network: &Network) -> Result<Function, CompileError> {
    network.check_types()?;
    let layers = network.layers();
    let width = |layer: Option<&Layer>| layer.map(|l| l.len()).unwrap_or(0);
    let input_type = ValueType::vector(ScalarType::Real, width(layers.first()));
    let output_type = ValueType::vector(ScalarType::Real, width(layers.last()));
    let mut function = Function::new(input_type, output_type);
    let mut session = Session::new();
    let mut input = function.input();
    let skip = match layers.first() {
        Some(first) if layers.len() > 1 && is_pass_through(network, first) => 1,
        _ => 0,
    };
    for (k, layer) in layers.iter().enumerate().skip(skip) {
        let output = if k + 1 == layers.len() {
            function.output()
        } else {
            let typ = ValueType::vector(ScalarType::Real, layer.len());
            let var = function.declare(&format!("layer{k}"), typ);
            function.push_statement(Statement::Define(var));
            var
        };
        for ensemble in network.ensembles(layer.id()).iter() {
            lower_ensemble(network, ensemble, input, output, &mut function, &mut session)?;
        }
        input = output;
    }
    info!(
        "Lowered {} layers into {} top-level statements and {} value sets",
        layers.len(),
        function.statements().len(),
        function.value_sets().len()
    );
    Ok(function)
}
