use crate::{
    LazyError, LazyResult, Value,
    eval::{Evaluator, Options},
    id::NodeId,
    ops::{BinaryOp, UnaryOp},
    source::Source,
};
use std::{
    cell::RefCell,
    fmt,
    hash::{Hash, Hasher},
    rc::Rc,
};
use tracing::{debug, trace};

/// A zero-argument computation producing a value on demand.
pub type Function = Rc<dyn Fn() -> LazyResult<Value>>;

/// Where a node's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginKind {
    /// Wraps a concrete value.
    Constant,
    /// Forwards to another node.
    Aliased,
    /// Computed from a function or from other nodes.
    Derived,
}

impl fmt::Display for OriginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OriginKind::Constant => "constant",
            OriginKind::Aliased => "aliased",
            OriginKind::Derived => "derived",
        };
        write!(f, "{}", name)
    }
}

/// The computation stored in a node.
///
/// Operands are shared handles; the nodes they point to stay usable on their own.
pub(crate) enum Computation {
    Constant(Value),
    Alias(LazyValue),
    Function(Function),
    Binary {
        op: BinaryOp,
        lhs: LazyValue,
        rhs: LazyValue,
        reverse: bool,
    },
    Unary(UnaryOp, LazyValue),
    Index(LazyValue, usize),
    Stack(Rc<Vec<LazyValue>>),
}

impl Computation {
    fn kind(&self) -> OriginKind {
        match self {
            Computation::Constant(_) => OriginKind::Constant,
            Computation::Alias(_) => OriginKind::Aliased,
            Computation::Function(_)
            | Computation::Binary { .. }
            | Computation::Unary(..)
            | Computation::Index(..)
            | Computation::Stack(_) => OriginKind::Derived,
        }
    }

    /// Leaves an empty constant in place and returns the previous computation.
    fn take(&mut self) -> Computation {
        std::mem::replace(self, Computation::Constant(Value::default()))
    }

    /// Consumes the computation and returns handles to the nodes it reads from.
    ///
    /// A function's captures are opaque, so it reports no operands.
    fn into_operands(self) -> Vec<LazyValue> {
        match self {
            Computation::Constant(_) | Computation::Function(_) => Vec::new(),
            Computation::Alias(node) | Computation::Unary(_, node) | Computation::Index(node, _) => {
                vec![node]
            }
            Computation::Binary { lhs, rhs, .. } => vec![lhs, rhs],
            Computation::Stack(children) => Rc::try_unwrap(children)
                .unwrap_or_else(|shared| shared.iter().map(LazyValue::share).collect()),
        }
    }
}

impl Clone for Computation {
    fn clone(&self) -> Self {
        match self {
            Computation::Constant(value) => Computation::Constant(value.clone()),
            Computation::Alias(node) => Computation::Alias(node.share()),
            Computation::Function(f) => Computation::Function(Rc::clone(f)),
            Computation::Binary {
                op,
                lhs,
                rhs,
                reverse,
            } => Computation::Binary {
                op: *op,
                lhs: lhs.share(),
                rhs: rhs.share(),
                reverse: *reverse,
            },
            Computation::Unary(op, node) => Computation::Unary(*op, node.share()),
            Computation::Index(node, index) => Computation::Index(node.share(), *index),
            Computation::Stack(children) => Computation::Stack(Rc::clone(children)),
        }
    }
}

struct Node {
    id: NodeId,
    length: Option<usize>,
    computation: RefCell<Computation>,
}

impl Drop for Node {
    // Operand chains can be far deeper than the stack, so nodes we hold the last reference to
    // are dismantled from a worklist instead of recursively.
    fn drop(&mut self) {
        let mut pending = self.computation.get_mut().take().into_operands();

        while let Some(LazyValue { node }) = pending.pop() {
            if let Ok(mut node) = Rc::try_unwrap(node) {
                pending.extend(node.computation.get_mut().take().into_operands());
            }
        }
    }
}

/// A placeholder for a numeric value that is computed only when executed.
///
/// Nodes compare and hash by identity. `LazyValue` deliberately does not implement `Clone`:
/// a copy of a placeholder has no sound meaning. Use [`LazyValue::alias`] to forward to a node
/// or [`LazyValue::detach`] to snapshot its current value.
pub struct LazyValue {
    node: Rc<Node>,
}

impl LazyValue {
    pub(crate) fn from_parts(length: Option<usize>, computation: Computation) -> Self {
        let id = NodeId::next();
        trace!(%id, kind = %computation.kind(), ?length, "Created lazy value");

        Self {
            node: Rc::new(Node {
                id,
                length,
                computation: RefCell::new(computation),
            }),
        }
    }

    /// Returns another handle to the same node.
    #[inline(always)]
    pub(crate) fn share(&self) -> LazyValue {
        Self {
            node: Rc::clone(&self.node),
        }
    }

    /// Builds a node from a value, an array, another node or a function.
    ///
    /// Another node is aliased, a function becomes an unsized derived node and anything else
    /// becomes a constant. Arrays with more than one dimension are rejected.
    pub fn new(source: impl Into<Source>) -> LazyResult<Self> {
        Self::with_length(source, None)
    }

    /// Builds a node with an explicit length.
    ///
    /// Only functions take a length; for values and nodes it is derived, so passing one fails
    /// with [`LazyError::LengthNotAllowed`].
    pub fn with_length(source: impl Into<Source>, length: Option<usize>) -> LazyResult<Self> {
        match (source.into(), length) {
            (Source::Function(f), length) => Ok(Self::from_parts(length, Computation::Function(f))),
            (source, Some(_)) => Err(LazyError::LengthNotAllowed(source.kind())),
            (Source::Lazy(node), None) => Ok(Self::alias(&node)),
            (source, None) => source.into_lazy(),
        }
    }

    pub fn constant(value: impl Into<Value>) -> Self {
        let value = value.into();
        Self::from_parts(value.length(), Computation::Constant(value))
    }

    /// Creates a new node that forwards execution to `other` and adopts its length.
    pub fn alias(other: &LazyValue) -> Self {
        Self::from_parts(other.length(), Computation::Alias(other.share()))
    }

    pub fn derive<F>(f: F, length: Option<usize>) -> Self
    where
        F: Fn() -> LazyResult<Value> + 'static,
    {
        Self::from_parts(length, Computation::Function(Rc::new(f)))
    }

    #[inline(always)]
    pub fn id(&self) -> NodeId {
        self.node.id
    }

    /// Returns the declared length, `None` for scalar or unsized nodes.
    #[inline(always)]
    pub fn length(&self) -> Option<usize> {
        self.node.length
    }

    /// Returns the declared length without executing anything.
    pub fn len(&self) -> LazyResult<usize> {
        self.node.length.ok_or(LazyError::NoLength)
    }

    pub fn is_empty(&self) -> LazyResult<bool> {
        self.len().map(|len| len == 0)
    }

    pub fn kind(&self) -> OriginKind {
        self.node.computation.borrow().kind()
    }

    #[inline(always)]
    pub fn is_constant(&self) -> bool {
        self.kind() == OriginKind::Constant
    }

    /// Runs the computation with the default [`Options`].
    ///
    /// Nothing is cached: every call recomputes the whole graph below this node. The default
    /// depth limit is lower in debug builds; see [`Options`].
    pub fn execute(&self) -> LazyResult<Value> {
        self.execute_with(&Options::default())
    }

    pub fn execute_with(&self, options: &Options) -> LazyResult<Value> {
        Evaluator::new(options.clone()).eval(self)
    }

    /// Executes the node once and wraps the result in a fresh constant node.
    pub fn detach(&self) -> LazyResult<LazyValue> {
        self.execute().map(Self::constant)
    }

    /// Prepares replacing this node's computation with `other`.
    ///
    /// Lengths are checked now and must be equal (or both absent). The node is only changed
    /// when the returned [`Updater`] is applied.
    pub fn assign(&self, other: impl Into<Source>) -> LazyResult<Updater<'_>> {
        let other = other.into();
        let (this, that) = (self.length(), other.length());

        if this != that {
            return Err(LazyError::IncompatibleLength { this, other: that });
        }

        Ok(Updater {
            target: self,
            computation: other.into_computation()?,
        })
    }

    /// Returns handles to the nodes this node currently reads from, in evaluation order.
    ///
    /// Constants and functions have none; an alias has the node it forwards to.
    pub fn operands(&self) -> Vec<LazyValue> {
        self.computation().into_operands()
    }

    pub(crate) fn computation(&self) -> Computation {
        self.node.computation.borrow().clone()
    }
}

impl PartialEq for LazyValue {
    fn eq(&self, other: &Self) -> bool {
        self.node.id == other.node.id
    }
}

impl Eq for LazyValue {}

impl Hash for LazyValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.node.id.hash(state);
    }
}

impl fmt::Display for LazyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LazyValue_{}", self.node.id)
    }
}

impl fmt::Debug for LazyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LazyValue_{}({}, length={:?})",
            self.node.id,
            self.kind(),
            self.node.length
        )
    }
}

/// A pending assignment returned by [`LazyValue::assign`].
pub struct Updater<'a> {
    target: &'a LazyValue,
    computation: Computation,
}

impl<'a> Updater<'a> {
    /// Replaces the target's computation and returns the target.
    ///
    /// Applying the same updater again installs the same computation again.
    pub fn apply(&self) -> &'a LazyValue {
        debug!(id = %self.target.id(), kind = %self.computation.kind(), "Applying assignment");
        *self.target.node.computation.borrow_mut() = self.computation.clone();
        self.target
    }
}

impl fmt::Debug for Updater<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Updater")
            .field("target", self.target)
            .field("kind", &self.computation.kind())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{ArrayD, IxDyn};
    use rstest::rstest;
    use std::{cell::Cell, collections::HashMap};

    #[rstest]
    #[case(Source::from(3.5), None, OriginKind::Constant)]
    #[case(Source::from(vec![1.0, 2.0]), Some(2), OriginKind::Constant)]
    #[case(Source::from(ArrayD::<f64>::zeros(IxDyn(&[3]))), Some(3), OriginKind::Constant)]
    #[case(Source::function(|| Ok(Value::from(1.0))), None, OriginKind::Derived)]
    fn test_new(
        #[case] source: Source,
        #[case] length: Option<usize>,
        #[case] kind: OriginKind,
    ) {
        let node = LazyValue::new(source).unwrap();
        assert_eq!(node.length(), length);
        assert_eq!(node.kind(), kind);
    }

    #[test]
    fn test_new_aliases_lazy_values() {
        let base = LazyValue::constant(vec![1.0, 2.0, 3.0]);
        let alias = LazyValue::new(&base).unwrap();

        assert_ne!(alias, base);
        assert_eq!(alias.kind(), OriginKind::Aliased);
        assert_eq!(alias.length(), Some(3));
        assert_eq!(alias.execute(), base.execute());
    }

    #[test]
    fn test_new_rejects_matrices() {
        let matrix = ArrayD::<f64>::zeros(IxDyn(&[2, 2]));
        assert_eq!(
            LazyValue::new(matrix).unwrap_err(),
            LazyError::UnsupportedShape(vec![2, 2])
        );
    }

    #[rstest]
    #[case(Source::from(1.0), "value")]
    #[case(Source::from(vec![1.0]), "value")]
    #[case(Source::from(LazyValue::constant(1.0)), "lazy value")]
    fn test_with_length_rejects_non_functions(#[case] source: Source, #[case] kind: &'static str) {
        assert_eq!(
            LazyValue::with_length(source, Some(1)).unwrap_err(),
            LazyError::LengthNotAllowed(kind)
        );
    }

    #[test]
    fn test_with_length_keeps_function_length() {
        let node = LazyValue::with_length(
            Source::function(|| Ok(Value::from(vec![1.0, 2.0]))),
            Some(2),
        )
        .unwrap();
        assert_eq!(node.len(), Ok(2));
        assert_eq!(node.execute(), Ok(Value::from(vec![1.0, 2.0])));
    }

    #[test]
    fn test_len_does_not_execute() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let node = LazyValue::derive(
            move || {
                counter.set(counter.get() + 1);
                Ok(Value::from(vec![0.0; 4]))
            },
            Some(4),
        );

        assert_eq!(node.len(), Ok(4));
        assert_eq!(node.is_empty(), Ok(false));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_execute_recomputes_every_time() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let node = LazyValue::derive(
            move || {
                counter.set(counter.get() + 1);
                Ok(Value::from(counter.get() as f64))
            },
            None,
        );

        assert_eq!(node.execute(), Ok(Value::from(1.0)));
        assert_eq!(node.execute(), Ok(Value::from(2.0)));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_identity_backs_equality_and_hash() {
        let a = LazyValue::constant(1.0);
        let b = LazyValue::constant(1.0);
        let mut bindings = HashMap::new();
        bindings.insert(a.id(), "a");
        bindings.insert(b.id(), "b");

        assert_ne!(a, b);
        assert_eq!(a, a.share());
        assert_eq!(bindings.len(), 2);
        assert_eq!(a.to_string(), format!("LazyValue_{}", a.id()));
    }

    #[test]
    fn test_assign_replaces_computation() {
        let node = LazyValue::constant(1.0);
        let id = node.id();
        let updater = node.assign(7.0).unwrap();

        assert_eq!(node.execute(), Ok(Value::from(1.0)));
        assert_eq!(updater.apply().execute(), Ok(Value::from(7.0)));
        assert_eq!(node.id(), id);
    }

    #[test]
    fn test_assign_lazy_value_aliases_it() {
        let node = LazyValue::constant(vec![1.0, 2.0]);
        let other = LazyValue::constant(vec![3.0, 4.0]);
        node.assign(&other).unwrap().apply();

        assert_eq!(node.kind(), OriginKind::Aliased);
        assert_eq!(node.execute(), Ok(Value::from(vec![3.0, 4.0])));
    }

    #[test]
    fn test_assign_function_to_unsized_node() {
        let node = LazyValue::constant(1.0);
        node.assign(Source::function(|| Ok(Value::from(9.0))))
            .unwrap()
            .apply();

        assert_eq!(node.kind(), OriginKind::Derived);
        assert_eq!(node.execute(), Ok(Value::from(9.0)));
    }

    #[rstest]
    #[case(Some(3), Source::from(vec![1.0, 2.0]), Some(2))]
    #[case(Some(3), Source::from(1.0), None)]
    #[case(Some(3), Source::function(|| Ok(Value::from(1.0))), None)]
    #[case(None, Source::from(vec![1.0]), Some(1))]
    fn test_assign_incompatible_length(
        #[case] length: Option<usize>,
        #[case] other: Source,
        #[case] other_length: Option<usize>,
    ) {
        let node = LazyValue::derive(|| Ok(Value::from(0.0)), length);

        assert_eq!(
            node.assign(other).unwrap_err(),
            LazyError::IncompatibleLength {
                this: length,
                other: other_length
            }
        );
        assert_eq!(node.execute(), Ok(Value::from(0.0)));
    }

    #[test]
    fn test_self_assignment_hits_depth_limit() {
        let node = LazyValue::constant(1.0);
        node.assign(&node).unwrap().apply();

        let options = Options { max_depth: 16 };
        assert_eq!(
            node.execute_with(&options),
            Err(LazyError::RecursionError(16))
        );
    }

    #[test]
    fn test_detach_snapshots_value() {
        let node = LazyValue::constant(2.0);
        let snapshot = node.detach().unwrap();
        node.assign(5.0).unwrap().apply();

        assert_ne!(snapshot, node);
        assert!(snapshot.is_constant());
        assert_eq!(snapshot.execute(), Ok(Value::from(2.0)));
        assert_eq!(node.execute(), Ok(Value::from(5.0)));
    }

    #[test]
    fn test_drop_long_chain() {
        let base = LazyValue::constant(vec![1.0, 2.0]);
        let mut node = base.neg();
        for _ in 0..100_000 {
            node = node.neg();
        }
        drop(node);

        assert_eq!(base.execute(), Ok(Value::from(vec![1.0, 2.0])));
    }

    #[test]
    fn test_drop_long_broadcast_chain() {
        let mut node = LazyValue::constant(vec![0.0; 3]);
        for _ in 0..20_000 {
            node = node.add(1.0).unwrap();
        }
        drop(node);
    }

    #[test]
    fn test_operands() {
        let a = LazyValue::constant(vec![1.0, 2.0]);
        let b = LazyValue::constant(vec![3.0, 4.0]);
        let sum = a.add(&b).unwrap();
        let alias = LazyValue::alias(&sum);
        let element = sum.index(1).unwrap();

        assert_eq!(sum.operands(), vec![a.share(), b.share()]);
        assert_eq!(alias.operands(), vec![sum.share()]);
        assert_eq!(element.operands(), vec![sum.share()]);
        assert_eq!(a.neg().operands(), vec![a.share()]);
        assert!(a.operands().is_empty());
        assert!(LazyValue::derive(|| Ok(Value::from(1.0)), None).operands().is_empty());
    }

    #[test]
    fn test_operands_of_broadcast() {
        let vector = LazyValue::constant(vec![1.0, 2.0, 3.0]);
        let scalar = LazyValue::constant(2.0);
        let product = vector.mul(&scalar).unwrap();

        let operands = product.operands();
        assert_eq!(operands[0], vector);
        assert_eq!(operands[1].length(), Some(3));
        assert_eq!(operands[1].operands(), vec![scalar.share(), scalar.share(), scalar.share()]);
    }
}
