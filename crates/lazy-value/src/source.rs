use crate::{
    LazyResult, LazyValue, Value,
    lazy::{Computation, Function},
    number::Number,
};
use ndarray::{Array1, ArrayD};
use std::rc::Rc;

/// Anything a [`LazyValue`] can be built from.
///
/// The variant is decided once, when the source is converted, so construction and assignment
/// only ever switch on the tag.
pub enum Source {
    /// A concrete scalar or vector.
    Value(Value),
    /// An n-dimensional array, checked for dimensionality on use.
    Array(ArrayD<f64>),
    /// An existing node, shared rather than copied.
    Lazy(LazyValue),
    /// A zero-argument computation.
    Function(Function),
}

impl Source {
    /// Wraps a zero-argument computation.
    pub fn function<F>(f: F) -> Self
    where
        F: Fn() -> LazyResult<Value> + 'static,
    {
        Source::Function(Rc::new(f))
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Source::Value(_) | Source::Array(_) => "value",
            Source::Lazy(_) => "lazy value",
            Source::Function(_) => "function",
        }
    }

    /// Declared length of the source, without executing anything.
    pub(crate) fn length(&self) -> Option<usize> {
        match self {
            Source::Value(value) => value.length(),
            Source::Array(array) => (array.ndim() > 0).then(|| array.len_of(ndarray::Axis(0))),
            Source::Lazy(node) => node.length(),
            Source::Function(_) => None,
        }
    }

    /// Turns the source into the computation a node will run.
    pub(crate) fn into_computation(self) -> LazyResult<Computation> {
        Ok(match self {
            Source::Value(value) => Computation::Constant(value),
            Source::Array(array) => Computation::Constant(Value::from_array(array)?),
            Source::Lazy(node) => Computation::Alias(node),
            Source::Function(f) => Computation::Function(f),
        })
    }

    /// Turns the source into a node usable as an operand.
    ///
    /// An existing node is used as-is, so the operand keeps its identity.
    pub(crate) fn into_lazy(self) -> LazyResult<LazyValue> {
        match self {
            Source::Value(value) => Ok(LazyValue::constant(value)),
            Source::Array(array) => Ok(LazyValue::constant(Value::from_array(array)?)),
            Source::Lazy(node) => Ok(node),
            Source::Function(f) => Ok(LazyValue::from_parts(None, Computation::Function(f))),
        }
    }
}

impl From<Value> for Source {
    fn from(value: Value) -> Self {
        Source::Value(value)
    }
}

impl From<Number> for Source {
    fn from(n: Number) -> Self {
        Source::Value(Value::from(n))
    }
}

impl From<f64> for Source {
    fn from(n: f64) -> Self {
        Source::Value(Value::from(n))
    }
}

impl From<i64> for Source {
    fn from(n: i64) -> Self {
        Source::Value(Value::from(n))
    }
}

impl From<i32> for Source {
    fn from(n: i32) -> Self {
        Source::Value(Value::from(n))
    }
}

impl From<Vec<f64>> for Source {
    fn from(v: Vec<f64>) -> Self {
        Source::Value(Value::from(v))
    }
}

impl From<&[f64]> for Source {
    fn from(v: &[f64]) -> Self {
        Source::Value(Value::from(v))
    }
}

impl<const N: usize> From<[f64; N]> for Source {
    fn from(v: [f64; N]) -> Self {
        Source::Value(Value::from(v))
    }
}

impl From<Array1<f64>> for Source {
    fn from(v: Array1<f64>) -> Self {
        Source::Value(Value::from(v))
    }
}

impl From<ArrayD<f64>> for Source {
    fn from(array: ArrayD<f64>) -> Self {
        Source::Array(array)
    }
}

impl From<LazyValue> for Source {
    fn from(node: LazyValue) -> Self {
        Source::Lazy(node)
    }
}

impl From<&LazyValue> for Source {
    fn from(node: &LazyValue) -> Self {
        Source::Lazy(node.share())
    }
}
