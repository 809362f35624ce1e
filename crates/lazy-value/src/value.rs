//! Concrete values produced by executing a lazy value.
//!
//! A [`Value`] is either a scalar [`Number`] or a 1-D `ndarray` vector. Arrays of any higher
//! dimensionality are rejected when they are converted into a `Value`.
use crate::{
    LazyError, LazyResult,
    number::Number,
    ops::{BinaryOp, UnaryOp},
};
use itertools::Itertools;
use ndarray::{Array1, ArrayD, Ix1, Zip};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Number),
    Vector(Array1<f64>),
}

impl Value {
    /// Converts an n-dimensional array into a value.
    ///
    /// 0-D arrays become scalars and 1-D arrays become vectors. Anything else fails with
    /// [`LazyError::UnsupportedShape`].
    pub fn from_array(array: ArrayD<f64>) -> LazyResult<Self> {
        match array.ndim() {
            0 => array
                .iter()
                .next()
                .map(|v| Value::Scalar(Number::new(*v)))
                .ok_or_else(|| LazyError::UnsupportedShape(Vec::new())),
            1 => {
                let shape = array.shape().to_vec();
                array
                    .into_dimensionality::<Ix1>()
                    .map(Value::Vector)
                    .map_err(|_| LazyError::UnsupportedShape(shape))
            }
            _ => Err(LazyError::UnsupportedShape(array.shape().to_vec())),
        }
    }

    /// Returns the number of elements, or `None` for a scalar.
    #[inline(always)]
    pub fn length(&self) -> Option<usize> {
        match self {
            Value::Scalar(_) => None,
            Value::Vector(v) => Some(v.len()),
        }
    }

    #[inline(always)]
    pub fn is_scalar(&self) -> bool {
        matches!(self, Value::Scalar(_))
    }

    /// Returns the scalar, if this value is one.
    pub fn as_scalar(&self) -> Option<Number> {
        match self {
            Value::Scalar(n) => Some(*n),
            Value::Vector(_) => None,
        }
    }

    /// Returns the element at `index` of a vector.
    pub fn get(&self, index: usize) -> Option<Number> {
        match self {
            Value::Scalar(_) => None,
            Value::Vector(v) => v.get(index).copied().map(Number::new),
        }
    }

    /// Returns the elements as a `Vec`; a scalar yields a single element.
    pub fn to_vec(&self) -> Vec<f64> {
        match self {
            Value::Scalar(n) => vec![n.value()],
            Value::Vector(v) => v.to_vec(),
        }
    }

    /// Returns the only element of a scalar or a one-element vector.
    pub(crate) fn single(&self) -> Option<f64> {
        match self {
            Value::Scalar(n) => Some(n.value()),
            Value::Vector(v) if v.len() == 1 => v.iter().next().copied(),
            Value::Vector(_) => None,
        }
    }

    pub(crate) fn binary(&self, op: BinaryOp, other: &Value) -> LazyResult<Value> {
        match (self, other) {
            (Value::Scalar(a), Value::Scalar(b)) => Ok(Value::Scalar(op.apply_number(*a, *b))),
            (Value::Scalar(a), Value::Vector(b)) => {
                let a = a.value();
                Ok(Value::Vector(b.mapv(|y| op.apply(a, y))))
            }
            (Value::Vector(a), Value::Scalar(b)) => {
                let b = b.value();
                Ok(Value::Vector(a.mapv(|x| op.apply(x, b))))
            }
            (Value::Vector(a), Value::Vector(b)) if a.len() == b.len() => Ok(Value::Vector(
                Zip::from(a).and(b).map_collect(|&x, &y| op.apply(x, y)),
            )),
            (Value::Vector(a), Value::Vector(b)) if a.len() == 1 => {
                let x = a[0];
                Ok(Value::Vector(b.mapv(|y| op.apply(x, y))))
            }
            (Value::Vector(a), Value::Vector(b)) if b.len() == 1 => {
                let y = b[0];
                Ok(Value::Vector(a.mapv(|x| op.apply(x, y))))
            }
            (Value::Vector(a), Value::Vector(b)) => Err(LazyError::IncompatibleLength {
                this: Some(a.len()),
                other: Some(b.len()),
            }),
        }
    }

    pub(crate) fn unary(&self, op: UnaryOp) -> Value {
        match self {
            Value::Scalar(n) => Value::Scalar(op.apply_number(*n)),
            Value::Vector(v) => Value::Vector(v.mapv(|x| op.apply(x))),
        }
    }

    /// Stacks scalars (or one-element vectors) into a vector, preserving order.
    pub(crate) fn stack(values: Vec<Value>) -> LazyResult<Value> {
        let count = values.len();
        values
            .iter()
            .map(|value| {
                value.single().ok_or_else(|| {
                    LazyError::UnsupportedShape(vec![count, value.length().unwrap_or_default()])
                })
            })
            .collect::<LazyResult<Vec<_>>>()
            .map(|elements| Value::Vector(Array1::from(elements)))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(n) => write!(f, "{}", n),
            Value::Vector(v) => write!(f, "[{}]", v.iter().map(|x| Number::new(*x)).join(", ")),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Scalar(Number::default())
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Scalar(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Scalar(Number::new(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Scalar(Number::from(n))
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Scalar(Number::from(n))
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Scalar(Number::from(n))
    }
}

impl From<Array1<f64>> for Value {
    fn from(v: Array1<f64>) -> Self {
        Value::Vector(v)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::Vector(Array1::from(v))
    }
}

impl From<&[f64]> for Value {
    fn from(v: &[f64]) -> Self {
        Value::Vector(Array1::from(v.to_vec()))
    }
}

impl<const N: usize> From<[f64; N]> for Value {
    fn from(v: [f64; N]) -> Self {
        Value::Vector(Array1::from(v.to_vec()))
    }
}

impl TryFrom<ArrayD<f64>> for Value {
    type Error = LazyError;

    fn try_from(array: ArrayD<f64>) -> Result<Self, Self::Error> {
        Value::from_array(array)
    }
}
