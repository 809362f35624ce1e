//! Arithmetic and indexing on lazy values.
//!
//! Every operator returns a new derived node and computes nothing. Binary operators share a
//! single broadcasting helper; the reflected forms (`radd`, `rsub`, ...) swap the operand order
//! when the node is executed, not when it is built.
use crate::{
    LazyError, LazyResult, LazyValue, StackedLazyValue,
    lazy::Computation,
    number::Number,
    source::Source,
};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    #[inline(always)]
    pub(crate) fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
        }
    }

    #[inline(always)]
    pub(crate) fn apply_number(self, a: Number, b: Number) -> Number {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum UnaryOp {
    Neg,
    Pow(Number),
}

impl UnaryOp {
    #[inline(always)]
    pub(crate) fn apply(self, x: f64) -> f64 {
        match self {
            UnaryOp::Neg => -x,
            UnaryOp::Pow(exponent) => x.powf(exponent.value()),
        }
    }

    #[inline(always)]
    pub(crate) fn apply_number(self, x: Number) -> Number {
        match self {
            UnaryOp::Neg => -x,
            UnaryOp::Pow(exponent) => x.pow(exponent),
        }
    }
}

impl LazyValue {
    /// Builds `self OP other`, or `other OP self` when `reverse` is set.
    ///
    /// An unsized or length-1 side is stacked up to the other side's length. Two different
    /// lengths where neither is 1 fail with [`LazyError::IncompatibleLength`].
    fn binary(&self, op: BinaryOp, other: Source, reverse: bool) -> LazyResult<LazyValue> {
        let mut this = self.share();
        let mut other = other.into_lazy()?;

        match (this.length(), other.length()) {
            (Some(la), None) => {
                debug!(id = %other.id(), times = la, "Broadcasting unsized operand");
                other = StackedLazyValue::repeat(&other, la).into_lazy();
            }
            (None, None) => {}
            (la, Some(lb)) if la == Some(lb) => {}
            (None | Some(1), Some(lb)) => {
                debug!(id = %this.id(), times = lb, "Broadcasting operand");
                this = StackedLazyValue::repeat(&this, lb).into_lazy();
            }
            (Some(la), Some(1)) => {
                debug!(id = %other.id(), times = la, "Broadcasting operand");
                other = StackedLazyValue::repeat(&other, la).into_lazy();
            }
            (Some(la), Some(lb)) => {
                return Err(LazyError::IncompatibleLength {
                    this: Some(la),
                    other: Some(lb),
                });
            }
        }

        Ok(LazyValue::from_parts(
            this.length(),
            Computation::Binary {
                op,
                lhs: this,
                rhs: other,
                reverse,
            },
        ))
    }

    /// Returns a node computing `self + other`.
    pub fn add(&self, other: impl Into<Source>) -> LazyResult<LazyValue> {
        self.binary(BinaryOp::Add, other.into(), false)
    }

    /// Returns a node computing `other + self`.
    pub fn radd(&self, other: impl Into<Source>) -> LazyResult<LazyValue> {
        self.binary(BinaryOp::Add, other.into(), true)
    }

    pub fn sub(&self, other: impl Into<Source>) -> LazyResult<LazyValue> {
        self.binary(BinaryOp::Sub, other.into(), false)
    }

    /// Returns a node computing `other - self`.
    pub fn rsub(&self, other: impl Into<Source>) -> LazyResult<LazyValue> {
        self.binary(BinaryOp::Sub, other.into(), true)
    }

    pub fn mul(&self, other: impl Into<Source>) -> LazyResult<LazyValue> {
        self.binary(BinaryOp::Mul, other.into(), false)
    }

    pub fn rmul(&self, other: impl Into<Source>) -> LazyResult<LazyValue> {
        self.binary(BinaryOp::Mul, other.into(), true)
    }

    pub fn div(&self, other: impl Into<Source>) -> LazyResult<LazyValue> {
        self.binary(BinaryOp::Div, other.into(), false)
    }

    /// Returns a node computing `other / self`.
    pub fn rdiv(&self, other: impl Into<Source>) -> LazyResult<LazyValue> {
        self.binary(BinaryOp::Div, other.into(), true)
    }

    pub fn neg(&self) -> LazyValue {
        LazyValue::from_parts(self.length(), Computation::Unary(UnaryOp::Neg, self.share()))
    }

    /// Returns a node computing `self ** exponent` element-wise.
    pub fn pow(&self, exponent: impl Into<Number>) -> LazyValue {
        LazyValue::from_parts(
            self.length(),
            Computation::Unary(UnaryOp::Pow(exponent.into()), self.share()),
        )
    }

    /// Same as [`LazyValue::pow`]; a modular power is not supported.
    pub fn pow_mod(
        &self,
        exponent: impl Into<Number>,
        modulo: Option<Number>,
    ) -> LazyResult<LazyValue> {
        match modulo {
            Some(modulo) => Err(LazyError::Unsupported(format!(
                "pow() with modulo {}",
                modulo
            ))),
            None => Ok(self.pow(exponent)),
        }
    }

    /// Returns a length-1 node computing the element at `index`.
    ///
    /// Only non-negative integers are accepted, and the index is checked against the declared
    /// length up front.
    pub fn index(&self, index: impl Into<Number>) -> LazyResult<LazyValue> {
        let index = index.into();
        let Some(position) = index.to_index() else {
            return Err(LazyError::Unsupported(format!(
                "index {} is not a non-negative integer",
                index
            )));
        };

        let length = self.len()?;
        if position >= length {
            return Err(LazyError::IndexOutOfRange {
                index: position,
                length,
            });
        }

        Ok(LazyValue::from_parts(
            Some(1),
            Computation::Index(self.share(), position),
        ))
    }
}

macro_rules! impl_binary_operator {
    ($trait:ident, $method:ident, $reflected:ident) => {
        impl std::ops::$trait<&LazyValue> for &LazyValue {
            type Output = LazyResult<LazyValue>;

            fn $method(self, rhs: &LazyValue) -> Self::Output {
                LazyValue::$method(self, rhs)
            }
        }

        impl std::ops::$trait<f64> for &LazyValue {
            type Output = LazyResult<LazyValue>;

            fn $method(self, rhs: f64) -> Self::Output {
                LazyValue::$method(self, rhs)
            }
        }

        impl std::ops::$trait<&LazyValue> for f64 {
            type Output = LazyResult<LazyValue>;

            fn $method(self, rhs: &LazyValue) -> Self::Output {
                rhs.$reflected(self)
            }
        }
    };
}

impl_binary_operator!(Add, add, radd);
impl_binary_operator!(Sub, sub, rsub);
impl_binary_operator!(Mul, mul, rmul);
impl_binary_operator!(Div, div, rdiv);

impl std::ops::Neg for &LazyValue {
    type Output = LazyValue;

    fn neg(self) -> Self::Output {
        LazyValue::neg(self)
    }
}
