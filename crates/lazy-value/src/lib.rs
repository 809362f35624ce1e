//! `lazy-value` defers scalar and vector arithmetic until it is explicitly executed.
//!
//! A [`LazyValue`] wraps a constant, another node, or a computation, together with an optional
//! length. Arithmetic on lazy values builds new nodes without computing anything; lengths are
//! checked at build time and scalar or length-1 operands are broadcast through a
//! [`StackedLazyValue`].
//!
//! ## Examples
//!
//! ```rust
//! use lazy_value::{LazyValue, Value};
//!
//! let prices = LazyValue::constant(vec![10.0, 20.0, 30.0]);
//! let rate = LazyValue::constant(0.5);
//! let discounted = prices.sub(&prices.mul(&rate)?)?;
//!
//! assert_eq!(discounted.len()?, 3);
//! assert_eq!(discounted.execute()?, Value::from(vec![5.0, 10.0, 15.0]));
//!
//! // Rebind a placeholder; every node built on it sees the new value.
//! rate.assign(0.25)?.apply();
//! assert_eq!(discounted.execute()?, Value::from(vec![7.5, 15.0, 22.5]));
//! # Ok::<(), lazy_value::LazyError>(())
//! ```
//!
//! Nodes have identity, not value semantics, so they cannot be cloned:
//!
//! ```compile_fail
//! let a = lazy_value::LazyValue::constant(1.0);
//! let b = a.clone();
//! ```
mod error;
mod eval;
mod id;
mod lazy;
mod number;
mod ops;
mod source;
mod stacked;
mod value;

pub use error::{LazyError, LazyResult};
pub use eval::Options;
pub use id::NodeId;
pub use lazy::{Function, LazyValue, OriginKind, Updater};
pub use number::{INFINITE, Number};
pub use source::Source;
pub use stacked::StackedLazyValue;
pub use value::Value;
