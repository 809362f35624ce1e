use crate::{
    LazyError, LazyResult, LazyValue, Value,
    lazy::Computation,
};
use tracing::trace;

/// Configuration options for executing lazy values.
///
/// The default `max_depth` is 512 in debug builds and 4096 in release builds, so a graph nested
/// deeper than 512 nodes executes in release but fails with [`LazyError::RecursionError`] in
/// debug. Pass explicit options to [`LazyValue::execute_with`] when the limit has to be the same
/// in both.
#[derive(Debug, Clone)]
pub struct Options {
    /// Maximum nesting of node executions, guarding against nodes that were assigned an
    /// expression of themselves.
    pub max_depth: u32,
}

#[cfg(debug_assertions)]
impl Default for Options {
    fn default() -> Self {
        Self {
            max_depth: 512, // Debug frames are larger, keep the test thread stack safe.
        }
    }
}

#[cfg(not(debug_assertions))]
impl Default for Options {
    fn default() -> Self {
        Self { max_depth: 4096 }
    }
}

/// Walks a lazy graph depth-first, operands before the operation that consumes them.
pub(crate) struct Evaluator {
    depth: u32,
    options: Options,
}

impl Evaluator {
    pub(crate) fn new(options: Options) -> Self {
        Self { depth: 0, options }
    }

    pub(crate) fn eval(&mut self, node: &LazyValue) -> LazyResult<Value> {
        self.enter_scope()?;
        let result = self.eval_computation(node);
        self.exit_scope();
        result
    }

    fn eval_computation(&mut self, node: &LazyValue) -> LazyResult<Value> {
        trace!(id = %node.id(), depth = self.depth, "Executing lazy value");

        // The computation is cloned out so that a function may apply an updater on a node
        // that is still being executed.
        match node.computation() {
            Computation::Constant(value) => Ok(value),
            Computation::Alias(other) => self.eval(&other),
            Computation::Function(f) => f(),
            Computation::Binary {
                op,
                lhs,
                rhs,
                reverse,
            } => {
                let a = self.eval(&lhs)?;
                let b = self.eval(&rhs)?;

                if reverse {
                    b.binary(op, &a)
                } else {
                    a.binary(op, &b)
                }
            }
            Computation::Unary(op, operand) => Ok(self.eval(&operand)?.unary(op)),
            Computation::Index(operand, index) => {
                let value = self.eval(&operand)?;
                value
                    .get(index)
                    .map(Value::Scalar)
                    .ok_or_else(|| match value.length() {
                        Some(length) => LazyError::IndexOutOfRange { index, length },
                        None => LazyError::Unsupported("indexing a scalar value".to_string()),
                    })
            }
            Computation::Stack(children) => {
                let values = children
                    .iter()
                    .map(|child| self.eval(child))
                    .collect::<LazyResult<Vec<_>>>()?;
                Value::stack(values)
            }
        }
    }

    fn enter_scope(&mut self) -> LazyResult<()> {
        if self.depth >= self.options.max_depth {
            return Err(LazyError::RecursionError(self.options.max_depth));
        }
        self.depth += 1;
        Ok(())
    }

    fn exit_scope(&mut self) {
        if self.depth > 0 {
            self.depth -= 1;
        }
    }
}
