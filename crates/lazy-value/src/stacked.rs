use crate::{LazyResult, LazyValue, lazy::Computation, source::Source};
use std::{ops::Deref, rc::Rc};

/// A lazy value that executes N children in order and stacks their results into a length-N
/// vector.
///
/// Each child must produce a scalar or a one-element vector. This is how scalar and length-1
/// operands are broadcast to a longer operand.
#[derive(Debug)]
pub struct StackedLazyValue {
    node: LazyValue,
    children: Rc<Vec<LazyValue>>,
}

impl StackedLazyValue {
    /// Stacks the given entries. Raw values are wrapped in constant nodes; nodes are shared.
    pub fn new<I, S>(entries: I) -> LazyResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<Source>,
    {
        let children = entries
            .into_iter()
            .map(|entry| entry.into().into_lazy())
            .collect::<LazyResult<Vec<_>>>()?;

        Ok(Self::from_children(children))
    }

    /// Stacks `times` references to the same node.
    ///
    /// The node is executed once per reference.
    pub fn repeat(value: &LazyValue, times: usize) -> Self {
        Self::from_children(std::iter::repeat_with(|| value.share()).take(times).collect())
    }

    fn from_children(children: Vec<LazyValue>) -> Self {
        let children = Rc::new(children);
        let node = LazyValue::from_parts(
            Some(children.len()),
            Computation::Stack(Rc::clone(&children)),
        );

        Self { node, children }
    }

    pub fn children(&self) -> &[LazyValue] {
        &self.children
    }

    pub fn into_lazy(self) -> LazyValue {
        self.node
    }
}

impl Deref for StackedLazyValue {
    type Target = LazyValue;

    fn deref(&self) -> &Self::Target {
        &self.node
    }
}

impl From<StackedLazyValue> for Source {
    fn from(stacked: StackedLazyValue) -> Self {
        Source::Lazy(stacked.node)
    }
}

impl From<&StackedLazyValue> for Source {
    fn from(stacked: &StackedLazyValue) -> Self {
        Source::Lazy(stacked.node.share())
    }
}
