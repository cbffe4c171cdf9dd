use crate::virtual_machine::errors::Fault;

/// LIFO value stack, empty at start.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Stack(Vec<i64>);

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) fn push(&mut self, value: i64) {
        self.0.push(value);
    }

    /// Removes and returns the top value.
    ///
    /// Returns [`Fault::EmptyStack`] if there is nothing to pop.
    pub(super) fn pop(&mut self) -> Result<i64, Fault> {
        self.0.pop().ok_or(Fault::EmptyStack)
    }

    pub fn peek(&self) -> Option<i64> {
        self.0.last().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Values from bottom to top.
    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifo_order() {
        let mut stack = Stack::new();
        stack.push(1);
        stack.push(2);
        assert_eq!(stack.peek(), Some(2));
        assert_eq!(stack.pop(), Ok(2));
        assert_eq!(stack.pop(), Ok(1));
        assert!(stack.is_empty());
    }

    #[test]
    fn pop_empty() {
        let mut stack = Stack::new();
        assert_eq!(stack.pop(), Err(Fault::EmptyStack));
        assert_eq!(stack.len(), 0);
    }
}
