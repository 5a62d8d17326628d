//! The subroutine call stack. Sixteen return addresses, last in first out.
//! Overflow and underflow are reported instead of wrapping.

/// Number of nested calls the stack can hold.
pub const STACK_DEPTH: usize = 16;

/// A fixed-depth stack of return addresses.
#[derive(Default, Clone, Copy)]
pub struct Stack {
    frames: [u16; STACK_DEPTH],
    sp: usize,
}

impl Stack {
    /// Creates an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes `address`, or returns `None` if every frame is already in use.
    #[must_use]
    pub fn push(&mut self, address: u16) -> Option<()> {
        *self.frames.get_mut(self.sp)? = address;
        self.sp += 1;
        Some(())
    }

    /// Pops the most recently pushed address, or `None` if the stack is empty.
    pub fn pop(&mut self) -> Option<u16> {
        self.sp = self.sp.checked_sub(1)?;
        Some(self.frames[self.sp])
    }

    /// The number of frames currently in use.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sp
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sp == 0
    }

    /// The live frames, oldest first.
    #[must_use]
    pub fn frames(&self) -> &[u16] {
        &self.frames[..self.sp]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_is_lifo() {
        let mut stack = Stack::new();
        assert_eq!(stack.push(0x200), Some(()));
        assert_eq!(stack.push(0x300), Some(()));
        assert_eq!(stack.frames(), &[0x200, 0x300]);
        assert_eq!(stack.pop(), Some(0x300));
        assert_eq!(stack.pop(), Some(0x200));
        assert!(stack.is_empty());
    }

    #[test]
    fn seventeenth_push_is_refused() {
        let mut stack = Stack::new();
        for i in 0..STACK_DEPTH as u16 {
            assert_eq!(stack.push(i * 2), Some(()));
        }
        assert_eq!(stack.push(0xABC), None);
        assert_eq!(stack.len(), STACK_DEPTH);
        assert_eq!(stack.pop(), Some(30));
    }

    #[test]
    fn pop_on_empty_is_none() {
        let mut stack = Stack::new();
        assert_eq!(stack.pop(), None);
        assert_eq!(stack.len(), 0);
    }
}
