use crate::constants::STACK_DEPTH;
use crate::error::Error;

/// The return-address stack.
///
/// Capacity is fixed at [`STACK_DEPTH`] entries, the source hardware's
/// subroutine nesting limit. Exceeding it is a program error, never silently
/// absorbed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stack {
    slots: [u16; STACK_DEPTH],
    depth: usize,
}

impl Stack {
    pub fn new() -> Self {
        Stack {
            slots: [0; STACK_DEPTH],
            depth: 0,
        }
    }

    /// Pushes a return address; errors when the stack is full.
    pub fn push(&mut self, address: u16) -> Result<(), Error> {
        if self.depth == STACK_DEPTH {
            return Err(Error::StackOverflow);
        }
        self.slots[self.depth] = address;
        self.depth += 1;
        Ok(())
    }

    /// Pops the most recent return address, zeroing the vacated slot;
    /// errors when the stack is empty.
    pub fn pop(&mut self) -> Result<u16, Error> {
        if self.depth == 0 {
            return Err(Error::StackUnderflow);
        }
        self.depth -= 1;
        let address = self.slots[self.depth];
        self.slots[self.depth] = 0;
        Ok(address)
    }

    /// The most recent return address without removing it;
    /// errors when the stack is empty.
    pub fn peek(&self) -> Result<u16, Error> {
        if self.depth == 0 {
            return Err(Error::StackUnderflow);
        }
        Ok(self.slots[self.depth - 1])
    }
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_then_pop_is_identity() {
        let mut stack = Stack::new();
        stack.push(0xABC).unwrap();
        assert_eq!(stack.pop(), Ok(0xABC));
    }

    #[test]
    fn test_pop_zeroes_the_vacated_slot() {
        let mut stack = Stack::new();
        stack.push(0xABC).unwrap();
        stack.pop().unwrap();
        assert_eq!(stack.slots[0], 0);
    }

    #[test]
    fn test_pop_on_empty_underflows() {
        let mut stack = Stack::new();
        assert_eq!(stack.pop(), Err(Error::StackUnderflow));
    }

    #[test]
    fn test_peek_does_not_mutate() {
        let mut stack = Stack::new();
        stack.push(0xABC).unwrap();
        assert_eq!(stack.peek(), Ok(0xABC));
        assert_eq!(stack.peek(), Ok(0xABC));
        assert_eq!(stack.depth, 1);
    }

    #[test]
    fn test_peek_on_empty_underflows() {
        let stack = Stack::new();
        assert_eq!(stack.peek(), Err(Error::StackUnderflow));
    }

    #[test]
    fn test_seventeenth_push_overflows() {
        let mut stack = Stack::new();
        for address in 0..STACK_DEPTH as u16 {
            stack.push(address).unwrap();
        }
        assert_eq!(stack.push(0xFFF), Err(Error::StackOverflow));
    }

    #[test]
    fn test_pops_in_lifo_order() {
        let mut stack = Stack::new();
        stack.push(0x111).unwrap();
        stack.push(0x222).unwrap();
        assert_eq!(stack.pop(), Ok(0x222));
        assert_eq!(stack.pop(), Ok(0x111));
    }
}
