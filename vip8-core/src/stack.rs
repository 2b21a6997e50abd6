use crate::error::StackError;

pub const STACK_DEPTH: usize = 16;

/// Return-address stack. `stack_pointer` is the next free slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stack {
    slots: [u16; STACK_DEPTH],
    stack_pointer: usize,
}

impl Stack {
    pub fn push(&mut self, return_address: u16) -> Result<(), StackError> {
        let slot = self
            .slots
            .get_mut(self.stack_pointer)
            .ok_or(StackError::Overflow {
                depth: self.stack_pointer,
            })?;
        *slot = return_address;
        self.stack_pointer += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Result<u16, StackError> {
        self.stack_pointer = self
            .stack_pointer
            .checked_sub(1)
            .ok_or(StackError::Underflow)?;
        Ok(self.slots[self.stack_pointer])
    }

    pub fn depth(&self) -> usize {
        self.stack_pointer
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
