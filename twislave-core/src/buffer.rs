//! Transfer buffer
//!
//! Fixed-capacity byte store shared between caller context (which arms a
//! transfer) and the interrupt handler (which moves the cursor).
//! `index <= size <= N` holds after every operation.

use crate::error::Error;

/// Byte buffer with a fill size and a cursor
#[derive(Debug, Clone)]
pub struct TransferBuffer<const N: usize> {
    data: [u8; N],
    size: usize,
    index: usize,
}

impl<const N: usize> Default for TransferBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> TransferBuffer<N> {
    /// Empty, zeroed buffer
    pub const fn new() -> Self {
        Self {
            data: [0; N],
            size: 0,
            index: 0,
        }
    }

    /// Capacity in bytes
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Bytes valid for the current transfer
    pub fn size(&self) -> usize {
        self.size
    }

    /// Cursor position
    pub fn index(&self) -> usize {
        self.index
    }

    /// Bytes left before the cursor reaches `size`
    pub fn remaining(&self) -> usize {
        self.size - self.index
    }

    /// Cursor has reached `size`
    pub fn is_complete(&self) -> bool {
        self.index == self.size
    }

    /// Zero the contents and forget the current transfer
    pub fn clear(&mut self) {
        self.data = [0; N];
        self.size = 0;
        self.index = 0;
    }

    /// Copy bytes to transmit
    pub fn load(&mut self, src: &[u8]) -> Result<(), Error> {
        if src.len() > N {
            return Err(Error::TooLarge);
        }
        self.data[..src.len()].copy_from_slice(src);
        self.size = src.len();
        self.index = 0;
        Ok(())
    }

    /// Prepare to receive `size` bytes
    pub fn expect(&mut self, size: usize) -> Result<(), Error> {
        if size > N {
            return Err(Error::TooLarge);
        }
        self.size = size;
        self.index = 0;
        Ok(())
    }

    /// Move the cursor back to the start of the transfer
    pub fn rewind(&mut self) {
        self.index = 0;
    }

    /// Store a received byte; `false` when the transfer is already full
    pub fn push(&mut self, byte: u8) -> bool {
        if self.index < self.size {
            self.data[self.index] = byte;
            self.index += 1;
            true
        } else {
            false
        }
    }

    /// Take the next byte to transmit
    pub fn pop(&mut self) -> Option<u8> {
        if self.index < self.size {
            let byte = self.data[self.index];
            self.index += 1;
            Some(byte)
        } else {
            None
        }
    }

    /// Bytes handled so far in this transfer
    pub fn filled(&self) -> &[u8] {
        &self.data[..self.index]
    }
}
