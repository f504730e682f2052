//! Lock-free single-producer/single-consumer byte queue
//!
//! One [`RingBuffer`] sits between a UART interrupt handler and foreground
//! code in each direction. Exactly one context may write (call the `store_*`
//! methods) and exactly one may read (`read_byte`, `peek`, `discard`). With
//! that discipline the index arithmetic below needs no critical sections: the
//! writer only ever publishes `head`, the reader only ever publishes `tail`.
//!
//! One slot is always left empty so that `head == tail` means empty and
//! `head + 1 == tail` means full.

use core::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};

use crate::internal::constants::{OVERFLOW_SENTINEL, RING_BUFFER_SIZE};

/// Fixed-capacity circular byte buffer.
///
/// `N` is the slot count; at most `N - 1` bytes are buffered.
pub struct RingBuffer<const N: usize = RING_BUFFER_SIZE> {
    buffer: [AtomicU8; N],
    head: AtomicUsize,
    tail: AtomicUsize,
    overflowed: AtomicBool,
}

impl<const N: usize> RingBuffer<N> {
    /// Create an empty buffer (const, suitable for static initialization).
    pub const fn new() -> Self {
        const { assert!(N >= 2, "ring buffer needs at least two slots") };
        Self {
            buffer: [const { AtomicU8::new(0) }; N],
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            overflowed: AtomicBool::new(false),
        }
    }

    /// Number of slots, including the one that is never filled.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Reset both indices to zero.
    ///
    /// Only valid while neither the producer nor the consumer is active, i.e.
    /// with the owning interrupt masked.
    pub fn clear(&self) {
        self.head.store(0, Ordering::Relaxed);
        self.tail.store(0, Ordering::Relaxed);
        self.overflowed.store(false, Ordering::Relaxed);
    }

    /// Store one byte. Producer side.
    ///
    /// When the buffer is full, the most recently stored byte is replaced by
    /// [`OVERFLOW_SENTINEL`], `head` does not move, and `false` is returned.
    pub fn store_byte(&self, byte: u8) -> bool {
        let head = self.head.load(Ordering::Relaxed);
        let next = (head + 1) % N;
        if next != self.tail.load(Ordering::Acquire) {
            self.buffer[head].store(byte, Ordering::Relaxed);
            self.head.store(next, Ordering::Release);
            true
        } else {
            self.buffer[(head + N - 1) % N].store(OVERFLOW_SENTINEL, Ordering::Relaxed);
            if !self.overflowed.swap(true, Ordering::Relaxed) {
                #[cfg(feature = "defmt")]
                defmt::trace!("ring buffer overflow");
            }
            false
        }
    }

    /// Store as many bytes of `data` as fit. Producer side.
    ///
    /// Never blocks and never overwrites unread data. Returns the number of
    /// bytes copied.
    pub fn store_block(&self, data: &[u8]) -> usize {
        let mut head = self.head.load(Ordering::Relaxed);
        let room = Self::room(head, self.tail.load(Ordering::Acquire));
        let count = room.min(data.len());
        for &byte in &data[..count] {
            self.buffer[head].store(byte, Ordering::Relaxed);
            head = (head + 1) % N;
        }
        if count > 0 {
            self.head.store(head, Ordering::Release);
        }
        count
    }

    /// Remove and return the oldest byte. Consumer side.
    pub fn read_byte(&self) -> Option<u8> {
        let tail = self.tail.load(Ordering::Relaxed);
        if tail == self.head.load(Ordering::Acquire) {
            return None;
        }
        let byte = self.buffer[tail].load(Ordering::Relaxed);
        self.tail.store((tail + 1) % N, Ordering::Release);
        Some(byte)
    }

    /// Return the oldest byte without removing it. Consumer side.
    pub fn peek(&self) -> Option<u8> {
        let tail = self.tail.load(Ordering::Relaxed);
        if tail == self.head.load(Ordering::Acquire) {
            None
        } else {
            Some(self.buffer[tail].load(Ordering::Relaxed))
        }
    }

    /// Drop everything currently buffered. Consumer side.
    pub fn discard(&self) {
        let head = self.head.load(Ordering::Acquire);
        self.tail.store(head, Ordering::Release);
    }

    /// Number of buffered bytes.
    pub fn available(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        (head + N - tail) % N
    }

    /// Number of bytes that can be stored before the buffer is full.
    pub fn room_left(&self) -> usize {
        Self::room(
            self.head.load(Ordering::Acquire),
            self.tail.load(Ordering::Acquire),
        )
    }

    /// True when nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.head.load(Ordering::Acquire) == self.tail.load(Ordering::Acquire)
    }

    /// True when the next `store_byte` would overflow.
    pub fn is_full(&self) -> bool {
        self.room_left() == 0
    }

    /// True if an overflow has happened since the last [`clear`](Self::clear).
    pub fn has_overflowed(&self) -> bool {
        self.overflowed.load(Ordering::Relaxed)
    }

    #[inline]
    fn room(head: usize, tail: usize) -> usize {
        (tail + N - head - 1) % N
    }
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
