//! Producer/Consumer handle untuk [`RingBuffer`].
//!
//! Handle memindahkan precondition SPSC ke type system. Masing-masing
//! `Send` tapi tidak `Sync` dan tidak `Clone`, sehingga hanya satu thread
//! yang bisa `push` dan hanya satu thread yang bisa `pop`.

use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;

use super::ring_buffer::RingBuffer;
use crate::sync::Arc;

/// Marker untuk opt-out dari `Sync` tanpa kehilangan `Send`.
type PhantomUnsync = PhantomData<Cell<&'static ()>>;

/// Membuat ring buffer baru dan langsung memecahnya menjadi
/// `(Producer, Consumer)`.
///
/// ```
/// let (mut tx, mut rx) = hermes_spsc::channel::<u64, 4>();
///
/// tx.push(1).unwrap();
/// tx.push(2).unwrap();
/// assert_eq!(rx.pop(), Some(1));
/// assert_eq!(rx.pop(), Some(2));
/// assert_eq!(rx.pop(), None);
/// ```
pub fn channel<T, const CAP: usize>() -> (Producer<T, CAP>, Consumer<T, CAP>) {
    RingBuffer::new().split()
}

impl<T, const CAP: usize> RingBuffer<T, CAP> {
    /// Memindahkan buffer ke belakang `Arc` dan mengembalikan kedua ujungnya.
    pub fn split(self) -> (Producer<T, CAP>, Consumer<T, CAP>) {
        let ring = Arc::new(self);
        (
            Producer {
                ring: Arc::clone(&ring),
                _unsync: PhantomData,
            },
            Consumer {
                ring,
                _unsync: PhantomData,
            },
        )
    }
}

/// Write end dari ring buffer. Hanya boleh ada satu per buffer.
pub struct Producer<T, const CAP: usize> {
    ring: Arc<RingBuffer<T, CAP>>,
    _unsync: PhantomUnsync,
}

/// Read end dari ring buffer. Hanya boleh ada satu per buffer.
pub struct Consumer<T, const CAP: usize> {
    ring: Arc<RingBuffer<T, CAP>>,
    _unsync: PhantomUnsync,
}

impl<T, const CAP: usize> Producer<T, CAP> {
    /// Push tanpa blocking. `Err(item)` berarti buffer penuh.
    #[inline]
    pub fn push(&mut self, item: T) -> Result<(), T> {
        // SAFETY: Producer tidak Clone dan tidak Sync; `&mut self` menjamin
        // satu pemanggil.
        unsafe { self.ring.push(item) }
    }

    /// Advisory, lihat [`RingBuffer::is_full`].
    #[inline]
    pub fn is_full(&self) -> bool {
        self.ring.is_full()
    }

    /// Advisory, lihat [`RingBuffer::is_empty`].
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Advisory, lihat [`RingBuffer::len`].
    #[inline]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    #[inline(always)]
    pub const fn capacity(&self) -> usize {
        CAP
    }
}

impl<T, const CAP: usize> Consumer<T, CAP> {
    /// Pop tanpa blocking. `None` berarti buffer kosong.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        // SAFETY: Consumer tidak Clone dan tidak Sync; `&mut self` menjamin
        // satu pemanggil.
        unsafe { self.ring.pop() }
    }

    /// Iterator yang terus `pop` sampai buffer terbaca kosong.
    pub fn drain(&mut self) -> Drain<'_, T, CAP> {
        Drain { consumer: self }
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.ring.is_full()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    #[inline(always)]
    pub const fn capacity(&self) -> usize {
        CAP
    }
}

/// Iterator dari [`Consumer::drain`].
pub struct Drain<'a, T, const CAP: usize> {
    consumer: &'a mut Consumer<T, CAP>,
}

impl<T, const CAP: usize> Iterator for Drain<'_, T, CAP> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        self.consumer.pop()
    }
}

impl<T, const CAP: usize> fmt::Debug for Producer<T, CAP> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer").field("ring", &*self.ring).finish()
    }
}

impl<T, const CAP: usize> fmt::Debug for Consumer<T, CAP> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer").field("ring", &*self.ring).finish()
    }
}
