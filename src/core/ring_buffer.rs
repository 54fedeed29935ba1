//! Lock-Free Single-Producer Single-Consumer (SPSC) Ring Buffer
//!
//! Implementasi Lamport queue dengan `CAP + 1` slot. Satu slot cadangan
//! membedakan kosong (`head == tail`) dari penuh (`next(tail) == head`)
//! tanpa counter bersama.
//!
//! Masing-masing sisi menyimpan salinan lokal (shadow) dari index milik
//! sisi lawan. Load Acquire ke index lawan hanya terjadi ketika salinan
//! lokal menunjukkan kondisi batas (penuh/kosong).
//!
//! ```text
//! producer: tulis slot[tail]    -> store tail (Release)
//! consumer: load tail (Acquire) -> baca slot[head] -> store head (Release)
//! producer: load head (Acquire) -> slot lama boleh ditimpa
//! ```
//!
//! Tidak ada Mutex, tidak ada alokasi setelah inisialisasi.

use std::cell::{Cell, UnsafeCell};
use std::fmt;
use std::mem::MaybeUninit;

use crate::sync::{AtomicUsize, Ordering};

/// Slot dalam ring buffer.
///
/// Slot sengaja tidak di-align per cache line: buffer ada di alokasi heap
/// terpisah dari index, jadi tidak berbagi line dengan `head`/`tail`.
struct Slot<T> {
    data: UnsafeCell<MaybeUninit<T>>,
}

impl<T> Slot<T> {
    const fn new() -> Self {
        Self {
            data: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }
}

/// Padding untuk cache line isolation (64 bytes pada x86-64)
#[repr(C, align(64))]
struct CacheLinePadded<T> {
    value: T,
}

impl<T> CacheLinePadded<T> {
    const fn new(value: T) -> Self {
        Self { value }
    }
}

/// State milik consumer.
struct ConsumerSide {
    /// Slot berikutnya yang akan dibaca. Hanya consumer yang menulis.
    head: AtomicUsize,
    /// Nilai `tail` terakhir yang dilihat consumer.
    cached_tail: Cell<usize>,
}

/// State milik producer.
struct ProducerSide {
    /// Slot berikutnya yang akan ditulis. Hanya producer yang menulis.
    tail: AtomicUsize,
    /// Nilai `head` terakhir yang dilihat producer.
    cached_head: Cell<usize>,
}

/// Bounded SPSC ring buffer dengan kapasitas `CAP`.
///
/// Field consumer dan producer masing-masing berada di cache line sendiri
/// untuk menghindari false sharing.
///
/// `push` dan `pop` di sini adalah `unsafe`: pemanggil wajib menjamin hanya
/// ada satu producer dan satu consumer. Untuk API yang aman gunakan
/// [`RingBuffer::split`] atau [`channel`](crate::core::channel).
///
/// Kapasitas nol ditolak saat kompilasi:
///
/// ```compile_fail
/// let rb = hermes_spsc::RingBuffer::<u64, 0>::new();
/// ```
#[repr(C)]
pub struct RingBuffer<T, const CAP: usize> {
    consumer: CacheLinePadded<ConsumerSide>,
    producer: CacheLinePadded<ProducerSide>,
    // Pre-allocated buffer di heap, panjang CAP + 1
    buffer: Box<[Slot<T>]>,
}

// SAFETY: RingBuffer aman untuk Send/Sync karena:
// - Hanya satu producer (menulis tail dan cached_head)
// - Hanya satu consumer (menulis head dan cached_tail)
// - Slot hanya ditulis di luar [head, tail) dan hanya dibaca di dalamnya;
//   pasangan Release/Acquire pada index menjadi batas sinkronisasinya
unsafe impl<T: Send, const CAP: usize> Send for RingBuffer<T, CAP> {}
unsafe impl<T: Send, const CAP: usize> Sync for RingBuffer<T, CAP> {}

impl<T, const CAP: usize> Default for RingBuffer<T, CAP> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const CAP: usize> RingBuffer<T, CAP> {
    /// Jumlah slot fisik. Evaluasi konstanta ini menolak `CAP == 0`.
    const BUFFER_SIZE: usize = {
        assert!(CAP > 0, "capacity must be at least 1");
        assert!(CAP < usize::MAX, "capacity + 1 must fit in usize");
        CAP + 1
    };

    /// Membuat ring buffer baru dengan `CAP + 1` slot.
    ///
    /// Alokasi hanya terjadi sekali di sini. Setelah itu tidak ada alokasi
    /// di hot path.
    pub fn new() -> Self {
        let buffer: Box<[Slot<T>]> = (0..Self::BUFFER_SIZE).map(|_| Slot::new()).collect();

        Self {
            consumer: CacheLinePadded::new(ConsumerSide {
                head: AtomicUsize::new(0),
                cached_tail: Cell::new(0),
            }),
            producer: CacheLinePadded::new(ProducerSide {
                tail: AtomicUsize::new(0),
                cached_head: Cell::new(0),
            }),
            buffer,
        }
    }

    /// `(index + 1) mod (CAP + 1)` tanpa instruksi pembagian.
    #[inline(always)]
    const fn next_index(index: usize) -> usize {
        let next = index + 1;
        if next == Self::BUFFER_SIZE {
            0
        } else {
            next
        }
    }

    /// Push data ke buffer (Producer side)
    ///
    /// Returns `Err(item)` jika buffer penuh; item dikembalikan ke pemanggil.
    /// Tidak pernah blocking. Retry/backoff adalah urusan pemanggil.
    ///
    /// # Safety
    ///
    /// Hanya satu thread yang boleh memanggil `push` pada satu waktu
    /// (single producer).
    #[inline]
    pub unsafe fn push(&self, item: T) -> Result<(), T> {
        let producer = &self.producer.value;
        let tail = producer.tail.load(Ordering::Relaxed);
        let next_tail = Self::next_index(tail);

        // Cek murah terhadap salinan lokal dulu
        if next_tail == producer.cached_head.get() {
            // Refresh dari index consumer (mahal)
            let head = self.consumer.value.head.load(Ordering::Acquire);
            producer.cached_head.set(head);

            if next_tail == head {
                return Err(item);
            }
        }

        // SAFETY: slot `tail` berada di luar [head, tail), consumer tidak
        // membacanya sampai tail baru di-publish di bawah.
        unsafe {
            (*self.buffer[tail].data.get()).write(item);
        }

        self.producer.value.tail.store(next_tail, Ordering::Release);
        Ok(())
    }

    /// Pop data dari buffer (Consumer side)
    ///
    /// Returns `None` jika buffer kosong. Tidak pernah blocking.
    ///
    /// # Safety
    ///
    /// Hanya satu thread yang boleh memanggil `pop` pada satu waktu
    /// (single consumer).
    #[inline]
    pub unsafe fn pop(&self) -> Option<T> {
        let consumer = &self.consumer.value;
        let head = consumer.head.load(Ordering::Relaxed);

        if head == consumer.cached_tail.get() {
            let tail = self.producer.value.tail.load(Ordering::Acquire);
            consumer.cached_tail.set(tail);

            if head == tail {
                return None;
            }
        }

        // SAFETY: head != tail, slot ini sudah ditulis producer dan Acquire
        // di atas (sekarang atau pada refresh sebelumnya) membuat tulisan
        // itu visible. Producer tidak menimpanya sebelum head baru terlihat.
        let item = unsafe { (*self.buffer[head].data.get()).assume_init_read() };

        consumer.head.store(Self::next_index(head), Ordering::Release);
        Some(item)
    }

    /// Cek apakah buffer kosong.
    ///
    /// Snapshot dari dua load independen; bisa sudah basi saat dipakai.
    /// Hanya untuk diagnostik.
    #[inline]
    pub fn is_empty(&self) -> bool {
        let head = self.consumer.value.head.load(Ordering::Acquire);
        let tail = self.producer.value.tail.load(Ordering::Acquire);
        head == tail
    }

    /// Cek apakah buffer penuh. Advisory, sama seperti [`is_empty`](Self::is_empty).
    #[inline]
    pub fn is_full(&self) -> bool {
        let tail = self.producer.value.tail.load(Ordering::Acquire);
        let head = self.consumer.value.head.load(Ordering::Acquire);
        Self::next_index(tail) == head
    }

    /// Jumlah elemen dalam buffer (advisory).
    #[inline]
    pub fn len(&self) -> usize {
        let head = self.consumer.value.head.load(Ordering::Acquire);
        let tail = self.producer.value.tail.load(Ordering::Acquire);
        if tail >= head {
            tail - head
        } else {
            Self::BUFFER_SIZE - head + tail
        }
    }

    /// Kapasitas logis buffer.
    #[inline(always)]
    pub const fn capacity(&self) -> usize {
        CAP
    }
}

impl<T, const CAP: usize> Drop for RingBuffer<T, CAP> {
    fn drop(&mut self) {
        if !std::mem::needs_drop::<T>() {
            return;
        }

        let mut head = self.consumer.value.head.load(Ordering::Relaxed);
        let tail = self.producer.value.tail.load(Ordering::Relaxed);
        while head != tail {
            // SAFETY: slot di [head, tail) sudah diinisialisasi dan belum dibaca.
            unsafe { self.buffer[head].data.get_mut().assume_init_drop() };
            head = Self::next_index(head);
        }
    }
}

impl<T, const CAP: usize> fmt::Debug for RingBuffer<T, CAP> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &CAP)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(all(test, not(loom)))]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize as StdAtomicUsize;
    use std::sync::Arc;

    // Test berjalan di satu thread, jadi precondition SPSC terpenuhi.
    fn push<T, const CAP: usize>(rb: &RingBuffer<T, CAP>, value: T) -> Result<(), T> {
        unsafe { rb.push(value) }
    }

    fn pop<T, const CAP: usize>(rb: &RingBuffer<T, CAP>) -> Option<T> {
        unsafe { rb.pop() }
    }

    struct DropCounter(Arc<StdAtomicUsize>);

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }
    }

    #[test]
    fn test_basic_push_pop() {
        let rb: RingBuffer<u64, 16> = RingBuffer::new();

        assert!(rb.is_empty());
        assert!(!rb.is_full());

        assert!(push(&rb, 42).is_ok());
        assert!(!rb.is_empty());
        assert_eq!(rb.len(), 1);

        assert_eq!(pop(&rb), Some(42));
        assert!(rb.is_empty());
        assert_eq!(pop(&rb), None);
    }

    #[test]
    fn test_full_buffer() {
        let rb: RingBuffer<u64, 4> = RingBuffer::new();

        for i in 1..=4 {
            assert!(push(&rb, i).is_ok());
        }

        assert!(rb.is_full());
        assert_eq!(rb.len(), 4);
        assert_eq!(push(&rb, 5), Err(5)); // penuh, item dikembalikan

        assert_eq!(pop(&rb), Some(1));
        assert!(push(&rb, 5).is_ok());
        assert!(rb.is_full());
    }

    #[test]
    fn test_capacity_one() {
        let rb: RingBuffer<u32, 1> = RingBuffer::new();

        assert!(push(&rb, 7).is_ok());
        assert!(rb.is_full());
        assert_eq!(push(&rb, 8), Err(8));
        assert_eq!(pop(&rb), Some(7));
        assert!(rb.is_empty());
        assert!(push(&rb, 8).is_ok());
        assert_eq!(pop(&rb), Some(8));
    }

    #[test]
    fn test_wraparound() {
        let rb: RingBuffer<u64, 4> = RingBuffer::new();

        // Isi dan kosongkan berulang supaya index melewati batas slot
        for round in 0..10 {
            for i in 0..4 {
                assert!(push(&rb, round * 4 + i).is_ok());
            }
            for i in 0..4 {
                assert_eq!(pop(&rb), Some(round * 4 + i));
            }
            assert!(rb.is_empty());
        }
    }

    #[test]
    fn test_len_across_wrap() {
        let rb: RingBuffer<u8, 3> = RingBuffer::new();

        // Geser head ke tengah buffer
        for _ in 0..3 {
            push(&rb, 0).unwrap();
            pop(&rb).unwrap();
        }
        for i in 0..3 {
            push(&rb, i).unwrap();
            assert_eq!(rb.len(), usize::from(i) + 1);
        }
        assert!(rb.is_full());
    }

    #[test]
    fn test_drop_releases_buffered_items() {
        let drops = Arc::new(StdAtomicUsize::new(0));
        {
            let rb: RingBuffer<DropCounter, 8> = RingBuffer::new();
            for _ in 0..5 {
                assert!(push(&rb, DropCounter(drops.clone())).is_ok());
            }
            drop(pop(&rb));
            assert_eq!(drops.load(std::sync::atomic::Ordering::SeqCst), 1);
        }
        assert_eq!(drops.load(std::sync::atomic::Ordering::SeqCst), 5);
    }

    #[test]
    fn test_capacity_and_debug() {
        let rb: RingBuffer<String, 32> = RingBuffer::default();
        push(&rb, "a".to_string()).unwrap();

        assert_eq!(rb.capacity(), 32);
        assert_eq!(format!("{:?}", rb), "RingBuffer { capacity: 32, len: 1 }");
    }
}
