//! Core module: Lock-Free SPSC Ring Buffer
//!
//! Prinsip desain:
//! - Lock-Free: Hanya atomic Acquire/Release, tidak ada Mutex/RwLock
//! - No-Allocation: Semua slot pre-allocated saat init
//! - Cached index: load lintas-thread hanya di kondisi penuh/kosong

mod handle;
mod ring_buffer;

pub use handle::{channel, Consumer, Drain, Producer};
pub use ring_buffer::RingBuffer;
