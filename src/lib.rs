//! Hermes SPSC - Wait-Free Bounded Ring Buffer
//!
//! Arsitektur:
//! - Lock-Free: transfer item antar dua thread hanya lewat atomic Acquire/Release
//! - No-Allocation: `CAP + 1` slot pre-allocated saat konstruksi
//! - Cached index: tiap sisi menyimpan shadow copy index lawan
//! - Cache-line isolation: state producer dan consumer di line terpisah
//!
//! ```
//! use std::thread;
//!
//! let (mut tx, mut rx) = hermes_spsc::channel::<u32, 16>();
//!
//! let producer = thread::spawn(move || {
//!     for i in 0..100 {
//!         let mut item = i;
//!         while let Err(rejected) = tx.push(item) {
//!             item = rejected;
//!             thread::yield_now();
//!         }
//!     }
//! });
//!
//! let mut received = Vec::new();
//! while received.len() < 100 {
//!     match rx.pop() {
//!         Some(v) => received.push(v),
//!         None => thread::yield_now(),
//!     }
//! }
//! producer.join().unwrap();
//! assert_eq!(received, (0..100).collect::<Vec<_>>());
//! ```
//!
//! Tepat satu producer dan satu consumer. `Producer`/`Consumer` menegakkan
//! ini lewat type system; `RingBuffer::push`/`pop` menyerahkannya ke
//! pemanggil sebagai kontrak `unsafe`.

pub mod core;
pub mod harness;
mod sync;
mod trace;

pub use crate::core::{channel, Consumer, Drain, Producer, RingBuffer};
pub use crate::trace::init_tracing;
