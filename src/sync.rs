//! Atomics dan `Arc` yang dipakai ring buffer.
//!
//! Di bawah `--cfg loom` semua primitif diganti versi loom supaya
//! model checker bisa mengeksplorasi setiap interleaving.

#[cfg(loom)]
pub(crate) use loom::sync::atomic::{AtomicUsize, Ordering};
#[cfg(loom)]
pub(crate) use loom::sync::Arc;

#[cfg(not(loom))]
pub(crate) use std::sync::atomic::{AtomicUsize, Ordering};
#[cfg(not(loom))]
pub(crate) use std::sync::Arc;
