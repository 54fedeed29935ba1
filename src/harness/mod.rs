//! Transfer driver: satu producer thread, satu consumer thread.
//!
//! Ring buffer sendiri tidak pernah menunggu. Role thread, retry/backoff,
//! dan koordinasi shutdown adalah tanggung jawab pemanggil; modul ini
//! membungkusnya sekali untuk binary, integration test, dan benchmark.
//!
//! Producer mengirim `0..items`, consumer memverifikasi setiap nilai tepat
//! satu lebih besar dari sebelumnya lalu menjumlahkannya. Urutan yang
//! benar plus jumlah `Σ i` membuktikan FIFO tanpa loss dan tanpa duplikasi.

mod affinity;
mod backoff;
mod config;

pub use affinity::{pin_current_thread, AffinityError};
pub use backoff::{Backoff, DEFAULT_SPIN_LIMIT};
pub use config::{usage, Command, ConfigError, TransferConfig, SUPPORTED_CAPACITIES};

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::core::channel;
use crate::trace::{debug, info, warn};

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("out-of-order item: expected {expected}, got {got}")]
    OutOfOrder { expected: u64, got: u64 },

    #[error("checksum mismatch: expected {expected}, got {got}")]
    SumMismatch { expected: u128, got: u128 },

    #[error("consumer received {received} of {expected} items")]
    Incomplete { expected: u64, received: u64 },

    #[error("failed to spawn {role} thread: {source}")]
    Spawn {
        role: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("{role} thread panicked")]
    ThreadPanicked { role: &'static str },

    #[error("failed to pin {role} thread: {source}")]
    Affinity {
        role: &'static str,
        #[source]
        source: AffinityError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Statistik satu round transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    pub capacity: usize,
    pub items: u64,
    /// Jumlah semua nilai yang diterima consumer.
    pub sum: u128,
    pub elapsed: Duration,
    /// Berapa kali `push` mendapat "penuh".
    pub full_retries: u64,
    /// Berapa kali `pop` mendapat "kosong".
    pub empty_retries: u64,
}

impl TransferReport {
    pub fn items_per_sec(&self) -> f64 {
        self.items as f64 / self.elapsed.as_secs_f64().max(f64::EPSILON)
    }

    pub fn ns_per_item(&self) -> f64 {
        if self.items == 0 {
            return 0.0;
        }
        self.elapsed.as_nanos() as f64 / self.items as f64
    }
}

struct ConsumerTally {
    received: u64,
    sum: u128,
    retries: u64,
}

/// Jalankan satu round transfer pada `RingBuffer<u64, CAP>`.
///
/// `config.capacity` diabaikan di sini; kapasitas ditentukan oleh `CAP`.
pub fn run_transfer<const CAP: usize>(
    config: &TransferConfig,
) -> Result<TransferReport, TransferError> {
    let (mut producer, mut consumer) = channel::<u64, CAP>();
    let items = config.items;
    let spin_limit = config.spin_limit;
    let producer_cpu = config.producer_cpu;
    let consumer_cpu = config.consumer_cpu;

    // Di-set oleh sisi yang gagal supaya sisi lain tidak menunggu selamanya
    let abort = AtomicBool::new(false);
    let abort = &abort;

    debug!(capacity = CAP, items, "transfer started");
    let start = Instant::now();

    let (produced, consumed) = thread::scope(|s| {
        let consumer_handle = thread::Builder::new()
            .name("spsc-consumer".into())
            .spawn_scoped(s, move || {
                let result = (|| -> Result<ConsumerTally, TransferError> {
                    pin(consumer_cpu, "consumer")?;

                    let mut backoff = Backoff::new(spin_limit);
                    let mut tally = ConsumerTally {
                        received: 0,
                        sum: 0,
                        retries: 0,
                    };

                    while tally.received < items {
                        match consumer.pop() {
                            Some(got) => {
                                if got != tally.received {
                                    warn!(expected = tally.received, got, "out-of-order item");
                                    return Err(TransferError::OutOfOrder {
                                        expected: tally.received,
                                        got,
                                    });
                                }
                                tally.sum += u128::from(got);
                                tally.received += 1;
                                backoff.reset();
                            }
                            None => {
                                if abort.load(Ordering::Acquire) {
                                    break;
                                }
                                tally.retries += 1;
                                backoff.snooze();
                            }
                        }
                    }
                    Ok(tally)
                })();

                if result.is_err() {
                    abort.store(true, Ordering::Release);
                }
                result
            })
            .map_err(|source| TransferError::Spawn {
                role: "consumer",
                source,
            })?;

        let producer_handle = thread::Builder::new()
            .name("spsc-producer".into())
            .spawn_scoped(s, move || {
                let result = (|| -> Result<u64, TransferError> {
                    pin(producer_cpu, "producer")?;

                    let mut backoff = Backoff::new(spin_limit);
                    let mut retries = 0u64;

                    for value in 0..items {
                        let mut pending = value;
                        while let Err(rejected) = producer.push(pending) {
                            if abort.load(Ordering::Acquire) {
                                return Ok(retries);
                            }
                            pending = rejected;
                            retries += 1;
                            backoff.snooze();
                        }
                        backoff.reset();
                    }
                    Ok(retries)
                })();

                if result.is_err() {
                    abort.store(true, Ordering::Release);
                }
                result
            });

        let producer_handle = match producer_handle {
            Ok(handle) => handle,
            Err(source) => {
                abort.store(true, Ordering::Release);
                // Consumer keluar lewat abort; hasilnya tidak relevan lagi
                let _ = consumer_handle.join();
                return Err(TransferError::Spawn {
                    role: "producer",
                    source,
                });
            }
        };

        let produced = producer_handle.join().map_err(|_| {
            abort.store(true, Ordering::Release);
            TransferError::ThreadPanicked { role: "producer" }
        })?;
        let consumed = consumer_handle
            .join()
            .map_err(|_| TransferError::ThreadPanicked { role: "consumer" })?;

        Ok::<_, TransferError>((produced, consumed))
    })?;

    let elapsed = start.elapsed();

    // Error consumer lebih informatif (urutan), producer hanya gagal saat pinning
    let tally = consumed?;
    let full_retries = produced?;

    if tally.received != items {
        return Err(TransferError::Incomplete {
            expected: items,
            received: tally.received,
        });
    }

    let expected = config.expected_sum();
    if tally.sum != expected {
        return Err(TransferError::SumMismatch {
            expected,
            got: tally.sum,
        });
    }

    debug!(
        elapsed_us = elapsed.as_micros() as u64,
        full_retries,
        empty_retries = tally.retries,
        "transfer finished"
    );

    Ok(TransferReport {
        capacity: CAP,
        items,
        sum: tally.sum,
        elapsed,
        full_retries,
        empty_retries: tally.retries,
    })
}

/// Ulangi [`run_transfer`] sebanyak `config.rounds`. Berhenti di error pertama.
pub fn run_rounds<const CAP: usize>(
    config: &TransferConfig,
) -> Result<Vec<TransferReport>, TransferError> {
    (0..config.rounds)
        .map(|round| {
            let report = run_transfer::<CAP>(config)?;
            info!(
                round,
                capacity = CAP,
                ns_per_item = report.ns_per_item(),
                "round complete"
            );
            Ok(report)
        })
        .collect()
}

/// Pilih instansiasi const generic sesuai `config.capacity`.
pub fn run_configured(config: &TransferConfig) -> Result<Vec<TransferReport>, TransferError> {
    config.validate()?;

    match config.capacity {
        1 => run_rounds::<1>(config),
        2 => run_rounds::<2>(config),
        4 => run_rounds::<4>(config),
        16 => run_rounds::<16>(config),
        64 => run_rounds::<64>(config),
        1024 => run_rounds::<1024>(config),
        65536 => run_rounds::<65536>(config),
        other => Err(ConfigError::UnsupportedCapacity(other).into()),
    }
}

fn pin(cpu: Option<usize>, role: &'static str) -> Result<(), TransferError> {
    let Some(cpu) = cpu else {
        return Ok(());
    };
    pin_current_thread(cpu).map_err(|source| TransferError::Affinity { role, source })?;
    debug!(role, cpu, "thread pinned");
    Ok(())
}
