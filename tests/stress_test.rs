//! Stress Test - Two-Thread Transfer
//!
//! Capacity kecil (16) memaksa producer dan consumer saling menunggu
//! sangat sering. Setiap round harus menghasilkan urutan dan jumlah
//! yang identik, apa pun jadwal thread-nya.
//!
//! Usage:
//!   cargo test --release --test stress_test -- --nocapture

#![cfg(not(loom))]

use std::thread;

use hermes_spsc::channel;
use hermes_spsc::harness::{self, Backoff, TransferConfig};

const ITEM_COUNT: u64 = 500_000;
const EXPECTED_SUM: u128 = 124_999_750_000;

#[test]
fn heavy_concurrency_capacity_16() {
    let (mut tx, mut rx) = channel::<u64, 16>();

    let producer = thread::spawn(move || {
        let mut producer_sum = 0u128;
        for i in 0..ITEM_COUNT {
            let mut item = i;
            // Spin sampai push berhasil; yield supaya consumer jalan
            while let Err(rejected) = tx.push(item) {
                item = rejected;
                thread::yield_now();
            }
            producer_sum += u128::from(i);
        }
        producer_sum
    });

    let consumer = thread::spawn(move || {
        let mut consumer_sum = 0u128;
        let mut received = 0u64;
        let mut last: Option<u64> = None;
        while received < ITEM_COUNT {
            if let Some(v) = rx.pop() {
                if let Some(prev) = last {
                    assert_eq!(v, prev + 1, "order broken after {}", prev);
                }
                last = Some(v);
                consumer_sum += u128::from(v);
                received += 1;
            } else {
                thread::yield_now();
            }
        }
        consumer_sum
    });

    let producer_sum = producer.join().unwrap();
    let consumer_sum = consumer.join().unwrap();

    assert_eq!(producer_sum, consumer_sum);
    assert_eq!(consumer_sum, EXPECTED_SUM);
}

#[test]
fn repeated_rounds_are_schedule_independent() {
    hermes_spsc::init_tracing();

    let config = TransferConfig {
        rounds: 5,
        ..TransferConfig::default()
    };
    assert_eq!(config.expected_sum(), EXPECTED_SUM);

    let reports = harness::run_configured(&config).unwrap();

    assert_eq!(reports.len(), 5);
    for report in &reports {
        assert_eq!(report.capacity, 16);
        assert_eq!(report.items, ITEM_COUNT);
        assert_eq!(report.sum, EXPECTED_SUM);
    }
}

#[test]
fn capacity_one_under_contention() {
    let config = TransferConfig {
        capacity: 1,
        items: 50_000,
        rounds: 2,
        spin_limit: 0,
        ..TransferConfig::default()
    };

    let reports = harness::run_configured(&config).unwrap();
    assert!(reports.iter().all(|r| r.sum == config.expected_sum()));
}

#[test]
fn busy_spin_backoff_large_buffer() {
    let (mut tx, mut rx) = channel::<u64, 1024>();

    let producer = thread::spawn(move || {
        let mut backoff = Backoff::new(1_000);
        for i in 0..ITEM_COUNT {
            let mut item = i;
            while let Err(rejected) = tx.push(item) {
                item = rejected;
                backoff.snooze();
            }
            backoff.reset();
        }
    });

    let mut backoff = Backoff::default();
    let mut expected = 0u64;
    while expected < ITEM_COUNT {
        match rx.pop() {
            Some(v) => {
                assert_eq!(v, expected);
                expected += 1;
                backoff.reset();
            }
            None => backoff.snooze(),
        }
    }

    producer.join().unwrap();
    assert!(rx.is_empty());
}
