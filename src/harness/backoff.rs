//! Spin-then-yield backoff untuk retry loop di sisi pemanggil.

use std::hint;
use std::thread;

/// Jumlah spin sebelum mulai `yield_now`.
pub const DEFAULT_SPIN_LIMIT: u32 = 64;

/// Backoff ringan: spin sebentar, lalu yield CPU.
#[derive(Debug, Clone)]
pub struct Backoff {
    spins: u32,
    limit: u32,
}

impl Backoff {
    pub const fn new(limit: u32) -> Self {
        Self { spins: 0, limit }
    }

    /// Tunggu sebentar sebelum retry berikutnya.
    #[inline(always)]
    pub fn snooze(&mut self) {
        if self.spins < self.limit {
            self.spins += 1;
            hint::spin_loop();
        } else {
            thread::yield_now();
        }
    }

    /// Dipanggil setelah operasi berhasil.
    #[inline(always)]
    pub fn reset(&mut self) {
        self.spins = 0;
    }

    /// `true` jika budget spin sudah habis dan snooze berikutnya akan yield.
    pub fn is_yielding(&self) -> bool {
        self.spins >= self.limit
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(DEFAULT_SPIN_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spins_until_limit_then_yields() {
        let mut backoff = Backoff::new(3);
        for _ in 0..3 {
            assert!(!backoff.is_yielding());
            backoff.snooze();
        }
        assert!(backoff.is_yielding());

        backoff.snooze(); // yield, counter tetap
        assert!(backoff.is_yielding());

        backoff.reset();
        assert!(!backoff.is_yielding());
    }

    #[test]
    fn zero_limit_always_yields() {
        let backoff = Backoff::new(0);
        assert!(backoff.is_yielding());
    }
}
