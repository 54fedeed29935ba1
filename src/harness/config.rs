//! Konfigurasi transfer: default, lalu environment, lalu argumen CLI.

use thiserror::Error;

use super::backoff::DEFAULT_SPIN_LIMIT;

/// Kapasitas yang tersedia sebagai instansiasi const generic.
pub const SUPPORTED_CAPACITIES: [usize; 7] = [1, 2, 4, 16, 64, 1024, 65536];

pub const ENV_CAPACITY: &str = "SPSC_CAPACITY";
pub const ENV_ITEMS: &str = "SPSC_ITEMS";
pub const ENV_ROUNDS: &str = "SPSC_ROUNDS";
pub const ENV_PRODUCER_CPU: &str = "PRODUCER_CPU";
pub const ENV_CONSUMER_CPU: &str = "CONSUMER_CPU";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing value for {flag}")]
    MissingValue { flag: String },

    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },

    #[error("unknown argument: {0}")]
    UnknownArgument(String),

    #[error("capacity must be at least 1")]
    ZeroCapacity,

    #[error("unsupported capacity {0} (supported: {caps:?})", caps = SUPPORTED_CAPACITIES)]
    UnsupportedCapacity(usize),

    #[error("rounds must be at least 1")]
    ZeroRounds,
}

/// Parameter satu sesi transfer producer -> consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferConfig {
    /// Kapasitas logis ring buffer.
    pub capacity: usize,
    /// Jumlah item (`0..items`) yang dikirim per round.
    pub items: u64,
    /// Berapa kali transfer diulang.
    pub rounds: u32,
    /// Budget spin sebelum backoff mulai yield.
    pub spin_limit: u32,
    pub producer_cpu: Option<usize>,
    pub consumer_cpu: Option<usize>,
}

/// Hasil parsing argumen CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(TransferConfig),
    Help,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            capacity: 16,
            items: 500_000,
            rounds: 1,
            spin_limit: DEFAULT_SPIN_LIMIT,
            producer_cpu: None,
            consumer_cpu: None,
        }
    }
}

impl TransferConfig {
    /// Default yang di-override oleh environment variable proses.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_lookup(|key| std::env::var(key).ok())
    }

    /// Override dari sumber environment arbitrer (dipakai juga oleh test).
    pub fn with_env_lookup<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_CAPACITY) {
            self.capacity = parse_value(ENV_CAPACITY, &value)?;
        }
        if let Some(value) = lookup(ENV_ITEMS) {
            self.items = parse_value(ENV_ITEMS, &value)?;
        }
        if let Some(value) = lookup(ENV_ROUNDS) {
            self.rounds = parse_value(ENV_ROUNDS, &value)?;
        }
        if let Some(value) = lookup(ENV_PRODUCER_CPU) {
            self.producer_cpu = Some(parse_value(ENV_PRODUCER_CPU, &value)?);
        }
        if let Some(value) = lookup(ENV_CONSUMER_CPU) {
            self.consumer_cpu = Some(parse_value(ENV_CONSUMER_CPU, &value)?);
        }
        Ok(self)
    }

    /// Override dari argumen CLI (tanpa nama program).
    pub fn parse_args<I, S>(mut self, args: I) -> Result<Command, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args = args.into_iter().map(Into::into);

        while let Some(flag) = args.next() {
            match flag.as_str() {
                "--capacity" | "-c" => self.capacity = next_value(&flag, &mut args)?,
                "--items" | "-n" => self.items = next_value(&flag, &mut args)?,
                "--rounds" | "-r" => self.rounds = next_value(&flag, &mut args)?,
                "--spin-limit" => self.spin_limit = next_value(&flag, &mut args)?,
                "--producer-cpu" => self.producer_cpu = Some(next_value(&flag, &mut args)?),
                "--consumer-cpu" => self.consumer_cpu = Some(next_value(&flag, &mut args)?),
                "--help" | "-h" => return Ok(Command::Help),
                _ => return Err(ConfigError::UnknownArgument(flag)),
            }
        }

        self.validate()?;
        Ok(Command::Run(self))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if !SUPPORTED_CAPACITIES.contains(&self.capacity) {
            return Err(ConfigError::UnsupportedCapacity(self.capacity));
        }
        if self.rounds == 0 {
            return Err(ConfigError::ZeroRounds);
        }
        Ok(())
    }

    /// `Σ i` untuk `i` di `[0, items)`.
    pub fn expected_sum(&self) -> u128 {
        let n = u128::from(self.items);
        n * n.saturating_sub(1) / 2
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        })
}

fn next_value<T, I>(flag: &str, args: &mut I) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    I: Iterator<Item = String>,
{
    let value = args.next().ok_or_else(|| ConfigError::MissingValue {
        flag: flag.to_string(),
    })?;
    parse_value(flag, &value)
}

pub fn usage() -> String {
    let defaults = TransferConfig::default();
    format!(
        "Usage: hermes-spsc [OPTIONS]\n\n\
         Options:\n\
         \x20 -c, --capacity <N>      Ring capacity, one of {caps:?} (default: {capacity})\n\
         \x20 -n, --items <N>         Items per round (default: {items})\n\
         \x20 -r, --rounds <N>        Number of rounds (default: {rounds})\n\
         \x20     --spin-limit <N>    Spins before yielding (default: {spin})\n\
         \x20     --producer-cpu <N>  Pin producer thread to CPU\n\
         \x20     --consumer-cpu <N>  Pin consumer thread to CPU\n\
         \x20 -h, --help              Show this help\n\n\
         Environment: {ENV_CAPACITY}, {ENV_ITEMS}, {ENV_ROUNDS}, {ENV_PRODUCER_CPU}, {ENV_CONSUMER_CPU}",
        caps = SUPPORTED_CAPACITIES,
        capacity = defaults.capacity,
        items = defaults.items,
        rounds = defaults.rounds,
        spin = defaults.spin_limit,
    )
}
