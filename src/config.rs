//! Resolved configuration for the password core.
//!
//! Flags and environment variables are parsed by `cli::dispatch`; these types
//! only carry the resulting values.

use chrono::TimeDelta;
use secrecy::SecretString;
use std::time::Duration;

pub const DEFAULT_PASSWORD_LIFETIME_SECONDS: i64 = 2 * 12 * 30 * 24 * 60 * 60;
pub const DEFAULT_BLOCKER_INTERVAL_SECONDS: u64 = 10;
pub const DEFAULT_HASH_SALT: &str = "1zJT7As5HyRs9rCzbRXE";
pub const DEFAULT_HASH_MEMORY_KIB: u32 = 19 * 1024;
pub const DEFAULT_HASH_ITERATIONS: u32 = 2;

#[derive(Clone, Copy, Debug)]
pub struct PasswordConfig {
    lifetime: TimeDelta,
}

impl PasswordConfig {
    /// Default lifetime: 720 days.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lifetime: TimeDelta::seconds(DEFAULT_PASSWORD_LIFETIME_SECONDS),
        }
    }

    #[must_use]
    pub fn with_lifetime(mut self, lifetime: TimeDelta) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Returns `None` when `seconds` does not fit a `TimeDelta`.
    #[must_use]
    pub fn with_lifetime_seconds(self, seconds: i64) -> Option<Self> {
        TimeDelta::try_seconds(seconds).map(|lifetime| self.with_lifetime(lifetime))
    }

    /// Lifetime applied when a password is added without `valid_until`.
    #[must_use]
    pub fn lifetime(&self) -> TimeDelta {
        self.lifetime
    }
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct BlockerConfig {
    interval: Duration,
}

impl BlockerConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_BLOCKER_INTERVAL_SECONDS),
        }
    }

    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub fn with_interval_seconds(self, seconds: u64) -> Self {
        self.with_interval(Duration::from_secs(seconds))
    }

    /// A zero interval would spin; it is raised to one second.
    #[must_use]
    pub fn normalize(self) -> Self {
        if self.interval.is_zero() {
            Self {
                interval: Duration::from_secs(1),
            }
        } else {
            self
        }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for BlockerConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug)]
pub struct HashConfig {
    salt: SecretString,
    memory_kib: u32,
    iterations: u32,
}

impl HashConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            salt: SecretString::from(DEFAULT_HASH_SALT.to_string()),
            memory_kib: DEFAULT_HASH_MEMORY_KIB,
            iterations: DEFAULT_HASH_ITERATIONS,
        }
    }

    #[must_use]
    pub fn with_salt(mut self, salt: SecretString) -> Self {
        self.salt = salt;
        self
    }

    #[must_use]
    pub fn with_memory_kib(mut self, memory_kib: u32) -> Self {
        self.memory_kib = memory_kib;
        self
    }

    #[must_use]
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    #[must_use]
    pub fn salt(&self) -> &SecretString {
        &self.salt
    }

    #[must_use]
    pub fn memory_kib(&self) -> u32 {
        self.memory_kib
    }

    #[must_use]
    pub fn iterations(&self) -> u32 {
        self.iterations
    }
}

impl Default for HashConfig {
    fn default() -> Self {
        Self::new()
    }
}
