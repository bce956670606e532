//! Serial number allocation.
//!
//! Each CA owns one allocator. Random allocation (the default) draws a
//! 20-byte positive integer per certificate and needs no shared state;
//! sequential allocation keeps a monotonic counter behind an atomic so
//! concurrent signings still get unique, ordered serials.

use rcgen::SerialNumber;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{CertmeshError, Result};

/// How a CA allocates serial numbers for the certificates it signs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialPolicy {
    /// 20-byte random serials; collision-negligible, lock-free.
    Random,
    /// Monotonic counter starting at 1; preserves allocation order.
    Sequential,
}

impl Default for SerialPolicy {
    fn default() -> Self {
        SerialPolicy::Random
    }
}

impl SerialPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            SerialPolicy::Random => "random",
            SerialPolicy::Sequential => "sequential",
        }
    }
}

impl fmt::Display for SerialPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SerialPolicy {
    type Err = CertmeshError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "random" => Ok(SerialPolicy::Random),
            "sequential" => Ok(SerialPolicy::Sequential),
            _ => Err(CertmeshError::Parse(format!(
                "Unknown serial policy: '{}'. Use 'random' or 'sequential'",
                s
            ))),
        }
    }
}

/// Per-CA serial number source.
#[derive(Debug)]
pub struct SerialAllocator {
    policy: SerialPolicy,
    counter: AtomicU64,
}

impl SerialAllocator {
    pub fn new(policy: SerialPolicy) -> Self {
        Self {
            policy,
            counter: AtomicU64::new(1),
        }
    }

    pub fn policy(&self) -> SerialPolicy {
        self.policy
    }

    /// Allocate the next serial number.
    pub fn next(&self) -> SerialNumber {
        match self.policy {
            SerialPolicy::Random => {
                let mut bytes = [0u8; 20];
                rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
                bytes[0] &= 0x7F; // Ensure positive
                SerialNumber::from_slice(&bytes)
            }
            SerialPolicy::Sequential => {
                let n = self.counter.fetch_add(1, Ordering::Relaxed);
                SerialNumber::from_slice(&n.to_be_bytes())
            }
        }
    }
}
