// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Log-variable registry and the exported `sent` counter

use core::sync::atomic::{AtomicU16, Ordering};

use crate::error::Result;

/// Numeric identifier of a registered log variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarId(pub u16);

/// Firmware log-variable registry
///
/// Lookup by `(group, name)` happens once at startup; reads go through the
/// resolved identifier on every iteration.
pub trait LogRegistry {
    /// Resolve a variable identifier, `None` if not registered
    fn var_id(&self, group: &str, name: &str) -> Option<VarId>;

    /// Read a variable as float
    fn get_float(&self, id: VarId) -> f32;

    /// Export a read-only u16 value under `group.name`
    ///
    /// Exporting the same counter under the same name again succeeds, so a
    /// failed init can be repeated.
    fn register_u16(
        &mut self,
        group: &'static str,
        name: &'static str,
        value: &'static SentCounter,
    ) -> Result<()>;
}

/// Publish counter exported to the log registry
///
/// Written by the telemetry task only, read by anyone. Uses plain
/// load/store so it also works on cores without atomic read-modify-write.
#[derive(Debug)]
pub struct SentCounter {
    value: AtomicU16,
}

impl SentCounter {
    /// Create a counter at zero
    pub const fn new() -> Self {
        Self {
            value: AtomicU16::new(0),
        }
    }

    /// Current value
    pub fn get(&self) -> u16 {
        self.value.load(Ordering::Relaxed)
    }

    /// Store a new value (single writer)
    pub(crate) fn set(&self, value: u16) {
        self.value.store(value, Ordering::Relaxed);
    }
}

impl Default for SentCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_starts_at_zero() {
        let counter = SentCounter::new();
        assert_eq!(counter.get(), 0);

        counter.set(u16::MAX);
        assert_eq!(counter.get(), u16::MAX);
    }
}
