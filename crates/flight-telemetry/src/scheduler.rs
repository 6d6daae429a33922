// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! RTOS scheduler abstraction
//!
//! Fixed-priority preemptive scheduling on a single core. The telemetry task
//! only needs three things from the kernel: create a task, sleep the calling
//! task, and (optionally) report free heap for diagnostics.

use core::fmt;

use crate::error::Result;

/// Task priority (higher value = more urgent)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Priority(pub u8);

impl Priority {
    /// Idle priority (lowest)
    pub const IDLE: Priority = Priority(0);
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to a created task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskHandle(pub u32);

/// Scheduler trait
///
/// Platform implementations (FreeRTOS, host threads) provide this trait.
pub trait Scheduler {
    /// Create a task running `entry`
    ///
    /// # Arguments
    ///
    /// * `name` - Task name (debug only)
    /// * `stack_depth` - Stack depth in words
    /// * `priority` - Scheduling priority
    /// * `entry` - Task body; the task ends when it returns
    fn spawn<F>(
        &self,
        name: &'static str,
        stack_depth: usize,
        priority: Priority,
        entry: F,
    ) -> Result<TaskHandle>
    where
        F: FnOnce() + Send + 'static;

    /// Suspend the calling task for `ms` milliseconds
    fn sleep_ms(&self, ms: u32);

    /// Free heap in bytes, if the platform tracks it
    fn free_heap(&self) -> Option<usize> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::IDLE < Priority(10));
        assert_eq!(Priority::default(), Priority::IDLE);
        assert_eq!(Priority(10).to_string(), "10");
    }
}
