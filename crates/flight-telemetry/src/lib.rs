// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # Flight Telemetry - Periodic attitude publisher for flight controllers
//!
//! Runs one low-priority task that opens a pub/sub session over a serial
//! link, starts the middleware's read and lease tasks, declares a single
//! publisher and then publishes the stabilizer pitch/roll every 300 ms as a
//! short text record (`"<seq>: <pitch>,<roll>"`).
//!
//! The middleware client, the RTOS scheduler and the firmware's log-variable
//! registry are collaborators behind traits; this crate only sequences them.
//!
//! ## Design Constraints
//!
//! - **No heap allocations** in core (fixed-capacity strings, static task memory)
//! - **`no_std` compatible**
//! - Every failure is terminal for the task: log, release the session, return
//!
//! ## Architecture
//!
//! ```text
//! +-----------------------------------------+
//! |  telemetry_init (spawns the task)       |
//! +-----------------------------------------+
//!           v
//! +-----------------------------------------+
//! |  TelemetryTask (startup + sample loop)  |
//! +-----------------------------------------+
//!      v              v              v
//! +-----------+ +-------------+ +-----------+
//! | Middleware| | LogRegistry | | Scheduler |
//! | (session) | | (pitch/roll)| | (sleep)   |
//! +-----------+ +-------------+ +-----------+
//! ```
//!
//! ## Feature Flags
//!
//! - `std` -- Enable host backends (threads, in-memory registry, loopback session)

#![cfg_attr(not(any(feature = "std", test)), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Error types
pub mod error;

/// Session, locator and task configuration
pub mod config;

/// Middleware client abstraction (session, publisher, auxiliary tasks)
pub mod middleware;

/// Scoped ownership of the session and its publisher
pub mod session;

/// Log-variable registry and the exported `sent` counter
pub mod registry;

/// Outgoing text record
pub mod record;

/// RTOS scheduler abstraction
pub mod scheduler;

/// The telemetry publisher task
pub mod task;

/// Host backends (requires `std` feature)
#[cfg(feature = "std")]
pub mod host;

// Re-exports for convenience
pub use crate::config::{KeyExpr, Locator, SessionConfig, TelemetryConfig, VarName};
pub use crate::error::{Error, Result};
pub use crate::middleware::{AuxMemory, AuxTaskAttr, AuxTaskKind, Middleware, Publisher, Session};
pub use crate::record::{Record, RecordText, Sample};
pub use crate::registry::{LogRegistry, SentCounter, VarId};
pub use crate::scheduler::{Priority, Scheduler, TaskHandle};
pub use crate::task::{telemetry_init, TelemetryTask};

/// Capacity of the outgoing text record in bytes
pub const RECORD_CAPACITY: usize = 100;

/// Log group the `sent` counter is exported under
pub const SENT_GROUP: &str = "zenoh";

/// Name of the exported publish counter
pub const SENT_NAME: &str = "sent";

/// Process-wide publish counter, exported read-only as `zenoh.sent`
pub static SENT: SentCounter = SentCounter::new();

/// Version of Flight Telemetry
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
