// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Middleware client abstraction
//!
//! The pub/sub middleware (session handshake, serial framing, lease
//! protocol) is provided by the platform. This module only defines the
//! calls the telemetry task makes into it:
//!
//! - `Middleware::open` -- open a session from a `SessionConfig`
//! - `Session::start_aux_task` -- start the read or lease background task
//! - `Session::declare_publisher` -- bind a publisher to a key expression
//! - `Publisher::put` -- send one payload
//! - `Session::close` -- release the session
//!
//! Auxiliary tasks never allocate: each one receives a statically allocated
//! stack and control block through `AuxTaskAttr`.

use core::fmt;

use static_cell::StaticCell;

use crate::config::{KeyExpr, SessionConfig, DEFAULT_STACK_DEPTH};
use crate::error::{Error, Result};
use crate::scheduler::Priority;

/// Native stack word
pub type StackWord = u32;

/// Control block size in words (covers FreeRTOS `StaticTask_t` on Cortex-M)
pub const CONTROL_BLOCK_WORDS: usize = 32;

/// Stack depth (words) of the read and lease tasks
pub const AUX_STACK_DEPTH: usize = DEFAULT_STACK_DEPTH;

/// Statically allocatable task memory: stack + control block
pub struct TaskMemory<const N: usize> {
    stack: [StackWord; N],
    control: [StackWord; CONTROL_BLOCK_WORDS],
}

impl<const N: usize> TaskMemory<N> {
    /// Create zeroed task memory
    pub const fn new() -> Self {
        Self {
            stack: [0; N],
            control: [0; CONTROL_BLOCK_WORDS],
        }
    }

    /// Stack depth in words
    pub const fn stack_depth(&self) -> usize {
        N
    }

    /// Stack buffer
    pub fn stack_mut(&mut self) -> &mut [StackWord] {
        &mut self.stack
    }

    /// Control block buffer
    pub fn control_block_mut(&mut self) -> &mut [StackWord] {
        &mut self.control
    }
}

impl<const N: usize> Default for TaskMemory<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Debug for TaskMemory<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskMemory")
            .field("stack_depth", &N)
            .finish_non_exhaustive()
    }
}

/// Memory for one auxiliary task
pub type AuxTaskMemory = TaskMemory<AUX_STACK_DEPTH>;

/// Auxiliary middleware task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuxTaskKind {
    /// Drains inbound transport data into the session
    Read,
    /// Renews the session lease (keepalive)
    Lease,
}

impl fmt::Display for AuxTaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuxTaskKind::Read => write!(f, "read"),
            AuxTaskKind::Lease => write!(f, "lease"),
        }
    }
}

/// Attributes of an auxiliary task
///
/// Owns its memory block for `'static`, so a block backs at most one task.
#[derive(Debug)]
pub struct AuxTaskAttr {
    /// Task name
    pub name: &'static str,
    /// Scheduling priority
    pub priority: Priority,
    /// Stack and control block
    pub memory: &'static mut AuxTaskMemory,
}

impl AuxTaskAttr {
    /// Stack depth in words
    pub fn stack_depth(&self) -> usize {
        self.memory.stack_depth()
    }
}

/// Memory for the read and lease tasks
#[derive(Debug)]
pub struct AuxMemory {
    /// Read task memory
    pub read: &'static mut AuxTaskMemory,
    /// Lease task memory
    pub lease: &'static mut AuxTaskMemory,
}

impl AuxMemory {
    /// Hand out the process-wide static blocks
    ///
    /// Succeeds once; later calls return `Error::ResourceExhausted`.
    pub fn take_static() -> Result<Self> {
        static READ_TASK_MEMORY: StaticCell<AuxTaskMemory> = StaticCell::new();
        static LEASE_TASK_MEMORY: StaticCell<AuxTaskMemory> = StaticCell::new();

        let read = READ_TASK_MEMORY
            .try_init_with(AuxTaskMemory::new)
            .ok_or(Error::ResourceExhausted)?;
        let lease = LEASE_TASK_MEMORY
            .try_init_with(AuxTaskMemory::new)
            .ok_or(Error::ResourceExhausted)?;

        Ok(Self { read, lease })
    }
}

/// Middleware client: opens sessions
pub trait Middleware {
    /// Session type
    type Session: Session;

    /// Open a session (transport + handshake)
    fn open(&mut self, config: SessionConfig) -> Result<Self::Session>;
}

/// Open middleware session
///
/// The middleware synchronizes its read/lease tasks with calls made from the
/// owning task; callers do not lock.
pub trait Session {
    /// Publisher type
    type Publisher: Publisher;

    /// Start an auxiliary background task
    fn start_aux_task(&mut self, kind: AuxTaskKind, attr: AuxTaskAttr) -> Result<()>;

    /// Declare a publisher on `key`
    fn declare_publisher(&self, key: &KeyExpr) -> Result<Self::Publisher>;

    /// Release the session
    fn close(&mut self);
}

/// Publisher bound to one key expression
pub trait Publisher {
    /// Send one payload
    fn put(&self, payload: &[u8]) -> Result<()>;
}
