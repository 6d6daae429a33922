// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Host backends for testing and demos
//!
//! - `StdScheduler` -- tasks are `std::thread`s, sleep is `thread::sleep`
//! - `MemoryRegistry` -- log variables in a shared table
//! - `LoopbackMiddleware` -- sessions that record every publication
//!
//! All three are cheap to clone; clones share state, so a test can keep a
//! handle while the task owns another.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, info};
use parking_lot::{Condvar, Mutex};

use crate::config::{KeyExpr, SessionConfig};
use crate::error::{Error, Result};
use crate::middleware::{AuxTaskAttr, AuxTaskKind, Middleware, Publisher, Session, StackWord};
use crate::registry::{LogRegistry, SentCounter, VarId};
use crate::scheduler::{Priority, Scheduler, TaskHandle};

/// Smallest host thread stack (bytes); RTOS word depths are far too small
/// for std formatting and logging.
const MIN_HOST_STACK: usize = 64 * 1024;

/// Scheduler backed by OS threads
///
/// Priorities are accepted but not enforced.
#[derive(Clone, Default)]
pub struct StdScheduler {
    next_id: Arc<AtomicU32>,
    threads: Arc<Mutex<HashMap<u32, JoinHandle<()>>>>,
}

impl StdScheduler {
    /// Create a scheduler
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for a spawned task to finish
    ///
    /// Returns false if the handle is unknown or the task panicked.
    pub fn join(&self, handle: TaskHandle) -> bool {
        let thread = self.threads.lock().remove(&handle.0);
        match thread {
            Some(thread) => thread.join().is_ok(),
            None => false,
        }
    }
}

impl Scheduler for StdScheduler {
    fn spawn<F>(
        &self,
        name: &'static str,
        stack_depth: usize,
        priority: Priority,
        entry: F,
    ) -> Result<TaskHandle>
    where
        F: FnOnce() + Send + 'static,
    {
        let stack_bytes = (stack_depth * core::mem::size_of::<StackWord>()).max(MIN_HOST_STACK);
        let thread = thread::Builder::new()
            .name(name.to_string())
            .stack_size(stack_bytes)
            .spawn(entry)
            .map_err(|_| Error::ResourceExhausted)?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.threads.lock().insert(id, thread);
        debug!("[host] spawned task '{}' (id {}, priority {})", name, id, priority);
        Ok(TaskHandle(id))
    }

    fn sleep_ms(&self, ms: u32) {
        thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

#[derive(Default)]
struct RegistryTable {
    vars: Vec<(String, String, f32)>,
    exports: Vec<(&'static str, &'static str, &'static SentCounter)>,
}

/// In-memory log-variable registry
#[derive(Clone, Default)]
pub struct MemoryRegistry {
    table: Arc<Mutex<RegistryTable>>,
}

impl MemoryRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a float variable
    ///
    /// Fails with `Error::ResourceExhausted` once every `VarId` is taken.
    pub fn define_float(&self, group: &str, name: &str, value: f32) -> Result<VarId> {
        let mut table = self.table.lock();
        let id = u16::try_from(table.vars.len()).map_err(|_| Error::ResourceExhausted)?;
        table.vars.push((group.to_string(), name.to_string(), value));
        Ok(VarId(id))
    }

    /// Update a float variable
    pub fn set_float(&self, id: VarId, value: f32) {
        if let Some(var) = self.table.lock().vars.get_mut(usize::from(id.0)) {
            var.2 = value;
        }
    }

    /// Read an exported u16 value
    pub fn read_u16(&self, group: &str, name: &str) -> Option<u16> {
        self.table
            .lock()
            .exports
            .iter()
            .find(|(g, n, _)| *g == group && *n == name)
            .map(|(_, _, value)| value.get())
    }
}

impl LogRegistry for MemoryRegistry {
    fn var_id(&self, group: &str, name: &str) -> Option<VarId> {
        self.table
            .lock()
            .vars
            .iter()
            .position(|(g, n, _)| g == group && n == name)
            .and_then(|index| u16::try_from(index).ok())
            .map(VarId)
    }

    fn get_float(&self, id: VarId) -> f32 {
        self.table
            .lock()
            .vars
            .get(usize::from(id.0))
            .map(|var| var.2)
            .unwrap_or(0.0)
    }

    fn register_u16(
        &mut self,
        group: &'static str,
        name: &'static str,
        value: &'static SentCounter,
    ) -> Result<()> {
        let mut table = self.table.lock();
        let existing = table
            .exports
            .iter()
            .find(|(g, n, _)| *g == group && *n == name)
            .map(|(_, _, counter)| *counter);
        match existing {
            Some(counter) if core::ptr::eq(counter, value) => Ok(()),
            Some(_) => Err(Error::InvalidParameter),
            None => {
                table.exports.push((group, name, value));
                Ok(())
            }
        }
    }
}

/// Auxiliary task start recorded by the loopback session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuxTaskRecord {
    /// Task kind
    pub kind: AuxTaskKind,
    /// Task name
    pub name: &'static str,
    /// Priority
    pub priority: Priority,
    /// Stack depth (words)
    pub stack_depth: usize,
}

#[derive(Default)]
struct Faults {
    open: bool,
    aux: Option<AuxTaskKind>,
    declare: bool,
    put_at: Option<usize>,
}

#[derive(Default)]
struct LoopbackState {
    faults: Faults,
    sessions_open: u32,
    closes: u32,
    aux_tasks: Vec<AuxTaskRecord>,
    puts: usize,
    published: Vec<(String, Vec<u8>)>,
}

struct Shared {
    state: Mutex<LoopbackState>,
    changed: Condvar,
}

/// Loopback middleware: records publications instead of sending them
#[derive(Clone)]
pub struct LoopbackMiddleware {
    shared: Arc<Shared>,
}

impl Default for LoopbackMiddleware {
    fn default() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(LoopbackState::default()),
                changed: Condvar::new(),
            }),
        }
    }
}

impl LoopbackMiddleware {
    /// Create a loopback middleware with no faults
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `open` fail
    pub fn fail_open(self) -> Self {
        self.shared.state.lock().faults.open = true;
        self
    }

    /// Make starting the given auxiliary task fail
    pub fn fail_aux(self, kind: AuxTaskKind) -> Self {
        self.shared.state.lock().faults.aux = Some(kind);
        self
    }

    /// Make publisher declaration fail
    pub fn fail_declare(self) -> Self {
        self.shared.state.lock().faults.declare = true;
        self
    }

    /// Make the `n`th put (1-based) fail
    pub fn fail_put_at(self, n: usize) -> Self {
        self.shared.state.lock().faults.put_at = Some(n);
        self
    }

    /// Publications so far as `(key, payload)`
    pub fn published(&self) -> Vec<(String, Vec<u8>)> {
        self.shared.state.lock().published.clone()
    }

    /// Text payloads published on `key`
    pub fn published_text(&self, key: &str) -> Vec<String> {
        self.shared
            .state
            .lock()
            .published
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, payload)| String::from_utf8_lossy(payload).into_owned())
            .collect()
    }

    /// Auxiliary tasks started so far
    pub fn aux_tasks(&self) -> Vec<AuxTaskRecord> {
        self.shared.state.lock().aux_tasks.clone()
    }

    /// Number of sessions opened
    pub fn sessions_opened(&self) -> u32 {
        self.shared.state.lock().sessions_open
    }

    /// Number of session releases
    pub fn closes(&self) -> u32 {
        self.shared.state.lock().closes
    }

    /// Block until every opened session has been released
    ///
    /// Returns false on timeout.
    pub fn wait_closed(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.state.lock();
        while state.sessions_open == 0 || state.closes < state.sessions_open {
            if self.shared.changed.wait_until(&mut state, deadline).timed_out() {
                return false;
            }
        }
        true
    }
}

impl Middleware for LoopbackMiddleware {
    type Session = LoopbackSession;

    fn open(&mut self, config: SessionConfig) -> Result<LoopbackSession> {
        let locator = config.connect().ok_or(Error::NotConnected)?;

        let mut state = self.shared.state.lock();
        if state.faults.open {
            return Err(Error::Transport);
        }
        state.sessions_open += 1;
        self.shared.changed.notify_all();

        info!(
            "[host] loopback session on {} ({} baud)",
            locator.address(),
            locator
                .baudrate()
                .map_or_else(|| "n/a".to_string(), |b| b.to_string())
        );

        Ok(LoopbackSession {
            shared: self.shared.clone(),
            open: true,
        })
    }
}

/// Loopback session
pub struct LoopbackSession {
    shared: Arc<Shared>,
    open: bool,
}

impl Session for LoopbackSession {
    type Publisher = LoopbackPublisher;

    fn start_aux_task(&mut self, kind: AuxTaskKind, attr: AuxTaskAttr) -> Result<()> {
        let mut state = self.shared.state.lock();
        if state.faults.aux == Some(kind) {
            return Err(Error::ResourceExhausted);
        }
        state.aux_tasks.push(AuxTaskRecord {
            kind,
            name: attr.name,
            priority: attr.priority,
            stack_depth: attr.stack_depth(),
        });
        Ok(())
    }

    fn declare_publisher(&self, key: &KeyExpr) -> Result<LoopbackPublisher> {
        if !self.open {
            return Err(Error::NotConnected);
        }
        if self.shared.state.lock().faults.declare {
            return Err(Error::InvalidParameter);
        }
        Ok(LoopbackPublisher {
            shared: self.shared.clone(),
            key: key.as_str().to_string(),
        })
    }

    fn close(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        self.shared.state.lock().closes += 1;
        self.shared.changed.notify_all();
    }
}

/// Loopback publisher
pub struct LoopbackPublisher {
    shared: Arc<Shared>,
    key: String,
}

impl Publisher for LoopbackPublisher {
    fn put(&self, payload: &[u8]) -> Result<()> {
        let mut state = self.shared.state.lock();
        state.puts += 1;
        if state.faults.put_at == Some(state.puts) {
            return Err(Error::Transport);
        }
        state.published.push((self.key.clone(), payload.to_vec()));
        self.shared.changed.notify_all();
        Ok(())
    }
}
