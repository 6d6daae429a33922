// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! TelemetryTask - periodic pitch/roll publisher
//!
//! # Lifecycle
//!
//! 1. Open a session on the configured locator
//! 2. Start the middleware read and lease tasks (static memory)
//! 3. Declare the publisher
//! 4. Resolve the pitch/roll log variables
//! 5. Loop: read samples, bump sequence, format, publish, sleep
//!
//! Any failure is logged and ends the task; the session guard releases the
//! session on the way out. There is no retry.

use core::convert::Infallible;
use core::fmt;

use log::{debug, error, info, warn};

use crate::config::{TelemetryConfig, VarName};
use crate::error::{Error, Result};
use crate::middleware::{AuxMemory, AuxTaskAttr, AuxTaskKind, Middleware};
use crate::record::{Record, Sample};
use crate::registry::{LogRegistry, SentCounter, VarId};
use crate::scheduler::{Scheduler, TaskHandle};
use crate::session::SessionGuard;
use crate::{SENT_GROUP, SENT_NAME};

/// Free-heap figure for diagnostics
struct FreeHeap(Option<usize>);

impl fmt::Display for FreeHeap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(bytes) => write!(f, "{}", bytes),
            None => write!(f, "n/a"),
        }
    }
}

/// Telemetry publisher task
///
/// Owns every collaborator it talks to; built once, then consumed by
/// [`TelemetryTask::run`].
///
/// # Example
///
/// ```ignore
/// let task = TelemetryTask::new(
///     TelemetryConfig::default(),
///     middleware,
///     registry,
///     scheduler,
///     AuxMemory::take_static()?,
///     &SENT,
/// )?;
/// let err = task.run().unwrap_err();
/// ```
pub struct TelemetryTask<M, R, S> {
    config: TelemetryConfig,
    middleware: M,
    registry: R,
    scheduler: S,
    memory: AuxMemory,
    sent: &'static SentCounter,
}

impl<M, R, S> TelemetryTask<M, R, S>
where
    M: Middleware,
    R: LogRegistry,
    S: Scheduler,
{
    /// Create a task
    ///
    /// Fails with `Error::InvalidParameter` if the configuration does not
    /// validate.
    pub fn new(
        config: TelemetryConfig,
        middleware: M,
        registry: R,
        scheduler: S,
        memory: AuxMemory,
        sent: &'static SentCounter,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            middleware,
            registry,
            scheduler,
            memory,
            sent,
        })
    }

    fn export_sent(&mut self) -> Result<()> {
        self.registry.register_u16(SENT_GROUP, SENT_NAME, self.sent)
    }

    /// Run the task until a failure ends it
    ///
    /// Never returns `Ok`.
    pub fn run(self) -> Result<Infallible> {
        let Self {
            config,
            mut middleware,
            registry,
            scheduler,
            memory,
            sent,
        } = self;

        debug!("[telemetry] init: {}", FreeHeap(scheduler.free_heap()));

        let session_config = config.session_config()?;
        let key = config.key_expr()?;

        debug!(
            "[telemetry] opening session on {}: {}",
            config.connect,
            FreeHeap(scheduler.free_heap())
        );

        let session = middleware.open(session_config).map_err(|e| {
            error!("[telemetry] unable to open session: {}", e);
            Error::SessionOpen
        })?;
        let mut session = SessionGuard::new(session);

        let AuxMemory { read, lease } = memory;
        let aux_tasks = [
            (AuxTaskKind::Read, config.read_task_name, read),
            (AuxTaskKind::Lease, config.lease_task_name, lease),
        ];
        for (kind, name, memory) in aux_tasks {
            let attr = AuxTaskAttr {
                name,
                priority: config.aux_priority,
                memory,
            };
            session.start_aux_task(kind, attr).map_err(|e| {
                error!("[telemetry] unable to start read and lease tasks ({} task: {})", kind, e);
                Error::AuxTaskStart(kind)
            })?;
        }

        debug!(
            "[telemetry] declaring publisher on {}: {}",
            key.as_str(),
            FreeHeap(scheduler.free_heap())
        );

        let publisher = session.declare_publisher(key).map_err(|e| {
            error!("[telemetry] unable to declare publisher: {}", e);
            Error::PublisherDeclare
        })?;

        debug!("[telemetry] start loop: {}", FreeHeap(scheduler.free_heap()));

        let pitch_id = resolve(&registry, config.pitch)?;
        let roll_id = resolve(&registry, config.roll)?;

        let mut seq = sent.get();
        loop {
            let sample = Sample {
                pitch: registry.get_float(pitch_id),
                roll: registry.get_float(roll_id),
            };

            seq = seq.wrapping_add(1);
            let text = Record::new(seq, sample).render()?;

            if let Err(e) = publisher.put(text.as_bytes()) {
                error!("[telemetry] unable to send message {}: {}", seq, e);
                return Err(Error::Publish);
            }
            sent.set(seq);

            scheduler.sleep_ms(config.publish_period_ms);
        }
    }
}

fn resolve<R: LogRegistry>(registry: &R, var: VarName) -> Result<VarId> {
    registry.var_id(var.group, var.name).ok_or_else(|| {
        error!("[telemetry] log variable not found: {}.{}", var.group, var.name);
        Error::VariableNotFound
    })
}

/// Create the telemetry task
///
/// Validates the configuration, exports `sent` as `zenoh.sent`, then spawns
/// the task with the configured name, stack depth and priority. An invalid
/// configuration exports nothing. A spawn failure is logged and reported as
/// `Error::TaskCreation`; nothing is retried.
pub fn telemetry_init<M, R, S>(
    scheduler: &S,
    registry: R,
    middleware: M,
    config: TelemetryConfig,
    memory: AuxMemory,
    sent: &'static SentCounter,
) -> Result<TaskHandle>
where
    M: Middleware + Send + 'static,
    R: LogRegistry + Send + 'static,
    S: Scheduler + Clone + Send + 'static,
{
    let name = config.task_name;
    let stack_depth = config.task_stack_depth;
    let priority = config.task_priority;
    let mut task =
        TelemetryTask::new(config, middleware, registry, scheduler.clone(), memory, sent)?;
    task.export_sent()?;

    let handle = scheduler
        .spawn(name, stack_depth, priority, move || {
            let Err(e) = task.run();
            warn!("[telemetry] task stopped: {}", e);
        })
        .map_err(|e| {
            error!("[telemetry] task creation failed: {}", e);
            Error::TaskCreation
        })?;

    info!("[telemetry] init done");
    Ok(handle)
}
