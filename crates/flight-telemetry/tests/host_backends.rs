// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! End-to-end runs of the telemetry task on the host backends

use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use flight_telemetry::host::{AuxTaskRecord, LoopbackMiddleware, MemoryRegistry, StdScheduler};
use flight_telemetry::middleware::AuxTaskMemory;
use flight_telemetry::{
    telemetry_init, AuxMemory, AuxTaskKind, Error, Priority, Scheduler, SentCounter, TaskHandle,
    TelemetryConfig,
};

const TOPIC: &str = "demo/example/pos";
const TIMEOUT: Duration = Duration::from_secs(5);

fn leak_memory() -> AuxMemory {
    AuxMemory {
        read: Box::leak(Box::new(AuxTaskMemory::new())),
        lease: Box::leak(Box::new(AuxTaskMemory::new())),
    }
}

fn leak_counter() -> &'static SentCounter {
    Box::leak(Box::new(SentCounter::new()))
}

fn stabilizer(pitch: f32, roll: f32) -> MemoryRegistry {
    let registry = MemoryRegistry::new();
    registry.define_float("stabilizer", "pitch", pitch).unwrap();
    registry.define_float("stabilizer", "roll", roll).unwrap();
    registry
}

#[test]
fn test_publishes_until_send_fails() {
    let _ = env_logger::builder().is_test(true).try_init();

    let scheduler = StdScheduler::new();
    let registry = stabilizer(12.4, -7.8);
    let middleware = LoopbackMiddleware::new().fail_put_at(4);
    let config = TelemetryConfig::default().with_publish_period_ms(5);

    let handle = telemetry_init(
        &scheduler,
        registry.clone(),
        middleware.clone(),
        config,
        AuxMemory::take_static().unwrap(),
        leak_counter(),
    )
    .unwrap();

    assert!(middleware.wait_closed(TIMEOUT));
    assert!(scheduler.join(handle));

    assert_eq!(
        middleware.published_text(TOPIC),
        vec!["1: 12,-7", "2: 12,-7", "3: 12,-7"]
    );
    assert_eq!(middleware.closes(), 1);
    assert_eq!(registry.read_u16("zenoh", "sent"), Some(3));
    assert_eq!(
        middleware.aux_tasks(),
        vec![
            AuxTaskRecord {
                kind: AuxTaskKind::Read,
                name: "ZenohReadTask",
                priority: Priority(10),
                stack_depth: 500,
            },
            AuxTaskRecord {
                kind: AuxTaskKind::Lease,
                name: "ZenohLeaseTask",
                priority: Priority(10),
                stack_depth: 500,
            },
        ]
    );
}

/// Scheduler whose sleeps block until the test opens the gate
#[derive(Clone)]
struct GatedScheduler {
    inner: StdScheduler,
    gate: Arc<Mutex<mpsc::Receiver<()>>>,
}

impl GatedScheduler {
    fn new() -> (Self, mpsc::Sender<()>) {
        let (open, gate) = mpsc::channel();
        let scheduler = Self {
            inner: StdScheduler::new(),
            gate: Arc::new(Mutex::new(gate)),
        };
        (scheduler, open)
    }
}

impl Scheduler for GatedScheduler {
    fn spawn<F>(
        &self,
        name: &'static str,
        stack_depth: usize,
        priority: Priority,
        entry: F,
    ) -> flight_telemetry::Result<TaskHandle>
    where
        F: FnOnce() + Send + 'static,
    {
        self.inner.spawn(name, stack_depth, priority, entry)
    }

    fn sleep_ms(&self, _ms: u32) {
        let _ = self.gate.lock().unwrap().recv_timeout(TIMEOUT);
    }
}

fn wait_published(middleware: &LoopbackMiddleware, count: usize) {
    let deadline = Instant::now() + TIMEOUT;
    while middleware.published().len() < count && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn test_samples_are_read_fresh() {
    let (scheduler, open_gate) = GatedScheduler::new();
    let registry = MemoryRegistry::new();
    let pitch = registry.define_float("stabilizer", "pitch", 0.0).unwrap();
    registry.define_float("stabilizer", "roll", 0.0).unwrap();
    let middleware = LoopbackMiddleware::new().fail_put_at(3);

    let handle = telemetry_init(
        &scheduler,
        registry.clone(),
        middleware.clone(),
        TelemetryConfig::default(),
        leak_memory(),
        leak_counter(),
    )
    .unwrap();

    // Task is parked in its first sleep until the gate opens
    wait_published(&middleware, 1);
    registry.set_float(pitch, -3.9);
    open_gate.send(()).unwrap();

    wait_published(&middleware, 2);
    open_gate.send(()).unwrap();

    assert!(middleware.wait_closed(TIMEOUT));
    assert!(scheduler.inner.join(handle));
    assert_eq!(middleware.published_text(TOPIC), vec!["1: 0,0", "2: -3,0"]);
}

#[test]
fn test_init_retried_after_invalid_config() {
    let scheduler = StdScheduler::new();
    let registry = stabilizer(1.0, 1.0);
    let middleware = LoopbackMiddleware::new().fail_put_at(1);
    let sent = leak_counter();

    let first = telemetry_init(
        &scheduler,
        registry.clone(),
        middleware.clone(),
        TelemetryConfig::default().with_connect("usart"),
        leak_memory(),
        sent,
    );
    assert_eq!(first, Err(Error::InvalidParameter));
    assert_eq!(registry.read_u16("zenoh", "sent"), None);

    let handle = telemetry_init(
        &scheduler,
        registry.clone(),
        middleware.clone(),
        TelemetryConfig::default(),
        leak_memory(),
        sent,
    )
    .unwrap();

    assert!(scheduler.join(handle));
    assert_eq!(middleware.sessions_opened(), 1);
    assert_eq!(registry.read_u16("zenoh", "sent"), Some(0));
}

#[test]
fn test_open_failure_publishes_nothing() {
    let scheduler = StdScheduler::new();
    let registry = stabilizer(1.0, 1.0);
    let middleware = LoopbackMiddleware::new().fail_open();

    let handle = telemetry_init(
        &scheduler,
        registry.clone(),
        middleware.clone(),
        TelemetryConfig::default(),
        leak_memory(),
        leak_counter(),
    )
    .unwrap();

    assert!(scheduler.join(handle));
    assert_eq!(middleware.sessions_opened(), 0);
    assert!(middleware.aux_tasks().is_empty());
    assert!(middleware.published().is_empty());
    assert_eq!(middleware.closes(), 0);
    assert_eq!(registry.read_u16("zenoh", "sent"), Some(0));
}

#[test]
fn test_lease_failure_releases_session() {
    let scheduler = StdScheduler::new();
    let middleware = LoopbackMiddleware::new().fail_aux(AuxTaskKind::Lease);

    let handle = telemetry_init(
        &scheduler,
        stabilizer(1.0, 1.0),
        middleware.clone(),
        TelemetryConfig::default(),
        leak_memory(),
        leak_counter(),
    )
    .unwrap();

    assert!(scheduler.join(handle));
    assert_eq!(middleware.aux_tasks().len(), 1);
    assert_eq!(middleware.closes(), 1);
    assert!(middleware.published().is_empty());
}

#[test]
fn test_declare_failure_releases_session() {
    let scheduler = StdScheduler::new();
    let middleware = LoopbackMiddleware::new().fail_declare();

    let handle = telemetry_init(
        &scheduler,
        stabilizer(1.0, 1.0),
        middleware.clone(),
        TelemetryConfig::default(),
        leak_memory(),
        leak_counter(),
    )
    .unwrap();

    assert!(scheduler.join(handle));
    assert_eq!(middleware.closes(), 1);
    assert!(middleware.published().is_empty());
}

#[test]
fn test_missing_variables_release_session() {
    let scheduler = StdScheduler::new();
    let middleware = LoopbackMiddleware::new();

    let handle = telemetry_init(
        &scheduler,
        MemoryRegistry::new(),
        middleware.clone(),
        TelemetryConfig::default(),
        leak_memory(),
        leak_counter(),
    )
    .unwrap();

    assert!(scheduler.join(handle));
    assert_eq!(middleware.closes(), 1);
    assert!(middleware.published().is_empty());
}

#[test]
fn test_invalid_config_not_spawned() {
    let scheduler = StdScheduler::new();

    let result = telemetry_init(
        &scheduler,
        MemoryRegistry::new(),
        LoopbackMiddleware::new(),
        TelemetryConfig::default().with_connect("usart"),
        leak_memory(),
        leak_counter(),
    );

    assert_eq!(result, Err(Error::InvalidParameter));
}
