// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Host Loopback Example
//!
//! Runs the telemetry task on OS threads against a simulated stabilizer and a
//! loopback session, then prints what was published.
//!
//! ## Usage
//!
//! ```sh
//! RUST_LOG=debug cargo run --example host_loopback --features std
//! ```

use std::thread;
use std::time::Duration;

use flight_telemetry::host::{LoopbackMiddleware, MemoryRegistry, StdScheduler};
use flight_telemetry::{telemetry_init, AuxMemory, Result, TelemetryConfig, SENT};

/// Number of records to publish before the loopback link drops
const RECORDS: usize = 10;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    println!("[T]  Flight Telemetry - Host Loopback");
    println!("=====================================\n");

    let registry = MemoryRegistry::new();
    let pitch = registry.define_float("stabilizer", "pitch", 0.0)?;
    let roll = registry.define_float("stabilizer", "roll", 0.0)?;

    // Simulated stabilizer: slow oscillation on both axes
    let stabilizer = registry.clone();
    thread::spawn(move || {
        let mut t: f32 = 0.0;
        loop {
            stabilizer.set_float(pitch, 15.0 * t.sin());
            stabilizer.set_float(roll, -10.0 * (t * 0.7).cos());
            t += 0.05;
            thread::sleep(Duration::from_millis(20));
        }
    });

    let scheduler = StdScheduler::new();
    let middleware = LoopbackMiddleware::new().fail_put_at(RECORDS + 1);
    let config = TelemetryConfig::default();
    let topic = config.topic;

    let handle = telemetry_init(
        &scheduler,
        registry.clone(),
        middleware.clone(),
        config,
        AuxMemory::take_static()?,
        &SENT,
    )?;
    println!("[OK] Telemetry task spawned ({:?})\n", handle);

    scheduler.join(handle);

    println!("[*] Published on '{}':", topic);
    for record in middleware.published_text(topic) {
        println!("   {}", record);
    }
    println!(
        "\n[OK] zenoh.sent = {}",
        registry.read_u16("zenoh", "sent").unwrap_or(0)
    );

    Ok(())
}
