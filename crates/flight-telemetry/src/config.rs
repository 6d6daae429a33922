// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Session and task configuration
//!
//! `TelemetryConfig` is the static description of the telemetry task. Its
//! defaults reproduce the flight-controller build: serial link at 38400 baud,
//! topic `demo/example/pos`, stabilizer pitch/roll, 300 ms period.
//!
//! String-valued options are validated into fixed-capacity types
//! (`Locator`, `KeyExpr`) when the task is built, never grown on the heap.

use heapless::String;

use crate::error::{Error, Result};
use crate::scheduler::Priority;

/// Maximum locator length (bytes)
pub const MAX_LOCATOR_LEN: usize = 64;

/// Maximum key expression length (bytes)
pub const MAX_KEYEXPR_LEN: usize = 64;

/// Default connect locator: serial transport on the USART at 38400 baud
pub const DEFAULT_CONNECT: &str = "serial/usart#baudrate=38400";

/// Default publication key expression
pub const DEFAULT_TOPIC: &str = "demo/example/pos";

/// Default publish period (milliseconds)
pub const DEFAULT_PUBLISH_PERIOD_MS: u32 = 300;

/// Default stack depth (words) for the telemetry task and auxiliary tasks
pub const DEFAULT_STACK_DEPTH: usize = 500;

/// Transport locator, e.g. `serial/usart#baudrate=38400`
///
/// Format: `<protocol>/<address>[#<key>=<value>[;<key>=<value>...]]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    text: String<MAX_LOCATOR_LEN>,
}

impl Locator {
    /// Parse and validate a locator
    pub fn parse(s: &str) -> Result<Self> {
        let (endpoint, metadata) = match s.split_once('#') {
            Some((endpoint, metadata)) => (endpoint, Some(metadata)),
            None => (s, None),
        };

        let (protocol, address) = endpoint.split_once('/').ok_or(Error::InvalidParameter)?;
        if protocol.is_empty()
            || address.is_empty()
            || !protocol.bytes().all(|b| b.is_ascii_alphanumeric())
        {
            return Err(Error::InvalidParameter);
        }

        if let Some(metadata) = metadata {
            for entry in metadata.split(';') {
                match entry.split_once('=') {
                    Some((key, _)) if !key.is_empty() => {}
                    _ => return Err(Error::InvalidParameter),
                }
            }
        }

        let mut text = String::new();
        text.push_str(s).map_err(|_| Error::InvalidParameter)?;
        Ok(Self { text })
    }

    /// Full locator text
    pub fn as_str(&self) -> &str {
        &self.text
    }

    fn endpoint(&self) -> &str {
        self.text.split('#').next().unwrap_or("")
    }

    /// Transport protocol (`serial`, `tcp`, ...)
    pub fn protocol(&self) -> &str {
        self.endpoint().split('/').next().unwrap_or("")
    }

    /// Transport address (device name, host:port, ...)
    pub fn address(&self) -> &str {
        self.endpoint()
            .split_once('/')
            .map(|(_, address)| address)
            .unwrap_or("")
    }

    /// Look up a metadata value by key
    pub fn metadata(&self, key: &str) -> Option<&str> {
        let (_, metadata) = self.text.split_once('#')?;
        metadata
            .split(';')
            .filter_map(|entry| entry.split_once('='))
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    /// Serial baud rate, if the locator carries one
    pub fn baudrate(&self) -> Option<u32> {
        self.metadata("baudrate")?.parse().ok()
    }
}

/// Publication key expression (topic)
///
/// Chunks are separated by `/`; no chunk may be empty and the reserved
/// characters `#`, `?` and `$` are rejected. Publication keys are concrete,
/// so wildcard chunks (`*`, `**`, `a*`) are rejected too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyExpr {
    text: String<MAX_KEYEXPR_LEN>,
}

impl KeyExpr {
    /// Validate a key expression
    pub fn new(s: &str) -> Result<Self> {
        if s.is_empty() || s.split('/').any(|chunk| chunk.is_empty()) {
            return Err(Error::InvalidParameter);
        }
        if s.contains(['#', '?', '$', '*']) {
            return Err(Error::InvalidParameter);
        }

        let mut text = String::new();
        text.push_str(s).map_err(|_| Error::InvalidParameter)?;
        Ok(Self { text })
    }

    /// Key expression text
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// Middleware session configuration
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionConfig {
    connect: Option<Locator>,
}

impl SessionConfig {
    /// Set the connect locator (replaces any previous value)
    pub fn insert_connect(&mut self, locator: Locator) {
        self.connect = Some(locator);
    }

    /// Configured connect locator
    pub fn connect(&self) -> Option<&Locator> {
        self.connect.as_ref()
    }
}

/// Log variable name: `(group, name)` as registered by the firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarName {
    /// Log group
    pub group: &'static str,
    /// Variable name within the group
    pub name: &'static str,
}

impl VarName {
    /// Create a variable name
    pub const fn new(group: &'static str, name: &'static str) -> Self {
        Self { group, name }
    }
}

/// Telemetry task configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Connect locator handed to the session
    pub connect: &'static str,

    /// Key expression the records are published on
    pub topic: &'static str,

    /// Delay between two publications (milliseconds)
    pub publish_period_ms: u32,

    /// Pitch log variable
    pub pitch: VarName,

    /// Roll log variable
    pub roll: VarName,

    /// Telemetry task name
    pub task_name: &'static str,

    /// Telemetry task stack depth (words)
    pub task_stack_depth: usize,

    /// Telemetry task priority
    pub task_priority: Priority,

    /// Middleware read task name
    pub read_task_name: &'static str,

    /// Middleware lease task name
    pub lease_task_name: &'static str,

    /// Priority of the read and lease tasks
    pub aux_priority: Priority,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            connect: DEFAULT_CONNECT,
            topic: DEFAULT_TOPIC,
            publish_period_ms: DEFAULT_PUBLISH_PERIOD_MS,
            pitch: VarName::new("stabilizer", "pitch"),
            roll: VarName::new("stabilizer", "roll"),
            task_name: "zenoh",
            task_stack_depth: DEFAULT_STACK_DEPTH,
            task_priority: Priority::IDLE,
            read_task_name: "ZenohReadTask",
            lease_task_name: "ZenohLeaseTask",
            aux_priority: Priority(10),
        }
    }
}

impl TelemetryConfig {
    /// Create default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Use another connect locator
    pub fn with_connect(mut self, connect: &'static str) -> Self {
        self.connect = connect;
        self
    }

    /// Publish on another key expression
    pub fn with_topic(mut self, topic: &'static str) -> Self {
        self.topic = topic;
        self
    }

    /// Change the publish period
    pub fn with_publish_period_ms(mut self, period_ms: u32) -> Self {
        self.publish_period_ms = period_ms;
        self
    }

    /// Sample other log variables
    pub fn with_vars(mut self, pitch: VarName, roll: VarName) -> Self {
        self.pitch = pitch;
        self.roll = roll;
        self
    }

    /// Build the session configuration (default config + connect locator)
    pub fn session_config(&self) -> Result<SessionConfig> {
        let mut config = SessionConfig::default();
        config.insert_connect(Locator::parse(self.connect)?);
        Ok(config)
    }

    /// Validated publication key expression
    pub fn key_expr(&self) -> Result<KeyExpr> {
        KeyExpr::new(self.topic)
    }

    /// Check every string-valued option
    pub fn validate(&self) -> Result<()> {
        self.session_config()?;
        self.key_expr()?;
        if self.task_stack_depth == 0 || self.task_name.is_empty() {
            return Err(Error::InvalidParameter);
        }
        Ok(())
    }
}
