// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for Flight Telemetry
//!
//! The first group of variants is terminal for the telemetry task: each one
//! names the lifecycle step that failed. The second group is what
//! collaborators (middleware backends, registries) report as the cause; the
//! task logs the cause and maps it onto the step.

use core::fmt;

use crate::middleware::AuxTaskKind;

/// Result type for Flight Telemetry operations
pub type Result<T> = core::result::Result<T, Error>;

/// Error type for Flight Telemetry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Session could not be opened (transport or handshake failure)
    SessionOpen,

    /// An auxiliary middleware task failed to start
    AuxTaskStart(AuxTaskKind),

    /// Publisher declaration failed
    PublisherDeclare,

    /// Publishing a record failed
    Publish,

    /// The scheduler refused to create the telemetry task
    TaskCreation,

    /// A log variable was not found in the registry
    VariableNotFound,

    /// Transport error
    Transport,

    /// Session is closed or was never established
    NotConnected,

    /// Resource exhausted (static memory already handed out, etc.)
    ResourceExhausted,

    /// Invalid parameter
    InvalidParameter,

    /// Buffer too small for operation
    BufferTooSmall,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::SessionOpen => write!(f, "Unable to open session"),
            Error::AuxTaskStart(kind) => write!(f, "Unable to start {} task", kind),
            Error::PublisherDeclare => write!(f, "Unable to declare publisher"),
            Error::Publish => write!(f, "Unable to send message"),
            Error::TaskCreation => write!(f, "Task creation failed"),
            Error::VariableNotFound => write!(f, "Log variable not found"),
            Error::Transport => write!(f, "Transport error"),
            Error::NotConnected => write!(f, "Session not connected"),
            Error::ResourceExhausted => write!(f, "Resource exhausted"),
            Error::InvalidParameter => write!(f, "Invalid parameter"),
            Error::BufferTooSmall => write!(f, "Buffer too small"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
