// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Scoped ownership of the session and its publisher
//!
//! `SessionGuard` closes the session when dropped, so every exit path of the
//! telemetry task releases it exactly once. `DeclaredPublisher` borrows the
//! guard: a publisher cannot outlive the session it was declared on.

use core::marker::PhantomData;

use log::debug;

use crate::config::KeyExpr;
use crate::error::Result;
use crate::middleware::{AuxTaskAttr, AuxTaskKind, Publisher, Session};

/// Owned session, closed on drop
pub struct SessionGuard<S: Session> {
    session: S,
}

impl<S: Session> SessionGuard<S> {
    /// Take ownership of an open session
    pub fn new(session: S) -> Self {
        Self { session }
    }

    /// Start an auxiliary task on the session
    pub fn start_aux_task(&mut self, kind: AuxTaskKind, attr: AuxTaskAttr) -> Result<()> {
        self.session.start_aux_task(kind, attr)
    }

    /// Declare a publisher bound to this session
    pub fn declare_publisher(&self, key: KeyExpr) -> Result<DeclaredPublisher<'_, S>> {
        let publisher = self.session.declare_publisher(&key)?;
        Ok(DeclaredPublisher {
            publisher,
            key,
            _session: PhantomData,
        })
    }
}

impl<S: Session> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        debug!("[telemetry] releasing session");
        self.session.close();
    }
}

/// Publisher borrowed from a live session
pub struct DeclaredPublisher<'s, S: Session> {
    publisher: S::Publisher,
    key: KeyExpr,
    _session: PhantomData<&'s SessionGuard<S>>,
}

impl<S: Session> DeclaredPublisher<'_, S> {
    /// Key expression the publisher is bound to
    pub fn key_expr(&self) -> &KeyExpr {
        &self.key
    }

    /// Publish one payload
    pub fn put(&self, payload: &[u8]) -> Result<()> {
        self.publisher.put(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingSession {
        closes: Rc<Cell<u32>>,
    }

    struct NullPublisher;

    impl Publisher for NullPublisher {
        fn put(&self, _payload: &[u8]) -> Result<()> {
            Ok(())
        }
    }

    impl Session for CountingSession {
        type Publisher = NullPublisher;

        fn start_aux_task(&mut self, _kind: AuxTaskKind, _attr: AuxTaskAttr) -> Result<()> {
            Err(Error::ResourceExhausted)
        }

        fn declare_publisher(&self, _key: &KeyExpr) -> Result<NullPublisher> {
            Ok(NullPublisher)
        }

        fn close(&mut self) {
            self.closes.set(self.closes.get() + 1);
        }
    }

    #[test]
    fn test_guard_closes_once_on_drop() {
        let closes = Rc::new(Cell::new(0));
        {
            let guard = SessionGuard::new(CountingSession {
                closes: closes.clone(),
            });
            let publisher = guard
                .declare_publisher(KeyExpr::new("demo/example/pos").unwrap())
                .unwrap();
            assert_eq!(publisher.key_expr().as_str(), "demo/example/pos");
            publisher.put(b"1: 0,0").unwrap();
            assert_eq!(closes.get(), 0);
        }
        assert_eq!(closes.get(), 1);
    }
}
