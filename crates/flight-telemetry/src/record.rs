// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Outgoing text record
//!
//! Wire format (ASCII): `"<seq>: <pitch>,<roll>"`, e.g. `"1: 12,-7"`.
//! Both angles are truncated toward zero, never rounded.

use core::fmt::Write;

use heapless::String;

use crate::error::{Error, Result};
use crate::RECORD_CAPACITY;

/// Rendered record text (fixed capacity)
pub type RecordText = String<RECORD_CAPACITY>;

/// One pitch/roll reading
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sample {
    /// Pitch (degrees)
    pub pitch: f32,
    /// Roll (degrees)
    pub roll: f32,
}

/// Record ready to be published
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record {
    /// Sequence number (1 for the first publication)
    pub seq: u16,
    /// Truncated pitch
    pub pitch: i32,
    /// Truncated roll
    pub roll: i32,
}

impl Record {
    /// Build a record from a sample
    ///
    /// `as` truncates toward zero; out-of-range values saturate and NaN
    /// becomes 0.
    pub fn new(seq: u16, sample: Sample) -> Self {
        Self {
            seq,
            pitch: sample.pitch as i32,
            roll: sample.roll as i32,
        }
    }

    /// Render into the fixed-capacity text buffer
    pub fn render(&self) -> Result<RecordText> {
        let mut text = RecordText::new();
        write!(text, "{}: {},{}", self.seq, self.pitch, self.roll)
            .map_err(|_| Error::BufferTooSmall)?;
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(seq: u16, pitch: f32, roll: f32) -> RecordText {
        Record::new(seq, Sample { pitch, roll }).render().unwrap()
    }

    #[test]
    fn test_render_format() {
        assert_eq!(render(1, 12.4, -7.8).as_str(), "1: 12,-7");
        assert_eq!(render(2, 12.6, -8.1).as_str(), "2: 12,-8");
    }

    #[test]
    fn test_truncates_toward_zero() {
        assert_eq!(render(1, 3.9, -3.9).as_str(), "1: 3,-3");
        assert_eq!(render(1, -0.9, 0.9).as_str(), "1: 0,0");
    }

    #[test]
    fn test_non_finite_values() {
        assert_eq!(render(7, f32::NAN, f32::INFINITY).as_str(), "7: 0,2147483647");
        assert_eq!(render(7, f32::NEG_INFINITY, 0.0).as_str(), "7: -2147483648,0");
    }

    #[test]
    fn test_worst_case_fits() {
        let text = render(u16::MAX, f32::MIN, f32::MIN);
        assert_eq!(text.as_str(), "65535: -2147483648,-2147483648");
        assert!(text.len() < RECORD_CAPACITY);
    }

    #[test]
    fn test_random_samples_match_pattern() {
        let mut rng = fastrand::Rng::with_seed(0x5eed);
        for _ in 0..1000 {
            let seq = rng.u16(..);
            let pitch = (rng.f32() - 0.5) * 360.0;
            let roll = (rng.f32() - 0.5) * 360.0;

            let text = render(seq, pitch, roll);
            let (head, tail) = text.split_once(": ").unwrap();
            let (p, r) = tail.split_once(',').unwrap();

            assert_eq!(head.parse::<u16>().unwrap(), seq);
            assert_eq!(p.parse::<i32>().unwrap(), pitch.trunc() as i32);
            assert_eq!(r.parse::<i32>().unwrap(), roll.trunc() as i32);
        }
    }
}
