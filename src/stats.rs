// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::session::ProcessingMode;
use serde_json::{json, Value};

/// Frame rate estimate from capture timestamps.
///
/// Reports the instantaneous rate between consecutive frames and keeps a
/// rolling average over the last `window` samples.
#[derive(Debug, Clone)]
pub struct FpsMeter {
    last_timestamp_ns: i64,
    history: Vec<f64>,
    index: usize,
    filled: usize,
}

impl FpsMeter {
    pub fn new(window: usize) -> Self {
        Self {
            last_timestamp_ns: -1,
            history: vec![0.0; window.max(1)],
            index: 0,
            filled: 0,
        }
    }

    /// Feeds the next capture timestamp and returns the instantaneous rate.
    ///
    /// The first frame (or any frame following a non-positive timestamp)
    /// reports 0. Identical timestamps report 0 and going backwards never
    /// yields a negative rate.
    pub fn update(&mut self, timestamp_ns: i64) -> f64 {
        if self.last_timestamp_ns <= 0 {
            self.last_timestamp_ns = timestamp_ns;
            return 0.0;
        }
        let delta = timestamp_ns - self.last_timestamp_ns;
        self.last_timestamp_ns = timestamp_ns;

        let fps = match delta {
            0 => 0.0,
            d => (1_000_000_000.0 / d as f64).max(0.0),
        };

        self.history[self.index] = fps;
        self.index = (self.index + 1) % self.history.len();
        self.filled = (self.filled + 1).min(self.history.len());
        fps
    }

    /// Mean of the recorded rates, 0 before the second frame.
    pub fn average(&self) -> f64 {
        if self.filled == 0 {
            return 0.0;
        }
        self.history[..self.filled].iter().sum::<f64>() / self.filled as f64
    }

    pub fn reset(&mut self) {
        self.last_timestamp_ns = -1;
        self.history.iter_mut().for_each(|v| *v = 0.0);
        self.index = 0;
        self.filled = 0;
    }
}

impl Default for FpsMeter {
    fn default() -> Self {
        Self::new(30)
    }
}

/// Per-frame statistics the host shows next to the preview.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameMetadata {
    pub fps: f64,
    pub width: i32,
    pub height: i32,
    pub mode: ProcessingMode,
}

impl FrameMetadata {
    pub fn to_json(&self) -> Value {
        json!({
            "fps": self.fps,
            "width": self.width,
            "height": self.height,
            "mode": self.mode.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fps_first_frame_is_zero() {
        let mut meter = FpsMeter::new(4);
        assert_eq!(meter.update(1_000_000_000), 0.0);
        assert_eq!(meter.average(), 0.0);
    }

    #[test]
    fn test_fps_from_deltas() {
        let mut meter = FpsMeter::new(4);
        meter.update(1_000_000_000);
        assert!((meter.update(1_033_333_333) - 30.0).abs() < 0.01);
        assert!((meter.update(1_100_000_000) - 15.0).abs() < 0.01);
        assert!((meter.average() - 22.5).abs() < 0.01);
    }

    #[test]
    fn test_fps_degenerate_deltas() {
        let mut meter = FpsMeter::new(4);
        meter.update(5_000);
        assert_eq!(meter.update(5_000), 0.0);
        assert_eq!(meter.update(4_000), 0.0);
    }

    #[test]
    fn test_fps_non_positive_start() {
        let mut meter = FpsMeter::new(4);
        assert_eq!(meter.update(0), 0.0);
        // Previous timestamp was not positive, so this is treated as first.
        assert_eq!(meter.update(100), 0.0);
        assert!((meter.update(100 + 50_000_000) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_fps_window_rolls() {
        let mut meter = FpsMeter::new(2);
        let mut ts = 1_000_000_000;
        meter.update(ts);
        for step in [100_000_000, 100_000_000, 50_000_000, 50_000_000] {
            ts += step;
            meter.update(ts);
        }
        assert!((meter.average() - 20.0).abs() < 1e-9);

        meter.reset();
        assert_eq!(meter.average(), 0.0);
        assert_eq!(meter.update(ts), 0.0);
    }

    #[test]
    fn test_metadata_json() {
        let meta = FrameMetadata {
            fps: 14.5,
            width: 1280,
            height: 720,
            mode: ProcessingMode::Passthrough,
        };
        assert_eq!(
            meta.to_json(),
            json!({"fps": 14.5, "width": 1280, "height": 720, "mode": "raw"})
        );
    }
}
