// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::{
    edge::{apply_edge_filter, EdgeConfig},
    error::FrameError,
    image::{nv21_to_rgba, FrameGeometry},
};
use core::fmt;
use std::{
    str::FromStr,
    sync::{Mutex, MutexGuard, PoisonError},
    time::Instant,
};
use tracing::{debug, info, trace};

/// What `process` produces for each frame.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ProcessingMode {
    /// Replace the frame by its edge map
    #[default]
    Edge,
    /// Colour converted frame, unfiltered
    Passthrough,
}

impl ProcessingMode {
    /// Maps the boolean flag used across the host boundary.
    pub fn from_edge_flag(edge_mode: bool) -> Self {
        if edge_mode {
            ProcessingMode::Edge
        } else {
            ProcessingMode::Passthrough
        }
    }

    pub fn is_edge(&self) -> bool {
        *self == ProcessingMode::Edge
    }

    pub fn toggled(&self) -> Self {
        match self {
            ProcessingMode::Edge => ProcessingMode::Passthrough,
            ProcessingMode::Passthrough => ProcessingMode::Edge,
        }
    }
}

impl fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProcessingMode::Edge => write!(f, "edge"),
            ProcessingMode::Passthrough => write!(f, "raw"),
        }
    }
}

impl FromStr for ProcessingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "edge" => Ok(ProcessingMode::Edge),
            "raw" | "passthrough" => Ok(ProcessingMode::Passthrough),
            other => Err(format!("unknown processing mode '{other}'")),
        }
    }
}

/// Mutable state shared by every caller of a session.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    pub mode: ProcessingMode,
    pub configured_width: i32,
    pub configured_height: i32,
}

/// Serialises access to the session state and runs the per-frame pipeline.
///
/// A single mutex guards the state and is held for the whole of every
/// `process` call, so frames never interleave and a mode change lands either
/// entirely before or entirely after a given frame.
///
/// # Example
///
/// ```
/// use edge_viewer::{image::nv21_from_luma, session::ProcessingSession};
///
/// let session = ProcessingSession::new();
/// session.set_mode(false);
///
/// let frame = nv21_from_luma(64, 48, |x, _| (x * 4) as u8);
/// let rgba = session.process(&frame, 64, 48);
/// assert_eq!(rgba.len(), 64 * 48 * 4);
///
/// // Malformed input yields no output rather than an error.
/// assert!(session.process(&frame, 0, 48).is_empty());
/// ```
#[derive(Debug, Default)]
pub struct ProcessingSession {
    state: Mutex<SessionState>,
    config: EdgeConfig,
}

impl ProcessingSession {
    /// Creates a session in edge mode with no configured dimensions.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EdgeConfig) -> Self {
        Self {
            state: Mutex::new(SessionState::default()),
            config,
        }
    }

    pub fn config(&self) -> &EdgeConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        // The state is plain data, a panicking holder cannot leave it torn.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records the frame size the host expects to send.
    ///
    /// The values are advisory and never validated; `process` always uses
    /// its own explicit geometry.
    pub fn configure(&self, width: i32, height: i32) {
        let mut state = self.lock();
        state.configured_width = width;
        state.configured_height = height;
        info!("configured {}x{}", width, height);
    }

    /// Selects edge (`true`) or passthrough (`false`) output for subsequent
    /// frames.
    pub fn set_mode(&self, edge_mode: bool) {
        self.set_processing_mode(ProcessingMode::from_edge_flag(edge_mode));
    }

    pub fn set_processing_mode(&self, mode: ProcessingMode) {
        let mut state = self.lock();
        if state.mode != mode {
            debug!("processing mode {} -> {}", state.mode, mode);
        }
        state.mode = mode;
    }

    /// Flips the mode and returns the new one.
    pub fn toggle_mode(&self) -> ProcessingMode {
        let mut state = self.lock();
        state.mode = state.mode.toggled();
        debug!("processing mode toggled to {}", state.mode);
        state.mode
    }

    pub fn mode(&self) -> ProcessingMode {
        self.lock().mode
    }

    pub fn configured_size(&self) -> (i32, i32) {
        let state = self.lock();
        (state.configured_width, state.configured_height)
    }

    /// Snapshot of the whole state taken under the lock.
    pub fn state(&self) -> SessionState {
        *self.lock()
    }

    /// Converts one NV21 frame, reporting why a frame was rejected.
    pub fn try_process(&self, nv21: &[u8], width: i32, height: i32) -> Result<Vec<u8>, FrameError> {
        let state = self.lock();
        let geometry = FrameGeometry::for_nv21(width, height, nv21.len())?;

        let start = Instant::now();
        let mut rgba = nv21_to_rgba(nv21, geometry.width(), geometry.height());
        if state.mode.is_edge() {
            rgba = apply_edge_filter(&rgba, geometry.width(), geometry.height(), &self.config);
        }
        trace!(
            "processed {} frame in {:?} mode {}",
            geometry,
            start.elapsed(),
            state.mode
        );

        drop(state);
        Ok(rgba)
    }

    /// Converts one NV21 frame to RGBA, replacing it by its edge map in edge
    /// mode.
    ///
    /// Returns an empty buffer when the geometry is non-positive, the buffer
    /// is empty, or the buffer is too small for the geometry. Callers treat an
    /// empty result as "no update this frame".
    pub fn process(&self, nv21: &[u8], width: i32, height: i32) -> Vec<u8> {
        match self.try_process(nv21, width, height) {
            Ok(rgba) => rgba,
            Err(e) => {
                debug!("frame dropped: {}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::nv21_from_luma;

    #[test]
    fn test_initial_state() {
        let session = ProcessingSession::new();
        assert_eq!(
            session.state(),
            SessionState {
                mode: ProcessingMode::Edge,
                configured_width: 0,
                configured_height: 0,
            }
        );
        assert_eq!(session.config(), &EdgeConfig::default());
    }

    #[test]
    fn test_configure_stores_without_validation() {
        let session = ProcessingSession::new();
        session.configure(-5, 0);
        assert_eq!(session.configured_size(), (-5, 0));
        session.configure(1280, 720);
        assert_eq!(session.configured_size(), (1280, 720));
    }

    #[test]
    fn test_mode_transitions() {
        let session = ProcessingSession::new();
        session.set_mode(false);
        assert_eq!(session.mode(), ProcessingMode::Passthrough);
        session.set_mode(false);
        assert_eq!(session.mode(), ProcessingMode::Passthrough);
        assert_eq!(session.toggle_mode(), ProcessingMode::Edge);
        assert_eq!(session.toggle_mode(), ProcessingMode::Passthrough);
        session.set_mode(true);
        assert_eq!(session.mode(), ProcessingMode::Edge);
    }

    #[test]
    fn test_mode_parse_and_display() {
        assert_eq!("edge".parse::<ProcessingMode>(), Ok(ProcessingMode::Edge));
        assert_eq!("RAW".parse::<ProcessingMode>(), Ok(ProcessingMode::Passthrough));
        assert_eq!(
            "passthrough".parse::<ProcessingMode>(),
            Ok(ProcessingMode::Passthrough)
        );
        assert!("sepia".parse::<ProcessingMode>().is_err());
        assert_eq!(ProcessingMode::Edge.to_string(), "edge");
        assert_eq!(ProcessingMode::Passthrough.to_string(), "raw");
    }

    #[test]
    fn test_try_process_reports_reason() {
        let session = ProcessingSession::new();
        let frame = nv21_from_luma(8, 8, |_, _| 50);
        assert!(matches!(
            session.try_process(&frame[..10], 8, 8),
            Err(FrameError::BufferTooSmall { len: 10, required: 96 })
        ));
        assert!(matches!(
            session.try_process(&[], 8, 8),
            Err(FrameError::NullInput)
        ));
        assert!(matches!(
            session.try_process(&frame, 8, -1),
            Err(FrameError::InvalidGeometry { width: 8, height: -1 })
        ));
        assert_eq!(session.try_process(&frame, 8, 8).unwrap().len(), 256);
    }

    #[test]
    fn test_lock_survives_poisoning() {
        let session = std::sync::Arc::new(ProcessingSession::new());
        let poisoner = session.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.state.lock().unwrap();
            panic!("poison the session lock");
        })
        .join();

        session.set_mode(false);
        assert_eq!(session.mode(), ProcessingMode::Passthrough);
        let frame = nv21_from_luma(4, 4, |_, _| 128);
        assert_eq!(session.process(&frame, 4, 4).len(), 64);
    }
}
