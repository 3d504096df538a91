// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::{edge::EdgeConfig, session::ProcessingSession};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Host-facing call surface of the native pipeline.
///
/// The host creates one bridge when its camera session starts and hands it to
/// every thread that needs it. The bridge lazily builds a
/// [`ProcessingSession`] on first use; [`NativeBridge::release`] discards it
/// and the next call starts over with fresh state.
///
/// The session slot has its own lock, separate from the session's state lock,
/// so concurrent first calls construct exactly one session. A frame that is
/// mid-flight during `release` keeps its session alive until it returns.
///
/// # Example
///
/// ```
/// use edge_viewer::{bridge::NativeBridge, image::nv21_from_luma};
///
/// let bridge = NativeBridge::new();
/// bridge.ensure_configured(32, 24);
/// bridge.set_mode(true);
///
/// let frame = nv21_from_luma(32, 24, |_, _| 128);
/// let rgba = bridge.process_frame(Some(&frame), 32, 24, 0);
/// // A flat field has no edges.
/// assert!(rgba.chunks_exact(4).all(|px| px == [0, 0, 0, 255]));
///
/// bridge.release();
/// assert!(bridge.process_frame(None, 32, 24, 0).is_empty());
/// ```
#[derive(Debug, Default)]
pub struct NativeBridge {
    session: Mutex<Option<Arc<ProcessingSession>>>,
    configured_size: Mutex<Option<(i32, i32)>>,
    config: EdgeConfig,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl NativeBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sessions created by this bridge use `config` for edge detection.
    pub fn with_config(config: EdgeConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Returns the live session, creating it if needed.
    pub fn session(&self) -> Arc<ProcessingSession> {
        let mut slot = lock(&self.session);
        slot.get_or_insert_with(|| {
            debug!("creating processing session");
            Arc::new(ProcessingSession::with_config(self.config))
        })
        .clone()
    }

    /// Whether a session currently exists.
    pub fn is_active(&self) -> bool {
        lock(&self.session).is_some()
    }

    pub fn configure(&self, width: i32, height: i32) {
        self.session().configure(width, height);
    }

    /// Forwards to [`NativeBridge::configure`] only when the size differs
    /// from the last one sent through this bridge.
    pub fn ensure_configured(&self, width: i32, height: i32) {
        let mut cached = lock(&self.configured_size);
        if *cached != Some((width, height)) {
            self.configure(width, height);
            *cached = Some((width, height));
        }
    }

    /// Processes one camera frame.
    ///
    /// `frame` is `None` when the host had no payload to hand over. The
    /// capture timestamp is accepted for interface parity and not used.
    pub fn process_frame(
        &self,
        frame: Option<&[u8]>,
        width: i32,
        height: i32,
        _timestamp_ns: i64,
    ) -> Vec<u8> {
        let Some(frame) = frame else {
            debug!("frame dropped: missing payload");
            return Vec::new();
        };
        self.session().process(frame, width, height)
    }

    pub fn set_mode(&self, edge_mode: bool) {
        self.session().set_mode(edge_mode);
    }

    /// Drops the session and forgets the cached configuration.
    pub fn release(&self) {
        let released = lock(&self.session).take();
        *lock(&self.configured_size) = None;
        if released.is_some() {
            info!("native pipeline released");
        }
    }
}
