// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! # Edge Viewer Native Library
//!
//! This library is the native half of a camera edge viewer. It turns raw NV21
//! camera preview frames into displayable RGBA frames, optionally replaced by
//! their edge map, at interactive frame rates.
//!
//! ## Features
//!
//! - **Colour Conversion**: BT.601 NV21 to RGBA with 2x2 chroma sharing,
//!   plus packing of strided YUV_420_888 planes into NV21.
//! - **Edge Detection**: Sobel gradients, non-maximum suppression and
//!   two-threshold hysteresis producing an opaque black and white map.
//! - **Thread-Safe Sessions**: Mode and configuration can be changed from any
//!   thread while frames are being processed; each frame sees one mode.
//! - **Defined Failure**: Malformed frames produce an empty output instead of
//!   an error or a crash.
//!
//! ## Example
//!
//! ```
//! use edge_viewer::{bridge::NativeBridge, image::nv21_from_luma};
//!
//! // Owned by the host for the lifetime of its camera session
//! let bridge = NativeBridge::new();
//! bridge.ensure_configured(640, 480);
//!
//! // Passthrough: colour conversion only
//! bridge.set_mode(false);
//! let frame = nv21_from_luma(640, 480, |x, y| ((x + y) % 256) as u8);
//! let rgba = bridge.process_frame(Some(&frame), 640, 480, 0);
//! assert_eq!(rgba.len(), 640 * 480 * 4);
//!
//! bridge.release();
//! ```
//!
//! ## Concurrency
//!
//! Every operation runs to completion on the calling thread. A
//! [`session::ProcessingSession`] serialises whole frames behind one lock, so
//! concurrent `process` calls queue rather than run in parallel.

pub mod bridge;
pub mod edge;
pub mod error;
pub mod image;
pub mod session;
pub mod stats;

pub use error::FrameError;
