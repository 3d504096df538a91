// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use thiserror::Error;

/// Errors raised while validating or transforming a frame.
///
/// None of these ever reach the host through [`crate::session::ProcessingSession::process`]:
/// the session turns every one of them into an empty output buffer so that a
/// single bad frame cannot interrupt the stream.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Width or height is zero or negative.
    #[error("invalid frame geometry {width}x{height}")]
    InvalidGeometry { width: i64, height: i64 },

    /// The buffer is shorter than the claimed geometry requires.
    #[error("frame buffer holds {len} bytes but {required} are required")]
    BufferTooSmall { len: usize, required: usize },

    /// No frame payload was supplied at the boundary.
    #[error("missing frame payload")]
    NullInput,

    /// The YUV plane set handed to the NV21 packer is unusable.
    #[error("invalid yuv planes: {0}")]
    InvalidPlanes(String),

    /// Encoding an output image failed.
    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}
