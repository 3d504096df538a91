// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use clap::Parser;
use edge_viewer::{image::nv21_from_luma, session::ProcessingMode};
use std::path::PathBuf;

/// Processing mode selected on the command line.
#[derive(clap::ValueEnum, Clone, Debug, PartialEq, Copy)]
pub enum ModeSetting {
    /// Replace frames by their edge map
    Edge,
    /// Colour conversion only
    Raw,
}

impl From<ModeSetting> for ProcessingMode {
    fn from(mode: ModeSetting) -> Self {
        match mode {
            ModeSetting::Edge => ProcessingMode::Edge,
            ModeSetting::Raw => ProcessingMode::Passthrough,
        }
    }
}

/// Synthetic frame content used when no input file is given.
///
/// Patterns only populate luma; chroma is neutral.
#[derive(clap::ValueEnum, Clone, Debug, PartialEq, Copy)]
pub enum PatternSetting {
    /// Uniform mid grey
    Flat,
    /// Horizontal luma ramp
    Gradient,
    /// 32 pixel black and white squares
    Checkerboard,
    /// Bright rectangle on a dark background
    Rectangle,
}

impl PatternSetting {
    /// Renders an NV21 frame, empty for non-positive sizes.
    pub fn render(&self, width: i32, height: i32) -> Vec<u8> {
        let (Ok(w), Ok(h)) = (usize::try_from(width), usize::try_from(height)) else {
            return Vec::new();
        };
        match self {
            PatternSetting::Flat => nv21_from_luma(w, h, |_, _| 128),
            PatternSetting::Gradient => nv21_from_luma(w, h, |x, _| (x * 255 / w.max(1)) as u8),
            PatternSetting::Checkerboard => {
                nv21_from_luma(w, h, |x, y| if (x / 32 + y / 32) % 2 == 0 { 16 } else { 235 })
            }
            PatternSetting::Rectangle => nv21_from_luma(w, h, |x, y| {
                if x > w / 4 && x < w * 3 / 4 && y > h / 4 && y < h * 3 / 4 {
                    220
                } else {
                    30
                }
            }),
        }
    }
}

/// Command-line arguments for the edge viewer driver.
///
/// Feeds NV21 frames, either read from a raw file or synthesised, through the
/// native pipeline the way the camera host would and optionally saves the
/// last processed frame as PNG.
///
/// # Example
///
/// ```bash
/// # Edge map of a recorded preview frame
/// edge-viewer --input frame.nv21 --size 1280 720 --output edges.png
///
/// # Four capture threads racing a mode toggle every 10 frames
/// export FRAME_SIZE="640 480"
/// edge-viewer --pattern rectangle --threads 4 --toggle-every 10 --stats
/// ```
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Raw NV21 frame file to process
    #[arg(short, long, env = "INPUT")]
    pub input: Option<PathBuf>,

    /// Synthetic pattern used when no input file is given
    #[arg(long, env = "PATTERN", default_value = "checkerboard", value_enum)]
    pub pattern: PatternSetting,

    /// Frame resolution in pixels (width height)
    #[arg(
        long,
        env = "FRAME_SIZE",
        default_value = "640 480",
        value_delimiter = ' ',
        num_args = 2,
        allow_negative_numbers = true
    )]
    pub size: Vec<i32>,

    /// Initial processing mode
    #[arg(long, env = "MODE", default_value = "edge", value_enum)]
    pub mode: ModeSetting,

    /// Number of frames each capture thread submits
    #[arg(short, long, env = "FRAMES", default_value = "30")]
    pub frames: u32,

    /// Simulated camera frame rate used for capture timestamps
    #[arg(long, env = "FPS", default_value = "30")]
    pub fps: u32,

    /// Number of capture threads submitting frames concurrently
    #[arg(short, long, env = "THREADS", default_value = "1")]
    pub threads: usize,

    /// Toggle the processing mode every N frames from a separate thread
    #[arg(long, env = "TOGGLE_EVERY")]
    pub toggle_every: Option<u32>,

    /// Write the last processed frame to this PNG file
    #[arg(short, long, env = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Print per-frame statistics as JSON lines
    #[arg(long, env = "STATS")]
    pub stats: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn width(&self) -> i32 {
        self.size[0]
    }

    pub fn height(&self) -> i32 {
        self.size[1]
    }
}
