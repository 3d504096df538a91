// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Hysteresis edge detection over RGBA frames.
//!
//! The detector runs in four stages on the intensity image:
//!
//! 1. 3x3 Sobel gradients with replicated borders. The Sobel smoothing row
//!    doubles as the noise suppression kernel.
//! 2. L1 gradient magnitude `|dx| + |dy|`.
//! 3. Non-maximum suppression along the gradient direction, quantised to
//!    horizontal, vertical and the two diagonals.
//! 4. Hysteresis: magnitudes above the high threshold are edges, those at or
//!    below the low threshold are not, and those in between are edges only
//!    when 8-connected (transitively) to a definite edge.

use crate::image::{grey_to_rgba, rgba_to_grey};

/// Lower hysteresis threshold on the 0-255 intensity scale.
pub const DEFAULT_LOW_THRESHOLD: f32 = 60.0;

/// Upper hysteresis threshold on the 0-255 intensity scale.
pub const DEFAULT_HIGH_THRESHOLD: f32 = 140.0;

/// Thresholds for the edge filter.
///
/// The defaults are what the viewer ships with; other values only exist to
/// exercise the detector in tests and benchmarks.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EdgeConfig {
    pub low_threshold: f32,
    pub high_threshold: f32,
}

impl EdgeConfig {
    /// Creates a configuration, swapping the thresholds if they arrive in the
    /// wrong order.
    pub fn new(low_threshold: f32, high_threshold: f32) -> Self {
        if low_threshold > high_threshold {
            Self {
                low_threshold: high_threshold,
                high_threshold: low_threshold,
            }
        } else {
            Self {
                low_threshold,
                high_threshold,
            }
        }
    }

    fn integer_thresholds(&self) -> (i32, i32) {
        (
            self.low_threshold.floor() as i32,
            self.high_threshold.floor() as i32,
        )
    }
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self::new(DEFAULT_LOW_THRESHOLD, DEFAULT_HIGH_THRESHOLD)
    }
}

/// Sobel derivatives of a single channel image.
#[derive(Clone, Debug)]
pub struct Gradients {
    width: usize,
    height: usize,
    dx: Vec<i32>,
    dy: Vec<i32>,
}

impl Gradients {
    /// Runs the 3x3 Sobel operator over `grey`, replicating border pixels.
    pub fn sobel(grey: &[u8], width: usize, height: usize) -> Self {
        let mut dx = vec![0i32; width * height];
        let mut dy = vec![0i32; width * height];

        let at = |x: usize, y: usize| grey[y * width + x] as i32;

        for y in 0..height {
            let up = y.saturating_sub(1);
            let down = (y + 1).min(height - 1);
            for x in 0..width {
                let left = x.saturating_sub(1);
                let right = (x + 1).min(width - 1);

                let gx = (at(right, up) - at(left, up))
                    + 2 * (at(right, y) - at(left, y))
                    + (at(right, down) - at(left, down));
                let gy = (at(left, down) - at(left, up))
                    + 2 * (at(x, down) - at(x, up))
                    + (at(right, down) - at(right, up));

                dx[y * width + x] = gx;
                dy[y * width + x] = gy;
            }
        }

        Self {
            width,
            height,
            dx,
            dy,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dx(&self, x: usize, y: usize) -> i32 {
        self.dx[y * self.width + x]
    }

    pub fn dy(&self, x: usize, y: usize) -> i32 {
        self.dy[y * self.width + x]
    }

    /// L1 magnitude for every pixel.
    pub fn magnitude(&self) -> Vec<i32> {
        self.dx
            .iter()
            .zip(&self.dy)
            .map(|(dx, dy)| dx.abs() + dy.abs())
            .collect()
    }
}

/// Classification of a pixel after non-maximum suppression.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EdgeClass {
    None,
    Weak,
    Strong,
}

// tan(22.5°) in Q15.
const CANNY_SHIFT: u32 = 15;
const TG22: i64 = 13573;

/// Thins the gradient magnitude to local maxima along the gradient direction
/// and classifies survivors against the thresholds.
///
/// Ties are broken towards the earlier pixel in scan order so that a plateau
/// two pixels wide still yields a single line.
pub fn suppress_non_maxima(gradients: &Gradients, config: &EdgeConfig) -> Vec<EdgeClass> {
    let (width, height) = (gradients.width, gradients.height);
    let (low, high) = config.integer_thresholds();
    let mag = gradients.magnitude();

    let mag_at = |x: isize, y: isize| -> i32 {
        if x < 0 || y < 0 || x >= width as isize || y >= height as isize {
            0
        } else {
            mag[y as usize * width + x as usize]
        }
    };

    let mut classes = vec![EdgeClass::None; width * height];

    for y in 0..height {
        for x in 0..width {
            let m = mag[y * width + x];
            if m <= low {
                continue;
            }

            let dx = gradients.dx(x, y) as i64;
            let dy = gradients.dy(x, y) as i64;
            let (xi, yi) = (x as isize, y as isize);

            let xs = dx.abs();
            let ys = dy.abs() << CANNY_SHIFT;
            let tg22x = xs * TG22;

            let is_max = if ys < tg22x {
                m > mag_at(xi - 1, yi) && m >= mag_at(xi + 1, yi)
            } else {
                let tg67x = tg22x + (xs << (CANNY_SHIFT + 1));
                if ys > tg67x {
                    m > mag_at(xi, yi - 1) && m >= mag_at(xi, yi + 1)
                } else {
                    let s: isize = if (dx ^ dy) < 0 { -1 } else { 1 };
                    m > mag_at(xi - s, yi - 1) && m > mag_at(xi + s, yi + 1)
                }
            };

            if is_max {
                classes[y * width + x] = if m > high {
                    EdgeClass::Strong
                } else {
                    EdgeClass::Weak
                };
            }
        }
    }

    classes
}

/// Promotes weak pixels 8-connected to a strong pixel and returns a binary
/// mask with 255 for edges and 0 elsewhere.
pub fn hysteresis(classes: &[EdgeClass], width: usize, height: usize) -> Vec<u8> {
    let mut mask = vec![0u8; width * height];
    let mut stack: Vec<usize> = Vec::new();

    for (i, class) in classes.iter().enumerate() {
        if *class == EdgeClass::Strong {
            mask[i] = 255;
            stack.push(i);
        }
    }

    while let Some(i) = stack.pop() {
        let (x, y) = (i % width, i / width);
        for ny in y.saturating_sub(1)..=(y + 1).min(height - 1) {
            for nx in x.saturating_sub(1)..=(x + 1).min(width - 1) {
                let n = ny * width + nx;
                if mask[n] == 0 && classes[n] == EdgeClass::Weak {
                    mask[n] = 255;
                    stack.push(n);
                }
            }
        }
    }

    mask
}

/// Full edge detection on a single channel image.
pub fn detect_edges(grey: &[u8], width: usize, height: usize, config: &EdgeConfig) -> Vec<u8> {
    if width == 0 || height == 0 {
        return Vec::new();
    }
    let gradients = Gradients::sobel(grey, width, height);
    let classes = suppress_non_maxima(&gradients, config);
    hysteresis(&classes, width, height)
}

/// Replaces an RGBA frame by its edge map: opaque white on edges, opaque
/// black elsewhere. Output length equals input length for a well formed
/// frame.
pub fn apply_edge_filter(rgba: &[u8], width: usize, height: usize, config: &EdgeConfig) -> Vec<u8> {
    let grey = rgba_to_grey(rgba);
    let edges = detect_edges(&grey, width, height, config);
    grey_to_rgba(&edges)
}
