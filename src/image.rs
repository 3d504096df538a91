// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::error::FrameError;
use core::fmt;
use std::io::Cursor;

/// Four character pixel format code.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// NV21 4:2:0 YUV semi-planar format (Android camera preview default)
pub const NV21: FourCC = FourCC(*b"NV21");

/// RGBA 32-bit pixel format (8 bits per channel, with alpha)
pub const RGBA: FourCC = FourCC(*b"RGBA");

/// 8-bit single channel intensity
pub const GREY: FourCC = FourCC(*b"GREY");

/// Bytes in one interleaved chroma row of an NV21 frame.
///
/// Each VU pair covers two columns, so odd widths round up to a whole pair.
pub const fn chroma_row_stride(width: usize) -> usize {
    width.div_ceil(2) * 2
}

/// Size in bytes of a tightly packed frame in the given format, or `None` for
/// a format this crate does not handle.
pub fn image_size(width: usize, height: usize, format: FourCC) -> Option<usize> {
    match format {
        NV21 => Some(width * height + chroma_row_stride(width) * height.div_ceil(2)),
        RGBA => Some(width * height * 4),
        GREY => Some(width * height),
        _ => None,
    }
}

/// Validated dimensions of one NV21 frame.
///
/// The geometry is never stored by the session; it is rebuilt from the
/// explicit arguments of every process call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FrameGeometry {
    width: usize,
    height: usize,
}

impl FrameGeometry {
    /// Accepts strictly positive dimensions as handed over by the host.
    pub fn new(width: i32, height: i32) -> Result<Self, FrameError> {
        if width <= 0 || height <= 0 {
            return Err(FrameError::InvalidGeometry {
                width: width.into(),
                height: height.into(),
            });
        }
        Ok(Self {
            width: width as usize,
            height: height as usize,
        })
    }

    /// Checks the dimensions and that an NV21 buffer of `len` bytes covers
    /// them. Trailing bytes beyond the frame are allowed.
    pub fn for_nv21(width: i32, height: i32, len: usize) -> Result<Self, FrameError> {
        if len == 0 {
            return Err(FrameError::NullInput);
        }
        let geometry = Self::new(width, height)?;
        let required = geometry.nv21_len();
        if len < required {
            return Err(FrameError::BufferTooSmall { len, required });
        }
        Ok(geometry)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> usize {
        self.width * self.height
    }

    pub fn nv21_len(&self) -> usize {
        self.width * self.height + chroma_row_stride(self.width) * self.height.div_ceil(2)
    }

    pub fn rgba_len(&self) -> usize {
        self.pixels() * 4
    }
}

impl fmt::Display for FrameGeometry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

// BT.601 limited range, 20-bit fixed point.
const YUV_SHIFT: i32 = 20;
const YUV_HALF: i32 = 1 << (YUV_SHIFT - 1);
const YUV_CY: i32 = 1_220_542;
const YUV_CVR: i32 = 1_673_527;
const YUV_CVG: i32 = -852_492;
const YUV_CUG: i32 = -409_993;
const YUV_CUB: i32 = 2_116_026;

#[inline]
fn clamp_u8(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

#[inline]
fn yuv_to_rgba(y: u8, u: i32, v: i32) -> [u8; 4] {
    let y = (y as i32 - 16).max(0) * YUV_CY;
    let r = (y + YUV_CVR * v + YUV_HALF) >> YUV_SHIFT;
    let g = (y + YUV_CVG * v + YUV_CUG * u + YUV_HALF) >> YUV_SHIFT;
    let b = (y + YUV_CUB * u + YUV_HALF) >> YUV_SHIFT;
    [clamp_u8(r), clamp_u8(g), clamp_u8(b), 255]
}

/// Converts an NV21 frame to tightly packed RGBA.
///
/// Every 2x2 block of luma samples shares the V/U pair found at the same
/// position in the interleaved chroma plane. The output is always
/// `width * height * 4` bytes with opaque alpha.
///
/// # Panics
///
/// The buffer is not validated here. Callers must ensure it holds at least
/// [`FrameGeometry::nv21_len`] bytes; [`crate::session::ProcessingSession`]
/// does so before calling.
pub fn nv21_to_rgba(nv21: &[u8], width: usize, height: usize) -> Vec<u8> {
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let stride = chroma_row_stride(width);
    let (luma, chroma) = nv21.split_at(width * height);
    let mut rgba = vec![0u8; width * height * 4];

    for (row, out) in rgba.chunks_exact_mut(width * 4).enumerate() {
        let y_row = &luma[row * width..(row + 1) * width];
        let vu_row = &chroma[(row / 2) * stride..(row / 2 + 1) * stride];
        for (col, px) in out.chunks_exact_mut(4).enumerate() {
            let pair = col & !1;
            let v = vu_row[pair] as i32 - 128;
            let u = vu_row[pair + 1] as i32 - 128;
            px.copy_from_slice(&yuv_to_rgba(y_row[col], u, v));
        }
    }

    rgba
}

/// Collapses RGBA to a single intensity channel using BT.601 luma weights.
/// Alpha is ignored.
pub fn rgba_to_grey(rgba: &[u8]) -> Vec<u8> {
    rgba.chunks_exact(4)
        .map(|px| {
            let y = px[0] as u32 * 4899 + px[1] as u32 * 9617 + px[2] as u32 * 1868 + (1 << 13);
            (y >> 14) as u8
        })
        .collect()
}

/// Expands a single channel image to opaque RGBA.
pub fn grey_to_rgba(grey: &[u8]) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(grey.len() * 4);
    for &v in grey {
        rgba.extend_from_slice(&[v, v, v, 255]);
    }
    rgba
}

/// Builds an NV21 frame from a luma function with neutral chroma.
///
/// Handy for synthetic test patterns: the colour conversion of such a frame
/// is a pure grey ramp of the luma values.
pub fn nv21_from_luma<F>(width: usize, height: usize, luma: F) -> Vec<u8>
where
    F: Fn(usize, usize) -> u8,
{
    let len = image_size(width, height, NV21).unwrap_or(0);
    let mut nv21 = vec![128u8; len];
    for y in 0..height {
        for x in 0..width {
            nv21[y * width + x] = luma(x, y);
        }
    }
    nv21
}

/// One plane of a YUV_420_888 image as delivered by a camera HAL.
#[derive(Copy, Clone, Debug)]
pub struct Plane<'a> {
    pub data: &'a [u8],
    pub row_stride: usize,
    pub pixel_stride: usize,
}

impl<'a> Plane<'a> {
    pub fn new(data: &'a [u8], row_stride: usize, pixel_stride: usize) -> Self {
        Self {
            data,
            row_stride,
            pixel_stride,
        }
    }

    fn sample(&self, index: usize) -> u8 {
        self.data.get(index).copied().unwrap_or(0)
    }
}

/// Packs a strided Y/U/V plane set into a tight NV21 buffer.
///
/// Luma rows are copied honouring the row stride and zero filled where the
/// plane runs short. Chroma is written as interleaved V then U; samples
/// outside a plane read as zero.
pub fn pack_nv21(planes: &[Plane], width: usize, height: usize) -> Result<Vec<u8>, FrameError> {
    let [y_plane, u_plane, v_plane] = match planes {
        [y, u, v, ..] => [y, u, v],
        _ => {
            return Err(FrameError::InvalidPlanes(format!(
                "expected 3 planes, found {}",
                planes.len()
            )))
        }
    };
    if width == 0 || height == 0 {
        return Err(FrameError::InvalidGeometry {
            width: width as i64,
            height: height as i64,
        });
    }

    let luma_size = width * height;
    let mut nv21 = vec![0u8; image_size(width, height, NV21).unwrap_or(luma_size)];

    for (row, out) in nv21[..luma_size].chunks_exact_mut(width).enumerate() {
        let start = row * y_plane.row_stride;
        if let Some(src) = y_plane.data.get(start..) {
            let n = src.len().min(width);
            out[..n].copy_from_slice(&src[..n]);
        }
    }

    let mut pos = luma_size;
    for row in 0..height.div_ceil(2) {
        for col in 0..width.div_ceil(2) {
            let u_index = row * u_plane.row_stride + col * u_plane.pixel_stride;
            let v_index = row * v_plane.row_stride + col * v_plane.pixel_stride;
            nv21[pos] = v_plane.sample(v_index);
            nv21[pos + 1] = u_plane.sample(u_index);
            pos += 2;
        }
    }

    Ok(nv21)
}

/// Encodes an RGBA frame as PNG.
///
/// Bytes beyond `width * height * 4` are ignored.
///
/// # Example
///
/// ```
/// use edge_viewer::image::encode_png;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let pix = vec![255u8; 4 * 4 * 4];
/// let png = encode_png(&pix, 4, 4)?;
/// assert_eq!(&png[1..4], b"PNG");
/// # Ok(())
/// # }
/// ```
pub fn encode_png(pix: &[u8], width: u32, height: u32) -> Result<Vec<u8>, FrameError> {
    let required = width as usize * height as usize * 4;
    if pix.len() < required {
        return Err(FrameError::BufferTooSmall {
            len: pix.len(),
            required,
        });
    }

    let mut out = Cursor::new(Vec::new());
    image::write_buffer_with_format(
        &mut out,
        &pix[..required],
        width,
        height,
        image::ExtendedColorType::Rgba8,
        image::ImageFormat::Png,
    )?;
    Ok(out.into_inner())
}
