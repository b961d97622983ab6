// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Raw and encoded frame types, plus per-format plane geometry.

use serde::{Deserialize, Serialize};

/// Uncompressed pixel layouts the adapter knows how to copy into a
/// transform input buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat {
    /// 4:2:0 semi-planar (full-height luma plane, half-height interleaved
    /// chroma plane). The preferred input for hardware H.264 transforms.
    #[default]
    Nv12,
    /// 4:2:0 planar (luma + two half-height chroma planes).
    I420,
    /// 4:4:4 planar (three full-height planes).
    I444,
    /// Packed 4:2:2.
    Yuy2,
    /// Packed 4:2:2, byte-swapped.
    Uyvy,
    /// Packed 32-bit BGRA.
    Bgra,
    /// Packed 32-bit BGRX.
    Bgrx,
}

impl PixelFormat {
    /// Per-plane heights for a frame of the given height, in plane order.
    ///
    /// Chroma planes in 4:2:0 layouts are half height; packed layouts are a
    /// single full-height plane. Strides already account for horizontal
    /// subsampling and bytes-per-pixel, so `stride * plane_height` is the
    /// byte size of each plane.
    pub fn plane_heights(self, height: usize) -> Vec<usize> {
        match self {
            PixelFormat::Nv12 => vec![height, height / 2],
            PixelFormat::I420 => vec![height, height / 2, height / 2],
            PixelFormat::I444 => vec![height, height, height],
            PixelFormat::Yuy2 | PixelFormat::Uyvy | PixelFormat::Bgra | PixelFormat::Bgrx => {
                vec![height]
            }
        }
    }

    /// Number of planes the caller must supply for this format.
    pub fn plane_count(self) -> usize {
        match self {
            PixelFormat::Nv12 => 2,
            PixelFormat::I420 | PixelFormat::I444 => 3,
            PixelFormat::Yuy2 | PixelFormat::Uyvy | PixelFormat::Bgra | PixelFormat::Bgrx => 1,
        }
    }
}

/// Borrowed view of one raw capture frame.
///
/// The adapter copies the plane data during `push_frame`; nothing here is
/// retained afterwards. `pts` is in 100-nanosecond ticks and is forwarded to
/// the transform as the sample time unchanged.
#[derive(Debug)]
pub struct FrameDescriptor<'a> {
    /// One slice per plane, in plane order for the negotiated pixel format.
    pub planes: &'a [&'a [u8]],
    /// Bytes per row for each plane. May exceed the visible width (padded
    /// capture surfaces); the full stride is copied.
    pub strides: &'a [usize],
    /// Presentation timestamp in 100-ns ticks.
    pub pts: i64,
}

/// One fully assembled elementary-stream frame.
///
/// Keyframe payloads are prefixed with the cached sequence header so the
/// buffer is decodable stand-alone. Ownership of `data` transfers to the
/// caller when the frame is popped.
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    /// H.264 elementary-stream bytes.
    pub data: Vec<u8>,
    /// Presentation timestamp in 100-ns ticks.
    pub pts: i64,
    /// Decode timestamp in 100-ns ticks. Lags `pts` for reordered streams.
    pub dts: i64,
    /// Whether the frame is a clean point (IDR).
    pub keyframe: bool,
}

impl EncodedFrame {
    /// Size of the encoded payload in bytes.
    pub fn data_len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the frame carries no payload.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nv12_plane_heights() {
        assert_eq!(PixelFormat::Nv12.plane_heights(720), vec![720, 360]);
        assert_eq!(PixelFormat::Nv12.plane_count(), 2);
    }

    #[test]
    fn test_i420_plane_heights() {
        assert_eq!(PixelFormat::I420.plane_heights(480), vec![480, 240, 240]);
        assert_eq!(PixelFormat::I420.plane_count(), 3);
    }

    #[test]
    fn test_i444_planes_are_full_height() {
        assert_eq!(PixelFormat::I444.plane_heights(1080), vec![1080, 1080, 1080]);
    }

    #[test]
    fn test_packed_formats_are_single_plane() {
        for format in [
            PixelFormat::Yuy2,
            PixelFormat::Uyvy,
            PixelFormat::Bgra,
            PixelFormat::Bgrx,
        ] {
            assert_eq!(format.plane_heights(600), vec![600]);
            assert_eq!(format.plane_count(), 1);
        }
    }
}
