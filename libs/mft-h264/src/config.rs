// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Encoder configuration.
//!
//! The adapter forwards every value here verbatim to the transform's
//! configuration interface; it never interprets or validates rate-control
//! parameters itself.

use serde::{Deserialize, Serialize};

use crate::frame::PixelFormat;

/// H.264 encoding profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum H264Profile {
    /// Baseline profile - most compatible, lowest features.
    #[default]
    Baseline,
    /// Main profile - good balance of compatibility and features.
    Main,
    /// High profile - advanced features, requires newer decoders.
    High,
}

/// Rate-control mode, forwarded to the transform untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateControl {
    #[default]
    ConstantBitrate,
    VariableBitrate,
    ConstrainedVariableBitrate,
    ConstantQp,
}

/// Per-slice-type quantization parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct H264Qp {
    pub default_qp: u16,
    pub i: u16,
    pub p: u16,
    pub b: u16,
}

impl H264Qp {
    /// Pack all four values into the 16-bits-per-slice-type layout the
    /// transform configuration interface expects.
    pub fn pack(self) -> u64 {
        u64::from(self.default_qp)
            | (u64::from(self.i) << 16)
            | (u64::from(self.p) << 32)
            | (u64::from(self.b) << 48)
    }
}

impl Default for H264Qp {
    fn default() -> Self {
        Self {
            default_qp: 26,
            i: 26,
            p: 26,
            b: 26,
        }
    }
}

/// H.264 encoder configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct H264EncoderConfig {
    /// Video width in pixels.
    pub width: u32,
    /// Video height in pixels.
    pub height: u32,
    /// Frame rate numerator.
    pub fps_num: u32,
    /// Frame rate denominator.
    pub fps_den: u32,
    /// Input pixel layout the caller will push.
    pub format: PixelFormat,
    /// Target bitrate in kbit/s.
    pub bitrate_kbps: u32,
    /// Peak bitrate in kbit/s, for constrained VBR.
    pub max_bitrate_kbps: Option<u32>,
    /// VBV buffer size in kbit.
    pub buffer_size_kbits: Option<u32>,
    /// Rate-control mode.
    pub rate_control: RateControl,
    /// Per-slice QP values, used in constant-QP mode.
    pub qp: H264Qp,
    /// Keyframe interval in seconds. Zero lets the transform choose.
    pub keyframe_interval_secs: u32,
    /// Encoding profile.
    pub profile: H264Profile,
    /// Enable low-latency mode for real-time streaming.
    pub low_latency: bool,
    /// Number of consecutive B-frames. Zero disables reordering.
    pub b_frame_count: u32,
}

impl Default for H264EncoderConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fps_num: 30,
            fps_den: 1,
            format: PixelFormat::default(),
            bitrate_kbps: 2500,
            max_bitrate_kbps: None,
            buffer_size_kbits: None,
            rate_control: RateControl::default(),
            qp: H264Qp::default(),
            keyframe_interval_secs: 0,
            profile: H264Profile::default(),
            low_latency: true,
            b_frame_count: 0,
        }
    }
}

impl H264EncoderConfig {
    /// Create a new config with specified dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Set the frame rate as a rational.
    pub fn with_frame_rate(mut self, fps_num: u32, fps_den: u32) -> Self {
        self.fps_num = fps_num;
        self.fps_den = fps_den;
        self
    }

    /// Set the input pixel layout.
    pub fn with_format(mut self, format: PixelFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the target bitrate in kbit/s.
    pub fn with_bitrate(mut self, bitrate_kbps: u32) -> Self {
        self.bitrate_kbps = bitrate_kbps;
        self
    }

    /// Set the rate-control mode.
    pub fn with_rate_control(mut self, rate_control: RateControl) -> Self {
        self.rate_control = rate_control;
        self
    }

    /// Set the encoding profile.
    pub fn with_profile(mut self, profile: H264Profile) -> Self {
        self.profile = profile;
        self
    }

    /// Set the keyframe interval in seconds.
    pub fn with_keyframe_interval(mut self, secs: u32) -> Self {
        self.keyframe_interval_secs = secs;
        self
    }

    /// Enable or disable low-latency mode.
    pub fn with_low_latency(mut self, enabled: bool) -> Self {
        self.low_latency = enabled;
        self
    }

    /// Keyframe interval converted to frames at the configured rate.
    pub fn keyframe_interval_frames(&self) -> u32 {
        if self.fps_den == 0 {
            return 0;
        }
        self.keyframe_interval_secs * self.fps_num / self.fps_den
    }

    /// The property bag handed to the transform's configuration interface.
    pub fn transform_settings(&self) -> TransformSettings {
        TransformSettings {
            mean_bitrate_bps: self.bitrate_kbps.saturating_mul(1000),
            max_bitrate_bps: self.max_bitrate_kbps.map(|k| k.saturating_mul(1000)),
            buffer_size_bits: self.buffer_size_kbits.map(|k| k.saturating_mul(1000)),
            rate_control: self.rate_control,
            packed_qp: self.qp.pack(),
            gop_size_frames: self.keyframe_interval_frames(),
            low_latency: self.low_latency,
            b_frame_count: self.b_frame_count,
        }
    }
}

/// Flattened settings forwarded verbatim to the transform at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformSettings {
    pub mean_bitrate_bps: u32,
    pub max_bitrate_bps: Option<u32>,
    pub buffer_size_bits: Option<u32>,
    pub rate_control: RateControl,
    pub packed_qp: u64,
    pub gop_size_frames: u32,
    pub low_latency: bool,
    pub b_frame_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qp_packing() {
        let qp = H264Qp {
            default_qp: 1,
            i: 2,
            p: 3,
            b: 4,
        };
        assert_eq!(qp.pack(), 0x0004_0003_0002_0001);
    }

    #[test]
    fn test_keyframe_interval_frames() {
        let config = H264EncoderConfig::new(1920, 1080)
            .with_frame_rate(60, 1)
            .with_keyframe_interval(2);
        assert_eq!(config.keyframe_interval_frames(), 120);
    }

    #[test]
    fn test_config_json_round_trip() {
        let config = H264EncoderConfig::new(1920, 1080)
            .with_frame_rate(30000, 1001)
            .with_profile(H264Profile::High)
            .with_rate_control(RateControl::VariableBitrate)
            .with_low_latency(false);
        let json = serde_json::to_string(&config).expect("serialize config");
        let parsed: H264EncoderConfig = serde_json::from_str(&json).expect("deserialize config");
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_transform_settings_forward_verbatim() {
        let config = H264EncoderConfig::new(1280, 720)
            .with_bitrate(4000)
            .with_rate_control(RateControl::ConstantQp);
        let settings = config.transform_settings();
        assert_eq!(settings.mean_bitrate_bps, 4_000_000);
        assert_eq!(settings.rate_control, RateControl::ConstantQp);
        assert_eq!(settings.packed_qp, H264Qp::default().pack());
        assert_eq!(settings.max_bitrate_bps, None);
    }
}
