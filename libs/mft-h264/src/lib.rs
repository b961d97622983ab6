// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Asynchronous hardware H.264 encoder adapter.
//!
//! Wraps a platform encoder transform (Media Foundation style) behind a
//! synchronous push-frame / pull-packet interface. The transform grants
//! input and output permission through asynchronous events; the adapter
//! turns that protocol into something a capture or streaming pipeline can
//! drive from a single thread:
//!
//! - [`CreditTracker`] counts the transform's need-input / have-output
//!   grants, shared with the event thread through a weak registration.
//! - [`H264Encoder`] queues raw frames while input credits are exhausted,
//!   drains encoded output deterministically, renegotiates the output type
//!   on mid-stream format changes, and prefixes the cached sequence header
//!   to every keyframe.
//! - [`Transform`] is the seam the platform lives behind; descriptors in
//!   the transform directory ([`TransformDescriptor`]) activate instances.
//!
//! ```no_run
//! use mft_h264::{EncodeOutput, FrameDescriptor, H264Encoder, H264EncoderConfig};
//!
//! # fn demo(transform: Box<dyn mft_h264::Transform>, nv12: &[&[u8]]) -> mft_h264::Result<()> {
//! let config = H264EncoderConfig::new(1920, 1080).with_frame_rate(30000, 1001);
//! let mut encoder = H264Encoder::new(transform, true, config)?;
//!
//! encoder.push_frame(&FrameDescriptor {
//!     planes: nv12,
//!     strides: &[1920, 1920],
//!     pts: 0,
//! })?;
//!
//! if let EncodeOutput::Frame(frame) = encoder.process_output()? {
//!     // frame.data, frame.pts, frame.dts, frame.keyframe
//!     assert!(!frame.data.is_empty());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Timestamps throughout are 100-nanosecond ticks; see
//! [`TICKS_PER_SECOND`] and [`frame_duration`].

pub mod config;
pub mod credits;
pub mod descriptor;
pub mod encoder;
pub mod error;
pub mod frame;
pub mod sample;
pub mod transform;

pub use config::{H264EncoderConfig, H264Profile, H264Qp, RateControl, TransformSettings};
pub use credits::{CreditTracker, EventSink, TransformEvent};
pub use descriptor::{activate_selected, select_transform, vendor_for_guid, TransformDescriptor};
pub use encoder::{EncodeOutput, H264Encoder};
pub use error::{EncoderError, Result};
pub use frame::{EncodedFrame, FrameDescriptor, PixelFormat};
pub use sample::{frame_duration, InputSample, SamplePool, TICKS_PER_SECOND};
pub use transform::{
    InputStatus, InputType, InterlaceMode, OutputStatus, OutputType, Transform, TransformSample,
};
