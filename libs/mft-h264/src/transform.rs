// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! The platform transform contract.
//!
//! The underlying encoder is modeled as a black box behind the [`Transform`]
//! trait: the adapter negotiates media types, feeds it input samples and
//! pulls output samples, and everything platform-specific (Media Foundation,
//! vendor SDKs, test doubles) stays behind this seam.

use std::fmt;
use std::sync::Weak;

use crate::config::{H264Profile, TransformSettings};
use crate::credits::EventSink;
use crate::error::Result;
use crate::frame::PixelFormat;
use crate::sample::InputSample;

/// Scan mode carried on the negotiated media types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InterlaceMode {
    #[default]
    Progressive,
    Interlaced,
}

/// Uncompressed input media type pushed to the transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputType {
    pub format: PixelFormat,
    pub width: u32,
    pub height: u32,
    pub fps_num: u32,
    pub fps_den: u32,
    pub interlace: InterlaceMode,
}

/// Negotiated H.264 output media type.
///
/// Mutated in place whenever the transform signals a stream-format change;
/// every frame produced after the change reflects the new type. The
/// `sequence_header` blob (SPS/PPS parameter sets) is only meaningful on
/// types read back via [`Transform::current_output_type`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputType {
    pub width: u32,
    pub height: u32,
    pub fps_num: u32,
    pub fps_den: u32,
    pub avg_bitrate_bps: u32,
    pub profile: H264Profile,
    /// H.264 level, or `None` to let the transform pick.
    pub level: Option<u32>,
    pub interlace: InterlaceMode,
    /// Codec sequence header bytes. Empty until the transform has started
    /// producing output.
    pub sequence_header: Vec<u8>,
}

/// One encoded sample pulled out of the transform.
#[derive(Debug, Clone)]
pub struct TransformSample {
    /// Raw encoded payload (no sequence header prefix).
    pub data: Vec<u8>,
    /// Sample time in 100-ns ticks.
    pub time: i64,
    /// Sample duration in 100-ns ticks.
    pub duration: i64,
    /// Clean-point marker: decodable without reference to prior frames.
    pub keyframe: bool,
    /// Decode timestamp in 100-ns ticks, when the transform reorders frames.
    /// Absent for streams without B-frames.
    pub decode_time: Option<i64>,
}

/// Outcome of submitting one input sample.
#[derive(Debug)]
pub enum InputStatus {
    /// The transform took ownership of the sample.
    Accepted,
    /// Backpressure: the transform refused the sample until output is
    /// drained. The sample is handed back for the retry.
    NotAccepting(InputSample),
}

/// Outcome of one output pull.
#[derive(Debug)]
pub enum OutputStatus {
    /// The transform produced an encoded sample.
    Sample(TransformSample),
    /// No output until more input is submitted. Not an error.
    NeedMoreInput,
    /// The output format changed; renegotiate via
    /// [`Transform::available_output_type`] and pull again.
    StreamChange,
}

/// A platform H.264 encoder transform.
///
/// All methods return immediately; none block or suspend. Hard failures are
/// `Err` with the platform status code, while backpressure, need-more-input
/// and stream changes are ordinary `Ok` outcomes the adapter handles
/// locally.
pub trait Transform: Send {
    /// Lift the transform's asynchronous-mode lock. Required once before
    /// type negotiation on asynchronous transforms; a no-op for synchronous
    /// ones.
    fn unlock_async(&mut self) -> Result<()>;

    /// Set the output media type. Must happen before the input type.
    fn set_output_type(&mut self, output_type: &OutputType) -> Result<()>;

    /// Set the input media type.
    fn set_input_type(&mut self, input_type: &InputType) -> Result<()>;

    /// The output type the transform proposes after a stream change.
    fn available_output_type(&mut self) -> Result<OutputType>;

    /// The currently negotiated output type, including the sequence header
    /// blob once the transform has produced output.
    fn current_output_type(&self) -> Result<OutputType>;

    /// Forward the caller's encoder settings verbatim.
    fn apply_settings(&mut self, settings: &TransformSettings) -> Result<()>;

    /// Register the event observer. Weak: the registration must not keep
    /// the adapter alive, and events after adapter teardown are dropped.
    fn set_event_sink(&mut self, sink: Weak<dyn EventSink>);

    /// Deliver the begin-streaming / start-of-stream notifications.
    fn begin_streaming(&mut self) -> Result<()>;

    /// Submit one input sample. On [`InputStatus::Accepted`] ownership
    /// transfers to the transform.
    fn process_input(&mut self, sample: InputSample) -> Result<InputStatus>;

    /// Pull one output sample.
    fn process_output(&mut self) -> Result<OutputStatus>;

    /// Whether an output sample is ready to be pulled right now.
    fn output_ready(&self) -> Result<bool>;

    /// Drop all in-flight samples ahead of teardown.
    fn flush(&mut self) -> Result<()>;
}

impl fmt::Debug for dyn Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn Transform")
    }
}
