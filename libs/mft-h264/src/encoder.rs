// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! The encoder adapter core.
//!
//! Bridges a synchronous push-frame / pull-packet interface to a transform
//! that hands out input/output permission through asynchronous events. The
//! adapter tracks those credits, queues samples while credits are exhausted,
//! drains output deterministically, renegotiates the output type mid-stream
//! when the transform asks for it, and assembles elementary-stream frames
//! with the cached sequence header prefixed to keyframes.

use std::collections::VecDeque;
use std::sync::{Arc, Weak};

use crate::config::H264EncoderConfig;
use crate::credits::{CreditTracker, EventSink};
use crate::descriptor::TransformDescriptor;
use crate::error::{EncoderError, Result};
use crate::frame::{EncodedFrame, FrameDescriptor};
use crate::sample::{frame_duration, InputSample, SamplePool};
use crate::transform::{
    InputStatus, InputType, InterlaceMode, OutputStatus, OutputType, Transform, TransformSample,
};

/// Outcome of one public pull.
#[derive(Debug)]
pub enum EncodeOutput {
    /// One assembled elementary-stream frame, ownership transferred.
    Frame(EncodedFrame),
    /// Nothing to deliver yet; push more input and pull again. Not a
    /// failure.
    NeedMoreInput,
}

/// Internal outcome of one drain pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DrainState {
    /// A sample was pulled and queued as an encoded frame.
    Produced,
    /// The transform wants more input before it can produce output.
    NeedMoreInput,
    /// No output credit or no sample ready; nothing happened.
    Idle,
}

/// Asynchronous H.264 encoder adapter.
///
/// Owns the transform exclusively for its own lifetime. The only state the
/// transform's event thread touches is the shared [`CreditTracker`], which
/// the transform holds weakly, so teardown never races the event path.
pub struct H264Encoder {
    transform: Box<dyn Transform>,
    config: H264EncoderConfig,
    credits: Arc<CreditTracker>,
    /// Credit gating applies only to asynchronous transforms; synchronous
    /// ones accept input whenever polled.
    gated: bool,
    pool: SamplePool,
    pending_inputs: VecDeque<InputSample>,
    encoded_frames: VecDeque<EncodedFrame>,
    extra_data: Vec<u8>,
    output_type: OutputType,
}

impl H264Encoder {
    /// Wrap an already activated transform.
    ///
    /// `is_async` selects the credit-gated submission protocol; it must
    /// match the descriptor flag of the transform's directory entry.
    pub fn new(
        mut transform: Box<dyn Transform>,
        is_async: bool,
        config: H264EncoderConfig,
    ) -> Result<Self> {
        let credits = Arc::new(CreditTracker::new());

        if is_async {
            transform.unlock_async()?;
        }

        // Output type first: transforms reject input types until the
        // compressed side is pinned down.
        let output_type = initial_output_type(&config);
        transform.set_output_type(&output_type)?;
        transform.set_input_type(&initial_input_type(&config))?;
        transform.apply_settings(&config.transform_settings())?;

        let sink: Weak<dyn EventSink> = Arc::downgrade(&credits) as Weak<dyn EventSink>;
        transform.set_event_sink(sink);
        transform.begin_streaming()?;

        tracing::info!(
            width = config.width,
            height = config.height,
            fps_num = config.fps_num,
            fps_den = config.fps_den,
            bitrate_kbps = config.bitrate_kbps,
            gated = is_async,
            "H.264 transform streaming"
        );

        Ok(Self {
            transform,
            config,
            credits,
            gated: is_async,
            pool: SamplePool::new(),
            pending_inputs: VecDeque::new(),
            encoded_frames: VecDeque::new(),
            extra_data: Vec::new(),
            output_type,
        })
    }

    /// Select, activate and wrap a transform from a directory entry.
    pub fn from_descriptor(
        descriptor: &TransformDescriptor,
        config: H264EncoderConfig,
    ) -> Result<Self> {
        let transform = descriptor.activate()?;
        Self::new(transform, descriptor.is_async(), config)
    }

    /// Copy one raw frame into a pooled sample and submit it.
    ///
    /// The frame is consumed by copy; nothing is retained after return.
    /// Backpressure from the transform is handled internally by draining
    /// output and retrying; only hard transform failures surface as errors.
    pub fn push_frame(&mut self, frame: &FrameDescriptor<'_>) -> Result<()> {
        let heights = self.config.format.plane_heights(self.config.height as usize);
        if frame.planes.len() != heights.len() || frame.strides.len() != heights.len() {
            return Err(EncoderError::Configuration(format!(
                "expected {} planes for {:?}, got {} planes / {} strides",
                heights.len(),
                self.config.format,
                frame.planes.len(),
                frame.strides.len()
            )));
        }

        let frame_size: usize = heights
            .iter()
            .zip(frame.strides)
            .map(|(&height, &stride)| height * stride)
            .sum();

        let mut data = self.pool.acquire(frame_size)?;
        for ((&plane_height, &stride), plane) in
            heights.iter().zip(frame.strides).zip(frame.planes)
        {
            let plane_len = plane_height * stride;
            let Some(bytes) = plane.get(..plane_len) else {
                self.pool.recycle(data);
                return Err(EncoderError::Configuration(format!(
                    "plane holds {} bytes, stride layout needs {}",
                    plane.len(),
                    plane_len
                )));
            };
            data.extend_from_slice(bytes);
        }

        let duration = frame_duration(self.config.fps_num, self.config.fps_den);
        self.submit(InputSample::new(data, frame.pts, duration))
    }

    /// Pull zero or one encoded frame.
    ///
    /// Runs one drain pass, then pops the frame queue. A drain hard-failure
    /// only propagates once no already-assembled frames remain to deliver.
    pub fn process_output(&mut self) -> Result<EncodeOutput> {
        if let Err(err) = self.drain_once() {
            if self.encoded_frames.is_empty() {
                return Err(err);
            }
            tracing::warn!(error = %err, "drain failed with assembled frames still queued");
        }

        match self.encoded_frames.pop_front() {
            Some(frame) => Ok(EncodeOutput::Frame(frame)),
            None => Ok(EncodeOutput::NeedMoreInput),
        }
    }

    /// The cached codec sequence header, available once the first keyframe
    /// has been drained. Stable for the lifetime of the encoder.
    pub fn extra_data(&self) -> Option<&[u8]> {
        if self.extra_data.is_empty() {
            None
        } else {
            Some(&self.extra_data)
        }
    }

    /// The currently negotiated output type.
    pub fn output_type(&self) -> &OutputType {
        &self.output_type
    }

    pub fn config(&self) -> &H264EncoderConfig {
        &self.config
    }

    /// Input samples waiting for a credit.
    pub fn pending_input_len(&self) -> usize {
        self.pending_inputs.len()
    }

    /// Assembled frames awaiting delivery.
    pub fn queued_frame_len(&self) -> usize {
        self.encoded_frames.len()
    }

    /// Release in-flight samples: tells the transform to flush and recycles
    /// queued input buffers. Already assembled frames stay deliverable.
    pub fn flush(&mut self) -> Result<()> {
        self.transform.flush()?;
        while let Some(sample) = self.pending_inputs.pop_front() {
            self.pool.recycle(sample.into_data());
        }
        Ok(())
    }

    /// Submit or queue one sample depending on the gating mode and the
    /// outstanding input credits, then feed as many queued samples as
    /// credits allow, in FIFO order.
    fn submit(&mut self, sample: InputSample) -> Result<()> {
        if !self.gated {
            return self.submit_now(sample);
        }

        self.pending_inputs.push_back(sample);
        while !self.pending_inputs.is_empty() {
            if !self.credits.try_consume_input() {
                break;
            }
            if let Some(next) = self.pending_inputs.pop_front() {
                self.submit_now(next)?;
            }
        }
        Ok(())
    }

    /// Hand one sample to the transform, draining output between retries
    /// while it reports backpressure. Submitting without draining can
    /// deadlock the transform, so the drain is unconditional per rejection.
    fn submit_now(&mut self, sample: InputSample) -> Result<()> {
        let mut sample = sample;
        loop {
            match self.transform.process_input(sample)? {
                InputStatus::Accepted => return Ok(()),
                InputStatus::NotAccepting(rejected) => {
                    tracing::debug!("transform not accepting input, draining output");
                    sample = rejected;
                    self.drain_once()?;
                }
            }
        }
    }

    /// One drain pass: consume at most one output credit, then pull until
    /// the transform yields a sample, asks for input, or fails. Stream
    /// changes are renegotiated inline and do not consume further credits
    /// within the same pass.
    fn drain_once(&mut self) -> Result<DrainState> {
        if self.gated && !self.credits.try_consume_output() {
            return Ok(DrainState::Idle);
        }
        if !self.transform.output_ready()? {
            return Ok(DrainState::Idle);
        }

        loop {
            match self.transform.process_output() {
                Ok(OutputStatus::NeedMoreInput) => return Ok(DrainState::NeedMoreInput),
                Ok(OutputStatus::StreamChange) => {
                    let renegotiated = self.transform.available_output_type()?;
                    self.transform.set_output_type(&renegotiated)?;
                    tracing::info!(
                        width = renegotiated.width,
                        height = renegotiated.height,
                        fps_num = renegotiated.fps_num,
                        fps_den = renegotiated.fps_den,
                        "output type renegotiated"
                    );
                    self.output_type = renegotiated;
                }
                Ok(OutputStatus::Sample(sample)) => {
                    self.finish_sample(sample)?;
                    return Ok(DrainState::Produced);
                }
                Err(err) => {
                    tracing::error!(error = %err, "output pull failed");
                    return Err(err);
                }
            }
        }
    }

    /// Assemble one pulled sample into an elementary-stream frame and
    /// queue it for delivery.
    fn finish_sample(&mut self, sample: TransformSample) -> Result<()> {
        if sample.keyframe && self.extra_data.is_empty() {
            self.cache_extra_data()?;
        }

        let prefix = if sample.keyframe {
            self.extra_data.len()
        } else {
            0
        };
        let mut data = Vec::with_capacity(prefix + sample.data.len());
        if sample.keyframe {
            data.extend_from_slice(&self.extra_data);
        }
        data.extend_from_slice(&sample.data);

        let pts = sample.time;
        let dts = sample.decode_time.unwrap_or(pts);

        self.encoded_frames.push_back(EncodedFrame {
            data,
            pts,
            dts,
            keyframe: sample.keyframe,
        });
        Ok(())
    }

    /// Populate the sequence-header cache from the negotiated output type.
    /// Called at most once, on the first keyframe.
    fn cache_extra_data(&mut self) -> Result<()> {
        let current = self.transform.current_output_type()?;
        if current.sequence_header.is_empty() {
            return Err(EncoderError::TypeNegotiation(
                "negotiated output type carries no sequence header".into(),
            ));
        }
        tracing::debug!(
            len = current.sequence_header.len(),
            "cached codec sequence header"
        );
        self.extra_data = current.sequence_header;
        Ok(())
    }
}

impl Drop for H264Encoder {
    fn drop(&mut self) {
        if let Err(err) = self.transform.flush() {
            tracing::debug!(error = %err, "transform flush during teardown failed");
        }
    }
}

fn initial_input_type(config: &H264EncoderConfig) -> InputType {
    InputType {
        format: config.format,
        width: config.width,
        height: config.height,
        fps_num: config.fps_num,
        fps_den: config.fps_den,
        interlace: InterlaceMode::Progressive,
    }
}

fn initial_output_type(config: &H264EncoderConfig) -> OutputType {
    OutputType {
        width: config.width,
        height: config.height,
        fps_num: config.fps_num,
        fps_den: config.fps_den,
        avg_bitrate_bps: config.bitrate_kbps.saturating_mul(1000),
        profile: config.profile,
        level: None,
        interlace: InterlaceMode::Progressive,
        sequence_header: Vec::new(),
    }
}
