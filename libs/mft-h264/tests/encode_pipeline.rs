// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

/// End-to-end encode pipeline over the public API.
///
/// Drives the adapter with an "instant" transform double that behaves like a
/// well-mannered asynchronous hardware encoder: it grants an input credit at
/// stream start and after every accepted sample, and an output credit for
/// every sample it encodes.
use std::collections::VecDeque;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use mft_h264::{
    EncodeOutput, EventSink, FrameDescriptor, H264Encoder, H264EncoderConfig, InputSample,
    InputStatus, InputType, OutputStatus, OutputType, PixelFormat, Result, Transform,
    TransformEvent, TransformSample, TransformSettings,
};

const SEQUENCE_HEADER: &[u8] = &[0x00, 0x00, 0x00, 0x01, 0x67, 0x64, 0x00, 0x1F];

/// Route adapter logs through the subscriber; `RUST_LOG` filters as usual.
/// `try_init` because the second test in the binary hits this too.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

#[derive(Default)]
struct Shared {
    sink: Mutex<Option<Weak<dyn EventSink>>>,
    pulls: Mutex<VecDeque<TransformSample>>,
    current_type: Mutex<Option<OutputType>>,
    frames_seen: Mutex<usize>,
}

impl Shared {
    fn grant(&self, event: TransformEvent) {
        let sink = self.sink.lock().clone();
        if let Some(sink) = sink.and_then(|weak| weak.upgrade()) {
            sink.notify(event);
        }
    }
}

/// Encodes every accepted sample immediately: payload is the frame index
/// repeated, first frame is the keyframe.
struct InstantEncoder {
    shared: Arc<Shared>,
}

impl Transform for InstantEncoder {
    fn unlock_async(&mut self) -> Result<()> {
        Ok(())
    }

    fn set_output_type(&mut self, output_type: &OutputType) -> Result<()> {
        *self.shared.current_type.lock() = Some(output_type.clone());
        Ok(())
    }

    fn set_input_type(&mut self, _input_type: &InputType) -> Result<()> {
        Ok(())
    }

    fn available_output_type(&mut self) -> Result<OutputType> {
        self.current_output_type()
    }

    fn current_output_type(&self) -> Result<OutputType> {
        let mut current = self
            .shared
            .current_type
            .lock()
            .clone()
            .ok_or_else(|| anyhow::anyhow!("output type not negotiated"))?;
        current.sequence_header = SEQUENCE_HEADER.to_vec();
        Ok(current)
    }

    fn apply_settings(&mut self, _settings: &TransformSettings) -> Result<()> {
        Ok(())
    }

    fn set_event_sink(&mut self, sink: Weak<dyn EventSink>) {
        *self.shared.sink.lock() = Some(sink);
    }

    fn begin_streaming(&mut self) -> Result<()> {
        self.shared.grant(TransformEvent::NeedInput);
        Ok(())
    }

    fn process_input(&mut self, sample: InputSample) -> Result<InputStatus> {
        let index = {
            let mut seen = self.shared.frames_seen.lock();
            let index = *seen;
            *seen += 1;
            index
        };
        self.shared.pulls.lock().push_back(TransformSample {
            data: vec![index as u8; 4],
            time: sample.time(),
            duration: sample.duration(),
            keyframe: index == 0,
            decode_time: None,
        });
        self.shared.grant(TransformEvent::HaveOutput);
        self.shared.grant(TransformEvent::NeedInput);
        Ok(InputStatus::Accepted)
    }

    fn process_output(&mut self) -> Result<OutputStatus> {
        match self.shared.pulls.lock().pop_front() {
            Some(sample) => Ok(OutputStatus::Sample(sample)),
            None => Ok(OutputStatus::NeedMoreInput),
        }
    }

    fn output_ready(&self) -> Result<bool> {
        Ok(!self.shared.pulls.lock().is_empty())
    }

    fn flush(&mut self) -> Result<()> {
        self.shared.pulls.lock().clear();
        Ok(())
    }
}

fn push_nv12(encoder: &mut H264Encoder, pts: i64) {
    let y = vec![0x40u8; 64 * 32];
    let uv = vec![0x80u8; 64 * 16];
    let planes: [&[u8]; 2] = [&y, &uv];
    encoder
        .push_frame(&FrameDescriptor {
            planes: &planes,
            strides: &[64, 64],
            pts,
        })
        .expect("push frame");
}

#[test]
fn test_three_frame_encode_delivers_in_order() {
    init_tracing();
    let shared = Arc::new(Shared::default());
    let transform = InstantEncoder {
        shared: Arc::clone(&shared),
    };
    let config = H264EncoderConfig::new(64, 32)
        .with_frame_rate(30000, 1001)
        .with_format(PixelFormat::Nv12);
    let mut encoder =
        H264Encoder::new(Box::new(transform), true, config).expect("encoder init");

    assert!(encoder.extra_data().is_none());

    let step = mft_h264::frame_duration(30000, 1001);
    for i in 0..3 {
        push_nv12(&mut encoder, i * step);
    }

    let mut frames = Vec::new();
    for _ in 0..3 {
        match encoder.process_output().expect("pull") {
            EncodeOutput::Frame(frame) => frames.push(frame),
            EncodeOutput::NeedMoreInput => panic!("expected a frame"),
        }
    }
    match encoder.process_output().expect("pull") {
        EncodeOutput::NeedMoreInput => {}
        EncodeOutput::Frame(frame) => panic!("unexpected extra frame at pts {}", frame.pts),
    }

    // FIFO, pts passed through verbatim, dts mirrors pts without B-frames.
    for (i, frame) in frames.iter().enumerate() {
        assert_eq!(frame.pts, i as i64 * step);
        assert_eq!(frame.dts, frame.pts);
    }

    // Only the first frame is a keyframe and only it carries the header.
    assert!(frames[0].keyframe);
    let mut expected = SEQUENCE_HEADER.to_vec();
    expected.extend_from_slice(&[0u8; 4]);
    assert_eq!(frames[0].data, expected);

    assert!(!frames[1].keyframe);
    assert_eq!(frames[1].data, vec![1u8; 4]);
    assert!(!frames[2].keyframe);
    assert_eq!(frames[2].data, vec![2u8; 4]);

    // Header cache is populated once and stays stable.
    assert_eq!(encoder.extra_data(), Some(SEQUENCE_HEADER));
}

#[test]
fn test_events_after_encoder_drop_are_dropped() {
    init_tracing();
    let shared = Arc::new(Shared::default());
    let transform = InstantEncoder {
        shared: Arc::clone(&shared),
    };
    let config = H264EncoderConfig::new(64, 32).with_frame_rate(30, 1);
    let encoder = H264Encoder::new(Box::new(transform), true, config).expect("encoder init");
    drop(encoder);

    // The weak registration is dead; late events must be silently ignored.
    shared.grant(TransformEvent::NeedInput);
    shared.grant(TransformEvent::HaveOutput);
}
