// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Input sample buffers and the reusable buffer pool.

use crate::error::{EncoderError, Result};

/// All adapter timestamps are in 100-nanosecond ticks, the canonical unit
/// for Media Foundation-style transforms.
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Average duration of one frame at `fps_num / fps_den`, in 100-ns ticks,
/// rounded to nearest. 30000/1001 yields 333667. A zero numerator or
/// denominator yields zero rather than dividing by it.
pub fn frame_duration(fps_num: u32, fps_den: u32) -> i64 {
    if fps_num == 0 || fps_den == 0 {
        return 0;
    }
    let num = i64::from(fps_num);
    let den = i64::from(fps_den);
    (TICKS_PER_SECOND * den + num / 2) / num
}

/// One input sample staged for the transform.
///
/// Created when a frame is pushed; owned exclusively by the adapter until
/// `Transform::process_input` accepts it, at which point the transform takes
/// over and the adapter retains no reference.
#[derive(Debug)]
pub struct InputSample {
    data: Vec<u8>,
    time: i64,
    duration: i64,
}

impl InputSample {
    pub fn new(data: Vec<u8>, time: i64, duration: i64) -> Self {
        Self {
            data,
            time,
            duration,
        }
    }

    /// Sample time in 100-ns ticks (the caller's pts, unchanged).
    pub fn time(&self) -> i64 {
        self.time
    }

    /// Sample duration in 100-ns ticks, derived from the frame rate.
    pub fn duration(&self) -> i64 {
        self.duration
    }

    /// Raw pixel payload, planes laid out contiguously.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Reclaim the backing buffer, e.g. to recycle it into a [`SamplePool`].
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// Grow-only pool of input buffers sized to the current frame geometry.
///
/// Buffers handed back via [`recycle`](SamplePool::recycle) keep their
/// capacity, so steady-state encoding allocates nothing per frame. The pool
/// is per-adapter and never shared across instances, so no locking.
#[derive(Debug, Default)]
pub struct SamplePool {
    spare: Vec<Vec<u8>>,
}

impl SamplePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a zero-length buffer with at least `capacity` bytes reserved,
    /// reusing a spare when one is available. Surfaces
    /// [`EncoderError::Allocation`] when the reservation cannot be
    /// satisfied.
    pub fn acquire(&mut self, capacity: usize) -> Result<Vec<u8>> {
        let mut buffer = self.spare.pop().unwrap_or_default();
        buffer.clear();
        if buffer.capacity() < capacity {
            buffer
                .try_reserve(capacity - buffer.capacity())
                .map_err(|err| EncoderError::Allocation(err.to_string()))?;
        }
        Ok(buffer)
    }

    /// Return a buffer for later reuse.
    pub fn recycle(&mut self, buffer: Vec<u8>) {
        self.spare.push(buffer);
    }

    pub fn spare_count(&self) -> usize {
        self.spare.len()
    }
}
