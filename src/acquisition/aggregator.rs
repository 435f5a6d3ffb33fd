// src/acquisition/aggregator.rs

use time::OffsetDateTime;

use crate::common::{
    frame::FIELD_COUNT,
    types::{AveragedReading, Reading},
};

/// Default number of readings averaged into one record.
pub const DEFAULT_WINDOW_SIZE: usize = 16;

/// Buffers readings and averages them once a window is full.
#[derive(Debug, Clone)]
pub struct Aggregator {
    window_size: usize,
    buffer: Vec<Reading>,
}

impl Aggregator {
    /// Creates an aggregator. A `window_size` of zero is treated as one.
    pub fn new(window_size: usize) -> Self {
        let window_size = window_size.max(1);
        Aggregator {
            window_size,
            buffer: Vec::with_capacity(window_size),
        }
    }

    /// Appends a reading; returns the averaged window when this one filled it.
    pub fn push(&mut self, reading: Reading) -> Option<AveragedReading> {
        self.buffer.push(reading);
        self.drain()
    }

    /// Averages and clears the buffer, but only when it holds exactly one
    /// full window. Partial windows are never emitted.
    pub fn drain(&mut self) -> Option<AveragedReading> {
        if self.buffer.len() != self.window_size {
            return None;
        }

        let count = self.buffer.len() as f64;
        let mut values = [0f64; FIELD_COUNT];
        for reading in self.buffer.iter() {
            for (sum, value) in values.iter_mut().zip(reading.frame.fields().iter()) {
                *sum += f64::from(*value);
            }
        }
        for value in values.iter_mut() {
            *value /= count;
        }

        let samples = self.buffer.len();
        self.buffer.clear();
        Some(AveragedReading {
            computed_at: OffsetDateTime::now_utc(),
            values,
            samples,
        })
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }
}
