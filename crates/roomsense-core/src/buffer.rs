//! Moving-window sample buffers for the continuous channels.
//!
//! Each continuous channel keeps its last [`BUFFER_CAPACITY`] valid samples.
//! When the window is full the oldest sample is evicted first, and the
//! reported value is the plain arithmetic mean of what remains buffered.
//!
//! # Example
//!
//! ```
//! use roomsense_core::buffer::SampleBuffer;
//!
//! let mut buffer = SampleBuffer::new();
//! assert_eq!(buffer.average(), None);
//!
//! for value in [20.0, 21.0, 22.0, 23.0, 24.0, 25.0] {
//!     buffer.push(value);
//! }
//!
//! // 20.0 has been evicted
//! assert_eq!(buffer.len(), 5);
//! assert_eq!(buffer.average(), Some(23.0));
//! ```

use std::collections::VecDeque;

use roomsense_types::Channel;

/// Number of most recent samples kept per continuous channel.
pub const BUFFER_CAPACITY: usize = 5;

/// FIFO window of recent samples for one channel.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    values: VecDeque<f64>,
    capacity: usize,
}

impl SampleBuffer {
    /// Create an empty buffer with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(BUFFER_CAPACITY)
    }

    /// Create an empty buffer holding at most `capacity` samples.
    ///
    /// A capacity of zero is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest one when full.
    pub fn push(&mut self, value: f64) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    /// Arithmetic mean of the buffered samples, `None` when empty.
    pub fn average(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        let sum: f64 = self.values.iter().sum();
        Some(sum / self.values.len() as f64)
    }

    /// Most recently pushed sample.
    pub fn latest(&self) -> Option<f64> {
        self.values.back().copied()
    }

    /// Number of buffered samples.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no sample is buffered.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Maximum number of buffered samples.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Buffered samples, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    /// Drop all samples.
    pub fn clear(&mut self) {
        self.values.clear();
    }
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// The three continuous-channel buffers owned by a processing session.
#[derive(Debug, Clone, Default)]
pub struct ChannelBuffers {
    temperature: SampleBuffer,
    humidity: SampleBuffer,
    air_quality: SampleBuffer,
}

impl ChannelBuffers {
    /// Create empty buffers with the default capacity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer of a channel; `None` for binary channels, which are not smoothed.
    pub fn get(&self, channel: Channel) -> Option<&SampleBuffer> {
        match channel {
            Channel::Temperature => Some(&self.temperature),
            Channel::Humidity => Some(&self.humidity),
            Channel::AirQuality => Some(&self.air_quality),
            Channel::Light | Channel::Noise | Channel::GasSmoke => None,
        }
    }

    fn get_mut(&mut self, channel: Channel) -> Option<&mut SampleBuffer> {
        match channel {
            Channel::Temperature => Some(&mut self.temperature),
            Channel::Humidity => Some(&mut self.humidity),
            Channel::AirQuality => Some(&mut self.air_quality),
            Channel::Light | Channel::Noise | Channel::GasSmoke => None,
        }
    }

    /// Push a sample into a channel's window.
    ///
    /// Returns `false` (and stores nothing) for binary channels.
    pub fn push(&mut self, channel: Channel, value: f64) -> bool {
        match self.get_mut(channel) {
            Some(buffer) => {
                buffer.push(value);
                true
            }
            None => false,
        }
    }

    /// Mean of a channel's window, `None` when empty or not buffered.
    pub fn average(&self, channel: Channel) -> Option<f64> {
        self.get(channel).and_then(SampleBuffer::average)
    }

    /// Empty every window.
    pub fn clear(&mut self) {
        self.temperature.clear();
        self.humidity.clear();
        self.air_quality.clear();
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// The average always equals the mean of exactly the last five pushes.
        #[test]
        fn average_is_mean_of_last_window(values in proptest::collection::vec(-50.0f64..100.0, 5..64)) {
            let mut buffer = SampleBuffer::new();
            for v in &values {
                buffer.push(*v);
            }

            let tail = &values[values.len() - BUFFER_CAPACITY..];
            let expected = tail.iter().sum::<f64>() / BUFFER_CAPACITY as f64;
            let actual = buffer.average().unwrap();
            prop_assert!((actual - expected).abs() < 1e-3);
            prop_assert_eq!(buffer.len(), BUFFER_CAPACITY);
        }
    }
}
