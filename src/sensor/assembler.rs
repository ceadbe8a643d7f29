use num_traits::{Float, FromPrimitive};
use std::collections::VecDeque;

/// Sliding window of raw sensor samples averaged into one value.
#[derive(Clone, Debug)]
pub struct SensorDataAssembler<T = f64> {
    sample_num: usize,
    samples: VecDeque<T>,
}

impl<T> SensorDataAssembler<T>
where
    T: Float + FromPrimitive,
{
    /// Create an assembler averaging the last `sample_num` samples (at least one).
    pub fn new(sample_num: usize) -> Self {
        let sample_num = sample_num.max(1);
        Self {
            sample_num,
            samples: VecDeque::with_capacity(sample_num),
        }
    }

    pub fn set_sample_num(&mut self, sample_num: usize) {
        self.sample_num = sample_num.max(1);
        while self.samples.len() > self.sample_num {
            self.samples.pop_front();
        }
    }

    pub fn sample_num(&self) -> usize {
        self.sample_num
    }

    /// Add a sample, dropping the oldest once the window is full.
    pub fn add_data(&mut self, value: T) {
        if self.samples.len() == self.sample_num {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    /// Arithmetic mean of the window, or zero when empty.
    pub fn get_calculated_value(&self) -> T {
        if self.samples.is_empty() {
            return T::zero();
        }

        let sum = self.samples.iter().fold(T::zero(), |sum, &x| sum + x);
        T::from_usize(self.samples.len()).map_or(T::zero(), |n| sum / n)
    }

    pub fn size(&self) -> usize {
        self.samples.len()
    }

    /// Empty the window, keeping its size.
    pub fn reset(&mut self) {
        self.samples.clear();
    }
}
