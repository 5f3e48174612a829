use std::collections::VecDeque;

use crate::error::NowcastError;
use crate::sample::Sample;
use crate::window::LookbackWindow;
use crate::LOOKBACK;

/// Ordered record of every sample seen by the service, oldest first.
///
/// By default the history grows without bound for the lifetime of the
/// process. [`History::with_retention`] caps it, dropping the oldest samples
/// once the cap is exceeded.
///
/// There is no internal locking: callers sharing a `History` across tasks
/// must wrap it in a single mutex covering both appends and reads.
#[derive(Debug, Default)]
pub struct History {
    samples: VecDeque<Sample>,
    retention: Option<usize>,
    appended: u64,
}

impl History {
    /// An empty, unbounded history.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty history keeping at most `capacity` samples.
    ///
    /// `capacity` must be able to hold a full lookback window.
    pub fn with_retention(capacity: usize) -> Result<Self, NowcastError> {
        if capacity < LOOKBACK {
            return Err(NowcastError::InvalidConfig(format!(
                "history retention {} is smaller than the lookback window ({})",
                capacity, LOOKBACK
            )));
        }
        Ok(Self {
            samples: VecDeque::with_capacity(capacity),
            retention: Some(capacity),
            appended: 0,
        })
    }

    pub fn append(&mut self, sample: Sample) {
        self.samples.push_back(sample);
        self.appended += 1;

        if let Some(cap) = self.retention {
            while self.samples.len() > cap {
                self.samples.pop_front();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples ever appended, including any dropped by retention.
    pub fn total_appended(&self) -> u64 {
        self.appended
    }

    pub fn retention(&self) -> Option<usize> {
        self.retention
    }

    /// The last `n` samples in insertion order, or `None` if fewer are held.
    pub fn tail(&self, n: usize) -> Option<Vec<Sample>> {
        let len = self.samples.len();
        if n > len {
            return None;
        }
        Some(self.samples.range(len - n..).copied().collect())
    }

    /// A copy of the newest [`LOOKBACK`] samples, once enough exist.
    pub fn window(&self) -> Option<LookbackWindow> {
        self.tail(LOOKBACK).map(LookbackWindow::from_tail)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }
}
