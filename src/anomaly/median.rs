/// First pass of the hex length check: collects nonzero payload lengths.
#[derive(Debug, Default, Clone)]
pub struct LengthCensus {
    lengths: Vec<usize>,
}

impl LengthCensus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one student's payload length. Zero lengths are ignored.
    pub fn record(&mut self, length: usize) {
        if length > 0 {
            self.lengths.push(length);
        }
    }

    /// Close the census and produce the immutable batch median.
    pub fn finish(mut self) -> BatchMedian {
        if self.lengths.is_empty() {
            return BatchMedian(0.0);
        }

        self.lengths.sort_unstable();
        let n = self.lengths.len();
        let mid = n / 2;
        let value = if n % 2 == 0 {
            (self.lengths[mid - 1] + self.lengths[mid]) as f64 / 2.0
        } else {
            self.lengths[mid] as f64
        };

        BatchMedian(value)
    }
}

impl FromIterator<usize> for LengthCensus {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut census = LengthCensus::new();
        for length in iter {
            census.record(length);
        }
        census
    }
}

/// Median hex payload length of a batch (0 when no student had a payload).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct BatchMedian(f64);

impl BatchMedian {
    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn is_known(&self) -> bool {
        self.0 > 0.0
    }
}
