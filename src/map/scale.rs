/// Unclamped linear map from a domain interval to a range interval
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Linear {
    domain: (f64, f64),
    range: (f64, f64),
}

impl Linear {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn apply(&self, v: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if d1 == d0 {
            // Degenerate domain maps everything to the middle of the range
            return (r0 + r1) / 2.0;
        }
        r0 + (v - d0) / (d1 - d0) * (r1 - r0)
    }
}

/// Splits a continuous domain into equal bins, one per output value
#[derive(Clone, Debug, PartialEq)]
pub struct Quantize<T> {
    domain: (f64, f64),
    range: Vec<T>,
}

impl<T: Copy> Quantize<T> {
    pub fn new(domain: (f64, f64), range: Vec<T>) -> Self {
        Self { domain, range }
    }

    /// Index of the bin `v` falls in, clamped to the first and last bins.
    pub fn bin(&self, v: f64) -> usize {
        let n = self.range.len();
        if n == 0 {
            return 0;
        }
        let (d0, d1) = self.domain;
        if d1 <= d0 {
            return 0;
        }
        let t = ((v - d0) / (d1 - d0) * n as f64).floor();
        (t.max(0.0) as usize).min(n - 1)
    }

    pub fn apply(&self, v: f64) -> Option<T> {
        self.range.get(self.bin(v)).copied()
    }
}
