use std::fmt::Display;

/// Running summary of integer samples, used for tree diagnostics.
#[derive(Clone, Debug, PartialEq)]
pub struct Stats {
    pub count: usize,
    pub min: usize,
    pub max: usize,
    pub avg: f32,
}

impl Stats {
    pub fn from_samples(samples: impl IntoIterator<Item = usize>) -> Self {
        let mut stats = Stats::default();
        stats.add_samples(samples);
        stats
    }

    pub fn add_sample(&mut self, value: usize) {
        self.count += 1;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.avg += (value as f32 - self.avg) / (self.count as f32);
    }

    pub fn add_samples(&mut self, samples: impl IntoIterator<Item = usize>) {
        for value in samples {
            self.add_sample(value);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl Default for Stats {
    fn default() -> Self {
        Stats {
            count: 0,
            min: usize::MAX,
            max: 0,
            avg: 0.0,
        }
    }
}

impl Display for Stats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "no samples");
        }
        write!(
            f,
            "{} - {}; avg {:.1}; {} samples",
            self.min, self.max, self.avg, self.count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::assert;

    #[test]
    fn from_samples() {
        let s = Stats::from_samples([20, 10, 30]);
        assert!(s.count == 3);
        assert!(s.min == 10);
        assert!(s.max == 30);
        assert!(s.avg == 20.0);
    }

    #[test]
    fn running_average() {
        let mut s = Stats::default();
        s.add_sample(1);
        s.add_sample(2);
        assert!(s.avg == 1.5);
        s.add_samples([3, 4, 5]);
        assert!(s.avg == 3.0);
        assert!(s.count == 5);
    }

    #[test]
    fn empty_display() {
        assert!(Stats::default().is_empty());
        assert!(format!("{}", Stats::default()) == "no samples");
    }

    #[test]
    fn display_format() {
        let output = format!("{}", Stats::from_samples([42]));
        assert!(output.contains("42 - 42"));
        assert!(output.contains("avg 42.0"));
        assert!(output.contains("1 samples"));
    }
}
