use serde::Serialize;

/// A half-open bucket `[lower, upper)`; the last bucket of a histogram is closed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Equal-width histogram over the observed range of a metric.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Histogram {
    pub buckets: Vec<Bucket>,
}

impl Histogram {
    /// Buckets an ascending slice into `bins` equal-width buckets spanning
    /// `[min, max]`. A single-valued range is widened by 0.5 on each side.
    pub fn from_sorted(sorted: &[f64], bins: usize) -> Self {
        let (Some(&first), Some(&last)) = (sorted.first(), sorted.last()) else {
            return Self::default();
        };
        if bins == 0 {
            return Self::default();
        }

        let (lower, upper) = if first == last {
            (first - 0.5, last + 0.5)
        } else {
            (first, last)
        };
        let width = (upper - lower) / bins as f64;

        let mut buckets: Vec<Bucket> = (0..bins)
            .map(|i| Bucket {
                lower: lower + width * i as f64,
                upper: if i + 1 == bins {
                    upper
                } else {
                    lower + width * (i + 1) as f64
                },
                count: 0,
            })
            .collect();

        for &value in sorted {
            let slot = ((value - lower) / width).floor() as usize;
            buckets[slot.min(bins - 1)].count += 1;
        }

        Self { buckets }
    }

    pub fn total(&self) -> usize {
        self.buckets.iter().map(|b| b.count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_counts_every_value() {
        let values = [0.0, 1.0, 2.0, 3.0, 4.0, 10.0];
        let hist = Histogram::from_sorted(&values, 5);

        assert_eq!(hist.buckets.len(), 5);
        assert_eq!(hist.total(), values.len());
        assert_eq!(hist.buckets[0].lower, 0.0);
        assert_eq!(hist.buckets[0].upper, 2.0);
        assert_eq!(hist.buckets[0].count, 2);
        assert_eq!(hist.buckets[1].count, 2);
        // max lands in the closed last bucket
        assert_eq!(hist.buckets[4].count, 1);
        assert_eq!(hist.buckets[4].upper, 10.0);
    }

    #[test]
    fn test_single_valued_range_is_widened() {
        let hist = Histogram::from_sorted(&[3.0, 3.0, 3.0], 2);
        assert_eq!(hist.buckets[0].lower, 2.5);
        assert_eq!(hist.buckets[1].upper, 3.5);
        assert_eq!(hist.buckets[1].count, 3);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(Histogram::from_sorted(&[], 10).buckets.is_empty());
        assert!(Histogram::from_sorted(&[1.0, 2.0], 0).buckets.is_empty());
    }
}
