use super::percentile::PercentileSet;

/// Running aggregate for one endpoint.
///
/// Every response-time sample is retained so percentiles are exact.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatAccumulator {
    count: u64,
    status_classes: [u64; 5],
    time_sum: f64,
    time_min: f64,
    time_max: f64,
    /// Saturates at `u64::MAX` instead of wrapping
    body_sum: u64,
    body_min: u64,
    body_max: u64,
    samples: Vec<f64>,
}

/// Finalized numbers for one accumulator
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub count: u64,
    pub status_classes: [u64; 5],
    pub min: f64,
    pub max: f64,
    pub sum: f64,
    pub avg: f64,
    pub stddev: f64,
    pub percentiles: PercentileSet,
    pub min_body: u64,
    pub max_body: u64,
    pub sum_body: u64,
    pub avg_body: f64,
}

impl StatAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, status: u16, response_time: f64, body_bytes: u64) {
        if self.count == 0 {
            self.time_min = response_time;
            self.time_max = response_time;
            self.body_min = body_bytes;
            self.body_max = body_bytes;
        } else {
            self.time_min = self.time_min.min(response_time);
            self.time_max = self.time_max.max(response_time);
            self.body_min = self.body_min.min(body_bytes);
            self.body_max = self.body_max.max(body_bytes);
        }

        self.count += 1;
        self.time_sum += response_time;
        self.body_sum = self.body_sum.saturating_add(body_bytes);
        self.samples.push(response_time);

        if (100..600).contains(&status) {
            self.status_classes[(status / 100 - 1) as usize] += 1;
        }
    }

    /// Fold another shard's accumulator into this one
    pub fn merge(&mut self, other: &StatAccumulator) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = other.clone();
            return;
        }

        self.count += other.count;
        for (mine, theirs) in self.status_classes.iter_mut().zip(other.status_classes) {
            *mine += theirs;
        }
        self.time_sum += other.time_sum;
        self.time_min = self.time_min.min(other.time_min);
        self.time_max = self.time_max.max(other.time_max);
        self.body_sum = self.body_sum.saturating_add(other.body_sum);
        self.body_min = self.body_min.min(other.body_min);
        self.body_max = self.body_max.max(other.body_max);
        self.samples.extend_from_slice(&other.samples);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn time_sum(&self) -> f64 {
        self.time_sum
    }

    pub fn time_min(&self) -> f64 {
        self.time_min
    }

    pub fn time_max(&self) -> f64 {
        self.time_max
    }

    pub fn body_sum(&self) -> u64 {
        self.body_sum
    }

    /// Compute the final numbers without touching the accumulator
    pub fn summarize(&self, ranks: &[u8]) -> Summary {
        let n = self.count as f64;
        let avg = if self.count > 0 { self.time_sum / n } else { 0.0 };
        let avg_body = if self.count > 0 {
            self.body_sum as f64 / n
        } else {
            0.0
        };

        let stddev = if self.count > 0 {
            let variance = self
                .samples
                .iter()
                .map(|x| (x - avg).powi(2))
                .sum::<f64>()
                / n;
            variance.sqrt()
        } else {
            0.0
        };

        let mut sorted = self.samples.clone();
        sorted.sort_by(f64::total_cmp);

        Summary {
            count: self.count,
            status_classes: self.status_classes,
            min: self.time_min,
            max: self.time_max,
            sum: self.time_sum,
            avg,
            stddev,
            percentiles: PercentileSet::compute(&sorted, ranks),
            min_body: self.body_min,
            max_body: self.body_max,
            sum_body: self.body_sum,
            avg_body,
        }
    }
}
