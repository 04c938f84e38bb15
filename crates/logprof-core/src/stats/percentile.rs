use serde::Serialize;

/// Index selected by the nearest-rank method: `ceil(rank / 100 * n) - 1`,
/// clamped to `[0, n - 1]`. Integer arithmetic keeps the ceiling exact.
pub fn nearest_rank_index(rank: u8, n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    let ordinal = (rank as usize * n).div_ceil(100);
    ordinal.saturating_sub(1).min(n - 1)
}

/// Nearest-rank percentile over ascending samples. Never interpolates: the
/// result is always one of the samples.
pub fn nearest_rank(sorted: &[f64], rank: u8) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    Some(sorted[nearest_rank_index(rank, sorted.len())])
}

/// Requested percentile ranks and their values, in request order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PercentileSet(Vec<(u8, f64)>);

impl PercentileSet {
    /// Compute every rank over already-sorted samples
    pub fn compute(sorted: &[f64], ranks: &[u8]) -> Self {
        Self(
            ranks
                .iter()
                .map(|&rank| (rank, nearest_rank(sorted, rank).unwrap_or(0.0)))
                .collect(),
        )
    }

    pub fn get(&self, rank: u8) -> Option<f64> {
        self.0.iter().find(|(r, _)| *r == rank).map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, f64)> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_rank_index() {
        assert_eq!(nearest_rank_index(50, 2), 0);
        assert_eq!(nearest_rank_index(50, 3), 1);
        assert_eq!(nearest_rank_index(90, 10), 8);
        assert_eq!(nearest_rank_index(99, 10), 9);
        assert_eq!(nearest_rank_index(100, 10), 9);
        assert_eq!(nearest_rank_index(0, 10), 0);
        assert_eq!(nearest_rank_index(1, 1000), 9);
        assert_eq!(nearest_rank_index(29, 100), 28);
    }

    #[test]
    fn test_nearest_rank_values() {
        let samples = [0.080, 0.120];
        assert_eq!(nearest_rank(&samples, 50), Some(0.080));
        assert_eq!(nearest_rank(&samples, 51), Some(0.120));
        assert_eq!(nearest_rank(&[], 50), None);
    }

    #[test]
    fn test_percentile_is_always_an_observed_sample() {
        let samples: Vec<f64> = (1..=37).map(|i| i as f64 * 0.013).collect();
        for rank in 0..=100u8 {
            let value = nearest_rank(&samples, rank).unwrap();
            assert!(samples.contains(&value), "p{} = {} not observed", rank, value);
        }
    }

    #[test]
    fn test_percentile_set_keeps_request_order() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        let set = PercentileSet::compute(&sorted, &[99, 50]);
        let ranks: Vec<u8> = set.iter().map(|(r, _)| r).collect();
        assert_eq!(ranks, vec![99, 50]);
        assert_eq!(set.get(50), Some(2.0));
        assert_eq!(set.get(99), Some(4.0));
        assert_eq!(set.get(90), None);
    }
}
