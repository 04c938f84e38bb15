use super::{EndpointKey, ReportRow, StatAccumulator};
use crate::log::LogRecord;
use std::collections::HashMap;

/// Owns the endpoint-to-accumulator mapping for one run.
///
/// Endpoints are kept in first-seen order, which is the order `finalize`
/// reports them in and the tie-break order of every sort.
#[derive(Debug, Clone, Default)]
pub struct StatsAggregator {
    index: HashMap<EndpointKey, usize>,
    endpoints: Vec<(EndpointKey, StatAccumulator)>,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one accepted record into its endpoint's accumulator
    pub fn update(&mut self, key: EndpointKey, record: &LogRecord) {
        let slot = match self.index.get(&key) {
            Some(&slot) => slot,
            None => {
                tracing::trace!("New endpoint: {}", key);
                let slot = self.endpoints.len();
                self.index.insert(key.clone(), slot);
                self.endpoints.push((key, StatAccumulator::new()));
                slot
            }
        };

        self.endpoints[slot]
            .1
            .record(record.status, record.response_time, record.body_bytes);
    }

    pub fn count_distinct_endpoints(&self) -> usize {
        self.endpoints.len()
    }

    /// Total records aggregated across all endpoints
    pub fn total_requests(&self) -> u64 {
        self.endpoints.iter().map(|(_, acc)| acc.count()).sum()
    }

    pub fn get(&self, key: &EndpointKey) -> Option<&StatAccumulator> {
        self.index.get(key).map(|&slot| &self.endpoints[slot].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EndpointKey, &StatAccumulator)> {
        self.endpoints.iter().map(|(key, acc)| (key, acc))
    }

    /// Combine a partial aggregation into this one. Endpoints new to `self`
    /// are appended in `other`'s first-seen order.
    pub fn merge(&mut self, other: StatsAggregator) {
        for (key, acc) in other.endpoints {
            match self.index.get(&key) {
                Some(&slot) => self.endpoints[slot].1.merge(&acc),
                None => {
                    self.index.insert(key.clone(), self.endpoints.len());
                    self.endpoints.push((key, acc));
                }
            }
        }
    }

    /// Materialize one row per endpoint in first-seen order.
    ///
    /// Pure: accumulators are not modified, so repeated calls return
    /// identical rows.
    pub fn finalize(&self, ranks: &[u8]) -> Vec<ReportRow> {
        tracing::debug!(
            "Finalizing {} endpoints with percentiles {:?}",
            self.endpoints.len(),
            ranks
        );

        self.endpoints
            .iter()
            .map(|(key, acc)| ReportRow::from_summary(key, acc.summarize(ranks)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(uri: &str, status: u16, response_time: f64, body_bytes: u64) -> LogRecord {
        LogRecord {
            uri: uri.to_string(),
            method: "GET".to_string(),
            status,
            response_time,
            body_bytes,
            timestamp: None,
        }
    }

    fn key(uri: &str) -> EndpointKey {
        EndpointKey::new(uri, Some("GET".to_string()))
    }

    #[test]
    fn test_one_accumulator_per_key() {
        let mut agg = StatsAggregator::new();
        agg.update(key("/a"), &record("/a", 200, 0.1, 10));
        agg.update(key("/b"), &record("/b", 200, 0.2, 20));
        agg.update(key("/a"), &record("/a", 200, 0.3, 30));
        agg.update(
            EndpointKey::new("/a", Some("POST".to_string())),
            &record("/a", 201, 0.4, 40),
        );

        assert_eq!(agg.count_distinct_endpoints(), 3);
        assert_eq!(agg.total_requests(), 4);
        assert_eq!(agg.get(&key("/a")).unwrap().count(), 2);
        assert!(agg.get(&key("/c")).is_none());
    }

    #[test]
    fn test_finalize_preserves_first_seen_order_and_is_idempotent() {
        let mut agg = StatsAggregator::new();
        for uri in ["/z", "/a", "/m", "/a", "/z"] {
            agg.update(key(uri), &record(uri, 200, 0.1, 1));
        }

        let rows = agg.finalize(&[50, 99]);
        let uris: Vec<&str> = rows.iter().map(|r| r.uri.as_str()).collect();
        assert_eq!(uris, vec!["/z", "/a", "/m"]);
        assert_eq!(agg.finalize(&[50, 99]), rows);
    }

    #[test]
    fn test_estate_round_trip() {
        let mut agg = StatsAggregator::new();
        let estate = key(r"/api/estate/\d+");
        agg.update(estate.clone(), &record("/api/estate/42", 200, 0.120, 512));
        agg.update(estate.clone(), &record("/api/estate/7", 200, 0.080, 256));

        let rows = agg.finalize(&[50]);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.uri, r"/api/estate/\d+");
        assert_eq!(row.count, 2);
        assert_eq!(row.min, 0.080);
        assert_eq!(row.max, 0.120);
        assert_eq!(row.percentiles.get(50), Some(0.080));
        assert_eq!(row.sum_body, 768);
    }

    #[test]
    fn test_merge_shards() {
        let mut left = StatsAggregator::new();
        left.update(key("/a"), &record("/a", 200, 0.1, 1));
        left.update(key("/b"), &record("/b", 200, 0.5, 1));

        let mut right = StatsAggregator::new();
        right.update(key("/c"), &record("/c", 200, 0.2, 1));
        right.update(key("/a"), &record("/a", 500, 0.9, 1));

        left.merge(right);
        let rows = left.finalize(&[100]);
        let uris: Vec<&str> = rows.iter().map(|r| r.uri.as_str()).collect();
        assert_eq!(uris, vec!["/a", "/b", "/c"]);
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[0].percentiles.get(100), Some(0.9));
        assert_eq!(rows[0].status_classes, [0, 1, 0, 0, 1]);
    }
}
