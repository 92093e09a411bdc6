// Interest score aggregation over a domain's recent activity records.
// Pure functions. Every reduction is order-independent, so any permutation of
// the input yields a bit-identical result.

use crate::types::{ActivityRecord, InterestFactors, InterestScore, ScoringConfig, Timestamp};

/// Raw aggregates over a set of records.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DomainMetrics {
    pub total_time: u64,
    pub avg_scroll_depth: f64,
    pub avg_engagement: f64,
    pub frequency: usize,
}

pub fn compute_metrics(records: &[ActivityRecord]) -> DomainMetrics {
    if records.is_empty() {
        return DomainMetrics::default();
    }
    let count = records.len() as f64;

    let total_time = records
        .iter()
        .fold(0u64, |total, r| total.saturating_add(r.focus_time));
    let depth_sum: u64 = records.iter().map(|r| u64::from(r.max_scroll_depth)).sum();

    // Float addition is not associative; summing in sorted order keeps the
    // result independent of input order.
    let mut ratios: Vec<f64> = records.iter().map(ActivityRecord::engagement_ratio).collect();
    ratios.sort_by(f64::total_cmp);
    let engagement_sum: f64 = ratios.iter().sum();

    DomainMetrics {
        total_time,
        avg_scroll_depth: depth_sum as f64 / count,
        avg_engagement: engagement_sum / count,
        frequency: records.len(),
    }
}

pub fn normalize_weights(metrics: &DomainMetrics, config: &ScoringConfig) -> InterestFactors {
    let time_weight = if config.time_cap_ms == 0 {
        0.0
    } else {
        (metrics.total_time as f64 / config.time_cap_ms as f64).min(1.0)
    };
    InterestFactors {
        time_weight,
        scroll_weight: (metrics.avg_scroll_depth / 100.0).min(1.0),
        engagement_weight: metrics.avg_engagement,
    }
}

/// Unrounded weighted sum. Not bounded by itself; `score_records` clamps.
pub fn weighted_score(factors: &InterestFactors, config: &ScoringConfig) -> f64 {
    (factors.time_weight * config.time_coefficient
        + factors.scroll_weight * config.scroll_coefficient
        + factors.engagement_weight * config.engagement_coefficient
        + config.frequency_term.min(1.0))
        * config.multiplier
}

/// Score and factors for a record set. Empty input is the zero score.
pub fn score_records(records: &[ActivityRecord], config: &ScoringConfig) -> (u8, InterestFactors) {
    if records.is_empty() {
        return (0, InterestFactors::default());
    }
    let metrics = compute_metrics(records);
    let factors = normalize_weights(&metrics, config);
    let score = weighted_score(&factors, config).round().clamp(0.0, 100.0) as u8;
    (score, factors)
}

/// Full per-domain score row, ready to upsert.
pub fn score_domain(
    domain: &str,
    records: &[ActivityRecord],
    config: &ScoringConfig,
    now: Timestamp,
) -> InterestScore {
    let (score, factors) = score_records(records, config);
    let url = records
        .iter()
        .max_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.url.cmp(&b.url)))
        .map(|r| r.url.clone());

    InterestScore {
        domain: domain.to_string(),
        url,
        score,
        factors,
        last_updated: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PageInfo;
    use proptest::prelude::*;

    fn record(focus: u64, idle: u64, max_depth: u8) -> ActivityRecord {
        let page = PageInfo {
            url: "https://example.com/".to_string(),
            title: "Example".to_string(),
            domain: "example.com".to_string(),
        };
        let mut record = ActivityRecord::new(&page, Timestamp::from_millis(0));
        record.focus_time = focus;
        record.idle_time = idle;
        record.max_scroll_depth = max_depth;
        record.scroll_depth = max_depth;
        record
    }

    #[test]
    fn empty_input_scores_zero() {
        let (score, factors) = score_records(&[], &ScoringConfig::default());
        assert_eq!(score, 0);
        assert_eq!(factors, InterestFactors::default());
        assert_eq!(compute_metrics(&[]), DomainMetrics::default());
    }

    #[test]
    fn single_record_scenario() {
        let config = ScoringConfig::default();
        let (score, factors) = score_records(&[record(60_000, 0, 50)], &config);

        assert!((factors.time_weight - 60_000.0 / 300_000.0).abs() < 1e-12);
        assert!((factors.scroll_weight - 0.5).abs() < 1e-12);
        assert!((factors.engagement_weight - 1.0).abs() < 1e-12);
        // (0.2*0.3 + 0.5*0.2 + 1.0*0.3 + 0.2) * 100 = 66
        assert_eq!(score, 66);
    }

    #[test]
    fn zero_time_record_contributes_zero_engagement() {
        let metrics = compute_metrics(&[record(0, 0, 10), record(30_000, 10_000, 90)]);
        assert_eq!(metrics.frequency, 2);
        assert_eq!(metrics.total_time, 30_000);
        assert!((metrics.avg_engagement - 0.375).abs() < 1e-12);
        assert!((metrics.avg_scroll_depth - 50.0).abs() < 1e-12);
        assert!(!metrics.avg_engagement.is_nan());
    }

    #[test]
    fn huge_durations_saturate_instead_of_overflowing() {
        let config = ScoringConfig::default();
        let (score, factors) = score_records(&[record(u64::MAX - 1, 10, 50)], &config);
        assert!((factors.engagement_weight - 1.0).abs() < 1e-9);
        assert_eq!(factors.time_weight, 1.0);
        // (1.0*0.3 + 0.5*0.2 + 1.0*0.3 + 0.2) * 100
        assert_eq!(score, 90);

        let half = u64::MAX / 2 + 1;
        let metrics = compute_metrics(&[record(half, 0, 10), record(half, 0, 10)]);
        assert_eq!(metrics.total_time, u64::MAX);
        assert_eq!(score_records(&[record(half, 0, 10), record(half, 0, 10)], &config).0, 82);
    }

    #[test]
    fn weights_saturate_at_one() {
        let config = ScoringConfig::default();
        let metrics = compute_metrics(&[record(10 * 60_000, 0, 100), record(5 * 60_000, 0, 100)]);
        let factors = normalize_weights(&metrics, &config);
        assert_eq!(factors.time_weight, 1.0);
        assert_eq!(factors.scroll_weight, 1.0);
        assert_eq!(score_records(&[record(10 * 60_000, 0, 100)], &config).0, 100);
    }

    #[test]
    fn custom_coefficients_clamp_into_range() {
        let config = ScoringConfig {
            multiplier: 500.0,
            ..Default::default()
        };
        assert_eq!(score_records(&[record(60_000, 0, 50)], &config).0, 100);
    }

    #[test]
    fn score_domain_picks_latest_url() {
        let mut old = record(1_000, 0, 10);
        old.url = "https://example.com/old".to_string();
        let mut new = record(1_000, 0, 10);
        new.url = "https://example.com/new".to_string();
        new.start_time = Timestamp::from_millis(5_000);

        let now = Timestamp::from_millis(9_000);
        let row = score_domain("example.com", &[new, old], &ScoringConfig::default(), now);
        assert_eq!(row.domain, "example.com");
        assert_eq!(row.url.as_deref(), Some("https://example.com/new"));
        assert_eq!(row.last_updated, now);

        let empty = score_domain("example.com", &[], &ScoringConfig::default(), now);
        assert_eq!(empty.score, 0);
        assert_eq!(empty.url, None);
    }

    fn record_strategy() -> impl Strategy<Value = ActivityRecord> {
        (0u64..2_000_000, 0u64..2_000_000, 0u8..=100).prop_map(|(f, i, d)| record(f, i, d))
    }

    proptest! {
        #[test]
        fn score_is_permutation_invariant(
            (records, shuffled) in prop::collection::vec(record_strategy(), 0..25)
                .prop_flat_map(|records| {
                    let shuffled = Just(records.clone()).prop_shuffle();
                    (Just(records), shuffled)
                }),
        ) {
            let config = ScoringConfig::default();
            let (score_a, factors_a) = score_records(&records, &config);
            let (score_b, factors_b) = score_records(&shuffled, &config);
            prop_assert_eq!(score_a, score_b);
            prop_assert_eq!(factors_a.time_weight.to_bits(), factors_b.time_weight.to_bits());
            prop_assert_eq!(factors_a.scroll_weight.to_bits(), factors_b.scroll_weight.to_bits());
            prop_assert_eq!(
                factors_a.engagement_weight.to_bits(),
                factors_b.engagement_weight.to_bits()
            );
        }

        #[test]
        fn factors_stay_in_unit_range(records in prop::collection::vec(record_strategy(), 0..25)) {
            let (score, factors) = score_records(&records, &ScoringConfig::default());
            prop_assert!(score <= 100);
            for weight in [factors.time_weight, factors.scroll_weight, factors.engagement_weight] {
                prop_assert!((0.0..=1.0).contains(&weight));
            }
        }
    }
}
