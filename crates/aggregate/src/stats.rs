//! Bucket statistics

use poutine_common::models::BucketStats;

/// Mean, median, min, and max of `prices` at full precision.
/// An empty slice gives all-null stats with count 0.
pub fn bucket_stats(prices: &[f64]) -> BucketStats {
    if prices.is_empty() {
        return BucketStats::default();
    }

    let mut sorted = prices.to_vec();
    sorted.sort_by(f64::total_cmp);

    let count = sorted.len();
    let mean = sorted.iter().sum::<f64>() / count as f64;
    let mid = count / 2;
    let median = if count % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };

    BucketStats {
        mean: Some(mean),
        median: Some(median),
        min: sorted.first().copied(),
        max: sorted.last().copied(),
        count,
    }
}
