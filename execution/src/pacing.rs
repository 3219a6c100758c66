use rand::Rng;
use std::ops::RangeInclusive;
use std::time::Duration;

/// Uniform draw from an inclusive range; an inverted range yields its start.
pub fn draw_inclusive<T, R>(range: RangeInclusive<T>, rng: &mut R) -> T
where
    T: rand::distributions::uniform::SampleUniform + PartialOrd + Copy,
    R: Rng,
{
    let (start, end) = (*range.start(), *range.end());
    if start >= end {
        return start;
    }
    rng.gen_range(start..=end)
}

pub fn draw_wait<R: Rng>(range_ms: RangeInclusive<u64>, rng: &mut R) -> Duration {
    Duration::from_millis(draw_inclusive(range_ms, rng))
}

/// The "match in progress" pause. Callers must not hold a ledger lock across it.
pub async fn pause(wait: Duration) {
    if !wait.is_zero() {
        tokio::time::sleep(wait).await;
    }
}
