use crate::tracks::inspect::AnimationJob;

/// Animations assigned to exactly one worker, in original relative order.
pub type JobPartition = Vec<AnimationJob>;

/// Split `items` into `n` contiguous, near-equal pieces.
///
/// With `base = len / n` and `rem = len % n`, the first `rem` pieces hold `base + 1` items and
/// the rest hold `base`. Pieces may be empty when `n > len`. `n == 0` is treated as `1`.
pub fn split_even<T: Clone>(items: &[T], n: usize) -> Vec<Vec<T>> {
    let n = n.max(1);
    let base = items.len() / n;
    let rem = items.len() % n;

    let mut pieces = Vec::with_capacity(n);
    let mut start = 0;
    for i in 0..n {
        let end = start + base + usize::from(i < rem);
        pieces.push(items[start..end].to_vec());
        start = end;
    }
    pieces
}

/// Partition long animations across `workers` by count.
///
/// Work per animation scales with its frame count, which this ignores; a worker that draws the
/// longest clips finishes last.
pub fn partition_jobs(jobs: &[AnimationJob], workers: usize) -> Vec<JobPartition> {
    split_even(jobs, workers)
}

/// Available CPU parallelism, falling back to `1`.
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
#[path = "../tests/unit/partition.rs"]
mod tests;
