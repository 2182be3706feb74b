use serde::{Deserialize, Serialize};

/// Per-round batch sizes by overall target. Larger runs use larger batches so
/// fewer remote round-trips are paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchPolicy {
    pub large_threshold: usize,
    pub large_step: usize,
    pub medium_threshold: usize,
    pub medium_step: usize,
    pub small_step: usize,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            large_threshold: 500,
            large_step: 50,
            medium_threshold: 100,
            medium_step: 20,
            small_step: 5,
        }
    }
}

impl BatchPolicy {
    pub fn max_step(&self, target: usize) -> usize {
        let step = if target >= self.large_threshold {
            self.large_step
        } else if target >= self.medium_threshold {
            self.medium_step
        } else {
            self.small_step
        };
        step.max(1)
    }
}

/// Size of the next batch, or 0 once the target is met.
pub fn next_batch_size(target: usize, current: usize, max_step: usize) -> usize {
    if current >= target {
        return 0;
    }
    (target - current).min(max_step)
}

/// Sizes for up to `slots` batches issued together, assuming each one fills.
pub fn plan_wave(target: usize, current: usize, max_step: usize, slots: usize) -> Vec<usize> {
    let mut sizes = Vec::new();
    let mut projected = current;
    while sizes.len() < slots {
        let size = next_batch_size(target, projected, max_step);
        if size == 0 {
            break;
        }
        sizes.push(size);
        projected += size;
    }
    sizes
}
