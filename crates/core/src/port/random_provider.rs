// Random Provider Port (for deterministic shuffles in tests)

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::Mutex;

/// Source of uniformly random permutations
pub trait RandomProvider: Send + Sync {
    /// A uniformly random permutation of `0..n`
    fn permutation(&self, n: usize) -> Vec<usize>;
}

/// Thread-local RNG provider (production)
pub struct ThreadRngProvider;

impl RandomProvider for ThreadRngProvider {
    fn permutation(&self, n: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..n).collect();
        // Fisher-Yates
        order.shuffle(&mut rand::thread_rng());
        order
    }
}

/// Seeded provider: same seed, same sequence of permutations
pub struct SeededRandomProvider {
    rng: Mutex<StdRng>,
}

impl SeededRandomProvider {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomProvider for SeededRandomProvider {
    fn permutation(&self, n: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..n).collect();
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        order.shuffle(&mut *rng);
        order
    }
}
