use std::sync::{Mutex, PoisonError};

use rand::{Rng, SeedableRng, rngs::StdRng};

pub const MIN_AWARD: i32 = 1;
pub const MAX_AWARD: i32 = 10;

/// Source of award amounts. Every draw lies in `MIN_AWARD..=MAX_AWARD`.
pub trait PointsSource: Send + Sync {
    fn draw(&self) -> i32;
}

/// Uniform draws from the thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomPoints;

impl PointsSource for RandomPoints {
    fn draw(&self) -> i32 {
        rand::thread_rng().gen_range(MIN_AWARD..=MAX_AWARD)
    }
}

/// Uniform draws from a seeded generator, reproducible across runs.
#[derive(Debug)]
pub struct SeededPoints {
    rng: Mutex<StdRng>,
}

impl SeededPoints {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl PointsSource for SeededPoints {
    fn draw(&self) -> i32 {
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen_range(MIN_AWARD..=MAX_AWARD)
    }
}
