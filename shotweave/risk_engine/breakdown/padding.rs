use std::ops::RangeInclusive;

use parking_lot::Mutex;
use rand::{rngs::SmallRng, thread_rng, Rng, SeedableRng};

/// Extra locations assumed beyond what recognition found.
pub const LOCATION_PADDING: RangeInclusive<usize> = 1..=3;
/// Extra characters assumed beyond what recognition found.
pub const CHARACTER_PADDING: RangeInclusive<usize> = 2..=5;

/// Source of the count padding that models entities recognition missed.
pub trait PaddingSource: Send + Sync {
    /// Padding added to the location count.
    fn location_padding(&self) -> usize;
    /// Padding added to the character count.
    fn character_padding(&self) -> usize;
}

/// Uniform random padding within [`LOCATION_PADDING`] and [`CHARACTER_PADDING`].
///
/// Non-deterministic unless constructed with [`RandomPadding::seeded`]. Unseeded draws use
/// the calling thread's generator, so concurrent breakdowns share no state.
#[derive(Debug, Default)]
pub struct RandomPadding {
    seeded: Option<Mutex<SmallRng>>,
}

impl RandomPadding {
    /// Entropy-seeded padding drawn from the thread-local generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { seeded: None }
    }

    /// Reproducible padding sequence.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            seeded: Some(Mutex::new(SmallRng::seed_from_u64(seed))),
        }
    }

    fn draw(&self, range: RangeInclusive<usize>) -> usize {
        match &self.seeded {
            Some(rng) => rng.lock().gen_range(range),
            None => thread_rng().gen_range(range),
        }
    }
}

impl PaddingSource for RandomPadding {
    fn location_padding(&self) -> usize {
        self.draw(LOCATION_PADDING)
    }

    fn character_padding(&self) -> usize {
        self.draw(CHARACTER_PADDING)
    }
}

/// No padding at all; counts equal the recognised entities.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPadding;

impl PaddingSource for NoPadding {
    fn location_padding(&self) -> usize {
        0
    }

    fn character_padding(&self) -> usize {
        0
    }
}

/// Constant padding.
#[derive(Debug, Clone, Copy)]
pub struct FixedPadding {
    /// Added to the location count.
    pub locations: usize,
    /// Added to the character count.
    pub characters: usize,
}

impl PaddingSource for FixedPadding {
    fn location_padding(&self) -> usize {
        self.locations
    }

    fn character_padding(&self) -> usize {
        self.characters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_padding_stays_in_range() {
        let padding = RandomPadding::new();
        for _ in 0..200 {
            assert!(LOCATION_PADDING.contains(&padding.location_padding()));
            assert!(CHARACTER_PADDING.contains(&padding.character_padding()));
        }
    }

    #[test]
    fn seeded_padding_repeats() {
        let a = RandomPadding::seeded(7);
        let b = RandomPadding::seeded(7);
        let left: Vec<_> = (0..10)
            .map(|_| (a.location_padding(), a.character_padding()))
            .collect();
        let right: Vec<_> = (0..10)
            .map(|_| (b.location_padding(), b.character_padding()))
            .collect();
        assert_eq!(left, right);
    }

    #[test]
    fn unseeded_padding_draws_in_parallel() {
        let padding = std::sync::Arc::new(RandomPadding::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let padding = std::sync::Arc::clone(&padding);
                std::thread::spawn(move || {
                    (0..100).all(|_| {
                        LOCATION_PADDING.contains(&padding.location_padding())
                            && CHARACTER_PADDING.contains(&padding.character_padding())
                    })
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert!(padding.seeded.is_none());
    }
}
