//! Door light flicker: a random decay that snaps back to full brightness.

use rand::Rng;

/// Intensity restored once the decay would take the light below zero.
pub const FLICKER_RESET_INTENSITY: f32 = 5.0;

/// Largest amount subtracted in a single tick.
pub const FLICKER_MAX_DECREMENT: f32 = 4.0;

/// Decay-and-reset rule for a light's intensity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Flicker {
    pub reset_intensity: f32,
    pub max_decrement: f32,
}

impl Default for Flicker {
    fn default() -> Self {
        Self {
            reset_intensity: FLICKER_RESET_INTENSITY,
            max_decrement: FLICKER_MAX_DECREMENT,
        }
    }
}

impl Flicker {
    /// Next intensity for a uniform `sample` in `[0, 1)`.
    ///
    /// The reset happens within the same call, so the returned value is
    /// never negative.
    pub fn apply(&self, intensity: f32, sample: f32) -> f32 {
        let next = intensity - sample * self.max_decrement;
        if next < 0.0 { self.reset_intensity } else { next }
    }

    /// Next intensity with a fresh draw from `rng`.
    pub fn step<R: Rng + ?Sized>(&self, intensity: f32, rng: &mut R) -> f32 {
        self.apply(intensity, rng.random::<f32>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_decrement_without_reset() {
        let next = Flicker::default().apply(5.0, 0.9);
        assert!((next - 1.4).abs() < 1e-5, "got {next}");
    }

    #[test]
    fn test_reset_on_negative() {
        let next = Flicker::default().apply(0.5, 0.8);
        assert_eq!(next, 5.0);
    }

    #[test]
    fn test_exact_zero_is_not_reset() {
        let next = Flicker::default().apply(2.0, 0.5);
        assert_eq!(next, 0.0);
    }

    #[test]
    fn test_zero_sample_keeps_intensity() {
        assert_eq!(Flicker::default().apply(3.25, 0.0), 3.25);
    }

    #[test]
    fn test_seeded_sequence_is_reproducible() {
        let flicker = Flicker::default();
        let run = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut intensity = FLICKER_RESET_INTENSITY;
            (0..32)
                .map(|_| {
                    intensity = flicker.step(intensity, &mut rng);
                    intensity
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(run(3), run(3));
    }

    #[test]
    fn test_long_run_resets_at_least_once() {
        let flicker = Flicker::default();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut intensity = FLICKER_RESET_INTENSITY;
        let mut resets = 0;
        for _ in 0..100 {
            let before = intensity;
            intensity = flicker.step(intensity, &mut rng);
            if intensity > before {
                resets += 1;
                assert_eq!(intensity, FLICKER_RESET_INTENSITY);
            }
        }
        assert!(resets > 0);
    }

    proptest! {
        #[test]
        fn prop_intensity_stays_in_range(
            start in 0.0f32..=5.0,
            samples in proptest::collection::vec(0.0f32..1.0, 1..200),
        ) {
            let flicker = Flicker::default();
            let mut intensity = start;
            for sample in samples {
                intensity = flicker.apply(intensity, sample);
                prop_assert!(intensity >= 0.0);
                prop_assert!(intensity <= FLICKER_RESET_INTENSITY);
            }
        }
    }
}
