//! Rejection-sampling preference generator.

use super::config::{GeneratorConfig, MILD_BAND, STRONG_BAND};
use super::matrix::{PreferenceMatrix, MAX_SCORE, MIN_SCORE, SELF_SCORE};
use crate::error::GroupingError;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

/// Creates a seeded RNG.
pub fn create_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Generates synthetic preference matrices.
///
/// For every row the generator draws the mild and strong bands, computes
/// the leftover `points_to_give - sum - 1`, and retries the whole row when
/// the leftover falls outside `[1, 9]`. Accepted rows are shuffled and the
/// self-score is inserted at the student's own position.
///
/// # Examples
///
/// ```
/// use u_groupform::preferences::{GeneratorConfig, PreferenceGenerator};
///
/// let generator = PreferenceGenerator::new(GeneratorConfig::new(9).with_seed(10)).unwrap();
/// let matrix = generator.generate().unwrap();
/// assert_eq!(matrix.size(), 9);
/// assert!(matrix.rows().all(|row| row.iter().map(|&s| s as u32).sum::<u32>() == 34));
/// ```
#[derive(Debug, Clone)]
pub struct PreferenceGenerator {
    config: GeneratorConfig,
}

impl PreferenceGenerator {
    /// Creates a generator after validating the configuration.
    pub fn new(config: GeneratorConfig) -> Result<Self, GroupingError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The validated configuration.
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generates a matrix using the configured seed (or a random one).
    pub fn generate(&self) -> Result<PreferenceMatrix, GroupingError> {
        let mut rng = match self.config.seed {
            Some(seed) => create_rng(seed),
            None => create_rng(rand::random()),
        };
        self.generate_with_rng(&mut rng)
    }

    /// Generates a matrix drawing from a caller-supplied RNG.
    pub fn generate_with_rng<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<PreferenceMatrix, GroupingError> {
        let n = self.config.students;
        let rows = (0..n)
            .map(|i| self.generate_row(i, rng))
            .collect::<Result<Vec<_>, _>>()?;
        let matrix = PreferenceMatrix::from_rows(rows)?;
        info!(
            students = n,
            points_to_give = matrix.points_per_row(),
            "preference matrix generated"
        );
        Ok(matrix)
    }

    fn generate_row<R: Rng + ?Sized>(
        &self,
        row: usize,
        rng: &mut R,
    ) -> Result<Vec<u8>, GroupingError> {
        let points = i64::from(self.config.points_to_give());
        let mild = self.config.mild_count();
        let strong = self.config.strong_count();

        for attempt in 1..=self.config.max_attempts_per_row {
            let mut scores: Vec<u8> = Vec::with_capacity(self.config.students);
            scores.extend((0..mild).map(|_| rng.random_range(MILD_BAND.0..=MILD_BAND.1)));
            scores.extend((0..strong).map(|_| rng.random_range(STRONG_BAND.0..=STRONG_BAND.1)));

            let drawn: i64 = scores.iter().map(|&s| i64::from(s)).sum();
            let leftover = points - drawn - i64::from(SELF_SCORE);
            if !(i64::from(MIN_SCORE)..=i64::from(MAX_SCORE)).contains(&leftover) {
                continue;
            }

            scores.push(leftover as u8);
            scores.shuffle(rng);
            scores.insert(row, SELF_SCORE);
            debug!(row, attempt, "row accepted");
            return Ok(scores);
        }

        Err(GroupingError::GenerationExhausted {
            row,
            attempts: self.config.max_attempts_per_row,
        })
    }
}
