use rand::distributions::Uniform;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use super::error::DataError;
use super::model::{Measurements, Observation, ObservationRow, Position};

// ---------------------------------------------------------------------------
// Synthetic floater paths
// ---------------------------------------------------------------------------

/// How many floaters and steps to generate, and from which seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticConfig {
    pub floaters: usize,
    pub steps: usize,
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            floaters: 10,
            steps: 6,
            seed: 42,
        }
    }
}

/// Start box for the random walk (central Indian Ocean).
const START_LAT: (f64, f64) = (-20.0, 20.0);
const START_LON: (f64, f64) = (50.0, 80.0);

/// Upper bound on `floaters × steps`.
pub const MAX_ROWS: usize = 1_000_000;

/// Per-step drift in degrees, applied to both axes.
const DRIFT_DEG: f64 = 0.5;
const JITTER_DEG: f64 = 0.1;

/// (name, first value, last value, noise σ) for each synthetic measurement.
const TRENDS: [(&str, f64, f64, f64); 3] = [
    ("temperature", 28.0, 22.0, 0.3),
    ("salinity", 34.5, 35.5, 0.05),
    ("pH", 8.15, 8.05, 0.01),
];

fn normal(std_dev: f64) -> Result<Normal<f64>, DataError> {
    Normal::new(0.0, std_dev).map_err(|e| DataError::InvalidConfig(e.to_string()))
}

/// Value at `step` of a linear ramp from `start` to `end` over `steps` points.
fn linspace_at(start: f64, end: f64, steps: usize, step: usize) -> f64 {
    if steps <= 1 {
        return start;
    }
    start + (end - start) * step as f64 / (steps - 1) as f64
}

/// Generate `floaters × steps` rows, floater by floater, step by step.
///
/// Identical seeds give identical rows; the caller owns the generator.
pub fn generate<R: Rng + ?Sized>(
    config: &SyntheticConfig,
    rng: &mut R,
) -> Result<Vec<ObservationRow>, DataError> {
    let start_lat = Uniform::new(START_LAT.0, START_LAT.1);
    let start_lon = Uniform::new(START_LON.0, START_LON.1);
    let jitter = normal(JITTER_DEG)?;
    let noise = TRENDS
        .iter()
        .map(|&(_, _, _, sd)| normal(sd))
        .collect::<Result<Vec<_>, _>>()?;

    let total = config
        .floaters
        .checked_mul(config.steps)
        .filter(|&n| n <= MAX_ROWS)
        .ok_or_else(|| {
            DataError::InvalidConfig(format!(
                "{} floaters × {} steps exceeds {MAX_ROWS} rows",
                config.floaters, config.steps
            ))
        })?;
    if total == 0 {
        return Ok(Vec::new());
    }

    let mut rows = Vec::with_capacity(total);
    for i in 0..config.floaters {
        let float_id = format!("Floater {}", i + 1);
        let mut lat = start_lat.sample(rng);
        let mut lon = start_lon.sample(rng);

        for step in 0..config.steps {
            if step > 0 {
                lat += DRIFT_DEG + jitter.sample(rng);
                lon += DRIFT_DEG + jitter.sample(rng);
            }
            let position = Position::new(lat.clamp(-90.0, 90.0), lon.clamp(-180.0, 180.0))
                .ok_or_else(|| DataError::InvalidConfig(format!("walk left the globe at step {step}")))?;

            let measurements: Measurements = TRENDS
                .iter()
                .zip(&noise)
                .map(|(&(name, start, end, _), dist)| {
                    let value = linspace_at(start, end, config.steps, step) + dist.sample(rng);
                    (name.to_string(), value)
                })
                .collect();

            rows.push(ObservationRow {
                float_id: float_id.clone(),
                observation: Observation {
                    time: None,
                    position,
                    measurements,
                },
            });
        }
    }

    log::debug!(
        "generated {} synthetic rows for {} floaters (seed {})",
        rows.len(),
        config.floaters,
        config.seed
    );
    Ok(rows)
}
