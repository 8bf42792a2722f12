use std::path::PathBuf;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::error::DataError;
use super::index::FloaterIndex;
use super::loader;
use super::model::{Dataset, LoadReport, Variant};
use super::synthetic::{self, SyntheticConfig};

/// Where a session's observations come from.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    Synthetic(SyntheticConfig),
    File(PathBuf),
}

impl DataSource {
    pub fn variant(&self) -> Variant {
        match self {
            DataSource::Synthetic(_) => Variant::Synthetic,
            DataSource::File(_) => Variant::File,
        }
    }

    /// Read (or generate) the rows and build the immutable dataset.
    pub fn load(&self) -> Result<Dataset, DataError> {
        let (rows, report, label) = match self {
            DataSource::Synthetic(config) => {
                let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
                let rows = synthetic::generate(config, &mut rng)?;
                let report = LoadReport {
                    rows_read: rows.len(),
                    ..LoadReport::default()
                };
                (rows, report, format!("synthetic, seed {}", config.seed))
            }
            DataSource::File(path) => {
                let (rows, report) = loader::load_file(path)?;
                let label = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                (rows, report, label)
            }
        };

        let index = FloaterIndex::from_rows(rows);
        log::info!(
            "loaded {} floaters from {label} ({} of {} rows kept)",
            index.len(),
            report.rows_kept(),
            report.rows_read
        );

        Ok(Dataset {
            variant: self.variant(),
            label,
            index,
            report,
        })
    }

    /// The same source with the next seed; files are returned unchanged.
    pub fn reseeded(&self) -> DataSource {
        match self {
            DataSource::Synthetic(config) => DataSource::Synthetic(SyntheticConfig {
                seed: config.seed.wrapping_add(1),
                ..*config
            }),
            DataSource::File(path) => DataSource::File(path.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_by_six_synthetic_dataset() {
        let dataset = DataSource::Synthetic(SyntheticConfig::default()).load().unwrap();

        assert_eq!(dataset.variant, Variant::Synthetic);
        assert_eq!(dataset.index.len(), 10);
        assert!(dataset.index.iter().all(|f| f.len() == 6));
        assert_eq!(dataset.index.get("Floater 3").map(|f| f.len()), Some(6));
        assert_eq!(dataset.report.rows_kept(), 60);
    }

    #[test]
    fn synthetic_floaters_list_in_generation_order() {
        let dataset = DataSource::Synthetic(SyntheticConfig::default()).load().unwrap();
        let ids: Vec<&str> = dataset.index.ids().collect();
        assert_eq!(ids[0], "Floater 1");
        assert_eq!(ids[1], "Floater 2");
        assert_eq!(ids[9], "Floater 10");
    }

    #[test]
    fn reseeding_changes_only_the_seed() {
        let source = DataSource::Synthetic(SyntheticConfig::default());
        match source.reseeded() {
            DataSource::Synthetic(config) => {
                assert_eq!(config.seed, 43);
                assert_eq!(config.floaters, 10);
            }
            other => panic!("unexpected source {other:?}"),
        }
    }

    #[test]
    fn zero_steps_gives_an_empty_dataset() {
        let dataset = DataSource::Synthetic(SyntheticConfig {
            steps: 0,
            ..SyntheticConfig::default()
        })
        .load()
        .unwrap();
        assert!(dataset.is_empty());
    }
}
