use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::data::model::Variant;
use crate::data::source::DataSource;
use crate::data::synthetic::SyntheticConfig;

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Debug, Parser)]
#[command(name = "floatwatch", version, about = "Animate ocean floater tracks and readings")]
pub struct Cli {
    /// Observation file (.csv, .json or .parquet). Synthetic paths when omitted.
    #[arg(long, value_name = "PATH")]
    pub data: Option<PathBuf>,

    /// Seed for synthetic paths.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Number of synthetic floaters.
    #[arg(long, default_value_t = 10)]
    pub floaters: usize,

    /// Steps per synthetic floater.
    #[arg(long, default_value_t = 6)]
    pub steps: usize,

    /// Seconds between animation steps [default: 1.0 synthetic, 0.5 file].
    #[arg(long, value_name = "SECS")]
    pub delay: Option<f64>,

    /// Print frames as JSON lines instead of opening a window.
    #[arg(long, requires = "floater")]
    pub headless: bool,

    /// Floater to animate in headless mode.
    #[arg(long, value_name = "ID", requires = "headless")]
    pub floater: Option<String>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Initial map viewpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    pub center_lat: f64,
    pub center_lon: f64,
    /// Web-map style zoom: each level halves the visible span.
    pub zoom: u8,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center_lat: 0.0,
            center_lon: 70.0,
            zoom: 2,
        }
    }
}

impl MapView {
    /// Longitude span shown at this zoom; latitude shows half of it.
    pub fn lon_span(&self) -> f64 {
        360.0 / 2f64.powi(i32::from(self.zoom))
    }

    /// `([min_lon, min_lat], [max_lon, max_lat])` of the initial view.
    pub fn bounds(&self) -> ([f64; 2], [f64; 2]) {
        let half_lon = self.lon_span() / 2.0;
        let half_lat = half_lon / 2.0;
        (
            [self.center_lon - half_lon, (self.center_lat - half_lat).max(-90.0)],
            [self.center_lon + half_lon, (self.center_lat + half_lat).min(90.0)],
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessOptions {
    pub floater: String,
}

/// Everything the session needs, fixed at launch.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub source: DataSource,
    /// Overrides the variant's default cadence.
    pub delay: Option<Duration>,
    pub map_view: MapView,
    pub headless: Option<HeadlessOptions>,
}

/// Default time between animation steps for each variant.
pub fn default_delay(variant: Variant) -> Duration {
    match variant {
        Variant::Synthetic => Duration::from_secs_f64(1.0),
        Variant::File => Duration::from_secs_f64(0.5),
    }
}

impl DashboardConfig {
    /// Cadence for `variant`, honouring an explicit override.
    pub fn delay_for(&self, variant: Variant) -> Duration {
        self.delay.unwrap_or_else(|| default_delay(variant))
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            source: DataSource::Synthetic(SyntheticConfig::default()),
            delay: None,
            map_view: MapView::default(),
            headless: None,
        }
    }
}

impl TryFrom<Cli> for DashboardConfig {
    type Error = anyhow::Error;

    fn try_from(cli: Cli) -> anyhow::Result<Self> {
        let delay = match cli.delay {
            Some(secs) => match Duration::try_from_secs_f64(secs) {
                Ok(delay) => Some(delay),
                Err(_) => anyhow::bail!("--delay must be a non-negative number of seconds, got {secs}"),
            },
            None => None,
        };

        let source = match cli.data {
            Some(path) => DataSource::File(path),
            None => DataSource::Synthetic(SyntheticConfig {
                floaters: cli.floaters,
                steps: cli.steps,
                seed: cli.seed,
            }),
        };

        let headless = match (cli.headless, cli.floater) {
            (true, Some(floater)) => Some(HeadlessOptions { floater }),
            _ => None,
        };

        Ok(DashboardConfig {
            source,
            delay,
            map_view: MapView::default(),
            headless,
        })
    }
}
