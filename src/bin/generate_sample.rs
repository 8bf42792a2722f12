use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Duration, TimeZone, Utc};
use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::Serialize;

/// Write a CSV of profiling-float surface observations for trying out the dashboard.
#[derive(Debug, Parser)]
struct Args {
    #[arg(long, default_value = "sample_floats.csv")]
    output: PathBuf,

    /// Number of floats.
    #[arg(long, default_value_t = 8)]
    floats: usize,

    /// Surfacing cycles per float.
    #[arg(long, default_value_t = 24)]
    cycles: usize,

    /// Days between surfacings.
    #[arg(long, default_value_t = 10)]
    cycle_days: i64,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Shuffle rows and sprinkle in malformed lines, like a raw export.
    #[arg(long)]
    messy: bool,
}

#[derive(Debug, Serialize)]
struct Row {
    float_id: String,
    time: String,
    latitude: String,
    longitude: String,
    temperature: String,
    salinity: String,
    pressure: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let step = Normal::new(0.0, 0.35).context("drift distribution")?;
    let noise = Normal::new(0.0, 1.0).context("noise distribution")?;
    let start = Utc
        .with_ymd_and_hms(2023, 1, 1, 0, 0, 0)
        .single()
        .context("start date")?;

    let mut rows = Vec::with_capacity(args.floats * args.cycles);
    for f in 0..args.floats {
        // WMO-style seven digit platform numbers.
        let float_id = format!("{}", 2_902_700 + f * 7);
        let mut lat: f64 = rng.gen_range(-25.0..15.0);
        let mut lon: f64 = rng.gen_range(55.0..95.0);
        let launch = start + Duration::hours(rng.gen_range(0..240));
        // Warmer floats sit further north.
        let base_temp = 27.5 + lat * 0.08;

        for c in 0..args.cycles {
            if c > 0 {
                lat = (lat + step.sample(&mut rng) - 0.05).clamp(-60.0, 25.0);
                lon = (lon + step.sample(&mut rng) + 0.1).clamp(30.0, 120.0);
            }
            let season = (c as f64 / 36.5 * std::f64::consts::TAU).sin();
            let time = launch + Duration::days(args.cycle_days * c as i64);

            rows.push(Row {
                float_id: float_id.clone(),
                time: time.format("%Y-%m-%d %H:%M:%S").to_string(),
                latitude: format!("{lat:.4}"),
                longitude: format!("{lon:.4}"),
                temperature: format!("{:.3}", base_temp + 1.2 * season + 0.25 * noise.sample(&mut rng)),
                salinity: format!("{:.3}", 34.9 - 0.15 * season + 0.05 * noise.sample(&mut rng)),
                pressure: format!("{:.1}", (5.0 + 1.5 * noise.sample(&mut rng)).max(0.5)),
            });
        }
    }

    if args.messy {
        make_messy(&mut rows, &mut rng);
    }

    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    for row in &rows {
        writer.serialize(row).context("writing row")?;
    }
    writer.flush().context("flushing CSV")?;

    println!(
        "Wrote {} observations of {} floats to {}",
        rows.len(),
        args.floats,
        args.output.display()
    );
    Ok(())
}

/// Shuffle the rows and corrupt a handful of fields.
fn make_messy(rows: &mut Vec<Row>, rng: &mut ChaCha8Rng) {
    use rand::seq::SliceRandom;

    rows.shuffle(rng);
    let n = rows.len();
    if n == 0 {
        return;
    }
    for _ in 0..(n / 50).max(1) {
        let i = rng.gen_range(0..n);
        match rng.gen_range(0..3) {
            0 => rows[i].latitude = "NaN".into(),
            1 => rows[i].time = "unknown".into(),
            _ => rows[i].temperature = String::new(),
        }
    }
}
