use std::io::{self, Write};

use anyhow::{Context, Result};
use serde_json::{json, Value as JsonValue};

use crate::anim::scheduler::{play, CancelFlag, PlayOutcome, SystemClock};
use crate::anim::sequencer::Frame;
use crate::config::{DashboardConfig, HeadlessOptions};
use crate::layers::{to_chart_series, to_info_text, to_path_layer, to_point_layer};

// ---------------------------------------------------------------------------
// Headless playback: one JSON object per line on stdout
// ---------------------------------------------------------------------------

/// Animate one floater without a window, at the configured cadence.
///
/// Each step is printed as it becomes due, then the terminal record and the
/// measurement chart.
pub fn run(config: &DashboardConfig, options: &HeadlessOptions) -> Result<()> {
    let dataset = config.source.load().context("loading dataset")?;
    let floater = dataset.index.get(&options.floater).with_context(|| {
        let known: Vec<&str> = dataset.index.ids().take(10).collect();
        format!("no floater '{}' (known: {})", options.floater, known.join(", "))
    })?;
    let names = dataset.measurement_names();
    let delay = config.delay_for(dataset.variant);

    let mut out = io::stdout().lock();
    let cancel = CancelFlag::default();
    let mut write_error = None;

    let outcome = play(floater, delay, &SystemClock::new(), &cancel, |frame| {
        if let Err(e) = writeln!(out, "{}", frame_record(frame, names)) {
            // Reader went away; stop instead of sleeping through the rest.
            write_error = Some(e);
            cancel.cancel();
        }
    });
    if let Some(e) = write_error {
        return Err(e).context("writing frame");
    }

    if let PlayOutcome::Completed { frames } = outcome {
        log::info!("played {frames} frames of {}", floater.id);
        let chart = json!({ "type": "chart", "chart": to_chart_series(floater, names) });
        writeln!(out, "{chart}").context("writing chart")?;
    }
    out.flush().context("flushing stdout")?;
    Ok(())
}

/// JSON record for one frame.
pub fn frame_record(frame: &Frame, names: &[&str]) -> JsonValue {
    match frame {
        Frame::Step(step) => json!({
            "type": "frame",
            "floater": step.floater_id,
            "step": step.step,
            "total_steps": step.total_steps,
            "time": step.time.map(|t| t.to_rfc3339()),
            "point": to_point_layer(frame).map(|p| p.to_geojson()),
            "path": to_path_layer(frame).map(|p| p.to_geojson()),
            "measurements": step.measurements,
            "info": to_info_text(frame, names),
        }),
        Frame::Complete {
            floater_id,
            total_steps,
        } => json!({
            "type": "complete",
            "floater": floater_id,
            "total_steps": total_steps,
        }),
    }
}
