use chrono::DateTime;
use eframe::egui::Ui;
use egui_plot::{Legend, Line, Plot, PlotPoints, Points};

use crate::color::generate_palette;
use crate::data::model::Floater;
use crate::layers::{to_chart_series, XAxis};

const SECONDS_PER_DAY: f64 = 86_400.0;

// ---------------------------------------------------------------------------
// Measurement chart (bottom panel, once an animation has finished)
// ---------------------------------------------------------------------------

/// Line chart of every measurement along the floater's path.
pub fn measurement_chart(ui: &mut Ui, floater: &Floater, names: &[&str]) {
    let chart = to_chart_series(floater, names);
    ui.heading(format!("Ocean data for {}", chart.floater_id));

    // Time axes are shown as days since the first observation.
    let origin = chart.x.first().copied().unwrap_or_default();
    let (x, x_label): (Vec<f64>, String) = match chart.x_axis {
        XAxis::Step => (chart.x.clone(), "Step".to_string()),
        XAxis::Time => {
            let start = DateTime::from_timestamp(origin as i64, 0)
                .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
                .unwrap_or_default();
            (
                chart.x.iter().map(|t| (t - origin) / SECONDS_PER_DAY).collect(),
                format!("Days since {start}"),
            )
        }
    };

    Plot::new("measurement_chart")
        .legend(Legend::default())
        .x_axis_label(x_label)
        .y_axis_label("Value")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            let colors = generate_palette(chart.series.len());
            for (series, color) in chart.series.iter().zip(colors) {
                let points: Vec<[f64; 2]> = x
                    .iter()
                    .zip(&series.values)
                    .map(|(&xi, &yi)| [xi, yi])
                    .collect();

                plot_ui.line(
                    Line::new(PlotPoints::from(points.clone()))
                        .name(&series.name)
                        .color(color)
                        .width(1.5),
                );
                plot_ui.points(
                    Points::new(PlotPoints::from(points))
                        .name(&series.name)
                        .color(color)
                        .radius(3.0),
                );
            }
        });
}
