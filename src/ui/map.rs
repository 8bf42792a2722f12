use eframe::egui::{self, Ui};
use egui_plot::{Legend, Line, Plot, PlotBounds, PlotPoint, PlotPoints, Points, Text};

use crate::color::{MARKER_COLOR, TRAIL_COLOR};
use crate::layers::{to_overview_layer, to_path_layer, to_point_layer};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Map (central panel)
// ---------------------------------------------------------------------------

/// Longitude on x, latitude on y, one degree per degree.
pub fn float_map(ui: &mut Ui, state: &mut AppState) {
    let dataset = match &state.dataset {
        Some(ds) => ds,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("No data to show  (File → Open…)");
            });
            return;
        }
    };
    if dataset.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("The dataset contains no floaters.");
        });
        return;
    }

    let (min, max) = state.config.map_view.bounds();
    let reset = std::mem::take(&mut state.reset_view);

    Plot::new("float_map")
        .legend(Legend::default())
        .data_aspect(1.0)
        .x_axis_label("Longitude (°E)")
        .y_axis_label("Latitude (°N)")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            if reset {
                plot_ui.set_plot_bounds(PlotBounds::from_min_max(min, max));
            }

            match &state.frame {
                // Animating or finished: trail and current marker.
                Some(frame) => {
                    if let Some(path) = to_path_layer(frame) {
                        plot_ui.line(
                            Line::new(PlotPoints::from(path.path))
                                .name("trail")
                                .color(TRAIL_COLOR)
                                .width(2.0),
                        );
                    }
                    if let Some(point) = to_point_layer(frame) {
                        let [lon, lat] = point.position;
                        plot_ui.points(
                            Points::new(PlotPoints::from(vec![point.position]))
                                .name(&point.floater_id)
                                .color(MARKER_COLOR)
                                .radius(6.0),
                        );
                        if let Some(step) = frame.as_step() {
                            plot_ui.text(
                                Text::new(
                                    PlotPoint::new(lon, lat),
                                    format!("  {}: Step {}", step.floater_id, step.step),
                                )
                                .anchor(egui::Align2::LEFT_BOTTOM),
                            );
                        }
                    }
                }
                // Idle: every floater at its first observation.
                None => {
                    for point in to_overview_layer(&dataset.index) {
                        plot_ui.points(
                            Points::new(PlotPoints::from(vec![point.position]))
                                .name(&point.floater_id)
                                .color(state.colors.color_for(&point.floater_id))
                                .radius(5.0),
                        );
                    }
                }
            }
        });
}
