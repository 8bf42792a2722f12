use std::time::Duration;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::anim::scheduler::Playback;
use crate::data::model::Variant;
use crate::data::source::DataSource;
use crate::layers::{to_info_text, unit};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – selection, animation controls, info
// ---------------------------------------------------------------------------

/// Render the left control panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState, now: Duration) {
    ui.heading("Floaters");
    ui.separator();

    let Some(dataset) = &state.dataset else {
        ui.label("No dataset loaded.");
        return;
    };
    if dataset.is_empty() {
        ui.label("This dataset has no floaters.");
        return;
    }

    // Clone what we need so we can mutate state inside the loop.
    let ids: Vec<String> = dataset.index.ids().map(str::to_string).collect();

    ui.strong("Select a floater");
    ScrollArea::vertical()
        .id_salt("floater_list")
        .max_height(220.0)
        .auto_shrink([false, true])
        .show(ui, |ui: &mut Ui| {
            for id in &ids {
                let checked = state.selected.as_deref() == Some(id.as_str());
                let text = RichText::new(id).color(state.colors.color_for(id));
                if ui.radio(checked, text).clicked() {
                    state.select(id);
                }
            }
        });
    ui.separator();

    // ---- Animate / Stop ----
    ui.horizontal(|ui: &mut Ui| {
        if ui
            .add_enabled(state.can_animate(), egui::Button::new("▶ Animate"))
            .clicked()
        {
            state.animate(now);
        }
        if ui
            .add_enabled(state.animator.is_animating(), egui::Button::new("■ Stop"))
            .clicked()
        {
            state.stop();
        }
    });

    let status = match state.animator.state() {
        Playback::Idle => "Idle".to_string(),
        Playback::Animating { .. } => format!(
            "Animating, one step every {:.1} s",
            state.animator.delay().as_secs_f64()
        ),
        Playback::Finished { floater_id } => format!("Finished {floater_id}"),
    };
    ui.weak(status);

    if let Some(step) = state.frame.as_ref().and_then(|f| f.as_step()) {
        let progress = (step.step + 1) as f32 / step.total_steps.max(1) as f32;
        ui.add(
            egui::ProgressBar::new(progress)
                .text(format!("Step {} / {}", step.step + 1, step.total_steps)),
        );
    }
    ui.separator();

    // ---- Info panel ----
    let names = state
        .dataset
        .as_ref()
        .map(|d| d.measurement_names())
        .unwrap_or_default();
    match &state.frame {
        Some(frame) => {
            ui.label(RichText::new(to_info_text(frame, names)).monospace());
        }
        None => {
            ui.label("Select a floater and click Animate to see its journey.");
        }
    }
    ui.separator();

    egui::CollapsingHeader::new(RichText::new("Observations").strong())
        .default_open(false)
        .show(ui, |ui: &mut Ui| observation_table(ui, state));
}

/// Table of the selected floater's observations.
fn observation_table(ui: &mut Ui, state: &AppState) {
    let (Some(floater), Some(dataset)) = (state.selected_floater(), state.dataset.as_ref()) else {
        return;
    };
    let names = dataset.measurement_names();
    let first_header = match dataset.variant {
        Variant::Synthetic => "step",
        Variant::File => "time (UTC)",
    };

    TableBuilder::new(ui)
        .striped(true)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .column(Column::auto())
        .columns(Column::auto(), 2 + names.len())
        .header(18.0, |mut header| {
            header.col(|ui| {
                ui.strong(first_header);
            });
            header.col(|ui| {
                ui.strong("lat");
            });
            header.col(|ui| {
                ui.strong("lon");
            });
            for name in names {
                header.col(|ui| {
                    ui.strong(format!("{name} {}", unit(name)).trim_end());
                });
            }
        })
        .body(|body| {
            body.rows(18.0, floater.len(), |mut row| {
                let i = row.index();
                let obs = &floater.observations[i];
                row.col(|ui| {
                    let label = obs
                        .time
                        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_else(|| i.to_string());
                    ui.label(label);
                });
                row.col(|ui| {
                    ui.label(format!("{:.3}", obs.position.lat));
                });
                row.col(|ui| {
                    ui.label(format!("{:.3}", obs.position.lon));
                });
                for name in names {
                    row.col(|ui| {
                        match obs.measurements.get(*name) {
                            Some(v) => ui.label(format!("{v:.2}")),
                            None => ui.label("–"),
                        };
                    });
                }
            });
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Synthetic floaters").clicked() {
                let synthetic = match &state.config.source {
                    source @ DataSource::Synthetic(_) => source.clone(),
                    DataSource::File(_) => DataSource::Synthetic(Default::default()),
                };
                state.load(synthetic);
                ui.close_menu();
            }
        });

        if matches!(state.source, DataSource::Synthetic(_)) && ui.button("Regenerate").clicked() {
            state.regenerate();
        }

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} floaters, {} observations ({})",
                ds.index.len(),
                ds.index.total_observations(),
                ds.label
            ));
            let dropped = ds.report.dropped_malformed + ds.report.dropped_untimed;
            if dropped > 0 {
                ui.label(
                    RichText::new(format!("{dropped} rows skipped")).color(Color32::YELLOW),
                )
                .on_hover_text(format!(
                    "{} malformed, {} without a usable time",
                    ds.report.dropped_malformed, ds.report.dropped_untimed
                ));
            }
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open float observations")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        log::info!("Opening {}", path.display());
        state.load(DataSource::File(path));
    }
}
