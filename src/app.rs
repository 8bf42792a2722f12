use std::time::Duration;

use eframe::egui;

use crate::config::DashboardConfig;
use crate::state::AppState;
use crate::ui::{chart, map, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct FloatWatchApp {
    pub state: AppState,
}

impl FloatWatchApp {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            state: AppState::new(config),
        }
    }
}

impl eframe::App for FloatWatchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // egui's frame clock drives the animation.
        let now = Duration::try_from_secs_f64(ctx.input(|i| i.time)).unwrap_or_default();
        self.state.tick(now);

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: selection and controls ----
        egui::SidePanel::left("control_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state, now);
            });

        // ---- Bottom panel: measurement chart once the animation is done ----
        if self.state.animator.is_finished() {
            if let (Some(floater), Some(dataset)) =
                (self.state.selected_floater(), self.state.dataset.as_ref())
            {
                egui::TopBottomPanel::bottom("chart_panel")
                    .default_height(280.0)
                    .resizable(true)
                    .show(ctx, |ui| {
                        chart::measurement_chart(ui, floater, dataset.measurement_names());
                    });
            }
        }

        // ---- Central panel: map ----
        egui::CentralPanel::default().show(ctx, |ui| {
            map::float_map(ui, &mut self.state);
        });

        // Wake up when the next step is due (including one started this frame).
        if let Some(due) = self.state.animator.next_due() {
            ctx.request_repaint_after(due.saturating_sub(now));
        }
    }
}
