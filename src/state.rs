use std::time::Duration;

use crate::anim::scheduler::Animator;
use crate::anim::sequencer::Frame;
use crate::color::FloaterColors;
use crate::config::DashboardConfig;
use crate::data::model::{Dataset, Floater};
use crate::data::source::DataSource;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Where the current dataset came from (changes on File → Open / Regenerate).
    pub source: DataSource,

    /// Loaded dataset (None when loading failed).
    pub dataset: Option<Dataset>,

    /// Colour per floater for the overview map.
    pub colors: FloaterColors,

    /// Floater picked in the side panel.
    pub selected: Option<String>,

    pub animator: Animator,

    /// Most recent step frame of the running or finished animation.
    pub frame: Option<Frame>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Ask the map to jump back to the configured viewpoint.
    pub reset_view: bool,
}

impl AppState {
    /// Build the state and load the configured source.
    pub fn new(config: DashboardConfig) -> Self {
        let source = config.source.clone();
        let animator = Animator::new(config.delay_for(source.variant()));
        let mut state = Self {
            config,
            source: source.clone(),
            dataset: None,
            colors: FloaterColors::default(),
            selected: None,
            animator,
            frame: None,
            status_message: None,
            reset_view: true,
        };
        state.load(source);
        state
    }

    /// Replace the dataset. A failed load leaves no dataset and an error message.
    pub fn load(&mut self, source: DataSource) {
        self.animator.stop();
        self.frame = None;
        match source.load() {
            Ok(dataset) => {
                self.source = source;
                self.set_dataset(dataset);
            }
            Err(e) => {
                log::error!("Failed to load data: {e}");
                self.dataset = None;
                self.selected = None;
                self.colors = FloaterColors::default();
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Ingest a newly loaded dataset, reset selection, cadence and colours.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.animator = Animator::new(self.config.delay_for(dataset.variant));
        self.frame = None;
        self.colors = FloaterColors::new(&dataset.index);
        self.selected = dataset.index.ids().next().map(str::to_string);
        self.status_message = None;
        self.reset_view = true;
        self.dataset = Some(dataset);
    }

    /// Load the synthetic source again with the next seed.
    pub fn regenerate(&mut self) {
        let next = self.source.reseeded();
        self.load(next);
    }

    pub fn selected_floater(&self) -> Option<&Floater> {
        let id = self.selected.as_deref()?;
        self.dataset.as_ref()?.index.get(id)
    }

    /// Pick a floater. Changing the selection always returns to Idle.
    pub fn select(&mut self, floater_id: &str) {
        if self.selected.as_deref() == Some(floater_id) {
            return;
        }
        self.animator.stop();
        self.frame = None;
        self.selected = Some(floater_id.to_string());
    }

    pub fn can_animate(&self) -> bool {
        self.selected_floater().is_some() && !self.animator.is_animating()
    }

    /// Start animating the selected floater. Returns whether it started.
    pub fn animate(&mut self, now: Duration) -> bool {
        if !self.can_animate() {
            return false;
        }
        let Some(id) = self.selected.clone() else {
            return false;
        };
        self.frame = None;
        self.animator.start(&id, now);
        true
    }

    pub fn stop(&mut self) {
        self.animator.stop();
        self.frame = None;
    }

    /// Advance the animation to `now`.
    ///
    /// Returns how long until the next frame is due, if animating.
    pub fn tick(&mut self, now: Duration) -> Option<Duration> {
        let floater = self
            .selected
            .as_deref()
            .and_then(|id| self.dataset.as_ref()?.index.get(id))?;

        if let Some(frame) = self.animator.tick(floater, now) {
            match frame {
                Frame::Complete { .. } => log::info!("animation of {} complete", floater.id),
                step => self.frame = Some(step),
            }
        }
        self.animator.next_due().map(|due| due.saturating_sub(now))
    }
}
