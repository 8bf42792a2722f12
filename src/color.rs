use std::collections::HashMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::index::FloaterIndex;

/// Trail drawn behind the animated floater.
pub const TRAIL_COLOR: Color32 = Color32::from_rgb(0, 0, 255);
/// The animated floater itself.
pub const MARKER_COLOR: Color32 = Color32::from_rgb(255, 0, 0);

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Floater → colour
// ---------------------------------------------------------------------------

/// One distinct colour per floater, stable for the lifetime of a dataset.
#[derive(Debug, Clone, Default)]
pub struct FloaterColors {
    mapping: HashMap<String, Color32>,
}

impl FloaterColors {
    pub fn new(index: &FloaterIndex) -> Self {
        let mapping = index
            .ids()
            .zip(generate_palette(index.len()))
            .map(|(id, c)| (id.to_string(), c))
            .collect();
        Self { mapping }
    }

    pub fn color_for(&self, floater_id: &str) -> Color32 {
        self.mapping.get(floater_id).copied().unwrap_or(Color32::GRAY)
    }
}
