use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Mix, Srgb};

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
// Category colors: category name → Color32
// ---------------------------------------------------------------------------

/// Maps each category to a distinct colour for the scatter plot and legend.
/// Rows without a category get the gray default.
#[derive(Debug, Clone, Default)]
pub struct CategoryColors {
    mapping: BTreeMap<String, Color32>,
}

impl CategoryColors {
    /// Build the map from the sorted category universe so colours stay
    /// stable across filter changes within one load.
    pub fn new(categories: &[String]) -> Self {
        let palette = generate_palette(categories.len());
        let mapping = categories
            .iter()
            .cloned()
            .zip(palette.into_iter())
            .collect();
        CategoryColors { mapping }
    }

    pub fn color_for(&self, category: Option<&str>) -> Color32 {
        category
            .and_then(|c| self.mapping.get(c))
            .copied()
            .unwrap_or(Color32::GRAY)
    }
}

// ---------------------------------------------------------------------------
// Diverging colormap for correlation cells
// ---------------------------------------------------------------------------

/// Map a correlation in [-1, 1] to a blue–white–red gradient. NaN (zero
/// variance) renders as neutral gray.
pub fn correlation_color(r: f64) -> Color32 {
    if r.is_nan() {
        return Color32::from_gray(120);
    }
    let white = Srgb::new(0.97, 0.97, 0.97);
    let end = if r < 0.0 {
        Srgb::new(0.13, 0.35, 0.80) // blue for negative
    } else {
        Srgb::new(0.80, 0.15, 0.15) // red for positive
    };
    let t = r.abs().clamp(0.0, 1.0) as f32;
    let mixed: Srgb = Srgb::from_linear(white.into_linear().mix(end.into_linear(), t));
    Color32::from_rgb(
        (mixed.red * 255.0) as u8,
        (mixed.green * 255.0) as u8,
        (mixed.blue * 255.0) as u8,
    )
}

/// Readable text colour on top of a correlation cell.
pub fn correlation_text_color(r: f64) -> Color32 {
    if !r.is_nan() && r.abs() > 0.6 {
        Color32::WHITE
    } else {
        Color32::BLACK
    }
}
