use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::Gender;

// ---------------------------------------------------------------------------
// Gender colours
// ---------------------------------------------------------------------------

const ORANGE: Color32 = Color32::from_rgb(255, 165, 0);
const WHEAT: Color32 = Color32::from_rgb(245, 222, 179);
const OLIVE: Color32 = Color32::from_rgb(128, 128, 0);
const DARK_SEA_GREEN: Color32 = Color32::from_rgb(143, 188, 143);

/// Main colour for a gender's bars.
pub fn gender_color(gender: Gender) -> Color32 {
    match gender {
        Gender::Female => ORANGE,
        Gender::Male => OLIVE,
    }
}

/// Lighter companion colour, used for the second bar of a pair.
pub fn gender_light_color(gender: Gender) -> Color32 {
    match gender {
        Gender::Female => WHEAT,
        Gender::Male => DARK_SEA_GREEN,
    }
}

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
            let hsl = Hsl::new(hue, 0.75, 0.45);
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
// Category → Color32
// ---------------------------------------------------------------------------

/// Stable colours per category, so a category keeps its line colour when the
/// trend selection changes.
#[derive(Debug, Clone)]
pub struct CategoryColors {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl CategoryColors {
    /// Build a colour map over every category of the dataset.
    pub fn new(categories: &[String]) -> Self {
        let mapping = categories
            .iter()
            .cloned()
            .zip(generate_palette(categories.len()))
            .collect();

        CategoryColors {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    pub fn color_for(&self, category: &str) -> Color32 {
        self.mapping
            .get(category)
            .copied()
            .unwrap_or(self.default_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size_and_distinct_colours() {
        assert!(generate_palette(0).is_empty());
        let p = generate_palette(8);
        assert_eq!(p.len(), 8);
        for (i, a) in p.iter().enumerate() {
            for b in &p[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn category_colours_are_stable_with_grey_fallback() {
        let cats = vec!["Books".to_string(), "Shoes".to_string()];
        let colors = CategoryColors::new(&cats);
        assert_eq!(colors.color_for("Books"), colors.color_for("Books"));
        assert_ne!(colors.color_for("Books"), colors.color_for("Shoes"));
        assert_eq!(colors.color_for("Unknown"), Color32::GRAY);
    }

    #[test]
    fn genders_have_distinct_colours() {
        assert_ne!(gender_color(Gender::Female), gender_color(Gender::Male));
        assert_ne!(gender_color(Gender::Male), gender_light_color(Gender::Male));
    }
}
