use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    /// Line height as a multiple of the font size.
    pub line_height: f32,
    pub text_color: String,
    pub block_stroke: String,
    /// Fill of the classes/properties detail blocks.
    pub detail_fill: String,
    /// Fallback head color for instances without a ranked class.
    pub muted_color: String,
    pub button_fill: String,
    pub button_hover_fill: String,
    pub panel_fill: String,
    pub panel_border: String,
    pub background: String,
}

impl Theme {
    /// The palette of the original explorer widget.
    pub fn classic() -> Self {
        Self {
            font_family: "verdana, arial, sans-serif".to_string(),
            font_size: 12.0,
            line_height: 1.25,
            text_color: "#1a1a1a".to_string(),
            block_stroke: "blue".to_string(),
            detail_fill: "lightsteelblue".to_string(),
            muted_color: "darkgray".to_string(),
            button_fill: "black".to_string(),
            button_hover_fill: "blue".to_string(),
            panel_fill: "lightgray".to_string(),
            panel_border: "blue".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}

/// Deterministic color for an entity, derived from its position in an
/// ordered id list. Hue walks the full circle with the index; saturation and
/// lightness step through small cycles so neighbouring hues stay separable.
/// Ids not in the list get black.
pub fn class_color(iri: &str, ordered_ids: &[String]) -> String {
    let Some(index) = ordered_ids.iter().position(|id| id == iri) else {
        return "black".to_string();
    };
    let size = ordered_ids.len().max(1);
    let hue = (index as f32 / size as f32 * 360.0).round();
    let saturation = cycled(index * index, 0.2, 0.8, 7);
    let lightness = cycled(index, 0.3, 0.6, 3);
    format!(
        "hsl({hue:.0}, {:.0}%, {:.0}%)",
        saturation * 100.0,
        lightness * 100.0
    )
}

fn cycled(value: usize, min: f32, max: f32, steps: usize) -> f32 {
    min + (max - min) / steps as f32 * (value % steps) as f32
}
