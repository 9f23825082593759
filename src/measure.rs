use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;
use ttf_parser::Face;

use crate::config::ViewConfig;
use crate::ir::InstanceNode;
use crate::theme::Theme;

static RULER: Lazy<Mutex<FontRuler>> = Lazy::new(|| Mutex::new(FontRuler::new()));

/// Pixel width of a single line of text. Falls back to an approximate
/// per-character table when no matching system font can be loaded, so layout
/// stays deterministic on fontless machines.
pub fn text_width(text: &str, font_size: f32, font_family: &str) -> f32 {
    if text.is_empty() || font_size <= 0.0 {
        return 0.0;
    }
    if let Ok(mut ruler) = RULER.lock()
        && let Some(width) = ruler.measure(text, font_size, font_family)
    {
        return width;
    }
    approx_width(text, font_size)
}

fn approx_width(text: &str, font_size: f32) -> f32 {
    text.chars().map(char_factor).sum::<f32>() * font_size
}

// Width factors bucketed by glyph class; close enough for wrap decisions.
fn char_factor(c: char) -> f32 {
    match c {
        'i' | 'j' | 'l' | '\'' | '.' | ',' | ':' | ';' | '!' | '|' => 0.28,
        'f' | 't' | 'r' | 'I' | '(' | ')' | '[' | ']' => 0.36,
        ' ' => 0.31,
        'm' | 'w' | 'M' | 'W' | '@' | '%' | '&' => 0.89,
        'A'..='Z' | '0'..='9' => 0.66,
        _ => 0.55,
    }
}

fn average_char_width(font_size: f32) -> f32 {
    font_size * 0.55
}

struct FontRuler {
    db: Database,
    loaded_system_fonts: bool,
    faces: HashMap<String, Option<FaceData>>,
}

struct FaceData {
    bytes: Vec<u8>,
    index: u32,
    units_per_em: f32,
    advances: HashMap<char, Option<u16>>,
}

impl FontRuler {
    fn new() -> Self {
        Self {
            db: Database::new(),
            loaded_system_fonts: false,
            faces: HashMap::new(),
        }
    }

    fn measure(&mut self, text: &str, font_size: f32, font_family: &str) -> Option<f32> {
        let key = font_family.trim().to_ascii_lowercase();
        if !self.faces.contains_key(&key) {
            let face = self.load(font_family);
            self.faces.insert(key.clone(), face);
        }
        let face = self.faces.get_mut(&key)?.as_mut()?;
        face.width_of(text, font_size)
    }

    fn load(&mut self, font_family: &str) -> Option<FaceData> {
        if !self.loaded_system_fonts {
            self.db.load_system_fonts();
            self.loaded_system_fonts = true;
        }
        let names: Vec<String> = font_family
            .split(',')
            .map(|part| part.trim().trim_matches('"').trim_matches('\'').to_string())
            .filter(|part| !part.is_empty())
            .collect();
        let mut families: Vec<Family<'_>> = Vec::with_capacity(names.len() + 1);
        for name in &names {
            match name.to_ascii_lowercase().as_str() {
                "serif" => families.push(Family::Serif),
                "sans-serif" | "system-ui" => families.push(Family::SansSerif),
                "monospace" => families.push(Family::Monospace),
                _ => families.push(Family::Name(name.as_str())),
            }
        }
        families.push(Family::SansSerif);
        let query = Query {
            families: &families,
            weight: Weight::NORMAL,
            stretch: Stretch::Normal,
            style: Style::Normal,
        };
        let id = self.db.query(&query)?;
        let mut loaded = None;
        let _ = self.db.with_face_data(id, |data, index| {
            if let Ok(face) = Face::parse(data, index) {
                loaded = Some(FaceData {
                    bytes: data.to_vec(),
                    index,
                    units_per_em: face.units_per_em().max(1) as f32,
                    advances: HashMap::new(),
                });
            }
        });
        loaded
    }
}

impl FaceData {
    fn width_of(&mut self, text: &str, font_size: f32) -> Option<f32> {
        let face = Face::parse(&self.bytes, self.index).ok()?;
        let scale = font_size / self.units_per_em;
        let fallback = font_size * 0.55;
        let mut width = 0.0f32;
        for c in text.chars() {
            if c == '\n' {
                continue;
            }
            let advance = *self.advances.entry(c).or_insert_with(|| {
                face.glyph_index(c)
                    .and_then(|id| face.glyph_hor_advance(id))
            });
            match advance {
                Some(units) => width += units as f32 * scale,
                None => width += fallback,
            }
        }
        Some(width.max(0.0))
    }
}

/// Greedy word wrap against a pixel budget. Words longer than the budget get
/// a line of their own rather than being broken mid-word.
pub fn wrap_to_width(text: &str, max_width: f32, font_size: f32, font_family: &str) -> Vec<String> {
    if text_width(text, font_size, font_family) <= max_width {
        return vec![text.to_string()];
    }
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if !current.is_empty() && text_width(&candidate, font_size, font_family) > max_width {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// A measured, word-wrapped rectangle of the node card.
#[derive(Debug, Clone)]
pub struct MeasuredBlock {
    pub lines: Vec<String>,
    pub width: f32,
    pub height: f32,
    pub fill: String,
}

/// Measures the rectangles a node renders as: a single summary rect when the
/// node shows its label only, a header + classes + properties stack when the
/// detail panel is open.
pub struct BlockMeasurer<'a> {
    pub theme: &'a Theme,
    pub config: &'a ViewConfig,
}

impl<'a> BlockMeasurer<'a> {
    pub fn new(theme: &'a Theme, config: &'a ViewConfig) -> Self {
        Self { theme, config }
    }

    fn line_height(&self) -> f32 {
        self.theme.font_size * self.theme.line_height
    }

    fn wrap_width(&self) -> f32 {
        let by_chars = self.config.wrap_chars.max(1) as f32 * average_char_width(self.theme.font_size);
        let by_block = self.config.block_width() - 2.0 * self.config.block_margin_x;
        by_chars.min(by_block).max(1.0)
    }

    fn block(&self, lines: Vec<String>, fill: &str) -> MeasuredBlock {
        let height = lines.len().max(1) as f32 * self.line_height() + 2.0 * self.config.block_margin_y;
        MeasuredBlock {
            lines,
            width: self.config.block_width(),
            height,
            fill: fill.to_string(),
        }
    }

    fn wrap(&self, text: &str) -> Vec<String> {
        wrap_to_width(
            text,
            self.wrap_width(),
            self.theme.font_size,
            &self.theme.font_family,
        )
    }

    /// The collapsed rendering: one rect fitting the wrapped label.
    pub fn summary(&self, name: &str, head_color: &str) -> MeasuredBlock {
        let fill = if head_color.is_empty() {
            &self.theme.muted_color
        } else {
            head_color
        };
        self.block(self.wrap(name), fill)
    }

    /// The expanded rendering: header rect, classes rect, properties rect,
    /// each independently wrapped to the block width.
    pub fn detail(&self, node: &InstanceNode) -> Vec<MeasuredBlock> {
        let mut blocks = vec![self.summary(&node.name, &node.head_color)];

        let mut class_lines = vec!["Classes:".to_string()];
        for class in &node.classes {
            if class.name == "NamedIndividual" {
                continue;
            }
            class_lines.extend(self.wrap(&class.name));
        }
        blocks.push(self.block(class_lines, &self.theme.detail_fill));

        let mut prop_lines = vec!["Properties:".to_string()];
        for prop in &node.data_props {
            let value = match prop.value.as_str() {
                "true" => "yes",
                "false" => "no",
                other => other,
            };
            prop_lines.extend(self.wrap(&format!("{}: {}", prop.name, value)));
        }
        blocks.push(self.block(prop_lines, &self.theme.detail_fill));

        blocks
    }

    /// Blocks for the node's current display state.
    pub fn node_blocks(&self, node: &InstanceNode) -> Vec<MeasuredBlock> {
        if node.expanded {
            self.detail(node)
        } else {
            vec![self.summary(&node.name, &node.head_color)]
        }
    }

    /// Total rendered height for the node's current display state.
    pub fn node_height(&self, node: &InstanceNode) -> f32 {
        self.node_blocks(node).iter().map(|b| b.height).sum()
    }
}
