use crate::config::ViewConfig;

/// One breadcrumb: a previously visited root instance, with the summary
/// height it measured when it was pushed so the panel can stack entries
/// without re-measuring departed roots.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub iri: String,
    pub name: String,
    pub head_color: String,
    pub rendered_height: f32,
}

/// Ordered, de-duplicating breadcrumb list: oldest first, unique by iri,
/// most recently visited last.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry; an existing entry with the same iri is removed
    /// first, so revisiting moves an instance to the end instead of
    /// duplicating it.
    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.retain(|e| e.iri != entry.iri);
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, iri: &str) -> bool {
        self.entries.iter().any(|e| e.iri == iri)
    }

    /// Vertical center offsets of the panel entries, accumulated top-down
    /// from each entry's own measured height.
    pub fn offsets(&self, config: &ViewConfig) -> Vec<f32> {
        let mut cursor = config.history_top;
        let mut out = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            out.push(cursor + entry.rendered_height / 2.0);
            cursor += entry.rendered_height + config.history_gap;
        }
        out
    }
}
