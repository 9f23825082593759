use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static LOCAL_NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^#/]+$").unwrap());
static ANONYMOUS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^_:|[#/]genid").unwrap());

/// Ontology context threaded through tree building and color assignment.
///
/// The class list order is significant: it is the ordered id list the
/// deterministic color assignment indexes into, so two render passes over the
/// same schema always color a class identically.
#[derive(Debug, Clone, Default)]
pub struct OntologySchema {
    class_order: Vec<String>,
    class_names: HashMap<String, String>,
    object_prop_names: HashMap<String, String>,
    data_prop_names: HashMap<String, String>,
}

impl OntologySchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_class(&mut self, iri: &str, label: Option<&str>) {
        if !self.class_names.contains_key(iri) {
            self.class_order.push(iri.to_string());
        }
        self.class_names
            .insert(iri.to_string(), display_name(iri, label));
    }

    pub fn add_object_property(&mut self, iri: &str, label: Option<&str>) {
        self.object_prop_names
            .insert(iri.to_string(), display_name(iri, label));
    }

    pub fn add_data_property(&mut self, iri: &str, label: Option<&str>) {
        self.data_prop_names
            .insert(iri.to_string(), display_name(iri, label));
    }

    /// Class ids in registration order.
    pub fn classes(&self) -> &[String] {
        &self.class_order
    }

    pub fn class_name(&self, iri: &str) -> String {
        self.class_names
            .get(iri)
            .cloned()
            .unwrap_or_else(|| local_name(iri).to_string())
    }

    pub fn object_property_name(&self, iri: &str) -> String {
        self.object_prop_names
            .get(iri)
            .cloned()
            .unwrap_or_else(|| local_name(iri).to_string())
    }

    pub fn data_property_name(&self, iri: &str) -> String {
        self.data_prop_names
            .get(iri)
            .cloned()
            .unwrap_or_else(|| local_name(iri).to_string())
    }

    /// Position of a class in the ordered list, used for color assignment.
    pub fn class_rank(&self, iri: &str) -> Option<usize> {
        self.class_order.iter().position(|c| c == iri)
    }
}

/// Last fragment or path segment of an IRI; the IRI itself when it has no
/// separator.
pub fn local_name(iri: &str) -> &str {
    LOCAL_NAME_RE
        .find(iri)
        .map(|m| m.as_str())
        .unwrap_or(iri)
}

/// Blank nodes and generated skolem ids never make navigation targets.
pub fn is_anonymous(iri: &str) -> bool {
    ANONYMOUS_RE.is_match(iri)
}

/// Preferred display text: the label when present, the IRI local name
/// otherwise.
pub fn display_name(iri: &str, label: Option<&str>) -> String {
    match label {
        Some(l) if !l.trim().is_empty() => l.trim().to_string(),
        _ => local_name(iri).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_name_takes_fragment_then_path() {
        assert_eq!(local_name("http://x.org/onto#Person"), "Person");
        assert_eq!(local_name("http://x.org/onto/Person"), "Person");
        assert_eq!(local_name("Person"), "Person");
    }

    #[test]
    fn anonymous_detection() {
        assert!(is_anonymous("_:b0"));
        assert!(is_anonymous("http://x.org/.well-known/genid/1234"));
        assert!(!is_anonymous("http://x.org/onto#Person"));
    }

    #[test]
    fn display_name_prefers_label() {
        assert_eq!(
            display_name("http://x.org#P1", Some("works at")),
            "works at"
        );
        assert_eq!(display_name("http://x.org#P1", Some("  ")), "P1");
        assert_eq!(display_name("http://x.org#P1", None), "P1");
    }

    #[test]
    fn class_rank_follows_registration_order() {
        let mut schema = OntologySchema::new();
        schema.add_class("urn:B", None);
        schema.add_class("urn:A", Some("Aaa"));
        assert_eq!(schema.class_rank("urn:B"), Some(0));
        assert_eq!(schema.class_rank("urn:A"), Some(1));
        assert_eq!(schema.class_name("urn:A"), "Aaa");
        assert_eq!(schema.class_rank("urn:C"), None);
    }
}
