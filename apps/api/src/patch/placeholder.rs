use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use crate::patch::path::AttrPath;

/// Per-compilation indirection between attribute paths/values and the
/// stable tokens a patch's clauses refer to. Scoped to one compile call and
/// discarded with it.
///
/// Each distinct path maps to exactly one `#nK` token. Values are *not*
/// deduplicated: two equal values get two `:vK` tokens. That wastes a few
/// table entries but keeps token allocation order-independent of value
/// content.
#[derive(Debug, Default)]
pub struct PlaceholderTable {
    names: BTreeMap<String, String>,
    tokens_by_path: HashMap<String, String>,
    values: BTreeMap<String, Value>,
}

impl PlaceholderTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the name token for `path`, allocating one on first use.
    pub fn name_token(&mut self, path: &AttrPath) -> String {
        let rendered = path.to_string();
        if let Some(token) = self.tokens_by_path.get(&rendered) {
            return token.clone();
        }
        let token = format!("#n{}", self.tokens_by_path.len());
        self.tokens_by_path.insert(rendered.clone(), token.clone());
        self.names.insert(token.clone(), rendered);
        token
    }

    /// Allocates a fresh value token; never reuses one.
    pub fn value_token(&mut self, value: Value) -> String {
        let token = format!(":v{}", self.values.len());
        self.values.insert(token.clone(), value);
        token
    }

    pub fn into_maps(self) -> (BTreeMap<String, String>, BTreeMap<String, Value>) {
        (self.names, self.values)
    }
}
