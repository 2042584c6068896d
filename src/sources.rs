use crate::types::SourceId;
use std::collections::BTreeMap;

/// Known input sources of one receiver, indexed both ways
///
/// Seeded from the series defaults. Grows when a zone reports a source id
/// that has no name yet; entries are never removed.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    by_id: BTreeMap<SourceId, String>,
    by_name: BTreeMap<String, SourceId>,
}

impl SourceRegistry {
    pub fn new(sources: BTreeMap<SourceId, String>) -> Self {
        let by_name = sources.iter().map(|(id, name)| (name.clone(), *id)).collect();
        Self { by_id: sources, by_name }
    }

    /// Name of a source, if known
    pub fn name(&self, id: SourceId) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

    /// Id of a source by display name, if known
    pub fn id(&self, name: &str) -> Option<SourceId> {
        self.by_name.get(name).copied()
    }

    /// Name of a source, registering `Source <id>` when the id is new
    ///
    /// Returns the name and whether a new entry was added.
    pub fn resolve_or_register(&mut self, id: SourceId) -> (String, bool) {
        if let Some(name) = self.by_id.get(&id) {
            return (name.clone(), false);
        }

        let name = format!("Source {}", id);
        self.by_id.insert(id, name.clone());
        self.by_name.insert(name.clone(), id);
        (name, true)
    }

    /// All known names, ordered by source id
    pub fn names(&self) -> Vec<String> {
        self.by_id.values().cloned().collect()
    }

    /// The id → name mapping
    pub fn as_map(&self) -> &BTreeMap<SourceId, String> {
        &self.by_id
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
