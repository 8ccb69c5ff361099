use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Built-in snippets, used when no snippet file provides any entries
pub const DEFAULT_SNIPPETS: [(&str, &str); 5] = [
    (":fire:", "🔥"),
    (":heart:", "❤️"),
    (":party:", "🥳"),
    (":smile:", "😄"),
    (":thumbsup:", "👍"),
];

/// A single trigger and the text it expands to
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    pub trigger: String,
    pub expansion: String,
}

impl Snippet {
    pub fn new(trigger: impl Into<String>, expansion: impl Into<String>) -> Self {
        Self {
            trigger: trigger.into(),
            expansion: expansion.into(),
        }
    }
}

/// Ordered trigger table.
///
/// Entries are applied in insertion order. Triggers are non-empty and unique;
/// inserting an existing trigger replaces its expansion in place.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct SnippetTable {
    entries: Vec<Snippet>,
}

impl SnippetTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn defaults() -> Self {
        DEFAULT_SNIPPETS.iter().copied().collect()
    }

    /// Add or replace a trigger. Empty triggers are rejected.
    pub fn insert(&mut self, trigger: impl Into<String>, expansion: impl Into<String>) -> bool {
        let trigger = trigger.into();
        if trigger.is_empty() {
            return false;
        }

        let expansion = expansion.into();
        match self.entries.iter_mut().find(|entry| entry.trigger == trigger) {
            Some(existing) => existing.expansion = expansion,
            None => self.entries.push(Snippet { trigger, expansion }),
        }
        true
    }

    pub fn get(&self, trigger: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.trigger == trigger)
            .map(|entry| entry.expansion.as_str())
    }

    pub fn contains(&self, trigger: &str) -> bool {
        self.get(trigger).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Snippet> {
        self.entries.iter()
    }

    /// Entries sorted by trigger, for display
    pub fn sorted(&self) -> Vec<&Snippet> {
        let mut sorted: Vec<&Snippet> = self.entries.iter().collect();
        sorted.sort_by(|a, b| a.trigger.cmp(&b.trigger));
        sorted
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SnippetTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = SnippetTable::new();
        for (trigger, expansion) in iter {
            table.insert(trigger, expansion);
        }
        table
    }
}

impl<'a> IntoIterator for &'a SnippetTable {
    type Item = &'a Snippet;
    type IntoIter = std::slice::Iter<'a, Snippet>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Process-wide snippet table.
///
/// Readers take an `Arc` snapshot and never see a half-built table; a reload
/// swaps the whole snapshot under one write.
#[derive(Debug, Clone)]
pub struct SharedTable {
    current: Arc<RwLock<Arc<SnippetTable>>>,
}

impl SharedTable {
    pub fn new(table: SnippetTable) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(table))),
        }
    }

    pub fn snapshot(&self) -> Arc<SnippetTable> {
        Arc::clone(&self.current.read())
    }

    /// Swap in a new table, returning the previous one
    pub fn replace(&self, table: SnippetTable) -> Arc<SnippetTable> {
        let next = Arc::new(table);
        let mut current = self.current.write();
        std::mem::replace(&mut *current, next)
    }
}

impl Default for SharedTable {
    fn default() -> Self {
        SharedTable::new(SnippetTable::defaults())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::thread;

    #[test]
    fn test_defaults_are_sorted_by_trigger() {
        let table = SnippetTable::defaults();
        let triggers: Vec<&str> = table.iter().map(|s| s.trigger.as_str()).collect();
        let mut sorted = triggers.clone();
        sorted.sort();

        assert_eq!(triggers, sorted);
        assert_eq!(table.get(":smile:"), Some("😄"));
        assert_eq!(table.len(), 5);
    }

    #[test]
    fn test_insert_keeps_order_and_replaces_in_place() {
        let mut table = SnippetTable::new();
        table.insert("b", "1");
        table.insert("a", "2");
        table.insert("b", "3");

        let entries: Vec<(&str, &str)> = table
            .iter()
            .map(|s| (s.trigger.as_str(), s.expansion.as_str()))
            .collect();
        assert_eq!(entries, vec![("b", "3"), ("a", "2")]);
    }

    #[test]
    fn test_insert_rejects_empty_trigger() {
        let mut table = SnippetTable::new();
        assert!(!table.insert("", "nothing"));
        assert!(table.is_empty());
        assert!(table.insert("x", ""));
        assert_eq!(table.get("x"), Some(""));
    }

    #[test]
    fn test_sorted_does_not_change_application_order() {
        let table: SnippetTable = [("zz", "1"), ("aa", "2")].into_iter().collect();
        let sorted: Vec<&str> = table.sorted().iter().map(|s| s.trigger.as_str()).collect();

        assert_eq!(sorted, vec!["aa", "zz"]);
        assert_eq!(table.iter().next().map(|s| s.trigger.as_str()), Some("zz"));
    }

    #[test]
    fn test_serializes_as_list() {
        let table: SnippetTable = [(":a:", "b")].into_iter().collect();
        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(json, r#"[{"trigger":":a:","expansion":"b"}]"#);
    }

    #[test]
    fn test_shared_table_swap_keeps_old_snapshots_intact() {
        let shared = SharedTable::default();
        let before = shared.snapshot();

        let previous = shared.replace([("x", "y")].into_iter().collect());

        assert_eq!(*previous, *before);
        assert_eq!(before.len(), 5);
        assert_eq!(shared.snapshot().get("x"), Some("y"));
        assert_eq!(shared.snapshot().len(), 1);
    }

    #[test]
    fn test_readers_see_whole_tables_during_reload() {
        let shared = SharedTable::new([("a", "1"), ("b", "1")].into_iter().collect());

        let writer = {
            let shared = shared.clone();
            thread::spawn(move || {
                for i in 0..200 {
                    let value = i.to_string();
                    shared.replace(
                        [("a", value.as_str()), ("b", value.as_str())]
                            .into_iter()
                            .collect(),
                    );
                }
            })
        };

        for _ in 0..200 {
            let snapshot = shared.snapshot();
            assert_eq!(snapshot.get("a"), snapshot.get("b"));
        }
        writer.join().unwrap();
    }
}
