//! Capped, newest-first translation history.

use serde::{Deserialize, Serialize};

/// Maximum number of entries kept.
pub const HISTORY_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub source_language: String,
    pub target_language: String,
    pub source_text: String,
    pub translated_text: String,
    /// Unix time in milliseconds.
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// What a caller supplies; id and timestamp are assigned on insert.
#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    pub source_language: String,
    pub target_language: String,
    pub source_text: String,
    pub translated_text: String,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    /// Build from persisted entries. Duplicated ids and anything past the
    /// limit are dropped so the invariants hold for hand-edited files too.
    pub fn from_entries(entries: Vec<HistoryEntry>) -> Self {
        let mut seen = std::collections::HashSet::new();
        let entries = entries
            .into_iter()
            .filter(|e| seen.insert(e.id.clone()))
            .take(HISTORY_LIMIT)
            .collect();
        Self { entries }
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

    /// Insert at the front and drop the oldest entries past the limit.
    pub fn push(&mut self, entry: NewHistoryEntry, created_at: i64) -> &HistoryEntry {
        let entry = HistoryEntry {
            id: uuid::Uuid::new_v4().to_string(),
            source_language: entry.source_language,
            target_language: entry.target_language,
            source_text: entry.source_text,
            translated_text: entry.translated_text,
            created_at,
            model: entry.model,
        };
        self.entries.insert(0, entry);
        self.entries.truncate(HISTORY_LIMIT);
        &self.entries[0]
    }

    /// Returns whether an entry was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_entry(text: &str) -> NewHistoryEntry {
        NewHistoryEntry {
            source_language: "en".to_string(),
            target_language: "zh".to_string(),
            source_text: text.to_string(),
            translated_text: format!("<{}>", text),
            model: None,
        }
    }

    #[test]
    fn test_push_is_newest_first() {
        let mut history = History::default();
        history.push(new_entry("first"), 1);
        history.push(new_entry("second"), 2);

        assert_eq!(history.entries()[0].source_text, "second");
        assert_eq!(history.entries()[1].source_text, "first");
    }

    #[test]
    fn test_push_caps_at_limit() {
        let mut history = History::default();
        for i in 0..(HISTORY_LIMIT + 25) {
            history.push(new_entry(&format!("text {}", i)), i as i64);
            assert!(history.len() <= HISTORY_LIMIT);
        }

        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history.entries()[0].source_text, "text 124");
        assert_eq!(history.entries()[HISTORY_LIMIT - 1].source_text, "text 25");
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut history = History::default();
        for i in 0..5 {
            history.push(new_entry(&i.to_string()), i);
        }
        let target = history.entries()[2].id.clone();

        assert!(history.remove(&target));
        let texts: Vec<_> = history.entries().iter().map(|e| e.source_text.as_str()).collect();
        assert_eq!(texts, vec!["4", "3", "1", "0"]);
        assert!(!history.remove(&target));
    }

    #[test]
    fn test_ids_unique() {
        let mut history = History::default();
        for i in 0..50 {
            history.push(new_entry("same"), i);
        }
        let ids: std::collections::HashSet<_> = history.entries().iter().map(|e| &e.id).collect();
        assert_eq!(ids.len(), 50);
    }

    #[test]
    fn test_from_entries_drops_duplicates() {
        let mut history = History::default();
        history.push(new_entry("a"), 1);
        let entry = history.entries()[0].clone();

        let restored = History::from_entries(vec![entry.clone(), entry]);
        assert_eq!(restored.len(), 1);
    }

    #[test]
    fn test_entry_json_shape() {
        let mut history = History::default();
        let entry = history.push(new_entry("hi"), 42).clone();
        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["sourceText"], "hi");
        assert_eq!(json["createdAt"], 42);
        assert!(json.get("model").is_none());
    }
}
