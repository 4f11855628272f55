use crate::diary_entry::DiaryEntry;
use crate::storage::KvStore;
use color_eyre::Result;
use std::collections::BTreeMap;

/// Key the serialized diary document lives under in the local store.
pub const DIARY_KEY: &str = "diary";

type EntryMap = BTreeMap<String, Vec<DiaryEntry>>;

/// Date-keyed diary store. The in-memory mapping is the source of truth
/// for the running session; every mutation hands a full serialized
/// snapshot to a background write whose failure is logged and swallowed.
///
/// Invariants: a date key is present iff its list is non-empty, every
/// entry's `date` equals the key it is stored under, and ids are unique
/// across the whole mapping.
pub struct DiaryState {
    entries: EntryMap,
    store: Option<KvStore>,
}

impl DiaryState {
    pub fn new() -> Self {
        DiaryState {
            entries: EntryMap::new(),
            store: None,
        }
    }

    /// Hydrate from the local store. Missing or unparsable documents
    /// start an empty diary instead of failing the caller.
    pub async fn load(store: KvStore) -> Self {
        let entries = match store.get(DIARY_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<EntryMap>(&raw) {
                Ok(map) => map,
                Err(e) => {
                    tracing::warn!(error = %e, "unreadable diary document, starting empty");
                    EntryMap::new()
                }
            },
            Ok(None) => EntryMap::new(),
            Err(e) => {
                tracing::warn!(error = %e, "diary load failed, starting empty");
                EntryMap::new()
            }
        };
        DiaryState {
            entries,
            store: Some(store),
        }
    }

    /// Append a new entry under `date_key`. Whitespace-only text is a
    /// no-op and returns false.
    pub fn add_entry(&mut self, date_key: &str, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        self.entries
            .entry(date_key.to_string())
            .or_default()
            .push(DiaryEntry::new(date_key, text));
        self.persist();
        true
    }

    /// Replace the text of the matching entry, leaving id, date and
    /// timestamp untouched. Whitespace-only text or an unknown id is a
    /// no-op and returns false.
    pub fn edit_entry(&mut self, date_key: &str, id: &str, new_text: &str) -> bool {
        let new_text = new_text.trim();
        if new_text.is_empty() {
            return false;
        }
        let Some(list) = self.entries.get_mut(date_key) else {
            return false;
        };
        let Some(entry) = list.iter_mut().find(|e| e.id == id) else {
            return false;
        };
        entry.text = new_text.to_string();
        self.persist();
        true
    }

    /// Remove the matching entry; the date key is pruned when its list
    /// empties. Unknown ids leave the mapping unchanged.
    pub fn remove_entry(&mut self, date_key: &str, id: &str) {
        if let Some(list) = self.entries.get_mut(date_key) {
            list.retain(|e| e.id != id);
            if list.is_empty() {
                self.entries.remove(date_key);
            }
        }
        self.persist();
    }

    /// Entries for a day, most recent first. Stored order is insertion
    /// order; sorting happens here, at presentation time.
    pub fn entries_for(&self, date_key: &str) -> Vec<DiaryEntry> {
        let mut list = self.entries.get(date_key).cloned().unwrap_or_default();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        list
    }

    pub fn has_entries(&self, date_key: &str) -> bool {
        self.entries.contains_key(date_key)
    }

    pub fn date_keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    /// Awaitable full write, used at the persistence seam and in tests.
    /// The UI path goes through `persist` instead and never waits.
    pub async fn save(&self) -> Result<()> {
        if let Some(store) = &self.store {
            let blob = serde_json::to_string(&self.entries)?;
            store.set(DIARY_KEY, &blob).await?;
        }
        Ok(())
    }

    /// Best-effort background write of the full mapping. The caller is
    /// never blocked and never sees a failure.
    fn persist(&self) {
        let Some(store) = self.store.clone() else {
            return;
        };
        let blob = match serde_json::to_string(&self.entries) {
            Ok(blob) => blob,
            Err(e) => {
                tracing::warn!(error = %e, "diary snapshot serialization failed");
                return;
            }
        };
        tokio::spawn(async move {
            if let Err(e) = store.set(DIARY_KEY, &blob).await {
                tracing::warn!(error = %e, "diary write failed, in-memory state kept");
            }
        });
    }
}

impl Default for DiaryState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(id: &str, date: &str, text: &str, created_at: i64) -> DiaryEntry {
        DiaryEntry {
            id: id.into(),
            date: date.into(),
            text: text.into(),
            created_at,
        }
    }

    fn state_with(entries: Vec<DiaryEntry>) -> DiaryState {
        let mut state = DiaryState::new();
        for e in entries {
            state
                .entries
                .entry(e.date.clone())
                .or_default()
                .push(e);
        }
        state
    }

    #[test]
    fn add_appends_one_entry_for_the_day() {
        let mut state = DiaryState::new();
        assert!(state.add_entry("2024-03-15", "went for a walk"));
        let list = state.entries_for("2024-03-15");
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].date, "2024-03-15");
        assert_eq!(list[0].text, "went for a walk");
    }

    #[test]
    fn add_trims_and_rejects_blank_text() {
        let mut state = DiaryState::new();
        assert!(!state.add_entry("2024-03-15", "   "));
        assert!(!state.add_entry("2024-03-15", "\n\t"));
        assert!(state.entries_for("2024-03-15").is_empty());
        assert!(state.add_entry("2024-03-15", "  padded  "));
        assert_eq!(state.entries_for("2024-03-15")[0].text, "padded");
    }

    #[test]
    fn entries_for_sorts_newest_first() {
        let state = state_with(vec![
            entry("a", "2024-03-15", "a", 100),
            entry("b", "2024-03-15", "b", 300),
            entry("c", "2024-03-15", "c", 200),
        ]);
        let list = state.entries_for("2024-03-15");
        let ids: Vec<&str> = list.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn edit_changes_text_only() {
        let mut state = state_with(vec![entry("x", "2024-03-15", "before", 42)]);
        assert!(state.edit_entry("2024-03-15", "x", "  after  "));
        let list = state.entries_for("2024-03-15");
        assert_eq!(list[0].text, "after");
        assert_eq!(list[0].id, "x");
        assert_eq!(list[0].date, "2024-03-15");
        assert_eq!(list[0].created_at, 42);
    }

    #[test]
    fn edit_rejects_blank_and_unknown_ids() {
        let mut state = state_with(vec![entry("x", "2024-03-15", "before", 42)]);
        assert!(!state.edit_entry("2024-03-15", "x", "   "));
        assert!(!state.edit_entry("2024-03-15", "missing", "after"));
        assert!(!state.edit_entry("2024-03-16", "x", "after"));
        assert_eq!(state.entries_for("2024-03-15")[0].text, "before");
    }

    #[test]
    fn removing_last_entry_prunes_the_date_key() {
        let mut state = state_with(vec![entry("only", "2024-03-15", "note", 1)]);
        state.remove_entry("2024-03-15", "only");
        assert!(!state.has_entries("2024-03-15"));
        assert_eq!(state.date_keys().count(), 0);
    }

    #[test]
    fn removing_unknown_id_leaves_list_unchanged() {
        let mut state = state_with(vec![
            entry("a", "2024-03-15", "a", 1),
            entry("b", "2024-03-15", "b", 2),
        ]);
        state.remove_entry("2024-03-15", "missing");
        assert_eq!(state.entries_for("2024-03-15").len(), 2);
        assert!(state.has_entries("2024-03-15"));
    }

    #[tokio::test]
    async fn save_then_load_round_trips_the_mapping() {
        let dir = TempDir::new().unwrap();
        let store = KvStore::open(dir.path()).await.unwrap();

        let mut state = DiaryState::load(store.clone()).await;
        state.add_entry("2024-03-15", "first");
        state.add_entry("2024-03-15", "second");
        state.add_entry("2024-04-01", "other day");
        // let the background best-effort writes drain, then make the
        // full snapshot the last write
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        state.save().await.unwrap();

        let reloaded = DiaryState::load(store).await;
        assert_eq!(
            reloaded.date_keys().cloned().collect::<Vec<_>>(),
            vec!["2024-03-15".to_string(), "2024-04-01".to_string()]
        );
        // insertion order within a key survives the round trip
        assert_eq!(reloaded.entries["2024-03-15"].len(), 2);
        assert_eq!(
            reloaded.entries["2024-03-15"],
            state.entries["2024-03-15"]
        );
        assert_eq!(reloaded.entries["2024-04-01"], state.entries["2024-04-01"]);
    }

    #[tokio::test]
    async fn load_treats_garbage_document_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = KvStore::open(dir.path()).await.unwrap();
        store.set(DIARY_KEY, "not json at all").await.unwrap();

        let state = DiaryState::load(store).await;
        assert_eq!(state.date_keys().count(), 0);
    }
}
