//! User preferences, each in its own storage slot.
//!
//! Values are stored as JSON. A missing or malformed slot falls back to the
//! default for that key alone; the other preferences are unaffected.

use crate::config::{
    CHALLENGE_MARKS_KEY, CHALLENGE_SEARCH_KEY, HIDE_SOLVED_KEY, HIDE_WEEK_IN_TITLE_KEY,
    SCOREBOARD_SEARCH_KEY,
};
use crate::marks::ChallengeMarks;
use crate::storage::DurableStorage;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;

pub fn load<T: DeserializeOwned, S: DurableStorage + ?Sized>(storage: &S, key: &str) -> Option<T> {
    let raw = storage.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("Ignoring malformed preference '{}': {}", key, e);
            None
        }
    }
}

pub fn load_or<T: DeserializeOwned, S: DurableStorage + ?Sized>(
    storage: &S,
    key: &str,
    default: T,
) -> T {
    load(storage, key).unwrap_or(default)
}

/// Best-effort write; a failure is logged and otherwise ignored.
pub fn save<T: Serialize + ?Sized, S: DurableStorage + ?Sized>(storage: &S, key: &str, value: &T) {
    let raw = match serde_json::to_string(value) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Not saving preference '{}': {}", key, e);
            return;
        }
    };
    if let Err(e) = storage.set(key, &raw) {
        warn!("Dropping preference write: {}", e);
    }
}

pub fn load_marks<S: DurableStorage + ?Sized>(storage: &S) -> ChallengeMarks {
    let raw: BTreeMap<String, String> = load_or(storage, CHALLENGE_MARKS_KEY, BTreeMap::new());
    ChallengeMarks::from_raw(&raw)
}

pub fn save_marks<S: DurableStorage + ?Sized>(storage: &S, marks: &ChallengeMarks) {
    save(storage, CHALLENGE_MARKS_KEY, &marks.to_raw());
}

/// Preferences of the challenge panel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChallengePanelPrefs {
    pub hide_solved: bool,
    pub hide_week_in_title: bool,
    pub search_text: String,
    pub marks: ChallengeMarks,
}

impl ChallengePanelPrefs {
    pub fn load<S: DurableStorage + ?Sized>(storage: &S) -> Self {
        Self {
            hide_solved: load_or(storage, HIDE_SOLVED_KEY, false),
            hide_week_in_title: load_or(storage, HIDE_WEEK_IN_TITLE_KEY, false),
            search_text: load_or(storage, CHALLENGE_SEARCH_KEY, String::new()),
            marks: load_marks(storage),
        }
    }

    pub fn save<S: DurableStorage + ?Sized>(&self, storage: &S) {
        save(storage, HIDE_SOLVED_KEY, &self.hide_solved);
        save(storage, HIDE_WEEK_IN_TITLE_KEY, &self.hide_week_in_title);
        save(storage, CHALLENGE_SEARCH_KEY, &self.search_text);
        save_marks(storage, &self.marks);
    }
}

pub fn load_scoreboard_search<S: DurableStorage + ?Sized>(storage: &S) -> String {
    load_or(storage, SCOREBOARD_SEARCH_KEY, String::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marks::{Mark, MarkKind};
    use crate::storage::MemoryStorage;

    #[test]
    fn absent_slots_use_defaults() {
        let storage = MemoryStorage::new();
        assert_eq!(ChallengePanelPrefs::load(&storage), ChallengePanelPrefs::default());
        assert_eq!(load_scoreboard_search(&storage), "");
    }

    #[test]
    fn malformed_slot_defaults_only_that_key() {
        let storage = MemoryStorage::new();
        storage.set(HIDE_SOLVED_KEY, "yes please").unwrap();
        storage.set(HIDE_WEEK_IN_TITLE_KEY, "true").unwrap();
        storage.set(CHALLENGE_SEARCH_KEY, "\"^web\"").unwrap();
        storage.set(CHALLENGE_MARKS_KEY, "[1, 2]").unwrap();

        let prefs = ChallengePanelPrefs::load(&storage);
        assert!(!prefs.hide_solved);
        assert!(prefs.hide_week_in_title);
        assert_eq!(prefs.search_text, "^web");
        assert!(prefs.marks.is_empty());
    }

    #[test]
    fn save_then_load() {
        let storage = MemoryStorage::new();
        let mut prefs = ChallengePanelPrefs {
            hide_solved: true,
            search_text: "pwn".into(),
            ..ChallengePanelPrefs::default()
        };
        prefs.marks.set(7, Mark::Known(MarkKind::ReviewedSkip));
        prefs.save(&storage);

        assert_eq!(storage.get(CHALLENGE_MARKS_KEY).as_deref(), Some(r#"{"7":"reviewed-skip"}"#));
        assert_eq!(ChallengePanelPrefs::load(&storage), prefs);
    }

    #[test]
    fn failed_write_is_swallowed() {
        let storage = MemoryStorage::with_quota(4);
        save(&storage, HIDE_SOLVED_KEY, &true);
        assert_eq!(storage.get(HIDE_SOLVED_KEY), None);
    }
}
