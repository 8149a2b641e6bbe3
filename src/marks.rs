//! User annotations on challenges.
//!
//! Marks are chosen locally, stored as `{ "<challenge id>": "<label>" }` and
//! never sent to the server. Labels are resolved against a fixed table when
//! read from storage; anything not in the table is kept as free text.

use crate::model::ChallengeId;
use log::debug;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MarkKind {
    Done,
    GiveUp,
    Working,
    ReviewedSkip,
    /// Explicitly marked as nothing; hides the flag glyph.
    Blank,
}

/// Label, kind, whether the kind counts as solved, icon. Rows follow the
/// declaration order of `MarkKind`.
const MARK_KINDS: &[(&str, MarkKind, bool, &str)] = &[
    ("done", MarkKind::Done, true, "mdi-check-circle"),
    ("give-up", MarkKind::GiveUp, true, "mdi-close-circle"),
    ("working", MarkKind::Working, false, "mdi-progress-wrench"),
    ("reviewed-skip", MarkKind::ReviewedSkip, false, "mdi-skip-next-circle"),
    ("(blank)", MarkKind::Blank, false, ""),
];

impl MarkKind {
    pub fn all() -> impl Iterator<Item = MarkKind> {
        MARK_KINDS.iter().map(|&(_, kind, _, _)| kind)
    }

    fn entry(self) -> &'static (&'static str, MarkKind, bool, &'static str) {
        &MARK_KINDS[self as usize]
    }

    pub fn label(self) -> &'static str {
        self.entry().0
    }

    pub fn regard_as_solved(self) -> bool {
        self.entry().2
    }

    pub fn icon(self) -> &'static str {
        self.entry().3
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mark {
    Known(MarkKind),
    Custom(String),
}

impl Mark {
    pub fn parse(text: &str) -> Mark {
        MARK_KINDS
            .iter()
            .find(|(label, _, _, _)| *label == text)
            .map(|&(_, kind, _, _)| Mark::Known(kind))
            .unwrap_or_else(|| Mark::Custom(text.to_string()))
    }

    pub fn label(&self) -> &str {
        match self {
            Mark::Known(kind) => kind.label(),
            Mark::Custom(text) => text,
        }
    }

    /// `None` for free-text marks, which carry no solved semantics.
    pub fn regard_as_solved(&self) -> Option<bool> {
        match self {
            Mark::Known(kind) => Some(kind.regard_as_solved()),
            Mark::Custom(_) => None,
        }
    }
}

/// What the card shows in its flag corner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum MarkGlyph {
    /// No mark: the default flag.
    Flag,
    Icon(&'static str),
    Text(String),
}

impl MarkGlyph {
    pub fn for_mark(mark: Option<&Mark>) -> MarkGlyph {
        match mark {
            None => MarkGlyph::Flag,
            Some(Mark::Known(kind)) => MarkGlyph::Icon(kind.icon()),
            Some(Mark::Custom(text)) => MarkGlyph::Text(text.clone()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChallengeMarks {
    marks: HashMap<ChallengeId, Mark>,
}

impl ChallengeMarks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the stored object. Keys that are not challenge ids are skipped.
    pub fn from_raw(raw: &BTreeMap<String, String>) -> Self {
        let mut marks = HashMap::with_capacity(raw.len());
        for (key, label) in raw {
            match key.trim().parse::<ChallengeId>() {
                Ok(id) => {
                    marks.insert(id, Mark::parse(label));
                }
                Err(_) => debug!("Skipping mark with non-numeric key '{}'", key),
            }
        }
        Self { marks }
    }

    pub fn to_raw(&self) -> BTreeMap<String, String> {
        self.marks
            .iter()
            .map(|(id, mark)| (id.to_string(), mark.label().to_string()))
            .collect()
    }

    pub fn get(&self, id: ChallengeId) -> Option<&Mark> {
        self.marks.get(&id)
    }

    pub fn set(&mut self, id: ChallengeId, mark: Mark) {
        self.marks.insert(id, mark);
    }

    pub fn clear(&mut self, id: ChallengeId) -> Option<Mark> {
        self.marks.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }
}

impl FromIterator<(ChallengeId, Mark)> for ChallengeMarks {
    fn from_iter<I: IntoIterator<Item = (ChallengeId, Mark)>>(iter: I) -> Self {
        Self {
            marks: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_resolves_known_labels() {
        assert_eq!(Mark::parse("done"), Mark::Known(MarkKind::Done));
        assert_eq!(
            Mark::parse("reviewed-skip"),
            Mark::Known(MarkKind::ReviewedSkip)
        );
        assert_eq!(Mark::parse("later?"), Mark::Custom("later?".into()));
        // labels are exact
        assert_eq!(Mark::parse("Done"), Mark::Custom("Done".into()));
    }

    #[test]
    fn table_rows_match_declaration_order() {
        for (idx, row) in MARK_KINDS.iter().enumerate() {
            assert_eq!(row.1 as usize, idx);
        }
    }

    #[test]
    fn every_kind_round_trips_through_its_label() {
        for kind in MarkKind::all() {
            assert_eq!(Mark::parse(kind.label()), Mark::Known(kind));
        }
    }

    #[test]
    fn solved_semantics() {
        assert_eq!(Mark::parse("done").regard_as_solved(), Some(true));
        assert_eq!(Mark::parse("give-up").regard_as_solved(), Some(true));
        assert_eq!(Mark::parse("working").regard_as_solved(), Some(false));
        assert_eq!(Mark::parse("(blank)").regard_as_solved(), Some(false));
        assert_eq!(Mark::parse("note").regard_as_solved(), None);
    }

    #[test]
    fn glyphs() {
        assert_eq!(MarkGlyph::for_mark(None), MarkGlyph::Flag);
        assert_eq!(
            MarkGlyph::for_mark(Some(&Mark::Known(MarkKind::Done))),
            MarkGlyph::Icon("mdi-check-circle")
        );
        assert_eq!(
            MarkGlyph::for_mark(Some(&Mark::Custom("?".into()))),
            MarkGlyph::Text("?".into())
        );
    }

    #[test]
    fn from_raw_skips_bad_keys_and_to_raw_restores_labels() {
        let raw: BTreeMap<String, String> = [
            ("7", "reviewed-skip"),
            ("12", "free text"),
            ("abc", "done"),
            ("-1", "done"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let mut marks = ChallengeMarks::from_raw(&raw);
        assert_eq!(marks.len(), 2);
        assert_eq!(marks.get(7), Some(&Mark::Known(MarkKind::ReviewedSkip)));
        assert_eq!(marks.get(12), Some(&Mark::Custom("free text".into())));

        marks.set(3, Mark::Known(MarkKind::Done));
        assert_eq!(marks.clear(12), Some(Mark::Custom("free text".into())));

        let saved = marks.to_raw();
        assert_eq!(saved.get("3").map(String::as_str), Some("done"));
        assert_eq!(saved.get("7").map(String::as_str), Some("reviewed-skip"));
        assert!(!saved.contains_key("12"));
    }
}
