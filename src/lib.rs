//! Client-side state engine for a CTF competition front end.
//!
//! Turns challenge, team-rank and scoreboard snapshots into view state, and
//! keeps fetched responses in a compressed local cache across reloads.

use log::debug;
use serde::Deserialize;
use std::collections::BTreeMap;
use wasm_bindgen::prelude::*;

pub mod cache;
pub mod challenge;
pub mod config;
pub mod marks;
pub mod model;
pub mod preferences;
pub mod provider;
pub mod scoreboard;
pub mod storage;
pub mod traffic;
pub mod utils;

pub use challenge::{
    counts_as_solved, derive_board, BloodPalette, BoardState, CategoryScope, ChallengeBoard,
    ChallengeView, FilterCriteria,
};
pub use marks::{ChallengeMarks, Mark, MarkKind};
pub use model::{
    ChallengeCategory, ChallengeSnapshot, ChallengesByCategory, GameTeamInfo, ScoreboardSnapshot,
    SubmissionType, TeamRankSnapshot,
};
pub use provider::{ResponseCacheProvider, SharedCache};
pub use scoreboard::{OrganizationScope, ScoreboardView, ScoreboardViewState};
pub use utils::{SearchPattern, SearchStatus};

/// Filter settings as passed from JavaScript.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CriteriaInput {
    /// `None` selects every category.
    pub category: Option<ChallengeCategory>,
    pub hide_solved: bool,
    pub hide_week_in_title: bool,
    pub search_text: String,
}

impl CriteriaInput {
    pub fn compile(&self) -> FilterCriteria {
        FilterCriteria {
            scope: self
                .category
                .map(CategoryScope::Only)
                .unwrap_or(CategoryScope::All),
            hide_solved: self.hide_solved,
            hide_week_in_title: self.hide_week_in_title,
            search: SearchPattern::compile(&self.search_text),
        }
    }
}

/// JavaScript entry point for deriving the challenge board.
///
/// # Arguments
/// * `team_info_js` - the `GameTeamInfo` snapshot
/// * `marks_js` - stored marks, `{ "<challenge id>": "<label>" }`
/// * `criteria_js` - a `CriteriaInput`
///
/// # Returns
/// Serialized `ChallengeBoard`, or an error message string
#[wasm_bindgen]
pub fn derive_challenge_board(team_info_js: JsValue, marks_js: JsValue, criteria_js: JsValue) -> JsValue {
    let start_time = js_sys::Date::now();
    let team_info: GameTeamInfo = match serde_wasm_bindgen::from_value(team_info_js) {
        Ok(info) => info,
        Err(e) => {
            return serde_wasm_bindgen::to_value(&format!("Failed to deserialize team info: {}", e))
                .unwrap_or(JsValue::NULL);
        }
    };
    // marks and criteria are local state; fall back to defaults rather than fail
    let raw_marks: BTreeMap<String, String> =
        serde_wasm_bindgen::from_value(marks_js).unwrap_or_default();
    let criteria: CriteriaInput = serde_wasm_bindgen::from_value(criteria_js).unwrap_or_else(|e| {
        debug!("Using default criteria: {}", e);
        CriteriaInput::default()
    });

    let board = derive_board(
        team_info.challenges.as_ref(),
        team_info.rank.as_ref(),
        &ChallengeMarks::from_raw(&raw_marks),
        &criteria.compile(),
        &BloodPalette::default(),
    );
    debug!(
        "Derived challenge board in {:.1} ms",
        js_sys::Date::now() - start_time
    );
    serde_wasm_bindgen::to_value(&board).unwrap_or(JsValue::NULL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn criteria_input_defaults_and_compiles() {
        let input: CriteriaInput =
            serde_json::from_str(r#"{"category": "Web", "searchText": "^x"}"#).unwrap();
        let criteria = input.compile();
        assert_eq!(criteria.scope, CategoryScope::Only(ChallengeCategory::Web));
        assert!(!criteria.hide_solved);
        assert!(criteria.search.is_match("X"));

        let all: CriteriaInput = serde_json::from_str("{}").unwrap();
        assert_eq!(all.compile().scope, CategoryScope::All);
        assert!(all.compile().search.is_absent());
    }
}
