//! Derived challenge state.
//!
//! Everything here is a pure function of the latest snapshots, the user's
//! marks and the filter criteria. The panel recomputes the whole board on
//! every change; cost is linear in the number of challenges.
//!
//! # Pipeline
//! 1. flatten the catalogue in category order
//! 2. scope to the active category
//! 3. drop challenges that count as solved, when hiding solved ones
//! 4. search titles, falling back to step 3's set when nothing matches
//! 5. compute the per-card display state

use crate::marks::{ChallengeMarks, Mark, MarkGlyph, MarkKind};
use crate::model::{
    Blood, ChallengeCategory, ChallengeId, ChallengeSnapshot, ChallengesByCategory,
    SubmissionType, TeamId, TeamRankSnapshot,
};
use crate::utils::{search_with_fallback, strip_week_prefix, SearchPattern, SearchStatus};
use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum CategoryScope {
    #[default]
    All,
    Only(ChallengeCategory),
}

#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    pub scope: CategoryScope,
    pub hide_solved: bool,
    pub hide_week_in_title: bool,
    pub search: SearchPattern,
}

/// Does the challenge count as solved for filtering?
///
/// A user mark wins over the server: a known mark decides through its
/// `regard_as_solved`, a free-text mark counts as solved. Without a mark the
/// challenge is solved when the team has any submission recorded for it.
pub fn counts_as_solved(
    id: ChallengeId,
    marks: &ChallengeMarks,
    submissions: &HashMap<ChallengeId, SubmissionType>,
) -> bool {
    match marks.get(id) {
        Some(mark) => mark.regard_as_solved().unwrap_or(true),
        None => submissions.contains_key(&id),
    }
}

/// All challenges, category groups in order, then the order inside each group.
pub fn flatten(challenges: &ChallengesByCategory) -> Vec<&ChallengeSnapshot> {
    challenges.values().flatten().collect()
}

/// Challenges left after category scoping and the solved filter.
pub fn working_subset<'a>(
    challenges: &'a ChallengesByCategory,
    submissions: &HashMap<ChallengeId, SubmissionType>,
    marks: &ChallengeMarks,
    criteria: &FilterCriteria,
) -> Vec<&'a ChallengeSnapshot> {
    let scoped: Vec<&ChallengeSnapshot> = match criteria.scope {
        CategoryScope::All => flatten(challenges),
        CategoryScope::Only(category) => challenges
            .get(&category)
            .map(|list| list.iter().collect())
            .unwrap_or_default(),
    };

    if !criteria.hide_solved {
        return scoped;
    }
    scoped
        .into_iter()
        .filter(|c| !counts_as_solved(c.id, marks, submissions))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BloodSlot {
    First,
    Second,
    Third,
}

impl BloodSlot {
    pub const ALL: [BloodSlot; 3] = [BloodSlot::First, BloodSlot::Second, BloodSlot::Third];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn submission_type(self) -> SubmissionType {
        match self {
            BloodSlot::First => SubmissionType::FirstBlood,
            BloodSlot::Second => SubmissionType::SecondBlood,
            BloodSlot::Third => SubmissionType::ThirdBlood,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BloodStyle {
    pub icon: String,
    pub color: String,
}

/// Icon and color per blood slot, supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BloodPalette {
    pub slots: [BloodStyle; 3],
}

impl BloodPalette {
    pub fn style(&self, slot: BloodSlot) -> &BloodStyle {
        &self.slots[slot.index()]
    }
}

impl Default for BloodPalette {
    fn default() -> Self {
        let style = |icon: &str, color: &str| BloodStyle {
            icon: icon.to_string(),
            color: color.to_string(),
        };
        Self {
            slots: [
                style("mdi-water", "#ffd700"),
                style("mdi-water", "#c0c0c0"),
                style("mdi-water", "#cd7f32"),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodBadge {
    pub slot: BloodSlot,
    pub team_id: TeamId,
    pub team_name: String,
    pub submit_time_utc: Option<DateTime<Utc>>,
    pub style: BloodStyle,
    /// The viewing team holds this slot.
    pub own_team: bool,
}

/// Badges for the claimed slots only. Entries past the third are ignored.
pub fn blood_badges(
    bloods: &[Option<Blood>],
    palette: &BloodPalette,
    team_id: Option<TeamId>,
) -> Vec<BloodBadge> {
    BloodSlot::ALL
        .iter()
        .zip(bloods.iter())
        .filter_map(|(&slot, blood)| {
            let blood = blood.as_ref()?;
            Some(BloodBadge {
                slot,
                team_id: blood.team_id,
                team_name: blood.team_name.clone(),
                submit_time_utc: blood.submit_time_utc,
                style: palette.style(slot).clone(),
                own_team: team_id == Some(blood.team_id),
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkDisplay {
    pub show: bool,
    pub glyph: MarkGlyph,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeView {
    pub id: ChallengeId,
    pub title: String,
    pub display_title: String,
    pub category: ChallengeCategory,
    pub score: u32,
    pub solved_count: u32,
    /// Accepted submission on the server. Marks never change this.
    pub solved_for_display: bool,
    pub darkened: bool,
    pub mark: MarkDisplay,
    pub bloods: Vec<BloodBadge>,
}

/// Display state for one retained challenge.
pub fn challenge_view(
    challenge: &ChallengeSnapshot,
    submissions: &HashMap<ChallengeId, SubmissionType>,
    marks: &ChallengeMarks,
    criteria: &FilterCriteria,
    palette: &BloodPalette,
    team_id: Option<TeamId>,
) -> ChallengeView {
    let solved_for_display = submissions
        .get(&challenge.id)
        .is_some_and(|t| t.is_accepted());
    let mark = marks.get(challenge.id);

    let darkened = solved_for_display || mark.and_then(Mark::regard_as_solved).unwrap_or(false);
    let show = match mark {
        Some(Mark::Known(MarkKind::Blank)) => false,
        Some(_) => true,
        None => solved_for_display,
    };
    let display_title = if criteria.hide_week_in_title {
        strip_week_prefix(&challenge.title).to_string()
    } else {
        challenge.title.clone()
    };

    ChallengeView {
        id: challenge.id,
        title: challenge.title.clone(),
        display_title,
        category: challenge.category,
        score: challenge.score,
        solved_count: challenge.solved_count,
        solved_for_display,
        darkened,
        mark: MarkDisplay {
            show,
            glyph: MarkGlyph::for_mark(mark),
        },
        bloods: blood_badges(&challenge.bloods, palette, team_id),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTab {
    pub scope: CategoryScope,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "challenges", rename_all = "camelCase")]
pub enum BoardState {
    /// The catalogue has not arrived yet.
    Loading,
    /// The game has no challenges.
    NoChallenges,
    /// No rank yet, or rank 0: the scoreboard has not been published.
    ScoreboardNotReady,
    /// Filters left nothing to show.
    AllSolved,
    Ready(Vec<ChallengeView>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeBoard {
    pub state: BoardState,
    pub tabs: Vec<CategoryTab>,
    pub search: SearchStatus,
}

/// Run the whole pipeline against the latest snapshots.
pub fn derive_board(
    challenges: Option<&ChallengesByCategory>,
    rank: Option<&TeamRankSnapshot>,
    marks: &ChallengeMarks,
    criteria: &FilterCriteria,
    palette: &BloodPalette,
) -> ChallengeBoard {
    let Some(challenges) = challenges else {
        return ChallengeBoard {
            state: BoardState::Loading,
            tabs: Vec::new(),
            search: SearchStatus::Inactive,
        };
    };

    let total: usize = challenges.values().map(Vec::len).sum();
    let mut tabs = Vec::with_capacity(challenges.len() + 1);
    tabs.push(CategoryTab {
        scope: CategoryScope::All,
        count: total,
    });
    tabs.extend(challenges.iter().map(|(category, list)| CategoryTab {
        scope: CategoryScope::Only(*category),
        count: list.len(),
    }));

    let submissions = rank.map(TeamRankSnapshot::submission_index).unwrap_or_default();
    let subset = working_subset(challenges, &submissions, marks, criteria);
    let (shown, search) = search_with_fallback(subset, &criteria.search, |c| c.title.as_str());

    let state = if total == 0 {
        BoardState::NoChallenges
    } else if !rank.is_some_and(TeamRankSnapshot::is_published) {
        BoardState::ScoreboardNotReady
    } else if shown.is_empty() {
        BoardState::AllSolved
    } else {
        let team_id = rank.map(|r| r.id);
        BoardState::Ready(
            shown
                .into_iter()
                .map(|c| challenge_view(c, &submissions, marks, criteria, palette, team_id))
                .collect(),
        )
    };
    debug!("Derived challenge board: {} challenges, search {:?}", total, search);

    ChallengeBoard {
        state,
        tabs,
        search,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SolvedChallenge;

    fn chal(id: ChallengeId, title: &str, category: ChallengeCategory) -> ChallengeSnapshot {
        ChallengeSnapshot {
            id,
            title: title.to_string(),
            category,
            score: 100,
            solved_count: 0,
            bloods: Vec::new(),
        }
    }

    fn rank_with(solved: &[(ChallengeId, SubmissionType)]) -> TeamRankSnapshot {
        TeamRankSnapshot {
            id: 5,
            name: "us".into(),
            rank: 3,
            score: 0,
            solved_challenges: solved
                .iter()
                .map(|&(id, submission_type)| SolvedChallenge {
                    id,
                    submission_type,
                    score: 100,
                    submit_time_utc: None,
                })
                .collect(),
        }
    }

    fn catalogue() -> ChallengesByCategory {
        let mut map = ChallengesByCategory::new();
        map.insert(
            ChallengeCategory::Web,
            vec![
                chal(1, "[week1] Intro", ChallengeCategory::Web),
                chal(2, "Introduction", ChallengeCategory::Web),
            ],
        );
        map.insert(
            ChallengeCategory::Crypto,
            vec![chal(3, "RSA", ChallengeCategory::Crypto)],
        );
        map.insert(
            ChallengeCategory::Pwn,
            vec![
                chal(4, "heap", ChallengeCategory::Pwn),
                chal(7, "stack", ChallengeCategory::Pwn),
            ],
        );
        map
    }

    fn ids(list: &[&ChallengeSnapshot]) -> Vec<ChallengeId> {
        list.iter().map(|c| c.id).collect()
    }

    fn ready(board: &ChallengeBoard) -> &[ChallengeView] {
        match &board.state {
            BoardState::Ready(views) => views,
            other => panic!("expected a ready board, got {:?}", other),
        }
    }

    #[test]
    fn mark_takes_precedence_over_server_state() {
        let submissions: HashMap<_, _> = [(1, SubmissionType::Normal)].into_iter().collect();
        let mut marks = ChallengeMarks::new();

        assert!(counts_as_solved(1, &marks, &submissions));
        assert!(!counts_as_solved(2, &marks, &submissions));

        marks.set(1, Mark::Known(MarkKind::Working));
        marks.set(2, Mark::Known(MarkKind::GiveUp));
        assert!(!counts_as_solved(1, &marks, &submissions));
        assert!(counts_as_solved(2, &marks, &submissions));

        marks.set(2, Mark::Custom("later".into()));
        assert!(counts_as_solved(2, &marks, &submissions));
    }

    #[test]
    fn unaccepted_submission_still_counts_for_filtering() {
        let submissions: HashMap<_, _> = [(4, SubmissionType::Unaccepted)].into_iter().collect();
        assert!(counts_as_solved(4, &ChallengeMarks::new(), &submissions));
    }

    #[test]
    fn all_scope_flattens_in_order() {
        let cat = catalogue();
        let subset = working_subset(&cat, &HashMap::new(), &ChallengeMarks::new(), &FilterCriteria::default());
        assert_eq!(ids(&subset), vec![1, 2, 3, 4, 7]);
        let total: usize = cat.values().map(Vec::len).sum();
        assert_eq!(subset.len(), total);
    }

    #[test]
    fn category_scope_keeps_group_order_and_tolerates_missing_groups() {
        let cat = catalogue();
        let mut criteria = FilterCriteria {
            scope: CategoryScope::Only(ChallengeCategory::Pwn),
            ..FilterCriteria::default()
        };
        let subset = working_subset(&cat, &HashMap::new(), &ChallengeMarks::new(), &criteria);
        assert_eq!(ids(&subset), vec![4, 7]);

        criteria.scope = CategoryScope::Only(ChallengeCategory::Blockchain);
        let subset = working_subset(&cat, &HashMap::new(), &ChallengeMarks::new(), &criteria);
        assert!(subset.is_empty());
    }

    #[test]
    fn week_prefix_hidden_for_display_only() {
        // one Misc challenge, no solves, hide week tags
        let mut cat = ChallengesByCategory::new();
        cat.insert(
            ChallengeCategory::Misc,
            vec![chal(1, "[week1] Intro", ChallengeCategory::Misc)],
        );
        let criteria = FilterCriteria {
            hide_week_in_title: true,
            ..FilterCriteria::default()
        };
        let rank = rank_with(&[]);
        let board = derive_board(
            Some(&cat),
            Some(&rank),
            &ChallengeMarks::new(),
            &criteria,
            &BloodPalette::default(),
        );
        let views = ready(&board);
        assert_eq!(views[0].display_title, "Intro");
        assert_eq!(views[0].title, "[week1] Intro");
        assert!(!views[0].solved_for_display);
    }

    #[test]
    fn hide_solved_excludes_server_solved() {
        let mut cat = ChallengesByCategory::new();
        cat.insert(
            ChallengeCategory::Misc,
            vec![chal(1, "[week1] Intro", ChallengeCategory::Misc)],
        );
        let rank = rank_with(&[(1, SubmissionType::Normal)]);
        let criteria = FilterCriteria {
            hide_solved: true,
            ..FilterCriteria::default()
        };
        let subset = working_subset(
            &cat,
            &rank.submission_index(),
            &ChallengeMarks::new(),
            &criteria,
        );
        assert!(subset.is_empty());

        let board = derive_board(
            Some(&cat),
            Some(&rank),
            &ChallengeMarks::new(),
            &criteria,
            &BloodPalette::default(),
        );
        assert_eq!(board.state, BoardState::AllSolved);
    }

    #[test]
    fn skip_mark_keeps_server_solved_challenge_visible() {
        let cat = catalogue();
        let rank = rank_with(&[(7, SubmissionType::FirstBlood)]);
        let marks: ChallengeMarks = [(7, Mark::parse("reviewed-skip"))].into_iter().collect();
        let criteria = FilterCriteria {
            hide_solved: true,
            ..FilterCriteria::default()
        };

        let board = derive_board(Some(&cat), Some(&rank), &marks, &criteria, &BloodPalette::default());
        let views = ready(&board);
        let seven = views.iter().find(|v| v.id == 7).unwrap();
        // the badge still reflects the server
        assert!(seven.solved_for_display);
        assert!(seven.darkened);
        assert!(seven.mark.show);
        assert_eq!(seven.mark.glyph, MarkGlyph::Icon(MarkKind::ReviewedSkip.icon()));
    }

    #[test]
    fn anchored_search_and_invalid_pattern() {
        let cat = catalogue();
        let rank = rank_with(&[]);
        let marks = ChallengeMarks::new();
        let mut criteria = FilterCriteria {
            scope: CategoryScope::Only(ChallengeCategory::Web),
            search: SearchPattern::compile("^intro$"),
            ..FilterCriteria::default()
        };
        let palette = BloodPalette::default();

        // raw titles: "[week1] Intro" does not match an anchored pattern
        let board = derive_board(Some(&cat), Some(&rank), &marks, &criteria, &palette);
        assert_eq!(board.search, SearchStatus::NoMatch);
        assert_eq!(ready(&board).len(), 2);

        let mut plain = ChallengesByCategory::new();
        plain.insert(
            ChallengeCategory::Web,
            vec![
                chal(1, "Intro", ChallengeCategory::Web),
                chal(2, "Introduction", ChallengeCategory::Web),
            ],
        );
        let board = derive_board(Some(&plain), Some(&rank), &marks, &criteria, &palette);
        assert_eq!(board.search, SearchStatus::Matched);
        let titles: Vec<_> = ready(&board).iter().map(|v| v.title.as_str()).collect();
        assert_eq!(titles, vec!["Intro"]);

        criteria.search = SearchPattern::compile("([");
        let board = derive_board(Some(&plain), Some(&rank), &marks, &criteria, &palette);
        assert_eq!(board.search, SearchStatus::Invalid);
        assert_eq!(ready(&board).len(), 2);
    }

    #[test]
    fn search_matches_raw_title_even_when_prefix_hidden() {
        let cat = catalogue();
        let rank = rank_with(&[]);
        let criteria = FilterCriteria {
            hide_week_in_title: true,
            search: SearchPattern::compile("week1"),
            ..FilterCriteria::default()
        };
        let board = derive_board(
            Some(&cat),
            Some(&rank),
            &ChallengeMarks::new(),
            &criteria,
            &BloodPalette::default(),
        );
        let views = ready(&board);
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].display_title, "Intro");
    }

    #[test]
    fn search_with_no_hits_falls_back_to_working_subset() {
        let cat = catalogue();
        let submissions = rank_with(&[(3, SubmissionType::Normal)]).submission_index();
        let marks = ChallengeMarks::new();
        let mut criteria = FilterCriteria {
            hide_solved: true,
            ..FilterCriteria::default()
        };
        let subset = working_subset(&cat, &submissions, &marks, &criteria);

        for text in ["zzz", "^$", "RSA"] {
            criteria.search = SearchPattern::compile(text);
            let (shown, status) =
                search_with_fallback(subset.clone(), &criteria.search, |c| c.title.as_str());
            assert_eq!(status, SearchStatus::NoMatch);
            assert_eq!(ids(&shown), ids(&subset));
        }
    }

    #[test]
    fn not_ready_states() {
        let cat = catalogue();
        let marks = ChallengeMarks::new();
        let criteria = FilterCriteria::default();
        let palette = BloodPalette::default();

        let board = derive_board(None, None, &marks, &criteria, &palette);
        assert_eq!(board.state, BoardState::Loading);

        let empty = ChallengesByCategory::new();
        let board = derive_board(Some(&empty), None, &marks, &criteria, &palette);
        assert_eq!(board.state, BoardState::NoChallenges);

        let board = derive_board(Some(&cat), None, &marks, &criteria, &palette);
        assert_eq!(board.state, BoardState::ScoreboardNotReady);

        let mut unpublished = rank_with(&[]);
        unpublished.rank = 0;
        let board = derive_board(Some(&cat), Some(&unpublished), &marks, &criteria, &palette);
        assert_eq!(board.state, BoardState::ScoreboardNotReady);
        // tabs are still available while waiting
        assert_eq!(board.tabs[0].count, 5);
        assert_eq!(board.tabs.len(), 4);
    }

    #[test]
    fn mark_display_rules() {
        let cat = catalogue();
        let rank = rank_with(&[(1, SubmissionType::Normal), (2, SubmissionType::Unaccepted)]);
        let marks: ChallengeMarks = [
            (3, Mark::parse("(blank)")),
            (4, Mark::parse("done")),
            (7, Mark::parse("my note")),
        ]
        .into_iter()
        .collect();
        let board = derive_board(
            Some(&cat),
            Some(&rank),
            &marks,
            &FilterCriteria::default(),
            &BloodPalette::default(),
        );
        let by_id: HashMap<_, _> = ready(&board).iter().map(|v| (v.id, v)).collect();

        // solved, unmarked: default flag shown
        assert!(by_id[&1].solved_for_display && by_id[&1].darkened && by_id[&1].mark.show);
        assert_eq!(by_id[&1].mark.glyph, MarkGlyph::Flag);
        // unaccepted submission is not solved for display
        assert!(!by_id[&2].solved_for_display && !by_id[&2].mark.show);
        // blank mark hides the glyph
        assert!(!by_id[&3].mark.show && !by_id[&3].darkened);
        // done mark darkens without a server solve
        assert!(by_id[&4].darkened && !by_id[&4].solved_for_display);
        // free text shows as text and does not darken
        assert_eq!(by_id[&7].mark.glyph, MarkGlyph::Text("my note".into()));
        assert!(!by_id[&7].darkened);
    }

    #[test]
    fn blood_badges_skip_unclaimed_slots_and_flag_own_team() {
        let palette = BloodPalette::default();
        let blood = |id: TeamId| {
            Some(Blood {
                team_id: id,
                team_name: format!("team{}", id),
                submit_time_utc: None,
            })
        };

        assert!(blood_badges(&[], &palette, Some(5)).is_empty());

        let badges = blood_badges(&[blood(9), None, blood(5)], &palette, Some(5));
        assert_eq!(badges.len(), 2);
        assert_eq!(badges[0].slot, BloodSlot::First);
        assert!(!badges[0].own_team);
        assert_eq!(badges[0].style, palette.slots[0]);
        assert_eq!(badges[1].slot, BloodSlot::Third);
        assert!(badges[1].own_team);
        assert_eq!(badges[1].style.color, "#cd7f32");

        let badges = blood_badges(&[blood(1), blood(2), blood(3), blood(4)], &palette, None);
        assert_eq!(badges.len(), 3);
    }
}
