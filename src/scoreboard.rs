//! Scoreboard view state.
//!
//! The full table and the compact mobile list are both fed from one
//! [`ScoreboardView`], derived synchronously from the latest snapshot each
//! time a filter changes. Rows are scoped by organization, columns by
//! category and title pattern.

use crate::config::ALL_ORGANIZATIONS;
use crate::model::{
    ChallengeCategory, ChallengeId, ChallengeSnapshot, ScoreboardItem, ScoreboardSnapshot,
    SubmissionType, TeamId,
};
use crate::utils::{search_with_fallback, SearchPattern, SearchStatus};
use log::debug;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OrganizationScope {
    #[default]
    All,
    Named(String),
}

impl OrganizationScope {
    /// `"all"` or an empty value select every organization.
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed == ALL_ORGANIZATIONS {
            OrganizationScope::All
        } else {
            OrganizationScope::Named(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            OrganizationScope::All => ALL_ORGANIZATIONS,
            OrganizationScope::Named(name) => name,
        }
    }

    fn admits(&self, item: &ScoreboardItem) -> bool {
        match self {
            OrganizationScope::All => true,
            OrganizationScope::Named(name) => item.organization.as_deref() == Some(name.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreboardColumn {
    pub id: ChallengeId,
    pub title: String,
    pub category: ChallengeCategory,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreboardRow {
    /// Organization rank when an organization is selected.
    pub rank: u32,
    pub team_id: TeamId,
    pub name: String,
    pub organization: Option<String>,
    pub score: u32,
    pub solved_count: usize,
    /// One entry per column; `None` when the team has no accepted solve.
    pub cells: Vec<Option<SubmissionType>>,
}

/// Row of the compact (mobile) scoreboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactRow {
    pub rank: u32,
    pub team_id: TeamId,
    pub name: String,
    pub score: u32,
    pub solved_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreboardView {
    pub columns: Vec<ScoreboardColumn>,
    pub rows: Vec<ScoreboardRow>,
    pub search: SearchStatus,
}

#[derive(Debug, Clone, Default)]
pub struct ScoreboardViewState {
    organization: OrganizationScope,
    category: Option<ChallengeCategory>,
    title_text: String,
    title_pattern: SearchPattern,
}

impl ScoreboardViewState {
    pub fn new(title_text: &str) -> Self {
        let mut state = Self::default();
        state.set_title_pattern(title_text);
        state
    }

    pub fn organization(&self) -> &OrganizationScope {
        &self.organization
    }

    pub fn category(&self) -> Option<ChallengeCategory> {
        self.category
    }

    pub fn title_text(&self) -> &str {
        &self.title_text
    }

    pub fn title_pattern(&self) -> &SearchPattern {
        &self.title_pattern
    }

    pub fn set_organization(&mut self, organization: OrganizationScope) {
        self.organization = organization;
    }

    pub fn set_category(&mut self, category: Option<ChallengeCategory>) {
        self.category = category;
    }

    /// Store the text and compile it right away.
    pub fn set_title_pattern(&mut self, text: &str) {
        self.title_text = text.to_string();
        self.title_pattern = SearchPattern::compile(text);
    }

    pub fn derive(&self, snapshot: &ScoreboardSnapshot) -> ScoreboardView {
        let scoped: Vec<&ChallengeSnapshot> = match self.category {
            None => snapshot.challenges.values().flatten().collect(),
            Some(category) => snapshot
                .challenges
                .get(&category)
                .map(|list| list.iter().collect())
                .unwrap_or_default(),
        };
        let (visible, search) =
            search_with_fallback(scoped, &self.title_pattern, |c| c.title.as_str());

        let columns: Vec<ScoreboardColumn> = visible
            .into_iter()
            .map(|c| ScoreboardColumn {
                id: c.id,
                title: c.title.clone(),
                category: c.category,
                score: c.score,
            })
            .collect();

        let filtered = self.organization != OrganizationScope::All;
        let rows: Vec<ScoreboardRow> = snapshot
            .items
            .iter()
            .filter(|item| self.organization.admits(item))
            .enumerate()
            .map(|(pos, item)| {
                let rank = if filtered {
                    item.organization_rank.unwrap_or(pos as u32 + 1)
                } else {
                    item.rank
                };
                build_row(item, rank, &columns)
            })
            .collect();

        debug!(
            "Derived scoreboard: {} rows, {} columns",
            rows.len(),
            columns.len()
        );
        ScoreboardView {
            columns,
            rows,
            search,
        }
    }
}

fn build_row(item: &ScoreboardItem, rank: u32, columns: &[ScoreboardColumn]) -> ScoreboardRow {
    let accepted: HashMap<ChallengeId, SubmissionType> = item
        .solved_challenges
        .iter()
        .filter(|s| s.submission_type.is_accepted())
        .map(|s| (s.id, s.submission_type))
        .collect();

    ScoreboardRow {
        rank,
        team_id: item.id,
        name: item.name.clone(),
        organization: item.organization.clone(),
        score: item.score,
        solved_count: accepted.len(),
        cells: columns.iter().map(|c| accepted.get(&c.id).copied()).collect(),
    }
}

/// Distinct organizations present in the snapshot, sorted.
pub fn organizations(snapshot: &ScoreboardSnapshot) -> Vec<String> {
    snapshot
        .items
        .iter()
        .filter_map(|item| item.organization.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn cell_label(cell: Option<SubmissionType>) -> &'static str {
    match cell {
        Some(SubmissionType::FirstBlood) => "1st",
        Some(SubmissionType::SecondBlood) => "2nd",
        Some(SubmissionType::ThirdBlood) => "3rd",
        Some(SubmissionType::Normal) => "solved",
        Some(SubmissionType::Unaccepted) | None => "",
    }
}

impl ScoreboardView {
    pub fn compact_rows(&self) -> Vec<CompactRow> {
        self.rows
            .iter()
            .map(|row| CompactRow {
                rank: row.rank,
                team_id: row.team_id,
                name: row.name.clone(),
                score: row.score,
                solved_count: row.solved_count,
            })
            .collect()
    }

    /// The visible table as CSV: rank, team, organization, score, then one
    /// column per visible challenge.
    pub fn export_csv(&self) -> Result<String, csv::Error> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        let mut header = vec![
            "Rank".to_string(),
            "Team".to_string(),
            "Organization".to_string(),
            "Score".to_string(),
        ];
        header.extend(self.columns.iter().map(|c| c.title.clone()));
        writer.write_record(&header)?;

        for row in &self.rows {
            let mut record = vec![
                row.rank.to_string(),
                row.name.clone(),
                row.organization.clone().unwrap_or_default(),
                row.score.to_string(),
            ];
            record.extend(row.cells.iter().map(|c| cell_label(*c).to_string()));
            writer.write_record(&record)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))?;
        String::from_utf8(bytes).map_err(|e| {
            csv::Error::from(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })
    }
}
