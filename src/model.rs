//! Snapshot types as they arrive from the game API.
//!
//! Every snapshot is read-only: a poll delivers a whole new value which
//! replaces the previous one, nothing here is ever patched in place.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub type ChallengeId = u32;
pub type TeamId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChallengeCategory {
    Misc,
    Crypto,
    Pwn,
    Web,
    Reverse,
    Blockchain,
    Forensics,
    Hardware,
    Mobile,
    PPC,
    AI,
    Pentest,
    OSINT,
}

impl ChallengeCategory {
    pub const ALL: [ChallengeCategory; 13] = [
        ChallengeCategory::Misc,
        ChallengeCategory::Crypto,
        ChallengeCategory::Pwn,
        ChallengeCategory::Web,
        ChallengeCategory::Reverse,
        ChallengeCategory::Blockchain,
        ChallengeCategory::Forensics,
        ChallengeCategory::Hardware,
        ChallengeCategory::Mobile,
        ChallengeCategory::PPC,
        ChallengeCategory::AI,
        ChallengeCategory::Pentest,
        ChallengeCategory::OSINT,
    ];
}

impl std::str::FromStr for ChallengeCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.to_string() == s)
            .ok_or_else(|| format!("Unknown challenge category '{}'", s))
    }
}

impl fmt::Display for ChallengeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubmissionType {
    Unaccepted,
    FirstBlood,
    SecondBlood,
    ThirdBlood,
    #[serde(alias = "Accepted")]
    Normal,
}

impl SubmissionType {
    pub fn is_accepted(self) -> bool {
        self != SubmissionType::Unaccepted
    }
}

/// One claimed blood slot on a challenge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blood {
    #[serde(rename = "id")]
    pub team_id: TeamId,
    #[serde(rename = "name")]
    pub team_name: String,
    #[serde(default)]
    pub submit_time_utc: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeSnapshot {
    pub id: ChallengeId,
    pub title: String,
    pub category: ChallengeCategory,
    #[serde(default)]
    pub score: u32,
    #[serde(default, rename = "solved")]
    pub solved_count: u32,
    /// First to third blood, `None` for slots nobody has claimed yet.
    #[serde(default)]
    pub bloods: Vec<Option<Blood>>,
}

/// Challenges grouped by category, in the order the server listed them.
pub type ChallengesByCategory = IndexMap<ChallengeCategory, Vec<ChallengeSnapshot>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolvedChallenge {
    pub id: ChallengeId,
    #[serde(rename = "type")]
    pub submission_type: SubmissionType,
    #[serde(default)]
    pub score: u32,
    #[serde(default)]
    pub submit_time_utc: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRankSnapshot {
    #[serde(default)]
    pub id: TeamId,
    #[serde(default)]
    pub name: String,
    /// Zero until the scoreboard has been computed and published.
    #[serde(default)]
    pub rank: u32,
    #[serde(default)]
    pub score: u32,
    #[serde(default)]
    pub solved_challenges: Vec<SolvedChallenge>,
}

impl TeamRankSnapshot {
    pub fn is_published(&self) -> bool {
        self.rank != 0
    }

    /// Submission type per solved challenge id, built once per derivation so
    /// lookups stay constant time.
    pub fn submission_index(&self) -> HashMap<ChallengeId, SubmissionType> {
        self.solved_challenges
            .iter()
            .map(|s| (s.id, s.submission_type))
            .collect()
    }
}

/// Per-team game details: the catalogue plus the team's own standing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameTeamInfo {
    #[serde(default, alias = "challengesByCategory")]
    pub challenges: Option<ChallengesByCategory>,
    #[serde(default)]
    pub rank: Option<TeamRankSnapshot>,
    #[serde(default)]
    pub writeup_deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreboardItem {
    pub id: TeamId,
    pub name: String,
    #[serde(default)]
    pub organization: Option<String>,
    pub rank: u32,
    #[serde(default)]
    pub organization_rank: Option<u32>,
    #[serde(default)]
    pub score: u32,
    #[serde(default)]
    pub solved_challenges: Vec<SolvedChallenge>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreboardSnapshot {
    #[serde(default)]
    pub items: Vec<ScoreboardItem>,
    #[serde(default)]
    pub challenges: ChallengesByCategory,
}
