//! Captured-traffic counts shown next to challenge metadata.
//!
//! Captures for a challenge live under `<capture root>/<challenge id>/`, one
//! sub-directory per team. Only the number of team directories is exposed.

use crate::model::{ChallengeCategory, ChallengeId};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChallengeType {
    #[default]
    StaticAttachment,
    StaticContainer,
    DynamicAttachment,
    DynamicContainer,
}

/// The fields of a game challenge the traffic listing needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameChallenge {
    pub id: ChallengeId,
    pub title: String,
    pub tag: ChallengeCategory,
    #[serde(rename = "type")]
    pub challenge_type: ChallengeType,
    pub is_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeTrafficModel {
    pub id: ChallengeId,
    pub title: String,
    pub tag: ChallengeCategory,
    #[serde(rename = "type")]
    pub challenge_type: ChallengeType,
    pub is_enabled: bool,
    /// Teams with captured traffic for this challenge.
    pub count: usize,
}

impl ChallengeTrafficModel {
    pub fn from_challenge(challenge: &GameChallenge, capture_root: &Path) -> Self {
        Self {
            id: challenge.id,
            title: challenge.title.clone(),
            tag: challenge.tag,
            challenge_type: challenge.challenge_type,
            is_enabled: challenge.is_enabled,
            count: count_team_dirs(&capture_root.join(challenge.id.to_string())),
        }
    }
}

/// Immediate sub-directories of `dir`; 0 when it does not exist or cannot
/// be read.
fn count_team_dirs(dir: &Path) -> usize {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("No captures at {:?}: {}", dir, e);
            return 0;
        }
    };
    entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .count()
}
