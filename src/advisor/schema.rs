//! Reply shapes expected from the text collaborator, and the checks that
//! decide whether a reply is usable.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::AdvisorError;
use crate::zone::CoverRating;
use crate::Timestamp;

/// Finds the first JSON object embedded in `text` and decodes it as `T`.
///
/// Replies routinely wrap the object in prose or a markdown fence, so each
/// `{` is tried as a starting point until one yields a complete object.
pub fn extract_json<T: DeserializeOwned>(text: &str) -> Result<T, AdvisorError> {
    for (start, _) in text.match_indices('{') {
        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        if let Some(Ok(value @ Value::Object(_))) = stream.next() {
            return serde_json::from_value(value).map_err(AdvisorError::Schema);
        }
    }
    Err(AdvisorError::NoJson)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverReport {
    pub cover_rating: CoverRating,
    #[serde(default)]
    pub analysis: Option<String>,
    #[serde(default)]
    pub tactical_advice: Option<String>,
}

impl CoverReport {
    pub fn unknown() -> Self {
        Self {
            cover_rating: CoverRating::Unknown,
            analysis: None,
            tactical_advice: None,
        }
    }

    pub(crate) fn parse(text: &str) -> Result<Self, AdvisorError> {
        let raw: RawCover = extract_json(text)?;
        let rating = CoverRating::from_untrusted(&raw.cover_rating);
        if rating == CoverRating::Unknown {
            return Err(AdvisorError::Invalid(format!(
                "cover rating '{}' is not high, medium or low",
                raw.cover_rating
            )));
        }
        Ok(Self {
            cover_rating: rating,
            analysis: raw.analysis.filter(|s| !s.trim().is_empty()),
            tactical_advice: raw.tactical_advice.filter(|s| !s.trim().is_empty()),
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCover {
    cover_rating: String,
    #[serde(default)]
    analysis: Option<String>,
    #[serde(default)]
    tactical_advice: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissionKind {
    Capture,
    Strategic,
    Exploration,
    Defense,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionObjective {
    pub description: String,
    pub target: u32,
    #[serde(default)]
    pub current: u32,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mission {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: MissionKind,
    pub objectives: Vec<MissionObjective>,
    pub reward: u64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expires_at: Timestamp,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionBoard {
    pub missions: Vec<Mission>,
}

impl MissionBoard {
    pub(crate) fn parse(text: &str) -> Result<Self, AdvisorError> {
        let board: MissionBoard = extract_json(text)?;
        if board.missions.is_empty() {
            return Err(AdvisorError::Invalid("no missions".into()));
        }
        for mission in &board.missions {
            if mission.title.trim().is_empty() {
                return Err(AdvisorError::Invalid(format!("mission '{}' has no title", mission.id)));
            }
            if mission.objectives.iter().any(|objective| objective.target == 0) {
                return Err(AdvisorError::Invalid(format!(
                    "mission '{}' has an objective with target 0",
                    mission.id
                )));
            }
        }
        Ok(board)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Info,
    Warning,
    Success,
}

impl MessageKind {
    fn from_untrusted(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("warning") => MessageKind::Warning,
            Some("success") => MessageKind::Success,
            _ => MessageKind::Info,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commentary {
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
}

impl Commentary {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: MessageKind::Info,
        }
    }

    pub(crate) fn parse(text: &str) -> Result<Self, AdvisorError> {
        let raw: RawCommentary = extract_json(text)?;
        let message = raw.message.trim();
        if message.is_empty() {
            return Err(AdvisorError::Invalid("empty commentary".into()));
        }
        Ok(Self {
            message: message.to_string(),
            kind: MessageKind::from_untrusted(raw.kind.as_deref()),
        })
    }
}

#[derive(Deserialize)]
struct RawCommentary {
    message: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}
