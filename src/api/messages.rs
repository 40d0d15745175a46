use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Credentials for login and registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Token issued by login/register
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: String,
}

/// A generated practice question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionResponse {
    pub id: i64,
    pub japanese_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRequest {
    pub question_id: i64,
    pub answer_text: String,
}

/// Tutor feedback on a submitted answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerFeedback {
    pub feedback: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoriteStatus {
    pub is_favorite: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveFavoriteRequest {
    pub japanese_text: String,
    pub english_answer: String,
}

/// A saved question in the review list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewQuestion {
    pub id: i64,
    pub japanese_text: String,
    #[serde(default)]
    pub english_answer: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewAnswerRequest {
    pub favorite_question_id: i64,
    pub answer_text: String,
    pub japanese_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub japanese_text: String,
}

/// Translation with a Japanese explanation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationResponse {
    pub translation: String,
    #[serde(default)]
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleVariationRequest {
    pub japanese_text: String,
    pub current_translation: String,
    pub variation_type: String,
}

/// FastAPI-style error body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// Register of a translation variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleVariation {
    Formal,
    Casual,
    /// Free-form situation, e.g. "job interview"
    Context(String),
}

impl fmt::Display for StyleVariation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StyleVariation::Formal => f.write_str("formal"),
            StyleVariation::Casual => f.write_str("casual"),
            StyleVariation::Context(situation) => write!(f, "context:{}", situation),
        }
    }
}

impl FromStr for StyleVariation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "formal" => Ok(StyleVariation::Formal),
            "casual" => Ok(StyleVariation::Casual),
            other => match other.strip_prefix("context:") {
                Some(situation) if !situation.trim().is_empty() => {
                    Ok(StyleVariation::Context(situation.trim().to_string()))
                }
                _ => Err(format!(
                    "unknown style '{}', expected formal, casual or context:<situation>",
                    other
                )),
            },
        }
    }
}

const TRANSLATION_MARKER: &str = "英訳";

/// Pull the English sentence out of a translation response
///
/// The generator sometimes answers with a labelled block such as
/// `英訳: I am a student.` followed by notes. Returns the text after the
/// first marker (ASCII or full-width colon) up to the end of that line, or
/// the whole text when no marker is present.
pub fn extract_translation(raw: &str) -> String {
    let mut rest = raw;
    while let Some(pos) = rest.find(TRANSLATION_MARKER) {
        let after = &rest[pos + TRANSLATION_MARKER.len()..];
        if let Some(body) = after.strip_prefix(':').or_else(|| after.strip_prefix('：')) {
            let line = body.split('\n').next().unwrap_or("");
            return line.trim().to_string();
        }
        rest = after;
    }
    raw.to_string()
}
