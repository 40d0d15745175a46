pub mod client;
pub mod messages;

pub use client::{ApiClient, ApiError};
pub use messages::{
    extract_translation, AnswerFeedback, Credentials, FavoriteStatus, QuestionResponse,
    ReviewQuestion, StyleVariation, TokenResponse, TranslationResponse, UserProfile,
};
