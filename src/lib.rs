pub mod api;
pub mod config;
pub mod practice;
pub mod session;
pub mod speech;

pub use api::{ApiClient, ApiError, StyleVariation};
pub use config::Config;
pub use practice::{capture_voice_answer, AnswerDraft};
pub use session::{
    AuthHeader, AuthState, FileStorage, MemoryStorage, Navigator, SessionManager,
    TokenClaims, TokenStorage,
};
pub use speech::{
    ScriptedHost, SpeechCaptureController, SpeechConfig, SpeechError, SpeechHost,
};
