use super::messages::{
    AnswerFeedback, AnswerRequest, Credentials, ErrorBody, FavoriteStatus, QuestionResponse,
    ReviewAnswerRequest, ReviewQuestion, SaveFavoriteRequest, StyleVariation,
    StyleVariationRequest, TokenResponse, TranslationRequest, TranslationResponse, UserProfile,
};
use crate::session::SessionManager;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ApiError {
    /// The server rejected (or did not receive) credentials
    #[error("not authenticated")]
    Unauthorized,

    #[error("request failed with {status}: {detail}")]
    Status { status: StatusCode, detail: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Client for the practice REST API
///
/// Every request carries the session's auth header contribution. A 401 comes
/// back as [`ApiError::Unauthorized`]; reacting to it is up to the caller.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    session: Arc<SessionManager>,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout_ms: u64,
        session: Arc<SessionManager>,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        info!("API client for {}", base_url);

        Ok(Self {
            base_url,
            http,
            session,
        })
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// POST /api/v1/login
    pub async fn login(&self, credentials: &Credentials) -> Result<TokenResponse, ApiError> {
        let req = self.http.post(self.url("/login")).json(credentials);
        self.send(req).await
    }

    /// POST /api/v1/register
    pub async fn register(&self, credentials: &Credentials) -> Result<TokenResponse, ApiError> {
        let req = self.http.post(self.url("/register")).json(credentials);
        self.send(req).await
    }

    /// GET /api/v1/me
    pub async fn me(&self) -> Result<UserProfile, ApiError> {
        let req = self.authed(self.http.get(self.url("/me")));
        self.send(req).await
    }

    /// POST /api/v1/questions/generate
    pub async fn generate_question(&self) -> Result<QuestionResponse, ApiError> {
        let req = self.authed(self.http.post(self.url("/questions/generate")));
        let question: QuestionResponse = self.send(req).await?;
        if question.japanese_text.trim().is_empty() {
            return Err(ApiError::InvalidResponse("question has no text".to_string()));
        }
        Ok(question)
    }

    /// POST /api/v1/questions/check
    pub async fn check_answer(
        &self,
        question_id: i64,
        answer_text: &str,
    ) -> Result<AnswerFeedback, ApiError> {
        let body = AnswerRequest {
            question_id,
            answer_text: answer_text.to_string(),
        };
        self.post_json("/questions/check", &body).await
    }

    /// POST /api/v1/questions/{id}/favorite
    pub async fn toggle_favorite(&self, question_id: i64) -> Result<FavoriteStatus, ApiError> {
        let path = format!("/questions/{}/favorite", question_id);
        let req = self.authed(self.http.post(self.url(&path)));
        self.send(req).await
    }

    /// POST /api/v1/questions/save-favorite
    pub async fn save_favorite(
        &self,
        japanese_text: &str,
        english_answer: &str,
    ) -> Result<serde_json::Value, ApiError> {
        let body = SaveFavoriteRequest {
            japanese_text: japanese_text.to_string(),
            english_answer: english_answer.to_string(),
        };
        self.post_json("/questions/save-favorite", &body).await
    }

    /// GET /api/v1/questions/favorites
    pub async fn favorites(&self) -> Result<Vec<ReviewQuestion>, ApiError> {
        let req = self.authed(self.http.get(self.url("/questions/favorites")));
        self.send(req).await
    }

    /// POST /api/v1/review/check
    pub async fn check_review_answer(
        &self,
        question: &ReviewQuestion,
        answer_text: &str,
    ) -> Result<AnswerFeedback, ApiError> {
        let body = ReviewAnswerRequest {
            favorite_question_id: question.id,
            answer_text: answer_text.to_string(),
            japanese_text: question.japanese_text.clone(),
        };
        self.post_json("/review/check", &body).await
    }

    /// POST /api/v1/translation/generate
    pub async fn translate(&self, japanese_text: &str) -> Result<TranslationResponse, ApiError> {
        let body = TranslationRequest {
            japanese_text: japanese_text.to_string(),
        };
        let resp: TranslationResponse = self.post_json("/translation/generate", &body).await?;
        if resp.translation.trim().is_empty() {
            return Err(ApiError::InvalidResponse("empty translation".to_string()));
        }
        Ok(resp)
    }

    /// POST /api/v1/translation/style-variation
    pub async fn style_variation(
        &self,
        japanese_text: &str,
        current_translation: &str,
        variation: &StyleVariation,
    ) -> Result<TranslationResponse, ApiError> {
        let body = StyleVariationRequest {
            japanese_text: japanese_text.to_string(),
            current_translation: current_translation.to_string(),
            variation_type: variation.to_string(),
        };
        self.post_json("/translation/style-variation", &body).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    /// Merge the session's header contribution into the request
    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        let mut headers = HeaderMap::new();
        for (name, value) in self.session.auth_header() {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(&value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => warn!("Skipping malformed auth header {}", name),
            }
        }
        req.headers(headers)
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let req = self.authed(self.http.post(self.url(path)).json(body));
        self.send(req).await
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ApiError> {
        let resp = req.send().await?;
        let status = resp.status();
        let url = resp.url().to_string();
        debug!("{} -> {}", url, status);

        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }

        if !status.is_success() {
            let raw = resp.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorBody>(&raw)
                .map(|body| body.detail)
                .unwrap_or(raw);
            warn!("{} failed with {}: {}", url, status, detail);
            return Err(ApiError::Status { status, detail });
        }

        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::InvalidResponse(format!("{} from {}", e, url)))
    }
}
