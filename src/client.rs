//! REST client for the learning platform backend.
//!
//! `Api` is the seam everything above talks through; `HttpApi` is the
//! reqwest-backed implementation. Endpoints live under `/api/v1` and
//! speak snake_case JSON; errors arrive as `{"detail": ...}` bodies.
//! A 401 maps to `ApiError::Unauthorized` so the session layer can force
//! a logout.

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::RwLock;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::domain::{Job, Lesson, Progress, Submission, User};
use crate::protocol::{
    LessonQuery, LoginRequest, ProgressCreate, ProgressUpdate, RegisterRequest, SubmissionCreate,
    TokenResponse,
};
use crate::util::trunc_for_log;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not authenticated")]
    Unauthorized,

    #[error("backend returned {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Backend operations the rest of the crate depends on. Implemented by
/// `HttpApi` in production and by in-memory fakes in tests.
#[allow(async_fn_in_trait)]
pub trait Api {
    /// Install or clear the bearer token used on subsequent requests.
    fn set_token(&self, token: Option<String>);

    async fn register(&self, req: &RegisterRequest) -> Result<User, ApiError>;
    async fn login(&self, req: &LoginRequest) -> Result<TokenResponse, ApiError>;
    async fn current_user(&self) -> Result<User, ApiError>;
    async fn lessons(&self, query: &LessonQuery) -> Result<Vec<Lesson>, ApiError>;
    async fn lesson(&self, id: i64) -> Result<Lesson, ApiError>;
    async fn submit_code(&self, req: &SubmissionCreate) -> Result<Submission, ApiError>;
    async fn submission(&self, id: i64) -> Result<Submission, ApiError>;
    async fn job(&self, id: &str) -> Result<Job, ApiError>;
    async fn my_progress(&self) -> Result<Vec<Progress>, ApiError>;
    async fn create_progress(&self, req: &ProgressCreate) -> Result<Progress, ApiError>;
    async fn update_progress(&self, id: i64, req: &ProgressUpdate) -> Result<Progress, ApiError>;
}

/// Pull a human-readable message out of a FastAPI-style error body.
fn extract_detail(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(v) => match v.get("detail") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => trunc_for_log(body, 200),
        },
        Err(_) => trunc_for_log(body, 200),
    }
}

pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl HttpApi {
    pub fn new(cfg: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(cfg.request_timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{path}", self.base_url)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        let token = self
            .token
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();
        match token {
            Some(t) => builder.bearer_auth(t),
            None => builder,
        }
    }

    async fn decode<T: DeserializeOwned>(&self, resp: Response) -> Result<T, ApiError> {
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!(target: "mlquest_client", "Request rejected with 401");
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let detail = extract_detail(&body);
            warn!(target: "mlquest_client", status = status.as_u16(), %detail, "Request failed");
            return Err(ApiError::Status {
                status: status.as_u16(),
                detail,
            });
        }
        Ok(resp.json().await?)
    }
}

impl Api for HttpApi {
    fn set_token(&self, token: Option<String>) {
        let mut guard = self
            .token
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = token;
    }

    async fn register(&self, req: &RegisterRequest) -> Result<User, ApiError> {
        debug!(target: "mlquest_client", email = %req.email, "POST /auth/register");
        let resp = self
            .client
            .post(self.url("/auth/register"))
            .json(req)
            .send()
            .await?;
        self.decode(resp).await
    }

    async fn login(&self, req: &LoginRequest) -> Result<TokenResponse, ApiError> {
        debug!(target: "mlquest_client", email = %req.email, "POST /auth/login/json");
        let resp = self
            .client
            .post(self.url("/auth/login/json"))
            .json(req)
            .send()
            .await?;
        self.decode(resp).await
    }

    async fn current_user(&self) -> Result<User, ApiError> {
        let resp = self
            .authed(self.client.get(self.url("/auth/me")))
            .send()
            .await?;
        self.decode(resp).await
    }

    async fn lessons(&self, query: &LessonQuery) -> Result<Vec<Lesson>, ApiError> {
        let resp = self
            .authed(self.client.get(self.url("/lessons")).query(query))
            .send()
            .await?;
        self.decode(resp).await
    }

    async fn lesson(&self, id: i64) -> Result<Lesson, ApiError> {
        let resp = self
            .authed(self.client.get(self.url(&format!("/lessons/{id}"))))
            .send()
            .await?;
        self.decode(resp).await
    }

    async fn submit_code(&self, req: &SubmissionCreate) -> Result<Submission, ApiError> {
        debug!(
            target: "mlquest_client",
            lesson_id = req.lesson_id,
            code = %trunc_for_log(&req.code, 120),
            "POST /submit"
        );
        let resp = self
            .authed(self.client.post(self.url("/submit")).json(req))
            .send()
            .await?;
        self.decode(resp).await
    }

    async fn submission(&self, id: i64) -> Result<Submission, ApiError> {
        let resp = self
            .authed(self.client.get(self.url(&format!("/submissions/{id}"))))
            .send()
            .await?;
        self.decode(resp).await
    }

    async fn job(&self, id: &str) -> Result<Job, ApiError> {
        let resp = self
            .authed(self.client.get(self.url(&format!("/jobs/{id}"))))
            .send()
            .await?;
        self.decode(resp).await
    }

    async fn my_progress(&self) -> Result<Vec<Progress>, ApiError> {
        let resp = self
            .authed(self.client.get(self.url("/progress/me")))
            .send()
            .await?;
        self.decode(resp).await
    }

    async fn create_progress(&self, req: &ProgressCreate) -> Result<Progress, ApiError> {
        let resp = self
            .authed(self.client.post(self.url("/progress")).json(req))
            .send()
            .await?;
        self.decode(resp).await
    }

    async fn update_progress(&self, id: i64, req: &ProgressUpdate) -> Result<Progress, ApiError> {
        let resp = self
            .authed(self.client.put(self.url(&format!("/progress/{id}"))).json(req))
            .send()
            .await?;
        self.decode(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_extraction_handles_fastapi_shapes() {
        assert_eq!(extract_detail(r#"{"detail": "Invalid credentials"}"#), "Invalid credentials");
        assert_eq!(
            extract_detail(r#"{"detail": [{"loc": ["body", "email"], "msg": "field required"}]}"#),
            r#"[{"loc":["body","email"],"msg":"field required"}]"#
        );
        assert_eq!(extract_detail("plain text error"), "plain text error");
        assert_eq!(extract_detail(r#"{"message": "nope"}"#), r#"{"message": "nope"}"#);
    }

    #[test]
    fn base_url_loses_its_trailing_slash() {
        let cfg = ApiConfig {
            base_url: "http://localhost:8002/".into(),
            request_timeout_secs: 5,
        };
        let api = HttpApi::new(&cfg).unwrap();
        assert_eq!(api.url("/auth/me"), "http://localhost:8002/api/v1/auth/me");
    }
}
