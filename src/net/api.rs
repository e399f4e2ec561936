use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// Header carrying the session token.
const SESSION_HEADER: &str = "X-Session-ID";

/// One prompt as listed by `GET /api/prompts`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PromptSummary {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub variables: Vec<String>,
}

/// Error talking to the prompt API
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("session expired")]
    Unauthorized,
    #[error("server answered HTTP {0}")]
    Status(u16),
}

/// Blocking client for the prompt endpoints. Cheap to clone into worker threads.
#[derive(Clone)]
pub struct ApiClient {
    base: Url,
    session: Option<String>,
    http: Client,
}

impl ApiClient {
    pub fn new(base: &str, session: Option<String>) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(concat!("ContextOS/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(15))
            .build()?;
        Ok(Self {
            base: normalize_base(base)?,
            session: session.filter(|s| !s.is_empty()),
            http,
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base.join(path)?)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.session {
            Some(token) => request.header(SESSION_HEADER, token),
            None => request,
        }
    }

    pub fn list_prompts(&self) -> Result<Vec<PromptSummary>, ApiError> {
        let url = self.endpoint("/api/prompts")?;
        log::debug!("GET {}", url);
        let response = self.authorize(self.http.get(url)).send()?;
        Ok(check(response)?.json()?)
    }

    pub fn delete_prompt(&self, id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("/api/prompts/{}", id))?;
        log::debug!("DELETE {}", url);
        let response = self.authorize(self.http.delete(url)).send()?;
        check(response)?;
        Ok(())
    }

    /// Link used as the `url` of a share payload.
    pub fn prompt_link(&self, id: &str) -> String {
        self.endpoint(&format!("/api/prompts/{}", id))
            .map(String::from)
            .unwrap_or_else(|_| self.base.to_string())
    }
}

fn normalize_base(base: &str) -> Result<Url, ApiError> {
    let base = if base.starts_with("http://") || base.starts_with("https://") {
        base.to_string()
    } else {
        format!("http://{}", base)
    };
    Ok(Url::parse(&base)?)
}

fn status_error(code: u16) -> Option<ApiError> {
    match code {
        401 => Some(ApiError::Unauthorized),
        200..=299 => None,
        _ => Some(ApiError::Status(code)),
    }
}

fn check(response: Response) -> Result<Response, ApiError> {
    match status_error(response.status().as_u16()) {
        Some(err) => Err(err),
        None => Ok(response),
    }
}
