//! REST client for the upstream demo data services.
//!
//! DESIGN
//! ======
//! Thin typed wrappers over GET/POST against a JSON backend. When a session
//! is present its token rides along as a bearer header; anonymous calls
//! send none. No retry and no caching.
//!
//! ERROR HANDLING
//! ==============
//! Non-2xx responses keep the body text as the error message so callers can
//! show what the backend said.

use reqwest::Method;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::types::{Album, Comment, NewPost, Post, SessionToken};

/// Public demo backend used when no base URL is configured.
pub const DEFAULT_API_URL: &str = "https://jsonplaceholder.typicode.com";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("request failed with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response payload: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

fn posts_endpoint(user_id: Option<u64>) -> String {
    match user_id {
        Some(id) => format!("/posts?userId={id}"),
        None => "/posts".to_owned(),
    }
}

fn post_endpoint(id: u64) -> String {
    format!("/posts/{id}")
}

fn post_comments_endpoint(post_id: u64) -> String {
    format!("/posts/{post_id}/comments")
}

fn albums_endpoint(user_id: Option<u64>) -> String {
    match user_id {
        Some(id) => format!("/albums?userId={id}"),
        None => "/albums".to_owned(),
    }
}

fn album_endpoint(id: u64) -> String {
    format!("/albums/{id}")
}

fn bearer_value(token: &SessionToken) -> String {
    format!("Bearer {}", token.expose())
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<SessionToken>,
}

impl ApiClient {
    /// Anonymous client against `base_url`.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            token: None,
        }
    }

    /// Same client, sending `token` as a bearer credential.
    #[must_use]
    pub fn with_token(mut self, token: Option<SessionToken>) -> Self {
        self.token = token;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn headers(&self) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = &self.token {
            let mut value = HeaderValue::from_str(&bearer_value(token))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    async fn request<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%method, %url, authenticated = self.token.is_some(), "api request");

        let request = self.http.request(method, &url).headers(self.headers()?);
        let request = match body {
            Some(body) => request.json(body),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            tracing::warn!(status = status.as_u16(), %url, "api request failed");
            return Err(ApiError::Status { status: status.as_u16(), body });
        }
        response.json::<T>().await.map_err(|e| {
            if e.is_decode() {
                ApiError::Decode(e)
            } else {
                ApiError::Http(e)
            }
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request::<T, ()>(Method::GET, path, None).await
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure, non-2xx status, or bad payload.
    pub async fn posts(&self) -> Result<Vec<Post>, ApiError> {
        self.get(&posts_endpoint(None)).await
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure, non-2xx status, or bad payload.
    pub async fn posts_by_user(&self, user_id: u64) -> Result<Vec<Post>, ApiError> {
        self.get(&posts_endpoint(Some(user_id))).await
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure, non-2xx status, or bad payload.
    pub async fn post(&self, id: u64) -> Result<Post, ApiError> {
        self.get(&post_endpoint(id)).await
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure, non-2xx status, or bad payload.
    pub async fn post_comments(&self, post_id: u64) -> Result<Vec<Comment>, ApiError> {
        self.get(&post_comments_endpoint(post_id)).await
    }

    /// Create a post; the backend assigns its id.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure, non-2xx status, or bad payload.
    pub async fn create_post(&self, post: &NewPost) -> Result<Post, ApiError> {
        self.request(Method::POST, &posts_endpoint(None), Some(post)).await
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure, non-2xx status, or bad payload.
    pub async fn albums(&self) -> Result<Vec<Album>, ApiError> {
        self.get(&albums_endpoint(None)).await
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure, non-2xx status, or bad payload.
    pub async fn albums_by_user(&self, user_id: u64) -> Result<Vec<Album>, ApiError> {
        self.get(&albums_endpoint(Some(user_id))).await
    }

    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure, non-2xx status, or bad payload.
    pub async fn album(&self, id: u64) -> Result<Album, ApiError> {
        self.get(&album_endpoint(id)).await
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
