//! HTTP client for the clinic API.
//!
//! Injects the stored bearer token, unwraps `{success, data}` envelopes
//! and turns every failure (transport, status, decoding) into an
//! [`ApiError`]. A 401 on an authenticated call evicts the stored token.

use std::time::Duration;

use reqwest::{Client, Method, StatusCode, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::client::session::Session;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Status {
        status: u16,
        message: String,
        details: Option<Value>,
    },

    /// No response: connection refused, timeout, DNS...
    #[error("{0}")]
    Transport(String),

    /// A 2xx response whose body did not match the expected shape.
    #[error("resposta inválida do servidor: {0}")]
    Decode(String),

    #[error("URL da API inválida: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn details(&self) -> Option<&Value> {
        match self {
            Self::Status { details, .. } => details.as_ref(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED.as_u16())
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Session,
}

impl ApiClient {
    pub fn new(base_url: &str, session: Session) -> ApiResult<Self> {
        let parsed = Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::InvalidUrl(format!("{base_url}: unsupported scheme")));
        }

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str, use_auth: bool) -> ApiResult<T> {
        self.request(Method::GET, endpoint, None, use_auth).await
    }

    pub async fn post<T, B>(&self, endpoint: &str, body: &B, use_auth: bool) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = encode(body)?;
        self.request(Method::POST, endpoint, Some(body), use_auth).await
    }

    pub async fn put<T, B>(&self, endpoint: &str, body: &B, use_auth: bool) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = encode(body)?;
        self.request(Method::PUT, endpoint, Some(body), use_auth).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str, use_auth: bool) -> ApiResult<T> {
        self.request(Method::DELETE, endpoint, None, use_auth).await
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
        use_auth: bool,
    ) -> ApiResult<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut request = self
            .client
            .request(method.clone(), &url)
            .header(header::CONTENT_TYPE, "application/json");

        if use_auth {
            if let Some(token) = self.session.token() {
                request = request.bearer_auth(token);
            }
        }
        if let Some(body) = body {
            request = request.body(body.to_string());
        }

        tracing::debug!("{} {}", method, url);
        let response = request.send().await.map_err(|e| {
            tracing::warn!("{} {} failed: {}", method, url, e);
            ApiError::from(e)
        })?;

        let status = response.status();
        let text = response.text().await?;

        if status == StatusCode::UNAUTHORIZED && use_auth {
            self.session.evict();
        }

        if !status.is_success() {
            let error = status_error(status, &text);
            tracing::debug!("{} {} -> {}: {}", method, url, status, error);
            return Err(error);
        }

        decode_success(&text)
    }
}

fn encode<B: Serialize + ?Sized>(body: &B) -> ApiResult<Value> {
    serde_json::to_value(body).map_err(|e| ApiError::Decode(format!("corpo da requisição: {e}")))
}

/// `{error, details}` from the body when present, else the status reason.
fn status_error(status: StatusCode, text: &str) -> ApiError {
    let body: Option<Value> = serde_json::from_str(text).ok();
    let message = body
        .as_ref()
        .and_then(|b| b.get("error").or_else(|| b.get("message")))
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| (!text.trim().is_empty()).then(|| text.trim().to_string()))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Erro na requisição")
                .to_string()
        });
    let details = body.and_then(|mut b| b.get_mut("details").map(Value::take));

    ApiError::Status {
        status: status.as_u16(),
        message,
        details,
    }
}

/// Unwrap `{success: true, data}`; anything else is taken as the data itself.
fn decode_success<T: DeserializeOwned>(text: &str) -> ApiResult<T> {
    let value: Value = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(text).map_err(|e| ApiError::Decode(e.to_string()))?
    };

    let data = match value {
        Value::Object(mut map)
            if map.get("success") == Some(&Value::Bool(true)) && map.contains_key("data") =>
        {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    };

    serde_json::from_value(data).map_err(|e| ApiError::Decode(e.to_string()))
}
