//! HTTP client adapter for the rental backend

use reqwest::{header, Client, Method};
use serde_json::Value;
use tracing::{debug, warn};

use crate::api::envelope::{unwrap_envelope, Unwrapped};
use crate::api::errors::ApiError;
use crate::config::Config;
use crate::session::Session;

pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Body of a mutating request
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    /// Text fields sent as `multipart/form-data`
    Multipart(Vec<(String, String)>),
}

impl RequestBody {
    pub fn field(&self, name: &str) -> Option<String> {
        match self {
            RequestBody::Json(Value::Object(map)) => map.get(name).map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
            RequestBody::Multipart(fields) => fields
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.clone()),
            _ => None,
        }
    }
}

/// How a resource expects create/update bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyEncoding {
    Json,
    Multipart,
}

impl BodyEncoding {
    /// Encode a flat field list. Multipart drops nulls and sends everything
    /// else as text; JSON keeps the value types.
    pub fn encode(self, fields: Vec<(String, Value)>) -> RequestBody {
        match self {
            BodyEncoding::Json => RequestBody::Json(Value::Object(fields.into_iter().collect())),
            BodyEncoding::Multipart => RequestBody::Multipart(
                fields
                    .into_iter()
                    .filter_map(|(name, value)| match value {
                        Value::Null => None,
                        Value::String(s) => Some((name, s)),
                        other => Some((name, other.to_string())),
                    })
                    .collect(),
            ),
        }
    }
}

/// Authenticated client; every request carries the injected session
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: Session,
}

impl ApiClient {
    pub fn new(config: &Config, session: Session) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(&config.http.user_agent)
            .timeout(config.http_timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    /// Client with default HTTP settings against `base_url`
    pub fn with_base_url(base_url: &str, session: Session) -> Result<Self, ApiError> {
        let config = Config {
            api_url: base_url.to_string(),
            ..Config::default()
        };
        Self::new(&config, session)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Unwrapped, ApiError> {
        self.send(Method::GET, path, query, RequestBody::Empty).await
    }

    pub async fn post(&self, path: &str, body: RequestBody) -> Result<Unwrapped, ApiError> {
        self.send(Method::POST, path, &[], body).await
    }

    pub async fn patch(&self, path: &str, body: RequestBody) -> Result<Unwrapped, ApiError> {
        self.send(Method::PATCH, path, &[], body).await
    }

    pub async fn delete(&self, path: &str) -> Result<Unwrapped, ApiError> {
        self.send(Method::DELETE, path, &[], RequestBody::Empty).await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: RequestBody,
    ) -> Result<Unwrapped, ApiError> {
        let Some(token) = self.session.access_token() else {
            warn!("Refusing {} {} without an access token", method, path);
            return Err(ApiError::Unauthenticated);
        };

        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);

        let mutating = method != Method::GET;
        let mut request = self
            .http
            .request(method, &url)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::ACCEPT, "application/json");

        if !query.is_empty() {
            request = request.query(query);
        }

        if mutating {
            if let Some(csrf) = self.session.csrf_token() {
                request = request.header(CSRF_HEADER, csrf);
            }
        }

        request = match body {
            RequestBody::Empty => request,
            RequestBody::Json(value) => request.json(&value),
            RequestBody::Multipart(fields) => {
                let form = fields
                    .into_iter()
                    .fold(reqwest::multipart::Form::new(), |form, (name, value)| {
                        form.text(name, value)
                    });
                request.multipart(form)
            }
        };

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            debug!("{} answered {}: {}", path, status, text);
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).map_err(|source| ApiError::Decode {
                path: path.to_string(),
                source,
            })?
        };

        unwrap_envelope(status.as_u16(), body)
    }
}
