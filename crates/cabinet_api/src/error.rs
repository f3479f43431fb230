use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthorized: {}", .detail.as_deref().unwrap_or("no detail"))]
    Unauthorized { detail: Option<String> },
    #[error("bad request: {}", .detail.as_deref().unwrap_or("no detail"))]
    BadRequest { detail: Option<String> },
    #[error("server error {status}: {}", .detail.as_deref().unwrap_or("no detail"))]
    Server {
        status: u16,
        detail: Option<String>,
    },
    #[error("request rejected with {status}: {}", .detail.as_deref().unwrap_or("no detail"))]
    Status {
        status: u16,
        detail: Option<String>,
    },
    #[error("server unreachable: {0}")]
    Unreachable(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let detail = detail_from_body(body);
        match status.as_u16() {
            401 => Self::Unauthorized { detail },
            400 => Self::BadRequest { detail },
            code if code >= 500 => Self::Server {
                status: code,
                detail,
            },
            code => Self::Status {
                status: code,
                detail,
            },
        }
    }

    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable(_))
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Unauthorized { detail }
            | Self::BadRequest { detail }
            | Self::Server { detail, .. }
            | Self::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Self::Unreachable(err.to_string())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

// FastAPI puts the reason under `detail`, either as a string or as a list
// of validation entries carrying `msg`.
fn detail_from_body(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::String(detail) => Some(detail.clone()),
        Value::Array(entries) => {
            let messages: Vec<&str> = entries
                .iter()
                .filter_map(|entry| entry.get("msg").and_then(Value::as_str))
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        _ => None,
    }
}
