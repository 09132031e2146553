/// Failures of a single proxy call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyError {
    /// The upstream answered with a non-success status.
    Upstream { status: u16, detail: String },
    /// The upstream could not be reached or its body could not be read/parsed.
    Transport(String),
}

impl ProxyError {
    /// HTTP status the proxy answers with for this error.
    pub fn status(&self) -> u16 {
        match self {
            Self::Upstream { status, .. } => *status,
            Self::Transport(_) => 500,
        }
    }

    /// Caller-facing JSON envelope: `{error, detail?}`.
    pub fn envelope(&self) -> serde_json::Value {
        match self {
            Self::Upstream { detail, .. } => serde_json::json!({
                "error": "Upstream error",
                "detail": detail,
            }),
            Self::Transport(message) => serde_json::json!({ "error": message }),
        }
    }
}

impl std::fmt::Display for ProxyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Upstream { status, .. } => write!(f, "upstream responded with status {status}"),
            Self::Transport(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for ProxyError {}
