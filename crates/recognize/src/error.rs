/// Categorized recognition failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionError {
    /// Endpoint rejected the credential (401/403)
    InvalidCredential(String),
    /// Endpoint asked us to slow down (429)
    RateLimited(String),
    /// Transport failure before a response arrived
    Network(String),
    /// Response arrived but could not be read as a document
    Malformed(String),
    /// The call exceeded its per-call timeout
    Timeout(String),
    /// Any other non-success status
    Upstream { status: u16, message: String },
}

impl RecognitionError {
    /// Whether another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited(_) | Self::Network(_) | Self::Timeout(_) => true,
            Self::Upstream { status, .. } => *status >= 500,
            Self::InvalidCredential(_) | Self::Malformed(_) => false,
        }
    }

    /// Short category label for logs and per-file error reports.
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidCredential(_) => "invalid_credential",
            Self::RateLimited(_) => "rate_limited",
            Self::Network(_) => "network",
            Self::Malformed(_) => "malformed_response",
            Self::Timeout(_) => "timeout",
            Self::Upstream { .. } => "upstream",
        }
    }
}

impl std::fmt::Display for RecognitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCredential(msg) => write!(f, "invalid credential: {}", msg),
            Self::RateLimited(msg) => write!(f, "rate limited: {}", msg),
            Self::Network(msg) => write!(f, "network error: {}", msg),
            Self::Malformed(msg) => write!(f, "malformed response: {}", msg),
            Self::Timeout(msg) => write!(f, "timed out: {}", msg),
            Self::Upstream { status, message } => write!(f, "HTTP {}: {}", status, message),
        }
    }
}

impl std::error::Error for RecognitionError {}
