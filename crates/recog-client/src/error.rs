use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    /// The server answered with `success: false`.
    #[error("{0}")]
    Application(String),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(e)
        }
    }
}

impl ClientError {
    /// No usable response was received.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Timeout | Self::Network(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Short text suitable for a toast.
    pub fn user_message(&self) -> String {
        match self {
            Self::Timeout => "The server took too long to respond".to_string(),
            Self::Network(_) => "Could not reach the server".to_string(),
            Self::Server { status, .. } => format!("Server error ({status})"),
            Self::Application(message) => message.clone(),
            Self::Json(_) => "Unexpected response from the server".to_string(),
        }
    }
}
