//! Error types for testtiming-luci.

use thiserror::Error;

/// All errors that can arise talking to the remote services.
#[derive(Debug, Error)]
pub enum LuciError {
    /// Connection, DNS or TLS failure before any HTTP status was received.
    #[error("transport error calling {method}: {message}")]
    Transport { method: String, message: String },

    /// The service answered with a non-success HTTP status.
    #[error("{method} returned HTTP {code}: {body}")]
    Status {
        method: String,
        code: u16,
        body: String,
    },

    /// Reading the response body failed.
    #[error("I/O error reading {method} response: {source}")]
    Io {
        method: String,
        #[source]
        source: std::io::Error,
    },

    /// Request encoding or response decoding failed.
    #[error("JSON error in {method}: {source}")]
    Json {
        method: String,
        #[source]
        source: serde_json::Error,
    },

    /// A commit time the source log returned could not be parsed.
    #[error("unparseable commit time '{0}'")]
    CommitTime(String),

    /// The shared cancellation scope fired before the next page was requested.
    #[error("cancelled")]
    Cancelled,
}

pub(crate) fn transport_err(method: &str, err: ureq::Error) -> LuciError {
    match err {
        ureq::Error::Status(code, response) => LuciError::Status {
            method: method.to_string(),
            code,
            body: response.into_string().unwrap_or_default(),
        },
        ureq::Error::Transport(transport) => LuciError::Transport {
            method: method.to_string(),
            message: transport.to_string(),
        },
    }
}

pub(crate) fn json_err(method: &str, source: serde_json::Error) -> LuciError {
    LuciError::Json {
        method: method.to_string(),
        source,
    }
}
