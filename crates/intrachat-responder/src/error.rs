use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResponderError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("responder returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("responder returned a body that is not JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid responder configuration: {0}")]
    Config(String),
}
