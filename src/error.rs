use thiserror::Error;

/// A dataset could not be fetched or decoded. Every variant is fatal to the
/// load path that raised it; nothing is retried.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    #[error("failed to read {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {location}: {source}")]
    Json {
        location: String,
        #[source]
        source: simd_json::Error,
    },

    #[error("topology has no object named `{0}`")]
    MissingObject(String),

    #[error("invalid topology: {0}")]
    Topology(String),
}
