pub use log::{debug, error, info, trace, warn};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A network operation was required but `network=false` in config.
    #[error("network access is disabled (network=false)")]
    Offline,
    /// A fetch failed after exhausting the retry budget.
    #[error("failed to download after exhausting retries")]
    FailedToDownload,
    /// Lower-level transport failure (DNS, connect, TLS, ...).
    #[error("transport error: {0}")]
    Transport(String),
    /// The operation's cancellation token was set mid-flight.
    #[error("operation was cancelled")]
    Cancelled,
    /// The response `Content-Type` did not match what was expected.
    #[error("content-type mismatch: expected {expected}, got {actual}")]
    ContentTypeMismatch { expected: String, actual: String },
    /// The downloaded payload size did not match what was expected.
    #[error("size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: u64, actual: u64 },
    /// The downloaded payload's checksum did not match what was expected.
    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },
    /// A store-layer operation was attempted against a disabled store.
    #[error("store `{0}` is not enabled")]
    NotEnabled(String),
    /// A fan-out operation had no stores to operate on.
    #[error("store array is empty")]
    ArrayIsEmpty,
    /// A lookup found nothing.
    #[error("failed to find `{0}`")]
    FailedToFind(String),
    /// A lookup that expected a single result found more than one.
    #[error("multiple matches found for `{0}`")]
    MultipleMatches(String),
    /// The requested operation is not implemented by this store/kind.
    #[error("operation not supported: {0}")]
    NoSupport(String),
    /// A parse or verification failure the caller should retry after
    /// invalidating the cache.
    #[error("recoverable error, retry after cache eviction: {0}")]
    Recoverable(String),
    /// Structurally invalid input (malformed XML/SQL/INI).
    #[error("malformed data: {0}")]
    Malformed(String),
    /// Required data was simply absent.
    #[error("no data: {0}")]
    NoData(String),
    /// Another process already holds this lock.
    #[error("already locked by {0}")]
    AlreadyLocked(String),
    /// `release` was called without a matching `take`.
    #[error("lock not held")]
    NotLocked,
    /// The process lacks permission to take/release a lock or write a file.
    #[error("permission denied: {0}")]
    Permission(String),
    /// A config key was requested but no tier supplied it.
    #[error("missing config key `{0}`")]
    MissingConfigKey(String),
    /// `set_string` found a conflicting value already installed at the
    /// runtime-override tier.
    #[error("config key `{0}` is already set to a different value")]
    AlreadySet(String),
    /// The main config file's `config_schema_version` was missing or
    /// not equal to 1.
    #[error("unsupported config schema version")]
    UnsupportedSchemaVersion,

    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    #[error(transparent)]
    Xml(#[from] serde_xml_rs::Error),
    #[error(transparent)]
    Sql(#[from] rusqlite::Error),
    #[error(transparent)]
    Rpm(#[from] rpm::Error),
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, Error>;
