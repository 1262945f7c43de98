//! Error types for plantid.

/// Result type alias for plantid operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for plantid.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration directory could not be determined.
    #[error("could not determine configuration directory for this platform")]
    ConfigDirNotFound,

    /// Failed to read configuration file.
    #[error("failed to read config file '{path}'")]
    ConfigRead {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}'")]
    ConfigParse {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// Failed to write configuration file.
    #[error("failed to write config file '{path}'")]
    ConfigWrite {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize configuration.
    #[error("failed to serialize config")]
    ConfigSerialize {
        /// Underlying serialization error.
        #[source]
        source: toml::ser::Error,
    },

    /// Failed to read the label file.
    #[error("failed to read labels file '{path}'")]
    LabelsRead {
        /// Path to the labels file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Label source is not a valid mapping.
    #[error("failed to parse labels: {reason}")]
    LabelsParse {
        /// Description of the parse failure.
        reason: String,
    },

    /// Label source contains no classes.
    #[error("label map is empty")]
    LabelsEmpty,

    /// Failed to write the derived dense label file.
    #[error("failed to write labels file '{path}'")]
    LabelsWrite {
        /// Path to the output file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Model file does not exist.
    #[error("model file does not exist: {path}")]
    ModelFileNotFound {
        /// Path to the missing model file.
        path: std::path::PathBuf,
    },

    /// Failed to read the model manifest.
    #[error("failed to read model manifest '{path}'")]
    ManifestRead {
        /// Path to the manifest.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Model manifest is malformed or declares unsupported features.
    #[error("invalid model manifest: {reason}")]
    ManifestParse {
        /// Description of the failure.
        reason: String,
    },

    /// Failed to initialize ONNX runtime.
    #[error("failed to initialize ONNX runtime: {reason}")]
    RuntimeInitialization {
        /// Description of the initialization failure.
        reason: String,
    },

    /// Failed to load the model.
    #[error("failed to load model: {reason}")]
    ModelLoad {
        /// Description of the load failure.
        reason: String,
    },

    /// Inference engine did not finish startup.
    #[error("model is not loaded: {reason}")]
    NotReady {
        /// Why the engine is unavailable.
        reason: String,
    },

    /// Uploaded bytes are not a decodable image.
    #[error("cannot decode image: {reason}")]
    Decode {
        /// Description of the decode failure.
        reason: String,
    },

    /// Tensor or score vector does not match the expected dimensions.
    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Expected dimensions.
        expected: String,
        /// Actual dimensions.
        actual: String,
    },

    /// Inference failed.
    #[error("inference failed: {reason}")]
    Inference {
        /// Description of the inference failure.
        reason: String,
    },

    /// Request rejected before processing.
    #[error("{message}")]
    Validation {
        /// Description of the invalid input.
        message: String,
    },

    /// Failed to bind the listening socket.
    #[error("failed to bind {addr}")]
    Bind {
        /// Address that could not be bound.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Internal error (for unexpected failures).
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl Error {
    /// Whether the error belongs to a single batch item rather than the request.
    pub fn is_item_error(&self) -> bool {
        matches!(
            self,
            Self::Decode { .. } | Self::ShapeMismatch { .. } | Self::Inference { .. }
        )
    }
}
