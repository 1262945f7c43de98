//! Application-wide constants.
//!
//! All magic numbers and strings are defined here to ensure consistency
//! and make changes easy to track.

/// Application name used for config directories and user-facing messages.
pub const APP_NAME: &str = "plantid";

/// File name of the configuration file inside the platform config dir.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Default number of top predictions to return per image.
pub const DEFAULT_TOP_K: usize = 5;

/// Default listening port when neither `PORT` nor the config file set one.
pub const DEFAULT_PORT: u16 = 8000;

/// Default bind address.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default maximum request body size (32 MiB).
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 32 * 1024 * 1024;

/// Default number of images sent to the model in one forward pass.
pub const DEFAULT_BATCH_SIZE: usize = 8;

/// Maximum allowed batch size.
///
/// Requests may carry more images than this; they are split into several
/// forward passes.
pub const MAX_BATCH_SIZE: usize = 256;

/// Default number of intra-op threads for the ONNX session (0 = runtime default).
pub const DEFAULT_INTRA_THREADS: usize = 0;

/// Default model file location, relative to the working directory.
pub const DEFAULT_MODEL_PATH: &str = "model/plant_classifier.onnx";

/// Default label file location, relative to the working directory.
pub const DEFAULT_LABELS_PATH: &str = "model/class_idx_to_species.json";

/// Model input shape used when no manifest declares one.
pub mod input_shape {
    /// Input height in pixels.
    pub const HEIGHT: usize = 256;
    /// Input width in pixels.
    pub const WIDTH: usize = 256;
    /// Number of colour channels (RGB).
    pub const CHANNELS: usize = 3;
}

/// Pixel normalization contract.
///
/// The bundled classifier was trained on RGB inputs scaled to `[-1, 1]`
/// (`x / 127.5 - 1`). Changing these values silently degrades accuracy.
pub mod normalization {
    /// Divisor applied to raw `u8` channel values.
    pub const SCALE: f32 = 127.5;
    /// Offset subtracted after scaling.
    pub const OFFSET: f32 = 1.0;
}

/// Multipart field names treated as image uploads even without a filename.
pub const IMAGE_FIELD_NAMES: &[&str] = &["image", "images", "file", "files"];

/// Multipart/query parameter name for the number of predictions.
pub const TOP_K_PARAM: &str = "top_k";

/// Stored layer parameters that older exporters write but the runtime ignores.
///
/// Pairs of `(layer class name, parameter name)`. Stripped from the model
/// manifest before strict parsing.
pub const IGNORED_LAYER_PARAMS: &[(&str, &str)] = &[("DepthwiseConv2D", "groups")];

/// Layer parameters the runtime cannot honour when present on any other layer.
pub const UNSUPPORTED_LAYER_PARAMS: &[&str] = &["groups"];
