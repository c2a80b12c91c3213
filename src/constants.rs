//! Global Constants
//!
//! Centralized defaults and wire strings. Layer error messages are part of
//! the observable contract and are kept verbatim.

/// HTTP/Network constants for url layers
pub mod network {
    /// Default per-attempt request timeout (seconds)
    pub const DEFAULT_TIMEOUT_REQUEST_SECS: f64 = 20.0;

    /// Default total budget for one url layer (seconds)
    pub const DEFAULT_TIMEOUT_SECS: f64 = 180.0;

    /// Default delay between two attempts (seconds)
    pub const DEFAULT_RETRY_DELAY_SECS: f64 = 10.0;
}

/// Lifecycle event names
pub mod events {
    pub const LAYER_LOAD_START: &str = "layer_load_start";
    pub const LAYER_LOAD_STOP: &str = "layer_load_stop";
    pub const LAYER_LOAD_ERROR: &str = "layer_load_error";
    pub const LAYER_URL_ATTEMPT_ERROR: &str = "layer_url_attempt_error";

    /// Capacity of the broadcast channel carrying loader events
    pub const CHANNEL_CAPACITY: usize = 1024;
}

/// Layer error messages
pub mod messages {
    pub const TYPE_INCORRECT: &str = "'type' incorrect";
    pub const CONFIG_NOT_OBJECT: &str = "'config' n'est pas un object";
    pub const MAPPING_NOT_OBJECT: &str = "'mapping' n'est pas un object";
    pub const FILE_INVALID: &str = "'file' n'est pas valide";
    pub const ID_INVALID: &str = "'id' n'est pas valide";
    pub const URL_INVALID: &str = "'url' n'est pas valide";
    pub const RESPONSE_NOT_OBJECT: &str = "la réponse n'est pas un object";
    pub const DOCUMENT_NOT_OBJECT: &str = "le document n'est pas un object";
}

/// Settings file locations for the CLI
pub mod settings {
    /// Environment variable prefix (`CONFSTACK_HTTP_TIMEOUT_IN_S`)
    pub const ENV_PREFIX: &str = "CONFSTACK_";

    /// Project-level settings file
    pub const PROJECT_FILE: &str = "confstack.toml";

    /// User-level settings file name inside the config directory
    pub const USER_FILE: &str = "settings.toml";
}
