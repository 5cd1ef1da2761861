/// The path segments (relative to the configured api base) under which job resources live.
pub const JOB_RESOURCE_SEGMENTS: [&str; 2] = ["api", "jobs"];

/// The query parameter used to encode a lifecycle command.
pub const ACTION_QUERY_PARAM: &str = "action";

/// The agent identity sent along with every command issued from this view.
pub const DEFAULT_AGENT_SYSTEM_NAME: &str = "gui";

/// Version + hostname are not meaningful for a view; the backend only requires them to be present.
pub const DEFAULT_AGENT_SYSTEM_VERSION: &str = "?";
pub const DEFAULT_AGENT_HOSTNAME: &str = "?";

/// Used by the binaries when no configuration file is available.
pub const API_URL_ENV: &str = "TOSHTOGO_API_URL";
