/// Name of the environment variable containing the path to the search configuration file.
/// If not set, defaults to
///  (1) on Linux and macOS: `$XDG_CONFIG_HOME/cyclic/search.toml` or `$HOME/.config/cyclic/search.toml`
///  (2) on Windows: `%APPDATA%\cyclic\search.toml`
pub const ENV_SEARCH_CONFIG_PATH: &str = "CY_SEARCH_CONFIG";

/// Directory (below the platform configuration directory) holding the configuration files.
pub const CONFIG_DIR_NAME: &str = "cyclic";

/// File name of the search configuration.
pub const SEARCH_CONFIG_FILE_NAME: &str = "search.toml";

/// Default bound on the length of a branch explored by proof search.
pub const DEFAULT_MAX_DEPTH: usize = 24;

/// Default wall-clock budget of a proof search, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Number of node identifiers a builder reserves from the shared arena at once.
pub const NODE_ID_CHUNK: u32 = 1 << 12;

/// Upper bound on the witness tuples tried for a single quantifier instantiation.
pub const MAX_WITNESS_TUPLES: usize = 64;
