// Log sink setup. Components only emit `tracing` events; this installs the
// subscriber that writes them to stderr.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log level (`DEBUG`, `INFO`, ...).
pub const LEVEL_ENV: &str = "DEBUGLEVEL";

const DEFAULT_LEVEL: &str = "warn";

/// Filter for the given flags: `--debug` wins, then `DEBUGLEVEL`, then
/// warnings only.
pub fn filter(debug: bool) -> EnvFilter {
    if debug {
        return EnvFilter::new("debug");
    }
    EnvFilter::try_from_env(LEVEL_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
}

/// Install the global subscriber. In debug mode lines carry timestamps and
/// targets so they can be correlated with server logs.
pub fn init(debug: bool) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter(debug))
        .with_writer(std::io::stderr);
    let result = if debug {
        builder.with_target(true).try_init()
    } else {
        builder.with_target(false).without_time().try_init()
    };
    result.map_err(|e| anyhow!("failed to install log subscriber: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_flag_forces_debug_level() {
        assert_eq!(filter(true).to_string(), "debug");
    }
}
