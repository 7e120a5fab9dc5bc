use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt};

/// Crates that are too chatty at `info` unless asked for explicitly.
const QUIET_TARGETS: &[&str] = &["sqlx=warn", "tower_http=info"];

/// Installs the global subscriber. `RUST_LOG`, when set, replaces the
/// configured level entirely.
pub fn init_logging(level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(filter_directives(level))
            .map_err(|e| anyhow!("invalid log level '{level}': {e}"))?,
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .compact()
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(())
}

fn filter_directives(level: &str) -> String {
    let mut directives = vec![level.trim().to_string()];
    for quiet in QUIET_TARGETS {
        let target = quiet.split('=').next().unwrap_or_default();
        if !level.contains(target) {
            directives.push((*quiet).to_string());
        }
    }
    directives.join(",")
}
