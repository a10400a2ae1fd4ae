use anyhow::{anyhow, Context};
use tracing_subscriber::EnvFilter;
use vitrine_core::config::{LogFormat, LoggingConfig};

/// Installs the global subscriber. Events go to stderr so command JSON on stdout
/// stays machine-readable.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(&config.level)
        .with_context(|| format!("invalid logging.level `{}`", config.level))?;
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = match config.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|error| anyhow!("failed to install tracing subscriber: {error}"))
}

#[cfg(test)]
mod tests {
    use vitrine_core::config::{LogFormat, LoggingConfig};

    use super::init_logging;

    #[test]
    fn rejects_unparseable_level_before_installing() {
        let config = LoggingConfig { level: "loud=[".to_string(), format: LogFormat::Json };
        let error = init_logging(&config).expect_err("bad filter");
        assert!(error.to_string().contains("logging.level"));
    }
}
