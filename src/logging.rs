//=========================================================================
// Logging
//=========================================================================
//
// One-time `env_logger` setup for the `log` facade.
//
// Targets used by the crate:
//   render    render-thread work (queue drain, resources, maps)
//   script    window traffic from script threads
//   input     input dispatch
//   platform  winit window and event loop
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::Once;

//=== LoggingConfig =======================================================

/// Logger configuration.
///
/// `env_filter` follows `env_logger` filter syntax, e.g.
/// `"info,stagehand::core=debug"`.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

impl LoggingConfig {
    /// Config using `filter`, if given.
    pub fn with_filter(filter: Option<String>) -> Self {
        Self {
            env_filter: filter,
            ..Self::default()
        }
    }
}

static INIT: Once = Once::new();

/// Installs the global logger. Later calls are ignored.
///
/// Filter precedence: `config.env_filter`, then `RUST_LOG`, then `info`.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        if let Some(filter) = config.env_filter {
            builder.parse_filters(&filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder.filter_level(log::LevelFilter::Info);
        }

        builder.write_style(config.write_style);

        // Another logger may already be installed (tests, host apps).
        if builder.try_init().is_ok() {
            log::debug!("logging initialized");
        }
    });
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init_logging(LoggingConfig::with_filter(Some("warn".into())));
        init_logging(LoggingConfig::default());
        log::warn!("still logging after a second init");
    }
}
