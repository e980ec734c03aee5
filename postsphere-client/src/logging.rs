use log::LevelFilter;
use once_cell::sync::OnceCell;
use simplelog::*;
use std::fs::File;
use std::path::PathBuf;

/// Logging configuration for the PostSphere client
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Master switch to enable/disable all logging
    pub enabled: bool,
    /// Path to the log file
    pub log_file: PathBuf,
    /// Whether to clear the log file on startup
    pub clear_on_startup: bool,
    /// Feature flags for specific logging categories
    pub features: LogFeatures,
    /// Overall log level
    pub level: LevelFilter,
}

/// Feature flags for specific logging categories
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogFeatures {
    /// HTTP requests and their outcome
    pub api_calls: bool,
    /// Login, logout and session restore
    pub session: bool,
    /// Feed recomputation
    pub feed: bool,
    /// User actions on a post (likes, comments, deletes, submissions)
    pub actions: bool,
}

static ACTIVE_FEATURES: OnceCell<LogFeatures> = OnceCell::new();

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_file: PathBuf::from("postsphere_debug.log"),
            clear_on_startup: true,
            features: LogFeatures::default(),
            level: LevelFilter::Info,
        }
    }
}

impl Default for LogFeatures {
    fn default() -> Self {
        Self {
            api_calls: true,
            session: true,
            feed: true,
            actions: true,
        }
    }
}

impl LogFeatures {
    pub fn none() -> Self {
        Self {
            api_calls: false,
            session: false,
            feed: false,
            actions: false,
        }
    }
}

impl LogConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            features: LogFeatures::none(),
            ..Default::default()
        }
    }

    /// Only errors and warnings
    pub fn minimal() -> Self {
        Self {
            enabled: true,
            level: LevelFilter::Warn,
            features: LogFeatures::none(),
            ..Default::default()
        }
    }

    /// Everything, down to trace
    pub fn verbose() -> Self {
        Self {
            enabled: true,
            level: LevelFilter::Trace,
            features: LogFeatures::default(),
            ..Default::default()
        }
    }
}

/// Feature flags the category macros consult. All categories are on until
/// [`init_logging`] installs a configuration.
pub fn features() -> LogFeatures {
    ACTIVE_FEATURES.get().copied().unwrap_or_default()
}

/// Initialize the logging system with the given configuration
pub fn init_logging(config: &LogConfig) -> anyhow::Result<()> {
    let _ = ACTIVE_FEATURES.set(config.features);

    if !config.enabled {
        let _ = WriteLogger::init(LevelFilter::Off, Config::default(), std::io::sink());
        return Ok(());
    }

    if config.clear_on_startup {
        let _ = File::create(&config.log_file)?;
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)?;

    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_time_offset_to_local()
        .unwrap_or_else(|builder| builder)
        .build();

    WriteLogger::init(config.level, log_config, log_file)?;

    log::info!("Logging initialized: file={}, level={:?}", config.log_file.display(), config.level);
    log::debug!("Log features: {:?}", config.features);

    Ok(())
}

/// Macro for logging HTTP calls
#[macro_export]
macro_rules! log_api_call {
    ($($arg:tt)*) => {
        if $crate::logging::features().api_calls {
            ::log::debug!(target: "api_calls", $($arg)*);
        }
    };
}

/// Macro for logging session changes
#[macro_export]
macro_rules! log_session {
    ($($arg:tt)*) => {
        if $crate::logging::features().session {
            ::log::info!(target: "session", $($arg)*);
        }
    };
}

/// Macro for logging feed recomputation
#[macro_export]
macro_rules! log_feed {
    ($($arg:tt)*) => {
        if $crate::logging::features().feed {
            ::log::debug!(target: "feed", $($arg)*);
        }
    };
}

/// Macro for logging user actions on posts
#[macro_export]
macro_rules! log_action {
    ($($arg:tt)*) => {
        if $crate::logging::features().actions {
            ::log::info!(target: "actions", $($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert!(!LogConfig::disabled().enabled);
        assert_eq!(LogConfig::minimal().level, LevelFilter::Warn);
        assert_eq!(LogConfig::minimal().features, LogFeatures::none());
        assert_eq!(LogConfig::verbose().level, LevelFilter::Trace);
        assert!(LogConfig::verbose().features.api_calls);
    }

    #[test]
    fn test_features_default_to_enabled() {
        // Nothing in the unit test binary installs a config
        if ACTIVE_FEATURES.get().is_none() {
            assert_eq!(features(), LogFeatures::default());
        }
    }
}
