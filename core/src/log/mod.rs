//! Logger initialization on top of `log4rs`.
//!
//! Log records always go to stdout. When a log directory is supplied, a size-rolled
//! log file receives everything and a second rolled file receives warnings and errors.

use consts::{CONSOLE_APPENDER, DEFAULT_LOGGER_ENV, ERR_LOG_FILE_APPENDER, ERR_LOG_FILE_NAME, LOG_FILE_APPENDER, LOG_FILE_NAME};
use log::LevelFilter;
use log4rs::config::{Config, Root};
use thiserror::Error;

mod appender;
pub mod consts;
mod logger;

use appender::AppenderSpec;
use logger::Builder;

#[derive(Clone, Debug, Error)]
pub enum LogError {
    #[error("logger spec parsing error: {0}")]
    ParseLoggerSpecError(String),

    #[error("log directory {0} is not valid utf-8")]
    InvalidLogDir(String),

    #[error("failed building log appender: {0}")]
    Appender(String),

    #[error("failed installing the logger: {0}")]
    Init(String),
}

/// Installs the global logger. `filters` follows the `RUST_LOG` syntax and is applied
/// on top of whatever the `RUST_LOG` environment variable already defines.
pub fn init_logger(log_dir: Option<&str>, filters: &str) -> Result<(), LogError> {
    let stdout_appender = AppenderSpec::console(CONSOLE_APPENDER, None);
    let file_appender = log_dir.map(|dir| AppenderSpec::roller(LOG_FILE_APPENDER, None, dir, LOG_FILE_NAME)).transpose()?;
    let err_file_appender =
        log_dir.map(|dir| AppenderSpec::roller(ERR_LOG_FILE_APPENDER, Some(LevelFilter::Warn), dir, ERR_LOG_FILE_NAME)).transpose()?;

    let appenders: Vec<&'static str> = [Some(CONSOLE_APPENDER), file_appender.as_ref().map(|x| x.name), err_file_appender.as_ref().map(|x| x.name)]
        .into_iter()
        .flatten()
        .collect();

    let loggers = Builder::new().parse_env(DEFAULT_LOGGER_ENV).parse_expression(filters).build();

    let mut config = Config::builder().appender(stdout_appender.appender());
    for spec in [file_appender, err_file_appender].into_iter().flatten() {
        config = config.appender(spec.appender());
    }
    let config = config
        .loggers(loggers.items())
        .build(Root::builder().appenders(appenders.iter().map(|x| x.to_string())).build(loggers.root_level()))
        .map_err(|err| LogError::Init(err.to_string()))?;

    log4rs::init_config(config).map_err(|err| LogError::Init(err.to_string()))?;
    Ok(())
}

/// Tries to install a console-only logger, ignoring the failure when a logger is already set.
/// Meant for tests, which may each attempt the initialization.
pub fn try_init_logger(filters: &str) {
    let _ = init_logger(None, filters);
}
