use super::LogError;
use log::LevelFilter;
use log4rs::config::Logger;
use std::{collections::HashMap, env, mem};

/// A module level override. It carries no appenders of its own and
/// inherits those of the root logger.
#[derive(Clone)]
pub(super) struct LoggerSpec {
    pub name: String,
    pub level: LevelFilter,
}

impl LoggerSpec {
    pub fn new(name: String, level: LevelFilter) -> Self {
        Self { name, level }
    }

    pub fn logger(&self) -> Logger {
        Logger::builder().build(self.name.clone(), self.level)
    }
}

pub(super) struct Loggers {
    loggers: Vec<LoggerSpec>,
    root_level: LevelFilter,
}

impl Loggers {
    pub fn root_level(&self) -> LevelFilter {
        self.root_level
    }

    pub fn items(&self) -> impl IntoIterator<Item = Logger> + '_ {
        self.loggers.iter().map(|x| x.logger())
    }
}

/// Collects per-module level directives from `RUST_LOG`-style expressions
/// such as `info,arbor_consensus=debug`.
pub(super) struct Builder {
    loggers: HashMap<String, LevelFilter>,
    root_level: Option<LevelFilter>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder { loggers: HashMap::new(), root_level: None }
    }

    pub fn parse_env(&mut self, env: &str) -> &mut Self {
        self.parse_expression(&env::var(env).unwrap_or_default())
    }

    pub fn parse_expression(&mut self, expression: &str) -> &mut Self {
        for spec in expression.split(',').map(|x| x.trim()) {
            if spec.is_empty() {
                continue;
            }
            match parse_spec(spec) {
                Ok((level, Some(name))) => {
                    self.logger(name.to_string(), level);
                }
                Ok((level, None)) => {
                    self.root_level(level);
                }
                Err(err) => {
                    // The logger is not up yet, so stdout is the only channel left
                    println!("Ignoring invalid logging spec: {}", err);
                }
            }
        }
        self
    }

    pub fn root_level(&mut self, root_level: LevelFilter) -> &mut Self {
        self.root_level.replace(root_level);
        self
    }

    pub fn logger(&mut self, name: String, level: LevelFilter) -> &mut Self {
        self.loggers.insert(name, level);
        self
    }

    pub fn build(&mut self) -> Loggers {
        let loggers_map = mem::take(&mut self.loggers);
        let loggers = loggers_map.into_iter().map(|(name, level)| LoggerSpec::new(name, level)).collect::<Vec<_>>();
        Loggers { loggers, root_level: self.root_level.take().unwrap_or(LevelFilter::Info) }
    }
}

fn parse_spec(spec: &str) -> Result<(LevelFilter, Option<&str>), LogError> {
    let mut parts = spec.split('=');
    match (parts.next(), parts.next().map(|x| x.trim()), parts.next()) {
        // A lone level string defines the root level, a lone name enables everything for that module
        (Some(part0), None, None) => match part0.parse() {
            Ok(level) => Ok((level, None)),
            Err(_) => Ok((LevelFilter::max(), Some(part0))),
        },
        (Some(part0), Some(""), None) => Ok((LevelFilter::max(), Some(part0))),
        (Some(part0), Some(part1), None) => match part1.parse() {
            Ok(level) => Ok((level, Some(part0))),
            Err(_) => Err(LogError::ParseLoggerSpecError(part1.to_string())),
        },
        _ => Err(LogError::ParseLoggerSpecError(spec.to_string())),
    }
}
