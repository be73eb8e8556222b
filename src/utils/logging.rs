// BMX Miner - Free and Open Source Software Statement
//
// This project, bmx-miner, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/utils/logging.rs
// Version: 1.0.0
//
// This file sets up log4rs for the miner binary, either from a YAML file or
// from a built-in console configuration.

use crate::error::{MinerError, Result};
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::Path;

/// Pattern used by the built-in console appender
pub const CONSOLE_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {h({l:<5})} [{t}] {m}{n}";

/// Map -v occurrences onto a level filter
pub fn level_for_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Console logging on stderr, so stdout stays free for the JSON result.
pub fn console_config(level: LevelFilter) -> Result<Config> {
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(CONSOLE_PATTERN)))
        .build();

    Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(level))
        .map_err(|e| MinerError::Logging(e.to_string()))
}

/// Install the global logger. Can only succeed once per process.
pub fn initialize_logging(config_file: Option<&Path>, verbose: u8) -> Result<()> {
    match config_file {
        Some(path) => log4rs::init_file(path, Default::default())
            .map_err(|e| MinerError::Logging(format!("{}: {}", path.display(), e))),
        None => {
            let config = console_config(level_for_verbosity(verbose))?;
            log4rs::init_config(config)
                .map(|_handle| ())
                .map_err(|e| MinerError::Logging(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(level_for_verbosity(0), LevelFilter::Info);
        assert_eq!(level_for_verbosity(1), LevelFilter::Debug);
        assert_eq!(level_for_verbosity(5), LevelFilter::Trace);
    }

    #[test]
    fn test_console_config_builds() {
        let config = console_config(LevelFilter::Debug).unwrap();
        assert_eq!(config.root().level(), LevelFilter::Debug);
        assert_eq!(config.appenders().len(), 1);
    }
}
