//! Logging setup
//!
//! Logs go to stderr as `LEVEL: message` so stdout stays reserved for
//! response payloads.

use fern::Dispatch;
use fern::colors::Color::{Blue, Green, Magenta, Red, Yellow};
use fern::colors::ColoredLevelConfig;
use log::LevelFilter;
use std::io::stderr;
use std::sync::atomic::{AtomicBool, Ordering};

static LOGGER_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Map the `-v` count to a level: warnings by default, then info, then debug.
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    }
}

/// Install the global logger. Later calls are no-ops.
pub fn init(verbosity: u8) -> Result<(), log::SetLoggerError> {
    if LOGGER_INITIALIZED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    let colors = ColoredLevelConfig::new()
        .debug(Blue)
        .info(Green)
        .warn(Yellow)
        .error(Red)
        .trace(Magenta);

    Dispatch::new()
        .level(level_for(verbosity))
        // Connection pool chatter is noise at -vv
        .level_for("hyper", LevelFilter::Warn)
        .level_for("reqwest", LevelFilter::Warn)
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{level}: {message}",
                level = colors.color(record.level()),
                message = message,
            ))
        })
        .chain(stderr())
        .apply()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_verbosity() {
        assert_eq!(level_for(0), LevelFilter::Warn);
        assert_eq!(level_for(1), LevelFilter::Info);
        assert_eq!(level_for(2), LevelFilter::Debug);
        assert_eq!(level_for(5), LevelFilter::Debug);
    }

    #[test]
    fn test_init_is_idempotent() {
        assert!(init(0).is_ok());
        assert!(init(2).is_ok());
    }
}
