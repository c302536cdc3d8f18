//! Logging (§4.10): `fern` + `log` + `chrono`, a rolling log file under the
//! config directory plus an optional colored stdout dispatch.

use failure::Fail;
use fern::colors::{Color, ColoredLevelConfig};
use log::{Level, LevelFilter, SetLoggerError};
use std::fs::File;
use std::path::{Path, PathBuf};

#[derive(Debug, Fail)]
pub enum InitLoggerError {
    #[fail(display = "fail to create log file: {}", _0)]
    FailCreateLogFile(std::io::Error),
    #[fail(display = "fail to open log file: {}", _0)]
    FailOpenLogFile(std::io::Error),
    #[fail(display = "invalid log file path")]
    LogFilePathNotStr,
    #[fail(display = "set logger error: {}", _0)]
    SetLoggerError(SetLoggerError),
}

impl From<SetLoggerError> for InitLoggerError {
    fn from(e: SetLoggerError) -> Self {
        InitLoggerError::SetLoggerError(e)
    }
}

/// Initialize the process-wide logger. `log_dir` is created if missing;
/// the log file lives at `<log_dir>/saftcr.log`.
pub fn init(log_dir: &Path, level: LevelFilter, log_stdout: bool) -> Result<(), InitLoggerError> {
    std::fs::create_dir_all(log_dir).map_err(InitLoggerError::FailCreateLogFile)?;
    let mut log_file_path: PathBuf = log_dir.to_path_buf();
    log_file_path.push("saftcr.log");

    let log_file_path_str = log_file_path.to_str().ok_or(InitLoggerError::LogFilePathNotStr)?;
    if !log_file_path.exists() {
        File::create(log_file_path_str).map_err(InitLoggerError::FailCreateLogFile)?;
    }

    let common_config = fern::Dispatch::new().level(level).format(|out, message, record| {
        let colors = ColoredLevelConfig::new().info(Color::Green).debug(Color::Cyan);
        let lvl = record.level();
        if lvl >= Level::Debug {
            out.finish(format_args!(
                "{}[{}:{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.file_static().unwrap_or("unknown source file"),
                record.line().unwrap_or(0),
                colors.color(lvl),
                message
            ))
        } else {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                colors.color(lvl),
                message
            ))
        }
    });

    let file_config =
        fern::Dispatch::new().chain(fern::log_file(log_file_path_str).map_err(InitLoggerError::FailOpenLogFile)?);

    if log_stdout {
        let term_config = fern::Dispatch::new().chain(std::io::stdout());
        common_config.chain(file_config).chain(term_config).apply()?;
    } else {
        common_config.chain(file_config).apply()?;
    }

    log::info!("saftcr logger initialised");
    Ok(())
}
