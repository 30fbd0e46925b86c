//! Logging for the scheduler, built on `fern`.
//!
//! Progress and diagnostics go to the terminal: info and below to stdout, warnings and errors to
//! stderr, coloured when the stream is a terminal. Scheduling runs also keep two plain-text log
//! files in the output folder, one of which holds only warnings and errors.
use anyhow::{Context, Result, bail};
use chrono::Local;
use fern::Dispatch;
use fern::colors::{Color, ColoredLevelConfig};
use log::{LevelFilter, Record};
use std::env;
use std::fmt::Arguments;
use std::fs::File;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::OnceLock;

/// Set once the process-wide logger is in place
static LOGGER_INIT: OnceLock<()> = OnceLock::new();

/// The environment variable used to override the log level
const LOG_LEVEL_ENV_VAR: &str = "H2DISPATCH_LOG_LEVEL";

/// The log level used when neither the environment nor `settings.toml` gives one
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Log file for the ordinary progress of a run
const LOG_INFO_FILE_NAME: &str = "h2dispatch_info.log";

/// Log file for warnings and errors, e.g. scenarios which could not be scheduled
const LOG_ERROR_FILE_NAME: &str = "h2dispatch_error.log";

/// Whether the program logger has been initialised
pub fn is_logger_initialised() -> bool {
    LOGGER_INIT.get().is_some()
}

/// Convert a log level name to a [`LevelFilter`]
fn parse_log_level(log_level: &str) -> Result<LevelFilter> {
    let filter = match log_level.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        unknown => bail!("Unknown log level: {unknown}"),
    };

    Ok(filter)
}

/// Pick the log level: the environment variable wins over the settings file
fn resolve_log_level(from_env: Option<&str>, from_settings: Option<&str>) -> Result<LevelFilter> {
    parse_log_level(from_env.or(from_settings).unwrap_or(DEFAULT_LOG_LEVEL))
}

/// Format one log line, e.g. `[14:02:11 INFO h2dispatch::controller] Hour 3: ...`
fn format_line(
    out: fern::FormatCallback,
    message: &Arguments,
    record: &Record,
    colours: Option<&ColoredLevelConfig>,
) {
    let timestamp = Local::now().format("%H:%M:%S");
    let target = record.target();
    match colours {
        Some(colours) => {
            let level = colours.color(record.level());
            out.finish(format_args!("[{timestamp} {level} {target}] {message}"));
        }
        None => {
            let level = record.level();
            out.finish(format_args!("[{timestamp} {level} {target}] {message}"));
        }
    }
}

/// Format one log line without colours
fn format_plain(out: fern::FormatCallback, message: &Arguments, record: &Record) {
    format_line(out, message, record, None);
}

/// Terminal output, split between stdout and stderr at the warning level
fn console_dispatch(level: LevelFilter) -> Dispatch {
    let colours = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::Magenta);
    let stdout_colours = std::io::stdout().is_terminal().then_some(colours);
    let stderr_colours = std::io::stderr().is_terminal().then_some(colours);

    Dispatch::new()
        .chain(
            Dispatch::new()
                .filter(|metadata| metadata.level() > LevelFilter::Warn)
                .format(move |out, message, record| {
                    format_line(out, message, record, stdout_colours.as_ref());
                })
                .level(level)
                .chain(std::io::stdout()),
        )
        .chain(
            Dispatch::new()
                .format(move |out, message, record| {
                    format_line(out, message, record, stderr_colours.as_ref());
                })
                .level(level.min(LevelFilter::Warn))
                .chain(std::io::stderr()),
        )
}

/// The two log files in `output_dir`.
///
/// The info file records at least `info`, whatever the terminal level, so that a run can be
/// inspected afterwards. Warnings and errors are always written to the error file.
fn file_dispatch(output_dir: &Path, level: LevelFilter) -> Result<Dispatch> {
    let create = |file_name: &str| {
        let file_path = output_dir.join(file_name);
        File::create(&file_path)
            .with_context(|| format!("Could not create log file {}", file_path.display()))
    };
    Ok(Dispatch::new()
        .chain(
            Dispatch::new()
                .filter(|metadata| metadata.level() > LevelFilter::Warn)
                .format(format_plain)
                .level(level.max(LevelFilter::Info))
                .chain(create(LOG_INFO_FILE_NAME)?),
        )
        .chain(
            Dispatch::new()
                .format(format_plain)
                .level(LevelFilter::Warn)
                .chain(create(LOG_ERROR_FILE_NAME)?),
        ))
}

/// Initialise the program logger.
///
/// The level comes from the `H2DISPATCH_LOG_LEVEL` environment variable, then from
/// `settings.toml`, then [`DEFAULT_LOG_LEVEL`]. At `debug` level the committed decision for every
/// hour is logged. Calling this again once a logger is in place does nothing.
///
/// # Arguments
///
/// * `log_level_from_settings`: The log level specified in `settings.toml`
/// * `output_dir`: Where to write log files (no files are written if `None`)
pub fn init(log_level_from_settings: Option<&str>, output_dir: Option<&Path>) -> Result<()> {
    if is_logger_initialised() {
        return Ok(());
    }

    let from_env = env::var(LOG_LEVEL_ENV_VAR).ok();
    let level = resolve_log_level(from_env.as_deref(), log_level_from_settings)?;

    let mut dispatch = Dispatch::new().chain(console_dispatch(level));
    if let Some(output_dir) = output_dir {
        dispatch = dispatch.chain(file_dispatch(output_dir, level)?);
    }
    dispatch.apply().context("Logger already initialised")?;

    let _ = LOGGER_INIT.set(());

    Ok(())
}
