//! `log4rs` setup for the process.
//!
//! Library code only uses the `log` facade. Aggregation stages log under
//! [`PIPELINE_TARGET`], which `configure_logging` routes to its own file.

use log::LevelFilter;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::append::rolling_file::policy::compound::{
    CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
};
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::{Path, PathBuf};

/// Log target used by aggregation stages.
pub const PIPELINE_TARGET: &str = "aggrelite::pipeline";

const ENCODER_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {t} - {m}{n}";
const ROLL_SIZE: u64 = 10 * 1024 * 1024;

/// Initializes the logging system from the default file `log4rs.yaml` in the working directory.
///
/// # Errors
/// Returns an error if the file is missing or invalid, or a logger is already installed.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    init_path(Path::new("log4rs.yaml"))
}

/// Initializes the logging system from a specific config file path.
///
/// # Errors
/// Returns an error if the file is missing or invalid, or a logger is already installed.
pub fn init_path(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    log4rs::init_file(path, log4rs::config::Deserializers::default())?;
    Ok(())
}

#[must_use]
pub fn parse_level(level: &str) -> LevelFilter {
    match level.to_ascii_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

fn rolling_appender(
    dir: &Path,
    stem: &str,
    keep: u32,
) -> Result<RollingFileAppender, Box<dyn std::error::Error>> {
    let roller = FixedWindowRoller::builder()
        .build(&format!("{}", dir.join(format!("{stem}.{{}}.log")).display()), keep)?;
    let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(ROLL_SIZE)), Box::new(roller));
    let appender = RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(ENCODER_PATTERN)))
        .build(dir.join(format!("{stem}.log")), Box::new(policy))?;
    Ok(appender)
}

/// Writes `{dir}/app.log` and `{dir}/pipeline.log` (rolling at 10 MiB, keeping
/// `retention` files, default 7).
///
/// Only the first successful call installs a logger; later calls leave the
/// existing configuration in place and return an error.
///
/// # Errors
/// Returns an error if the directory or appenders cannot be created, or a logger is
/// already installed.
pub fn configure_logging(
    dir: Option<&Path>,
    level: Option<&str>,
    retention: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let base = dir
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    std::fs::create_dir_all(&base)?;
    let keep = retention.unwrap_or(7);
    let lvl = parse_level(level.unwrap_or("info"));

    let config = Config::builder()
        .appender(Appender::builder().build("app", Box::new(rolling_appender(&base, "app", keep)?)))
        .appender(
            Appender::builder()
                .build("pipeline", Box::new(rolling_appender(&base, "pipeline", keep)?)),
        )
        .logger(Logger::builder().appender("pipeline").additive(false).build(PIPELINE_TARGET, lvl))
        .build(Root::builder().appender("app").build(lvl))?;
    log4rs::init_config(config)?;
    Ok(())
}

/// Initializes logging to `{base}/{db_name}_logs/{db_name}.log`.
///
/// # Errors
/// Returns an error if the directory cannot be created or the logger fails to initialize.
pub fn init_for_db_in(
    base_dir: &Path,
    db_name: &str,
    level: &str,
    retention: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = base_dir.join(format!("{db_name}_logs"));
    std::fs::create_dir_all(&dir)?;
    let appender = rolling_appender(&dir, db_name, retention)?;
    let config = Config::builder()
        .appender(Appender::builder().build("db", Box::new(appender)))
        .build(Root::builder().appender("db").build(parse_level(level)))?;
    log4rs::init_config(config)?;
    Ok(())
}

/// Configure logging from environment variables if present:
/// - AGGRELITE_LOG_DIR
/// - AGGRELITE_LOG_LEVEL
/// - AGGRELITE_LOG_RETENTION
///
/// # Errors
/// Same as [`configure_logging`].
pub fn configure_from_env() -> Result<(), Box<dyn std::error::Error>> {
    let dir = std::env::var("AGGRELITE_LOG_DIR").ok().map(PathBuf::from);
    let level = std::env::var("AGGRELITE_LOG_LEVEL").ok();
    let retention =
        std::env::var("AGGRELITE_LOG_RETENTION").ok().and_then(|s| s.parse::<u32>().ok());
    configure_logging(dir.as_deref(), level.as_deref(), retention)
}
