use anyhow::{Context, Result};
use chrono::Local;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::{
    fs,
    path::{Path, PathBuf},
};
use time::macros::format_description;

/// `<log_dir>/<timestamp>+<label>.log`; the file logger is the only
/// logger, the terminal belongs to the progress bar.
pub fn init_file_logger(log_dir: &Path, label: &str) -> Result<PathBuf> {
    fs::create_dir_all(log_dir).with_context(|| "failed to create logs directory")?;

    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();
    let log_path = log_dir.join(format!("{timestamp}+{label}.log"));
    let log_file = fs::File::create(&log_path)
        .with_context(|| format!("failed to create log file {}", log_path.display()))?;

    WriteLogger::init(
        LevelFilter::Info,
        ConfigBuilder::new()
            .set_time_format_custom(format_description!(
                "[year]-[month]-[day] [hour]:[minute]:[second]"
            ))
            .build(),
        log_file,
    )
    .context("failed to initialise file logger")?;

    Ok(log_path)
}
