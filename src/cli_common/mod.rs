//! Общий модуль для CLI
//!
//! Инициализация логирования, цветной вывод сообщений и сводки генерации.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use tracing_subscriber::EnvFilter;

pub mod output;

pub use output::{print_summary, OutputFormat};

/// Инициализирует систему логирования.
/// `RUST_LOG` дополняет уровень, заданный флагом `verbose`.
pub fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

pub fn print_header(name: &str, version: &str, description: &str) {
    println!("{} {} - {}", "🔧".blue(), name.bold().blue(), version.dimmed());
    println!("{}\n", description.dimmed());
}

pub fn print_success(message: &str) {
    println!("{} {}", "✅".green(), message.green());
}

pub fn print_warning(message: &str) {
    println!("{} {}", "⚠️".yellow(), message.yellow());
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "❌".red(), message.red());
}

/// Проверяет существование файла или директории
pub fn validate_path(path: &Path, description: &str) -> Result<()> {
    if !path.exists() {
        return Err(anyhow::anyhow!("{} does not exist: {}", description, path.display()));
    }
    Ok(())
}

/// Создает директорию если она не существует
pub fn ensure_dir_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Форматирует продолжительность в человекочитаемый вид
pub fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if secs == 0 {
        format!("{}ms", millis)
    } else if secs < 60 {
        format!("{}.{:03}s", secs, millis)
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_format_duration() {
        use std::time::Duration;

        assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
        assert_eq!(format_duration(Duration::from_secs(1)), "1.000s");
        assert_eq!(format_duration(Duration::from_secs(65)), "1m 5s");
    }

    #[test]
    fn test_validate_and_ensure_dir() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("out").join("contracts");

        assert!(validate_path(&nested, "Output directory").is_err());
        ensure_dir_exists(&nested).unwrap();
        assert!(validate_path(&nested, "Output directory").is_ok());
    }
}
