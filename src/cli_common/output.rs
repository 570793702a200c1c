//! Вывод сводки генерации

use anyhow::Result;
use colored::Colorize;
use std::fmt::Write as _;
use std::str::FromStr;

use crate::contract_generator::GenerationSummary;

/// Сколько диагностик печатать в текстовом виде без `--verbose`
const MAX_LISTED_WARNINGS: usize = 20;

/// Формат вывода сводки
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow::anyhow!("Unknown output format: {}", s)),
        }
    }
}

/// Текст сводки в выбранном формате
pub fn render_summary(
    summary: &GenerationSummary,
    format: OutputFormat,
    all_warnings: bool,
) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(summary)?),
        OutputFormat::Text => Ok(render_text(summary, all_warnings)),
    }
}

pub fn print_summary(
    summary: &GenerationSummary,
    format: OutputFormat,
    all_warnings: bool,
) -> Result<()> {
    println!("{}", render_summary(summary, format, all_warnings)?);
    Ok(())
}

fn render_text(summary: &GenerationSummary, all_warnings: bool) -> String {
    let mut out = String::new();
    let header = "Contract generation summary";
    let _ = writeln!(out, "\n{}", header.bold().blue());
    let _ = writeln!(out, "{}", "=".repeat(header.len()).blue());

    if let Some(report) = &summary.report_path {
        let _ = writeln!(out, "  • Report: {}", report.display());
    }
    let _ = writeln!(out, "  • Objects parsed: {}", summary.objects_parsed);
    let _ = writeln!(out, "  • Object contracts: {}", summary.objects_written);
    let _ = writeln!(out, "  • Form contracts: {}", summary.forms_written);
    let elapsed = summary.duration().to_std().unwrap_or_default();
    let _ = writeln!(out, "  • Duration: {}", super::format_duration(elapsed));

    if !summary.failures.is_empty() {
        let _ = writeln!(out, "\n{} ({})", "Failed files".red().bold(), summary.failures.len());
        for failure in &summary.failures {
            let _ = writeln!(out, "  • {}: {}", failure.path.display(), failure.error);
        }
    }

    if !summary.diagnostics.is_empty() {
        let _ = writeln!(out, "\n{} ({})", "Warnings".yellow().bold(), summary.warnings());
        let limit = if all_warnings { usize::MAX } else { MAX_LISTED_WARNINGS };
        for diagnostic in summary.diagnostics.iter().take(limit) {
            let _ = writeln!(out, "  • {}", diagnostic);
        }
        if summary.diagnostics.len() > limit {
            let _ = writeln!(out, "  … and {} more", summary.diagnostics.len() - limit);
        }
    }

    out
}
