/*!
# 1C Contract Generator CLI

Command-line interface for generating JSON metadata and form contracts
from a 1C:Enterprise configuration report and XML dump.
*/

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use onec_contract_generator::cli_common::{self, OutputFormat};
use onec_contract_generator::configuration::type_normalizer::TypePattern;
use onec_contract_generator::{ContractGenerator, FsContractSink, GeneratorSettings};

#[derive(Parser)]
#[command(
    name = "onec-contracts",
    version = env!("CARGO_PKG_VERSION"),
    author = "BSL Analyzer Team",
    about = "Generates JSON contracts for 1C:Enterprise metadata objects and forms"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file (TOML or YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate object and form contracts
    Generate {
        /// Text report of the configuration
        #[arg(short, long)]
        report_path: Option<PathBuf>,

        /// Configuration XML dump directory
        #[arg(short = 'd', long)]
        conf_dir: Option<PathBuf>,

        /// Output directory for contracts
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Do not generate object contracts
        #[arg(long)]
        skip_metadata: bool,

        /// Do not generate form contracts
        #[arg(long)]
        skip_forms: bool,

        /// Keep existing *.json files in the output directory
        #[arg(long)]
        no_clean: bool,

        /// Stop on the first file that fails to parse
        #[arg(long)]
        fail_fast: bool,

        /// Look for the report inside the configuration directory
        #[arg(long)]
        discover_report: bool,

        /// Write compact JSON
        #[arg(long)]
        compact: bool,

        /// Summary format (text, json)
        #[arg(short = 'f', long, default_value = "text")]
        format: String,
    },

    /// Normalize raw type tokens and print the result
    NormalizeType {
        /// Raw tokens, e.g. "cfg:CatalogRef.Банки" or "xs:string(50)"
        #[arg(required = true)]
        tokens: Vec<String>,
    },

    /// Print the effective type normalization table
    TypeRules,

    /// Write default settings to a TOML file
    InitConfig {
        #[arg(default_value = "contracts.toml")]
        path: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        cli_common::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    cli_common::init_logging(cli.verbose)?;

    let settings = match &cli.config {
        Some(path) => {
            cli_common::validate_path(path, "Settings file")?;
            GeneratorSettings::load_from_file(path)?
        }
        None => GeneratorSettings::default(),
    };

    match cli.command {
        Commands::Generate {
            report_path,
            conf_dir,
            output_dir,
            skip_metadata,
            skip_forms,
            no_clean,
            fail_fast,
            discover_report,
            compact,
            format,
        } => {
            let mut settings = settings;
            if report_path.is_some() {
                settings.report_path = report_path;
            }
            if conf_dir.is_some() {
                settings.conf_dir = conf_dir;
            }
            if let Some(output_dir) = output_dir {
                settings.output_dir = output_dir;
            }
            settings.skip_metadata |= skip_metadata;
            settings.skip_forms |= skip_forms;
            settings.fail_fast |= fail_fast;
            settings.discover_report |= discover_report;
            if no_clean {
                settings.clean_output = false;
            }
            if compact {
                settings.pretty = false;
            }
            let format: OutputFormat = format.parse()?;
            generate(settings, format, cli.verbose)
        }
        Commands::NormalizeType { tokens } => {
            let normalizer = settings.normalizer();
            for token in tokens {
                let descriptor = normalizer.describe(&token);
                let mut line = format!("{} -> {}", token, descriptor.normalized.bold());
                if let Some(length) = descriptor.length {
                    line.push_str(&format!(" length={}", length));
                }
                if let Some(precision) = descriptor.precision {
                    line.push_str(&format!(" precision={}", precision));
                }
                println!("{}", line);
            }
            Ok(())
        }
        Commands::TypeRules => {
            for rule in settings.normalizer().rules() {
                match &rule.pattern {
                    TypePattern::Exact(token) => println!("{:<45} = {}", token, rule.replacement),
                    TypePattern::Prefix(prefix) => {
                        println!("{:<45} = {}*", format!("{}*", prefix), rule.replacement)
                    }
                }
            }
            Ok(())
        }
        Commands::InitConfig { path } => {
            settings
                .save_to_file(&path)
                .with_context(|| format!("Failed to create settings file {}", path.display()))?;
            cli_common::print_success(&format!("Settings written to {}", path.display()));
            Ok(())
        }
    }
}

fn generate(settings: GeneratorSettings, format: OutputFormat, verbose: bool) -> Result<()> {
    if format == OutputFormat::Text {
        cli_common::print_header(
            "onec-contracts",
            env!("CARGO_PKG_VERSION"),
            "1C metadata and form contract generator",
        );
    }

    if let Some(report) = &settings.report_path {
        cli_common::validate_path(report, "Configuration report")?;
    }
    if let Some(conf_dir) = &settings.conf_dir {
        cli_common::validate_path(conf_dir, "Configuration directory")?;
    }
    cli_common::ensure_dir_exists(&settings.output_dir)?;

    let mut sink = FsContractSink::new(&settings.output_dir)
        .with_pretty(settings.pretty)
        .with_clean(settings.clean_output);
    let generator = ContractGenerator::new(settings).with_progress(format == OutputFormat::Text);
    let summary = generator.run(&mut sink)?;

    cli_common::print_summary(&summary, format, verbose)?;

    if format == OutputFormat::Text {
        if summary.is_clean() {
            cli_common::print_success(&format!(
                "Contracts written to {}",
                sink.output_dir().display()
            ));
        } else {
            cli_common::print_warning(&format!(
                "{} files failed, the rest were written to {}",
                summary.failures.len(),
                sink.output_dir().display()
            ));
        }
    }

    if !summary.is_clean() {
        std::process::exit(2);
    }
    Ok(())
}
