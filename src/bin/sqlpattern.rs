//! sqlpattern CLI: verify templated SQL
//!
//! # Usage
//!
//! ```bash
//! # Verify a batch file and write a JSON report
//! sqlpattern verify templates.json -o report.json
//!
//! # Check one template
//! sqlpattern check "SELECT * FROM t WHERE OPT_BLOCK f [ OPTIONAL(a = ?, b = ?) ]"
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use sqlpattern::prelude::*;
use sqlpattern::verify::{Template, TemplateReport};

#[derive(Parser)]
#[command(name = "sqlpattern")]
#[command(version)]
#[command(about = "Parse and round-trip verify SQL templates with OPT_BLOCK/REQUIRED/OPTIONAL/LOOP macros", long_about = None)]
#[command(after_help = "EXAMPLES:
    sqlpattern verify templates.json -o report.json -c 16
    sqlpattern check 'SELECT * FROM t WHERE OPT_BLOCK f [ OPTIONAL(a = ?, b = ?) ]'
    sqlpattern explain 'UPDATE t SET OPT_BLOCK s [ OPTIONAL(a = ?, b = ?) ] WHERE id = ?'")]
struct Cli {
    /// Debug logging (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file; defaults to ./sqlpattern.toml, then the user config directory
    #[arg(long, global = true, env = "SQLPATTERN_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify every template in a JSON batch file
    Verify {
        /// Batch file (template list, id map, batch list or workflow output)
        input: PathBuf,

        /// Write the JSON report here
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Templates verified at once
        #[arg(short, long)]
        concurrency: Option<usize>,

        /// Summary format on stdout
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Exit non-zero if any template fails
        #[arg(long)]
        strict: bool,
    },
    /// Verify one template and show the result
    Check {
        template: String,
    },
    /// Print the parsed statement as JSON
    Explain {
        template: String,
    },
    /// Print the cleaned template text
    Clean {
        template: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Commands::Verify {
            input,
            output,
            concurrency,
            format,
            strict,
        } => {
            let mut config = config;
            if let Some(n) = concurrency {
                config.verify.concurrency = n.max(1);
            }
            let all_passed = run_verify(&input, output.as_deref(), format, config).await?;
            if strict && !all_passed {
                std::process::exit(1);
            }
        }
        Commands::Check { template } => {
            if !check_template(&template, &config) {
                std::process::exit(1);
            }
        }
        Commands::Explain { template } => explain_template(&template, &config)?,
        Commands::Clean { template } => {
            println!("{}", clean_with(&template, &config));
        }
    }
    Ok(())
}

fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("sqlpattern=debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
}

fn clean_with(template: &str, config: &Config) -> String {
    sqlpattern::verify::clean_with(template, config.verify.rewrite_braces)
}

/// Returns true when every template verified.
async fn run_verify(
    input: &std::path::Path,
    output: Option<&std::path::Path>,
    format: OutputFormat,
    config: Config,
) -> anyhow::Result<bool> {
    let batches = sqlpattern::load::load_batches(input)
        .with_context(|| format!("failed to read batches from {}", input.display()))?;
    let pretty = config.report.pretty;
    let verifier = Verifier::new(config);
    let report = verifier.verify_batches_concurrent(batches).await;

    if let Some(path) = output {
        report
            .write_to(path, pretty)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
    }

    match format {
        OutputFormat::Json => println!("{}", report.to_json(pretty)?),
        OutputFormat::Table => print_summary(&report),
    }
    if let Some(path) = output {
        eprintln!("{} Report written to {}", "✓".green(), path.display().to_string().cyan());
    }
    Ok(report.totals.failed == 0)
}

fn print_summary(report: &RunReport) {
    for batch in &report.batches {
        let disposition = match batch.disposition {
            Disposition::FullSuccess => batch.disposition.to_string().green(),
            Disposition::PartialSuccess => batch.disposition.to_string().yellow(),
            Disposition::Failure => batch.disposition.to_string().red(),
        };
        println!(
            "{} {} ({}/{})",
            batch.id.white().bold(),
            disposition,
            batch.success_count,
            batch.templates.len()
        );
        for template in batch.templates.iter().filter(|t| !t.success) {
            if let Some(error) = &template.error {
                println!(
                    "  {} {} {}",
                    "✗".red(),
                    template.id.yellow(),
                    error.message.dimmed()
                );
            }
        }
    }

    let totals = &report.totals;
    println!();
    println!("{}", "Summary".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("  {:20} {}", "templates", totals.templates);
    println!("  {:20} {}", "succeeded", totals.succeeded.to_string().green());
    println!("  {:20} {}", "failed", totals.failed.to_string().red());
    println!("  {:20} {}", "full success", totals.full_success);
    println!("  {:20} {}", "partial success", totals.partial_success);
    println!("  {:20} {}", "failure", totals.failure);
    if !totals.error_kinds.is_empty() {
        println!();
        println!("{}", "Errors by kind".cyan().bold());
        for (kind, count) in &totals.error_kinds {
            println!("  {:20} {}", kind.as_str(), count);
        }
    }
}

/// Returns true when the template verified.
fn check_template(raw: &str, config: &Config) -> bool {
    let template = Template::verify("template", raw, &config.verify);
    println!("{} {}", "Cleaned:".dimmed(), template.cleaned.white());

    match &template.error {
        None => {
            println!("{} {}", "✓".green(), "template verified".green().bold());
            if let Some(generated) = &template.generated {
                println!("{} {}", "Generated:".dimmed(), generated.white());
            }
            let report = TemplateReport::from_template(&template, false);
            if !report.blocks.is_empty() {
                println!("{} {}", "Blocks:".dimmed(), report.blocks.join(", ").cyan());
            }
            true
        }
        Some(error) => {
            eprintln!("{} {}", format!("[{}]", error.kind()).red().bold(), error);
            if let Some(position) = error.position() {
                print_caret(&template.cleaned, position);
            }
            false
        }
    }
}

/// Print the failing line with a caret under the column.
fn print_caret(source: &str, position: Position) {
    if let Some(line) = source.lines().nth(position.line.saturating_sub(1)) {
        eprintln!("  {}", line);
        eprintln!(
            "  {}{}",
            " ".repeat(position.column.saturating_sub(1)),
            "^".red().bold()
        );
    }
}

fn explain_template(raw: &str, config: &Config) -> anyhow::Result<()> {
    let cleaned = clean_with(raw, config);
    let statement = sqlpattern::parser::parse_with_depth(&cleaned, config.verify.max_depth)?;
    println!("{}", serde_json::to_string_pretty(&statement)?);
    Ok(())
}
