//! Testgen CLI - BRD and QA test case generation from a use case.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::disallowed_macros)]
#![allow(clippy::uninlined_format_args)]

use std::future::Future;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use dialoguer::Editor;

use testgen::ai::as_of_today;
use testgen::domain::{ConfigDomain, GeneratorDomain};
use testgen::entities::{resolve_use_case, ModelSettings, Schema, Session, TestgenConfig};
use testgen::errors::{TestgenError, TestgenResult};
use testgen::export::{export_document, export_table, write_export, ExportFormat};
use testgen::reconcile::Reconciliation;
use testgen::template::TemplateReader;
use testgen::ui;

#[derive(Parser)]
#[command(name = "testgen")]
#[command(about = "Generate a BRD and QA test cases from a use case", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project root directory (holds .testgen/config.json)
    #[arg(long, global = true)]
    project: Option<PathBuf>,

    /// Provider override (e.g. gemini)
    #[arg(long, global = true)]
    provider: Option<String>,

    /// Model override
    #[arg(long, global = true)]
    model: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a BRD from a use case
    Brd {
        #[command(flatten)]
        use_case: UseCaseArgs,

        /// Output directory (defaults to the project root)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Generate test cases from an existing BRD
    TestCases {
        /// BRD text file
        #[arg(long)]
        brd: PathBuf,

        /// Template (.csv or .xlsx) whose header defines the columns
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Output directory (defaults to the project root)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Generate the BRD and then the test cases
    Run {
        #[command(flatten)]
        use_case: UseCaseArgs,

        /// Template (.csv or .xlsx) whose header defines the columns
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Output directory (defaults to the project root)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Reconcile a saved model reply against a schema, offline
    Reconcile {
        /// File holding the raw reply
        #[arg(long)]
        reply: PathBuf,

        /// Template (.csv or .xlsx) whose header defines the columns
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Also write test_cases.csv and test_cases.xlsx here
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Print a prompt without calling the service
    Prompt {
        #[command(subcommand)]
        kind: PromptCommands,
    },

    /// List providers, their configuration and models
    Models,

    /// Inspect or update the configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(clap::Args)]
struct UseCaseArgs {
    /// Use case file (takes precedence over --text)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Use case text
    #[arg(long)]
    text: Option<String>,

    /// Date the BRD is written as of (defaults to today)
    #[arg(long)]
    as_of: Option<String>,
}

#[derive(Subcommand)]
enum PromptCommands {
    /// The BRD prompt for a use case
    Brd {
        #[command(flatten)]
        use_case: UseCaseArgs,
    },

    /// The test case prompt for a BRD
    TestCases {
        /// BRD text file
        #[arg(long)]
        brd: PathBuf,

        /// Template (.csv or .xlsx) whose header defines the columns
        #[arg(short, long)]
        template: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Set the model (and optionally the provider)
    SetModel {
        /// Model ID
        model: String,

        /// Provider name
        #[arg(long)]
        provider: Option<String>,

        /// Sampling temperature
        #[arg(long)]
        temperature: Option<f32>,
    },
}

fn get_project_path(cli_path: Option<PathBuf>) -> PathBuf {
    cli_path.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        ui::print_error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), TestgenError> {
    let project_path = get_project_path(cli.project);
    let config_domain = ConfigDomain::new(&project_path);

    let mut config = config_domain.load().await?;
    if let Some(provider) = cli.provider {
        config.model.provider = provider;
    }
    if let Some(model) = cli.model {
        config.model.model_id = model;
    }

    match cli.command {
        Commands::Brd { use_case, out } => {
            let generator = GeneratorDomain::new(&config);
            let mut session = generator.new_session(None);
            brd_step(&generator, &mut session, use_case).await?;
            write_brd(&session, &out.unwrap_or(project_path))?;
        }

        Commands::TestCases { brd, template, out } => {
            let schema = load_schema(template.as_deref(), &config)?;
            let generator = GeneratorDomain::new(&config);
            let mut session = generator.new_session(Some(schema));
            session.set_brd(&brd.display().to_string(), read_text(&brd)?);

            let reconciliation = test_case_step(&generator, &mut session).await?;
            write_table(&reconciliation, &out.unwrap_or(project_path))?;
        }

        Commands::Run {
            use_case,
            template,
            out,
        } => {
            let schema = load_schema(template.as_deref(), &config)?;
            let generator = GeneratorDomain::new(&config);
            let mut session = generator.new_session(Some(schema));
            let out = out.unwrap_or(project_path);

            brd_step(&generator, &mut session, use_case).await?;
            write_brd(&session, &out)?;

            let reconciliation = test_case_step(&generator, &mut session).await?;
            write_table(&reconciliation, &out)?;
            ui::display_session(&session);
        }

        Commands::Reconcile {
            reply,
            template,
            out,
        } => {
            let schema = load_schema(template.as_deref(), &config)?;
            let reconciliation = GeneratorDomain::reconcile_only(&read_text(&reply)?, &schema);
            ui::display_reconciliation(&reconciliation);
            if let Some(out) = out {
                write_table(&reconciliation, &out)?;
            }
        }

        Commands::Prompt { kind } => {
            let generator = GeneratorDomain::new(&config);
            let prompt = match kind {
                PromptCommands::Brd { use_case } => {
                    let as_of = use_case.as_of.clone().unwrap_or_else(as_of_today);
                    let text = read_use_case(use_case)?;
                    generator.prompts().brd_prompt(&text, &as_of)?
                }
                PromptCommands::TestCases { brd, template } => {
                    let schema = load_schema(template.as_deref(), &config)?;
                    generator
                        .prompts()
                        .test_case_prompt(&read_text(&brd)?, &schema)?
                }
            };
            println!("{prompt}");
        }

        Commands::Models => {
            let generator = GeneratorDomain::new(&config);
            println!(
                "{} {} ({})",
                "Configured model:".bold(),
                config.model.model_id.cyan(),
                config.model.provider
            );
            println!("{}", ui::provider_table(&generator.registry().providers()));
        }

        Commands::Config { action } => match action {
            ConfigCommands::Show => {
                ui::print_info(&format!("{}", config_domain.config_path().display()));
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
            ConfigCommands::SetModel {
                model,
                provider,
                temperature,
            } => {
                let current = config_domain.load_file().await?.model;
                let settings = ModelSettings {
                    provider: provider.unwrap_or(current.provider),
                    model_id: model,
                    temperature: temperature.unwrap_or(current.temperature),
                    ..current
                };
                let summary = format!("{} ({})", settings.model_id, settings.provider);
                config_domain.set_model(settings).await?;
                ui::print_success(&format!("Model set to {summary}"));
            }
        },
    }

    Ok(())
}

/// Await a service call behind a spinner.
async fn with_spinner<T>(message: &str, call: impl Future<Output = TestgenResult<T>>) -> TestgenResult<T> {
    let spinner = ui::spinner(message);
    let result = call.await;
    spinner.finish_and_clear();
    result
}

async fn brd_step(
    generator: &GeneratorDomain,
    session: &mut Session,
    args: UseCaseArgs,
) -> TestgenResult<()> {
    let as_of = args.as_of.clone().unwrap_or_else(as_of_today);
    let use_case = read_use_case(args)?;

    let usage = with_spinner(
        "Generating BRD...",
        generator.generate_brd(session, &use_case, &as_of),
    )
    .await?;

    if session.has_brd() {
        ui::print_success("BRD generated");
    } else {
        ui::print_warning("The model returned no text for the BRD");
    }
    ui::print_usage(usage);
    Ok(())
}

async fn test_case_step(
    generator: &GeneratorDomain,
    session: &mut Session,
) -> TestgenResult<Reconciliation> {
    let run = with_spinner(
        "Generating test cases...",
        generator.generate_test_cases(session),
    )
    .await?;

    if run.no_candidates {
        ui::print_warning("The model returned no candidates");
    }
    ui::display_reconciliation(&run.reconciliation);
    ui::print_usage(run.usage);
    Ok(run.reconciliation)
}

/// Use case from --input or --text, falling back to an editor.
fn read_use_case(args: UseCaseArgs) -> TestgenResult<String> {
    let file = match &args.input {
        Some(path) => Some(std::fs::read(path).map_err(|e| TestgenError::FileReadError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?),
        None => None,
    };

    if let Some(text) = resolve_use_case(file.as_deref(), args.text.as_deref().unwrap_or("")) {
        return Ok(text);
    }
    if args.input.is_some() || args.text.is_some() {
        return Err(TestgenError::EmptyInput);
    }

    let edited = Editor::new()
        .extension(".md")
        .edit("")
        .map_err(|e| TestgenError::InvalidArgument {
            reason: format!("Could not open an editor: {e}"),
        })?;
    resolve_use_case(None, &edited.unwrap_or_default()).ok_or(TestgenError::EmptyInput)
}

/// Schema from a template, or the configured default columns.
fn load_schema(template: Option<&Path>, config: &TestgenConfig) -> TestgenResult<Schema> {
    match template {
        Some(path) => TemplateReader::read_path(path),
        None => config
            .template
            .default_schema()?
            .ok_or(TestgenError::SchemaMissing),
    }
}

fn read_text(path: &Path) -> TestgenResult<String> {
    std::fs::read_to_string(path).map_err(|e| TestgenError::FileReadError {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn write_brd(session: &Session, out: &Path) -> TestgenResult<()> {
    for format in [ExportFormat::Text, ExportFormat::Pdf] {
        let bytes = export_document(format, &session.brd_text)?;
        let path = write_export(out, format, &bytes)?;
        ui::print_info(&format!("Wrote {}", path.display()));
    }
    Ok(())
}

fn write_table(reconciliation: &Reconciliation, out: &Path) -> TestgenResult<()> {
    for format in [ExportFormat::Csv, ExportFormat::Xlsx] {
        let bytes = export_table(format, &reconciliation.table)?;
        let path = write_export(out, format, &bytes)?;
        ui::print_info(&format!("Wrote {}", path.display()));
    }
    Ok(())
}
