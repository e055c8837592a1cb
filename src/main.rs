use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

mod cohort;
mod error;
mod loader;
mod models;
mod ranking;
mod report;
mod scoring;

#[derive(Parser)]
#[command(name = "cohort-match")]
#[command(about = "Pairwise survey compatibility matching within cohorts", long_about = None)]
struct Cli {
    /// Tab-separated survey responses
    #[arg(long, global = true, default_value = "responses.tsv")]
    responses: PathBuf,
    /// Question schema (JSON)
    #[arg(long, global = true, default_value = "schema.json")]
    schema: PathBuf,
    /// Email domain removed from displayed names
    #[arg(long, global = true)]
    strip_domain: Option<String>,
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the schema and responses without scoring
    Check,
    /// Print each respondent's closest peers
    Score {
        /// Cohorts to score, every cohort when omitted
        #[arg(long)]
        cohort: Vec<String>,
        #[arg(long, default_value_t = 3)]
        limit: usize,
        /// Emit rankings as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Write one LaTeX document per cohort
    Report {
        #[arg(long)]
        cohort: Vec<String>,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        /// Page template containing a `% REPLACE ME` line
        #[arg(long)]
        template: Option<PathBuf>,
        #[arg(long, default_value_t = 5)]
        per_page: usize,
    },
}

fn init_logging(level: &str) -> anyhow::Result<()> {
    let level = match level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let schema = loader::load_schema(&cli.schema)?;
    let respondents = loader::load_responses(&cli.responses, &schema)?;
    let strip_domain = cli.strip_domain.as_deref();

    match cli.command {
        Commands::Check => {
            let cohorts = cohort::cohorts(&respondents);
            println!(
                "{} questions, {} respondents across {} cohorts.",
                schema.number_of_questions(),
                respondents.len(),
                cohorts.len()
            );
            for tag in cohorts {
                let members = cohort::filter_cohort(&respondents, &tag);
                println!("- {}: {} respondents", tag, members.len());
            }
        }
        Commands::Score {
            cohort: requested,
            limit,
            json,
        } => {
            let groups = cohort::partition(&respondents, &requested);
            warn_empty(&groups);
            let rankings = ranking::rank_cohorts(Arc::new(schema), groups, limit).await?;

            if json {
                println!("{}", report::render_json(&rankings)?);
            } else {
                print!("{}", report::render_console(&rankings, limit, strip_domain));
            }
        }
        Commands::Report {
            cohort: requested,
            out_dir,
            template,
            per_page,
        } => {
            let page_template = match template {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read template {}", path.display()))?,
                None => report::DEFAULT_PAGE_TEMPLATE.to_string(),
            };

            let groups = cohort::partition(&respondents, &requested);
            warn_empty(&groups);
            let rankings =
                ranking::rank_cohorts(Arc::new(schema), groups, report::REPORT_SLOTS).await?;

            std::fs::create_dir_all(&out_dir)
                .with_context(|| format!("failed to create {}", out_dir.display()))?;
            let generated_on = Utc::now().date_naive();

            for ranking in &rankings {
                let document = report::build_document(
                    ranking,
                    &page_template,
                    strip_domain,
                    per_page,
                    generated_on,
                );
                let out = out_dir.join(report::document_file_name(&ranking.cohort));
                std::fs::write(&out, document)
                    .with_context(|| format!("failed to write {}", out.display()))?;
                info!(cohort = %ranking.cohort, path = %out.display(), "report written");
                println!("Report written to {}.", out.display());
            }
        }
    }

    Ok(())
}

fn warn_empty(groups: &[(String, Vec<models::Respondent>)]) {
    for (tag, members) in groups {
        if members.is_empty() {
            warn!(cohort = %tag, "no respondents in cohort");
        }
    }
}
