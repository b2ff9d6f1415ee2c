//! Uniform Allocation operator CLI
//!
//! Loads the school list and inventory, runs optimizations and checks
//! scanned SKUs against the resulting picking list.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use shared::{
    dashboard, picking_sections, picking_summary, school_cards, sku_gauges, top_bottleneck,
    Locale, SchoolSort, ScanVerdict, UploadKind,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uniform_allocation_client::{App, ClientError, Config, HttpGateway, PollSchedule};

#[derive(Parser)]
#[command(name = "uops", version, about = "School uniform allocation client")]
struct Cli {
    /// Override the configured UI language (es, en)
    #[arg(long, global = true)]
    locale: Option<Locale>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Coverage and school status summary
    Dashboard,
    /// School list with selection and bottleneck counts
    Schools {
        #[arg(long, default_value = "students")]
        sort: SchoolSort,
    },
    /// Stock usage per SKU
    Inventory,
    /// Run an optimization and print its outcome
    Optimize,
    /// Upload a CSV file
    Upload { kind: UploadKind, file: PathBuf },
    /// Run an optimization and check SKUs against its picking list
    Verify {
        #[arg(required = true)]
        skus: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "uops=info,uniform_allocation_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;
    let locale = cli.locale.unwrap_or(config.locale);

    let gateway = HttpGateway::from_config(&config.api)?;
    tracing::info!("Environment: {}", config.environment);
    tracing::info!("API: {}", gateway.base_url());

    let app = App::new(
        Arc::new(gateway),
        PollSchedule::from(&config.polling),
        locale,
    );

    run(&app, cli.command, &Labels::for_locale(locale))
        .await
        .map_err(|e| {
            let message = e.user_message(locale);
            anyhow::Error::new(e).context(message)
        })
}

async fn run(app: &App, command: Command, labels: &Labels) -> Result<(), ClientError> {
    match command {
        Command::Dashboard => {
            app.refresh().await?;
            print_dashboard(app, labels);
        }
        Command::Schools { sort } => {
            app.fetch_schools().await?;
            let state = app.state();
            for card in school_cards(&state.schools, state.last_result.as_ref(), sort) {
                let mark = if card.is_selected { "*" } else { " " };
                println!(
                    "{} {:<12} {:>6} {}  {}: {}",
                    mark,
                    card.school.school_id,
                    card.school.total_students,
                    labels.students,
                    labels.bottleneck,
                    card.shortage_count
                );
            }
        }
        Command::Inventory => {
            app.fetch_inventory().await?;
            let state = app.state();
            for gauge in sku_gauges(&state.inventory) {
                println!(
                    "{:<16} {:>4}% [{}] {}/{}",
                    gauge.item.sku_id,
                    gauge.percent,
                    gauge.severity.as_str(),
                    gauge.item.allocated,
                    gauge.item.total_stock_available
                );
            }
        }
        Command::Optimize => {
            app.refresh().await?;
            app.run_optimization().await?;
            print_dashboard(app, labels);

            let state = app.state();
            match top_bottleneck(state.last_result.as_ref()) {
                Some(shortage) => println!(
                    "{}: {} @ {} (-{})",
                    labels.bottleneck, shortage.sku_id, shortage.school_id, shortage.deficit
                ),
                None => println!("{}", labels.no_bottleneck),
            }

            let sections = picking_sections(state.picking_list.as_ref());
            let summary = picking_summary(&sections);
            println!(
                "{}: {} {}, {} {}",
                labels.picking,
                summary.school_count,
                labels.schools,
                summary.student_count,
                labels.students
            );
        }
        Command::Upload { kind, file } => {
            let text = std::fs::read_to_string(&file)
                .map_err(|e| ClientError::Configuration(format!("{}: {}", file.display(), e)))?;
            let outcome = app.upload_csv(kind, &text).await?;
            println!("{}: {}", labels.upserted, outcome.upserted);
            for error in &outcome.errors {
                println!("  {}", error);
            }
        }
        Command::Verify { skus } => {
            app.run_optimization().await?;
            for sku in &skus {
                let verdict = match app.verify_scan(sku) {
                    Some(ScanVerdict::Approved) => labels.approved,
                    _ => labels.rejected,
                };
                println!("{:<16} {}", sku, verdict);
            }
        }
    }
    Ok(())
}

fn print_dashboard(app: &App, labels: &Labels) {
    let state = app.state();
    let summary = dashboard(&state.schools, state.last_result.as_ref());
    println!(
        "{}: {}% ({}/{})",
        labels.coverage, summary.coverage_percent, summary.students_served, summary.total_students
    );
    println!(
        "{}: {}  {}: {}",
        labels.eligible, summary.eligible, labels.blocked, summary.blocked
    );
}

/// Output labels for one locale
struct Labels {
    coverage: &'static str,
    eligible: &'static str,
    blocked: &'static str,
    students: &'static str,
    schools: &'static str,
    bottleneck: &'static str,
    no_bottleneck: &'static str,
    picking: &'static str,
    upserted: &'static str,
    approved: &'static str,
    rejected: &'static str,
}

impl Labels {
    fn for_locale(locale: Locale) -> Self {
        match locale {
            Locale::En => Self {
                coverage: "Coverage",
                eligible: "Eligible",
                blocked: "Blocked",
                students: "students",
                schools: "schools",
                bottleneck: "Bottleneck",
                no_bottleneck: "No bottlenecks",
                picking: "Picking list",
                upserted: "Rows upserted",
                approved: "APPROVED",
                rejected: "NOT ON PICKING LIST",
            },
            Locale::Es => Self {
                coverage: "Cobertura",
                eligible: "Elegibles",
                blocked: "Bloqueadas",
                students: "estudiantes",
                schools: "escuelas",
                bottleneck: "Cuello de botella",
                no_bottleneck: "Sin cuellos de botella",
                picking: "Lista de picking",
                upserted: "Filas cargadas",
                approved: "APROBADO",
                rejected: "NO ESTÁ EN LA LISTA",
            },
        }
    }
}
