mod analyze;
mod reports;

use clap::{Parser, Subcommand};
use llmvis_core::GroupDimension;
use tracing_subscriber::EnvFilter;

use crate::analyze::AnalyzeArgs;
use crate::reports::ReportsCommands;

#[derive(Debug, Parser)]
#[command(name = "llmvis-cli")]
#[command(about = "Brand visibility analysis across text-generation models")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Run a batch analysis and store its report
    Analyze(AnalyzeArgs),
    /// Inspect and delete stored reports
    Reports {
        #[command(subcommand)]
        command: ReportsCommands,
    },
    /// Print visibility KPIs for a report as JSON
    Kpis {
        /// Report id
        report_id: i64,
        #[arg(long)]
        region: Option<String>,
        #[arg(long)]
        language_code: Option<String>,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        keyword: Option<String>,
        #[arg(long)]
        prompt_template: Option<String>,
        /// Partition by region, language_code, model, keyword or prompt_template
        #[arg(long)]
        group_by: Option<GroupDimension>,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("llmvis-cli ready; run with --help to list commands");
        return Ok(());
    };

    let config = llmvis_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let pool_config = llmvis_db::PoolConfig::from_app_config(&config);
    let pool = llmvis_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Db { command } => run_db(&pool, command).await?,
        Commands::Analyze(args) => analyze::run_analyze(&pool, &config, args).await?,
        Commands::Reports { command } => reports::run_reports(&pool, command).await?,
        Commands::Kpis {
            report_id,
            region,
            language_code,
            model,
            keyword,
            prompt_template,
            group_by,
        } => {
            let filters = llmvis_core::DimensionFilters {
                region,
                language_code,
                model,
                keyword,
                prompt_template,
            };
            reports::run_kpis(&pool, report_id, &filters, group_by).await?;
        }
    }

    pool.close().await;
    Ok(())
}

async fn run_db(pool: &sqlx::PgPool, command: DbCommands) -> anyhow::Result<()> {
    match command {
        DbCommands::Ping => {
            llmvis_db::health_check(pool).await?;
            println!("database ok");
        }
        DbCommands::Migrate => {
            let applied = llmvis_db::run_migrations(pool).await?;
            println!("applied {applied} migration(s)");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests;
