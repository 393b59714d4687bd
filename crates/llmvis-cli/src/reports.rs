use anyhow::Context;
use clap::Subcommand;
use llmvis_analysis::{group_by, summarize};
use llmvis_core::{DimensionFilters, GroupDimension};

#[derive(Debug, Subcommand)]
pub enum ReportsCommands {
    /// List stored reports, newest first
    List {
        /// Only reports attributed to this owner
        #[arg(long)]
        owner: Option<String>,
        #[arg(long, default_value = "20")]
        limit: i64,
        #[arg(long, default_value = "0")]
        offset: i64,
    },
    /// Show one report's parameters and overall KPIs
    Show {
        /// Report id
        id: i64,
    },
    /// Delete a report and its responses
    Delete {
        /// Report id
        id: i64,
    },
}

pub(crate) async fn run_reports(
    pool: &sqlx::PgPool,
    command: ReportsCommands,
) -> anyhow::Result<()> {
    match command {
        ReportsCommands::List {
            owner,
            limit,
            offset,
        } => run_reports_list(pool, owner.as_deref(), limit, offset).await,
        ReportsCommands::Show { id } => run_reports_show(pool, id).await,
        ReportsCommands::Delete { id } => run_reports_delete(pool, id).await,
    }
}

async fn run_reports_list(
    pool: &sqlx::PgPool,
    owner: Option<&str>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<()> {
    let rows = llmvis_db::list_reports(pool, owner, limit.clamp(1, 200), offset.max(0)).await?;

    if rows.is_empty() {
        println!("no reports found");
        return Ok(());
    }

    println!(
        "{:<8} {:<24} {:<16} {:>9}  CREATED",
        "ID", "BRAND", "OWNER", "RESPONSES"
    );
    for row in &rows {
        println!(
            "{:<8} {:<24} {:<16} {:>9}  {}",
            row.id,
            truncate(&row.brand_name, 24),
            truncate(row.owner.as_deref().unwrap_or("-"), 16),
            row.response_count,
            row.created_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

async fn run_reports_show(pool: &sqlx::PgPool, id: i64) -> anyhow::Result<()> {
    let report = llmvis_db::get_report(pool, id)
        .await?
        .with_context(|| format!("report {id} not found"))?;

    println!("report {}: {}", report.id, report.brand_name);
    println!("  owner:       {}", report.owner.as_deref().unwrap_or("-"));
    println!("  created:     {}", report.created_at.to_rfc3339());
    println!("  competitors: {}", report.competitor_names.join(", "));
    println!("  models:      {}", report.models.join(", "));
    println!("  keywords:    {}", report.keywords.join(", "));
    println!("  regions:     {}", report.regions.join(", "));
    println!("  languages:   {}", report.languages.join(", "));
    println!("  templates:   {}", report.prompt_templates.len());

    let kpis = &report.kpis.0;
    println!();
    println!("  responses:          {}", kpis.total_responses);
    println!("  brand mentions:     {}", kpis.brand_mentions);
    println!("  mention percentage: {:.2}", kpis.brand_mention_percentage);
    println!("  share of voice:     {:.2}", kpis.share_of_voice);
    println!("  citation rate:      {:.2}", kpis.citation_rate);
    for (name, count) in &kpis.competitor_mention_counts {
        println!("  {name:<19} {count}");
    }
    Ok(())
}

async fn run_reports_delete(pool: &sqlx::PgPool, id: i64) -> anyhow::Result<()> {
    llmvis_db::delete_report(pool, id)
        .await
        .with_context(|| format!("failed to delete report {id}"))?;
    tracing::info!(report_id = id, "report deleted");
    println!("report {id} deleted");
    Ok(())
}

/// Prints the KPI summary for a report's filtered responses as JSON,
/// partitioned when `dimension` is set.
pub(crate) async fn run_kpis(
    pool: &sqlx::PgPool,
    report_id: i64,
    filters: &DimensionFilters,
    dimension: Option<GroupDimension>,
) -> anyhow::Result<()> {
    let report = llmvis_db::get_report(pool, report_id)
        .await?
        .with_context(|| format!("report {report_id} not found"))?;
    let rows = llmvis_db::list_responses(pool, report_id, filters, None, 0).await?;

    let output = match dimension {
        None => serde_json::json!({
            "report_id": report_id,
            "filters": filters,
            "total_count": rows.len(),
            "kpis": summarize(rows.iter().map(|r| &r.kpis.0), &report.competitor_names),
        }),
        Some(dimension) => serde_json::json!({
            "report_id": report_id,
            "filters": filters,
            "total_count": rows.len(),
            "group_by": dimension,
            "groups": group_by(&rows, dimension, &report.competitor_names),
        }),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub(crate) fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let kept: String = value.chars().take(width.saturating_sub(1)).collect();
    format!("{kept}~")
}
