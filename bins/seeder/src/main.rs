//! Seeds a demo construction project and logs its budget rollups.
//!
//! Runs against PostgreSQL when `database.url` is configured (run the
//! migrator first) and in memory otherwise. Re-running against a seeded
//! database only prints the rollups.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use anyhow::Context;
use rust_decimal::Decimal;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use chantier_core::budget::{BudgetLinePatch, NewBudgetLine, RollupScope};
use chantier_core::change_order::{ChangeOrderType, NewChangeOrder, Numbering};
use chantier_core::division::DivisionTaxonomy;
use chantier_core::project::ProjectBudgetService;
use chantier_core::repository::{BudgetLineRepository, ChangeOrderRepository, MemoryRepository};
use chantier_db::{PgRepository, connect_with_config};
use chantier_shared::AppConfig;
use chantier_shared::config::{LedgerConfig, LoggingConfig};
use chantier_shared::types::{ProjectId, TaxRates};

/// Demo project ID (stable across runs).
const DEMO_PROJECT_ID: ProjectId = ProjectId::from_uuid(Uuid::from_u128(1));

/// Contract budget of the demo project.
fn nominal_budget() -> Decimal {
    Decimal::new(250_000, 0)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.logging);

    let taxonomy = Arc::new(load_taxonomy(&config.ledger)?);
    let numbering = Numbering::new(
        config.ledger.change_order_prefix.clone(),
        config.ledger.number_width,
    );

    if let Some(database) = &config.database {
        let db = connect_with_config(database)
            .await
            .context("Failed to connect to database")?;
        info!("Connected to database");
        run(Arc::new(PgRepository::new(db)), taxonomy, numbering, config.tax).await
    } else {
        warn!("No database configured, seeding in memory");
        run(Arc::new(MemoryRepository::new()), taxonomy, numbering, config.tax).await
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    let registry = tracing_subscriber::registry().with(filter);
    if logging.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn load_taxonomy(ledger: &LedgerConfig) -> anyhow::Result<DivisionTaxonomy> {
    let Some(path) = &ledger.taxonomy_path else {
        return Ok(DivisionTaxonomy::masterformat());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read division taxonomy {path}"))?;
    let taxonomy = DivisionTaxonomy::from_json(&json)
        .with_context(|| format!("Invalid division taxonomy {path}"))?;
    info!(path = %path, divisions = taxonomy.len(), "Division taxonomy loaded");
    Ok(taxonomy)
}

async fn run<R>(
    repo: Arc<R>,
    taxonomy: Arc<DivisionTaxonomy>,
    numbering: Numbering,
    tax: TaxRates,
) -> anyhow::Result<()>
where
    R: BudgetLineRepository + ChangeOrderRepository,
{
    let mut service =
        ProjectBudgetService::load(repo, DEMO_PROJECT_ID, taxonomy, numbering, nominal_budget())
            .await?;

    if service.ledger().is_empty() && service.register().is_empty() {
        seed(&mut service).await?;
        info!(project_id = %DEMO_PROJECT_ID, "Demo project seeded");
    } else {
        info!(project_id = %DEMO_PROJECT_ID, "Demo project already seeded, skipping");
    }

    report(&service, tax);
    Ok(())
}

async fn seed<R>(service: &mut ProjectBudgetService<R>) -> anyhow::Result<()>
where
    R: BudgetLineRepository + ChangeOrderRepository,
{
    let lines = [
        ("03 30 00", "Cast-in-place concrete", 50_000, 30_000, 28_000, 52_000),
        ("05 12 00", "Structural steel", 80_000, 75_000, 40_000, 78_000),
        ("09 29 00", "Gypsum board", 35_000, 10_000, 0, 35_000),
        ("26 05 00", "Electrical common work", 60_000, 20_000, 12_000, 61_500),
    ];
    for (division, description, original, committed, actual, forecast) in lines {
        let id = service
            .add_line(NewBudgetLine::new(division, description, Decimal::new(original, 0)))
            .await?
            .id;
        service
            .update_line(
                id,
                &BudgetLinePatch::default()
                    .committed(Decimal::new(committed, 0))
                    .actual(Decimal::new(actual, 0))
                    .forecast(Decimal::new(forecast, 0)),
            )
            .await?;
    }

    let footing = service
        .create_change_order(
            NewChangeOrder::new(
                "Deeper footings",
                ChangeOrderType::Addition,
                Decimal::new(12_500, 0),
            )
            .division("03")
            .reason("Soil report"),
        )
        .await?
        .id;
    service.submit(footing).await?;
    service.approve(footing).await?;

    let credit = service
        .create_change_order(
            NewChangeOrder::new(
                "Owner-supplied finishes",
                ChangeOrderType::Deduction,
                Decimal::new(4_000, 0),
            )
            .division("09"),
        )
        .await?
        .id;
    service.submit(credit).await?;
    service.approve(credit).await?;

    let panel = service
        .create_change_order(
            NewChangeOrder::new(
                "Second electrical panel",
                ChangeOrderType::Addition,
                Decimal::new(7_500, 0),
            )
            .division("26"),
        )
        .await?
        .id;
    service.submit(panel).await?;

    service
        .create_change_order(NewChangeOrder::new(
            "Swap door hardware supplier",
            ChangeOrderType::NoCost,
            Decimal::ZERO,
        ))
        .await?;

    Ok(())
}

fn report<R>(service: &ProjectBudgetService<R>, tax: TaxRates)
where
    R: BudgetLineRepository + ChangeOrderRepository,
{
    for rollup in service.rollup_by_division(RollupScope::Used) {
        info!(
            division = %rollup.division_code,
            name = rollup.division_name.as_deref().unwrap_or("unclassified"),
            lines = rollup.line_count,
            budget_current = %rollup.totals.budget_current,
            forecast = %rollup.totals.forecast,
            variance = %rollup.totals.variance,
            status = ?rollup.totals.variance_status(),
            "Division rollup"
        );
    }

    let totals = service.rollup_project();
    info!(
        budget_current = %totals.budget_current,
        committed = %totals.committed,
        actual = %totals.actual,
        variance = %totals.variance,
        utilization = %totals.utilization_percent(),
        "Project totals"
    );

    let rollup = service.project_rollup();
    info!(
        budget_original = %rollup.budget_original,
        additions_approved = %rollup.additions_approved,
        deductions_approved = %rollup.deductions_approved,
        pending = %rollup.pending_amount,
        budget_revised = %rollup.budget_revised,
        percent_variation = %rollup.percent_variation,
        "Change-order rollup"
    );

    let invoice = tax.apply(rollup.additions_approved);
    info!(
        subtotal = %invoice.subtotal,
        federal_tax = %invoice.federal_tax,
        provincial_tax = %invoice.provincial_tax,
        total = %invoice.total,
        "Approved additions invoiced"
    );
}
