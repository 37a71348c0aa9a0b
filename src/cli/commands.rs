use tracing::{error, info};

use crate::app::{AppContext, PricetapError, Result};
use crate::domain::ResultTable;
use crate::fetcher::{RetryController, RetryOutcome, SessionQuoteSource};
use crate::scraper::BrowserSession;

/// One pass over every configured source, delivered as a price update.
///
/// The update is sent even when the browser dies part way; the fault is
/// returned afterwards.
pub async fn quote(ctx: &AppContext, session: &dyn BrowserSession) -> Result<ResultTable> {
    let targets = ctx.config.source_targets()?;
    println!("Fetching {} sources...", targets.len());

    let report = ctx.aggregator.run(session, &targets).await;
    let text = ctx.formatter.price_update(&targets, &report.table);
    ctx.notifier.notify(&text).await;

    match report.fault {
        Some(fault) => Err(fault.into()),
        None => Ok(report.table),
    }
}

/// Retry every configured source until it prices or runs out of attempts.
pub async fn watch(ctx: &AppContext, session: &dyn BrowserSession) -> Result<RetryOutcome> {
    let targets = ctx.config.source_targets()?;
    info!(
        "Watching {} sources, up to {} attempts each",
        targets.len(),
        ctx.retry_policy.max_retries
    );

    let source = SessionQuoteSource::new(session, &ctx.aggregator);
    let controller = RetryController::new(ctx.retry_policy, &ctx.notifier, &ctx.formatter);
    let mut outcome = controller.run(&source, &targets).await;

    match outcome.fault.take() {
        Some(fault) => Err(fault.into()),
        None => Ok(outcome),
    }
}

/// Fetch the `[matrix]` grid and deliver it as one message.
pub async fn matrix(ctx: &AppContext, session: &dyn BrowserSession) -> Result<ResultTable> {
    let matrix = ctx.config.matrix.as_ref().ok_or_else(|| {
        PricetapError::Other(format!(
            "No [matrix] section in {}",
            ctx.config_path.display()
        ))
    })?;
    let targets = matrix.targets(&ctx.config.browser)?;
    println!(
        "Fetching {} prices ({} models x {} storages)...",
        targets.len(),
        matrix.models.len(),
        matrix.storages.len()
    );

    let report = ctx.aggregator.run(session, &targets).await;
    let text = ctx
        .formatter
        .matrix(&matrix.label, &matrix.models, &matrix.storages, &report.table);
    ctx.notifier.notify(&text).await;

    if let Some(fault) = report.fault {
        error!(
            "Browser session failed; {} of {} prices fetched",
            report.table.available_count(),
            targets.len()
        );
        return Err(fault.into());
    }
    Ok(report.table)
}

pub fn list_targets(ctx: &AppContext) -> Result<()> {
    let sources = ctx.config.source_targets()?;
    if sources.is_empty() {
        println!("No sources configured");
    }
    for target in &sources {
        println!("{}\n  {}", target.heading(), target.url());
    }

    if let Some(targets) = ctx.config.matrix_targets()? {
        println!("\nMatrix: {} targets", targets.len());
        for target in &targets {
            println!("  {}  {}", target.id, target.url());
        }
    }

    Ok(())
}
