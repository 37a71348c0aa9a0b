use tracing::{debug, error, info, warn};

use crate::app::SessionFault;
use crate::domain::{Quote, ResultTable, Target, UnavailableReason};
use crate::fetcher::unique_targets;
use crate::scraper::{BrowserSession, NavError, Navigator, PageError, PriceExtractor, ScraperConfig, Tab};

/// Result of one aggregation run.
///
/// `table` holds exactly one quote per unique input target, even when the
/// run was cut short by `fault`.
#[derive(Debug)]
pub struct RunReport {
    pub table: ResultTable,
    pub fault: Option<SessionFault>,
}

/// Fans navigation and extraction out over a list of targets on one session.
#[derive(Debug, Clone)]
pub struct Aggregator {
    navigator: Navigator,
    extractor: PriceExtractor,
    batch_size: usize,
}

impl Aggregator {
    pub fn new(navigator: Navigator, batch_size: usize) -> Self {
        Self {
            navigator,
            extractor: PriceExtractor,
            batch_size: batch_size.max(1),
        }
    }

    pub fn from_config(config: &ScraperConfig) -> Self {
        Self::new(Navigator::from_config(config), config.batch_size())
    }

    /// Quote every target once, `batch_size` tabs at a time.
    ///
    /// Navigations for a batch are issued up front so their network latency
    /// overlaps; waiting and extraction then proceed one tab at a time.
    pub async fn run(&self, session: &dyn BrowserSession, targets: &[Target]) -> RunReport {
        let targets = unique_targets(targets);
        let mut table = ResultTable::new();
        let mut fault: Option<SessionFault> = None;

        info!(
            "Fetching {} targets in batches of {}",
            targets.len(),
            self.batch_size
        );

        for batch in targets.chunks(self.batch_size) {
            if fault.is_some() {
                break;
            }

            let mut opened: Vec<(&Target, Option<Box<dyn Tab>>, Result<(), NavError>)> =
                Vec::with_capacity(batch.len());

            for &target in batch {
                match session.open_tab().await {
                    Ok(tab) => {
                        let begun = self.navigator.begin(tab.as_ref(), &target.url()).await;
                        if let Err(NavError::Session(f)) = &begun {
                            fault = Some(f.clone());
                        }
                        opened.push((target, Some(tab), begun));
                    }
                    Err(PageError::Session(f)) => fault = Some(f),
                    Err(e) => {
                        opened.push((target, None, Err(NavError::Failed(e.to_string()))));
                    }
                }
                if fault.is_some() {
                    break;
                }
            }

            for (target, tab, begun) in opened {
                let Some(tab) = tab else {
                    warn!("Could not open a tab for {}", target.id);
                    record(
                        &mut table,
                        Quote::unavailable(target, UnavailableReason::NavigationFailed, None, 1),
                    );
                    continue;
                };

                if fault.is_some() {
                    let _ = tab.close().await;
                    continue;
                }

                match self.settle(tab.as_ref(), target, 1, begun).await {
                    Ok(quote) => record(&mut table, quote),
                    Err(f) => fault = Some(f),
                }

                if let Err(f) = close_tab(tab).await {
                    fault.get_or_insert(f);
                }
            }

            if fault.is_none() {
                if let Err(f) = restore_home(session).await {
                    fault = Some(f);
                }
            }
        }

        if let Some(ref f) = fault {
            error!("Browser session failed, aborting run: {}", f);
            for target in &targets {
                if !table.contains(&target.id) {
                    record(
                        &mut table,
                        Quote::unavailable(target, UnavailableReason::SessionAborted, None, 1),
                    );
                }
            }
            let _ = session.activate_home().await;
        }

        info!(
            "Run complete: {} of {} targets priced",
            table.available_count(),
            table.len()
        );

        RunReport { table, fault }
    }

    /// One attempt at one target in its own tab.
    pub async fn fetch_one(
        &self,
        session: &dyn BrowserSession,
        target: &Target,
        attempt: u32,
    ) -> Result<Quote, SessionFault> {
        let tab = match session.open_tab().await {
            Ok(tab) => tab,
            Err(PageError::Session(f)) => return Err(f),
            Err(e) => {
                warn!("Could not open a tab for {}: {}", target.id, e);
                return Ok(Quote::unavailable(
                    target,
                    UnavailableReason::NavigationFailed,
                    None,
                    attempt,
                ));
            }
        };

        let begun = self.navigator.begin(tab.as_ref(), &target.url()).await;
        let quote = self.settle(tab.as_ref(), target, attempt, begun).await;
        let closed = close_tab(tab).await;

        let quote = quote?;
        closed?;
        restore_home(session).await?;
        Ok(quote)
    }

    /// Wait for a tab whose navigation was already issued, then extract.
    async fn settle(
        &self,
        tab: &dyn Tab,
        target: &Target,
        attempt: u32,
        begun: Result<(), NavError>,
    ) -> Result<Quote, SessionFault> {
        let profile = target.profile();
        let ready = match begun {
            Ok(()) => {
                self.navigator
                    .await_ready(tab, &profile.ready_selector, profile.ready_timeout)
                    .await
            }
            Err(e) => Err(e),
        };

        match ready {
            Ok(()) => self.extractor.extract(tab, target, attempt).await,
            Err(NavError::Session(f)) => Err(f),
            Err(NavError::Timeout { selector, waited }) => {
                // Error pages usually lack the ready marker
                if profile.not_found.check(tab).await? {
                    debug!("{} is a not-found page", target.id);
                    return Ok(Quote::unavailable(target, UnavailableReason::NotFound, None, attempt));
                }
                warn!(
                    "{}: `{}` did not appear within {:?}",
                    target.display_name(),
                    selector,
                    waited
                );
                Ok(Quote::unavailable(
                    target,
                    UnavailableReason::NavigationTimeout,
                    None,
                    attempt,
                ))
            }
            Err(NavError::Failed(msg)) => {
                warn!("{}: {}", target.display_name(), msg);
                Ok(Quote::unavailable(
                    target,
                    UnavailableReason::NavigationFailed,
                    None,
                    attempt,
                ))
            }
        }
    }
}

/// Drop repeated target ids, keeping the first occurrence.
fn record(table: &mut ResultTable, quote: Quote) {
    if let Err(e) = table.insert(quote) {
        warn!("{}", e);
    }
}

async fn close_tab(tab: Box<dyn Tab>) -> Result<(), SessionFault> {
    match tab.close().await {
        Ok(()) => Ok(()),
        Err(PageError::Session(f)) => Err(f),
        Err(e) => {
            warn!("Failed to close tab: {}", e);
            Ok(())
        }
    }
}

async fn restore_home(session: &dyn BrowserSession) -> Result<(), SessionFault> {
    match session.activate_home().await {
        Ok(()) => Ok(()),
        Err(PageError::Session(f)) => Err(f),
        Err(e) => {
            warn!("Failed to re-activate home tab: {}", e);
            Ok(())
        }
    }
}
