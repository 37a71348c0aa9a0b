use std::time::Duration;

use tracing::{error, info, warn};

use crate::app::SessionFault;
use crate::config::RetryConfig;
use crate::delivery::Notifier;
use crate::domain::{Quote, ResultTable, Target};
use crate::fetcher::{unique_targets, QuoteSource};
use crate::report::ReportFormatter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            max_retries: max_retries.max(1),
            retry_delay,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_retries, config.retry_delay())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryStatus {
    Pending,
    Attempting,
    Succeeded,
    Exhausted,
    /// The browser session died before this target finished
    Aborted,
}

impl RetryStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Exhausted | Self::Aborted)
    }
}

/// Per-target progress through one retry run.
#[derive(Debug, Clone)]
pub struct RetryState {
    pub target: Target,
    pub status: RetryStatus,
    pub attempts_made: u32,
    max_attempts: u32,
    pub best: Option<Quote>,
}

impl RetryState {
    fn new(target: Target, max_attempts: u32) -> Self {
        Self {
            target,
            status: RetryStatus::Pending,
            attempts_made: 0,
            max_attempts,
            best: None,
        }
    }

    pub fn attempts_remaining(&self) -> u32 {
        self.max_attempts.saturating_sub(self.attempts_made)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Apply one attempt's quote. Returns true if this attempt succeeded.
    fn record(&mut self, quote: Quote) -> bool {
        self.attempts_made += 1;
        let succeeded = quote.is_available();
        self.best = Some(quote);

        self.status = if succeeded {
            RetryStatus::Succeeded
        } else if self.attempts_remaining() == 0 {
            RetryStatus::Exhausted
        } else {
            RetryStatus::Attempting
        };
        succeeded
    }
}

#[derive(Debug)]
pub struct RetryOutcome {
    pub states: Vec<RetryState>,
    pub partials_sent: usize,
    pub fault: Option<SessionFault>,
}

impl RetryOutcome {
    pub fn all_succeeded(&self) -> bool {
        self.states.iter().all(|s| s.status == RetryStatus::Succeeded)
    }

    /// Last quote per target that was attempted at least once.
    pub fn table(&self) -> ResultTable {
        let mut table = ResultTable::new();
        for quote in self.states.iter().filter_map(|s| s.best.clone()) {
            let _ = table.insert(quote);
        }
        table
    }
}

/// Bounded-attempt loop over a small set of tracked targets.
///
/// Each round gives every unfinished target one attempt, then waits
/// `retry_delay` before the next round. A success while another target is
/// still unfinished is delivered right away as a partial update.
pub struct RetryController<'a> {
    policy: RetryPolicy,
    notifier: &'a Notifier,
    formatter: &'a ReportFormatter,
}

impl<'a> RetryController<'a> {
    pub fn new(policy: RetryPolicy, notifier: &'a Notifier, formatter: &'a ReportFormatter) -> Self {
        Self {
            policy,
            notifier,
            formatter,
        }
    }

    pub async fn run(&self, source: &dyn QuoteSource, targets: &[Target]) -> RetryOutcome {
        let max = self.policy.max_retries;
        let mut states: Vec<RetryState> = unique_targets(targets)
            .into_iter()
            .cloned()
            .map(|t| RetryState::new(t, max))
            .collect();
        let mut partials_sent = 0;
        let mut fault = None;

        'rounds: for round in 1..=max {
            for i in 0..states.len() {
                if states[i].is_terminal() {
                    continue;
                }

                states[i].status = RetryStatus::Attempting;
                let attempt = states[i].attempts_made + 1;
                info!(
                    "Fetching {} (attempt {}/{})",
                    states[i].target.display_name(),
                    attempt,
                    max
                );

                let quote = match source.fetch(&states[i].target, attempt).await {
                    Ok(quote) => quote,
                    Err(f) => {
                        fault = Some(f);
                        break 'rounds;
                    }
                };

                if !states[i].record(quote) {
                    if states[i].status == RetryStatus::Exhausted {
                        warn!(
                            "{} unavailable after {} attempts",
                            states[i].target.display_name(),
                            max
                        );
                    }
                    continue;
                }

                let waiting: Vec<&RetryState> = states.iter().filter(|s| !s.is_terminal()).collect();
                if !waiting.is_empty() {
                    let text = self.formatter.partial(&states[i], &waiting);
                    self.notifier.notify(&text).await;
                    partials_sent += 1;
                }
            }

            if states.iter().all(RetryState::is_terminal) {
                break;
            }
            if round < max && !self.policy.retry_delay.is_zero() {
                info!("Retrying in {:?}", self.policy.retry_delay);
                tokio::time::sleep(self.policy.retry_delay).await;
            }
        }

        if let Some(ref f) = fault {
            error!("Browser session failed during retries: {}", f);
            for state in states.iter_mut().filter(|s| !s.is_terminal()) {
                state.status = RetryStatus::Aborted;
            }
        }

        let text = self.formatter.final_report(&states);
        self.notifier.notify(&text).await;

        RetryOutcome {
            states,
            partials_sent,
            fault,
        }
    }
}
