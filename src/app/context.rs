use std::path::PathBuf;
use std::sync::Arc;

use tracing::warn;

use crate::app::error::Result;
use crate::config::Config;
use crate::delivery::{Notifier, Router, TelegramSink};
use crate::fetcher::{Aggregator, RetryPolicy};
use crate::report::ReportFormatter;

pub struct AppContext {
    pub config: Config,
    pub config_path: PathBuf,
    pub notifier: Notifier,
    pub aggregator: Aggregator,
    pub formatter: ReportFormatter,
    pub retry_policy: RetryPolicy,
}

impl AppContext {
    /// Wire up delivery from `config`. With `telegram` set, the bot token must
    /// be present in the configured environment variable.
    pub fn new(config: Config, config_path: PathBuf, telegram: bool) -> Result<Self> {
        let sink = if telegram {
            if config.delivery.chat_ids.is_empty() {
                warn!("Telegram delivery enabled but no chat_ids are configured");
            }
            Some(TelegramSink::from_env(
                &config.delivery.telegram_token_env,
                config.delivery.api_base.clone(),
            )?)
        } else {
            None
        };

        let notifier = Notifier::new(
            Arc::new(Router::new(sink)),
            config.delivery.destinations(telegram),
        );
        Ok(Self::with_notifier(config, config_path, notifier))
    }

    pub fn with_notifier(config: Config, config_path: PathBuf, notifier: Notifier) -> Self {
        let aggregator = Aggregator::from_config(&config.browser);
        let formatter = ReportFormatter::from_minutes(config.report.utc_offset_minutes);
        let retry_policy = RetryPolicy::from_config(&config.retry);

        Self {
            config,
            config_path,
            notifier,
            aggregator,
            formatter,
            retry_policy,
        }
    }
}
