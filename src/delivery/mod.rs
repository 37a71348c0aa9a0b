//! Text delivery to chat destinations.
//!
//! The scraping core only needs "deliver this text"; [`Notifier`] fans one
//! message out to every configured [`Destination`] through a [`Deliver`]
//! implementation and logs per-destination failures.

pub mod console;
pub mod telegram;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::app::{PricetapError, Result};

pub use console::ConsoleSink;
pub use telegram::TelegramSink;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Standard output of this process
    Console,
    /// A Telegram chat id
    Chat(i64),
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Console => f.write_str("console"),
            Destination::Chat(id) => write!(f, "chat {}", id),
        }
    }
}

#[async_trait]
pub trait Deliver: Send + Sync {
    async fn deliver(&self, destination: &Destination, text: &str) -> Result<()>;
}

/// Routes each destination kind to the sink that can reach it.
pub struct Router {
    console: ConsoleSink,
    telegram: Option<TelegramSink>,
}

impl Router {
    pub fn new(telegram: Option<TelegramSink>) -> Self {
        Self {
            console: ConsoleSink,
            telegram,
        }
    }
}

#[async_trait]
impl Deliver for Router {
    async fn deliver(&self, destination: &Destination, text: &str) -> Result<()> {
        match destination {
            Destination::Console => self.console.deliver(destination, text).await,
            Destination::Chat(_) => match &self.telegram {
                Some(sink) => sink.deliver(destination, text).await,
                None => Err(PricetapError::Delivery(format!(
                    "no Telegram token configured for {}",
                    destination
                ))),
            },
        }
    }
}

/// Sends each message to all destinations.
#[derive(Clone)]
pub struct Notifier {
    sink: Arc<dyn Deliver>,
    destinations: Vec<Destination>,
}

impl Notifier {
    pub fn new(sink: Arc<dyn Deliver>, destinations: Vec<Destination>) -> Self {
        Self { sink, destinations }
    }

    pub fn destinations(&self) -> &[Destination] {
        &self.destinations
    }

    /// Deliver `text` everywhere; returns how many destinations accepted it.
    pub async fn notify(&self, text: &str) -> usize {
        let mut delivered = 0;
        for destination in &self.destinations {
            match self.sink.deliver(destination, text).await {
                Ok(()) => {
                    delivered += 1;
                    info!("Sent update to {}", destination);
                }
                Err(e) => warn!("Failed to send message to {}: {}", destination, e),
            }
        }
        delivered
    }
}
