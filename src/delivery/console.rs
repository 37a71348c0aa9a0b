use async_trait::async_trait;

use crate::app::{PricetapError, Result};
use crate::delivery::{Deliver, Destination};

/// Prints messages to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

#[async_trait]
impl Deliver for ConsoleSink {
    async fn deliver(&self, destination: &Destination, text: &str) -> Result<()> {
        match destination {
            Destination::Console => {
                println!("{}\n", text);
                Ok(())
            }
            other => Err(PricetapError::Delivery(format!(
                "console sink cannot reach {}",
                other
            ))),
        }
    }
}
