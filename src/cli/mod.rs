pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "pricetap")]
#[command(about = "Scrape prices with a headless browser and relay them", long_about = None)]
pub struct Cli {
    /// Configuration file (default: ~/.config/pricetap/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Also send messages to the configured Telegram chats
    #[arg(short, long, global = true)]
    pub telegram: bool,

    /// Tabs opened per batch, overriding the config file
    #[arg(short, long, global = true)]
    pub batch_size: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch every configured source once and send a price update
    Quote,
    /// Retry each source until it yields a price or runs out of attempts
    Watch,
    /// Fetch the full model x storage price matrix
    Matrix,
    /// List configured targets and their URLs
    Targets,
    /// Print the configuration file path
    ConfigPath,
}

impl Commands {
    /// Whether this command drives a browser session.
    pub fn needs_browser(&self) -> bool {
        matches!(self, Commands::Quote | Commands::Watch | Commands::Matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["pricetap", "quote", "--telegram", "-b", "3"]).unwrap();
        assert!(cli.telegram);
        assert_eq!(cli.batch_size, Some(3));
        assert!(matches!(cli.command, Commands::Quote));
        assert!(cli.command.needs_browser());
    }

    #[test]
    fn test_config_path_subcommand() {
        let cli = Cli::try_parse_from(["pricetap", "--config", "/tmp/p.toml", "config-path"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/p.toml")));
        assert!(!cli.command.needs_browser());
    }
}
