use anyhow::{Result, bail};
use serde::Serialize;

/// Output format for command results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// JSON - machine-parseable
    Json,
}

impl OutputFormat {
    /// Serialize data to the requested format
    pub fn serialize<T: Serialize>(self, data: &T) -> Result<String> {
        match self {
            Self::Json => {
                serde_json::to_string_pretty(data).map_err(|e| anyhow::anyhow!("JSON serialization failed: {e}"))
            }
            Self::Text => bail!("Text format should not use serialize()"),
        }
    }

    /// Print `data` as JSON, or run `text` to print it by hand.
    pub fn emit<T: Serialize>(self, data: &T, text: impl FnOnce(&T)) -> Result<()> {
        match self {
            Self::Json => println!("{}", self.serialize(data)?),
            Self::Text => text(data),
        }
        Ok(())
    }
}
