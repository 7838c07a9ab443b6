//! Minimal CLI parsing for one-shot queries.

use anyhow::{Result, bail};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create and validate entity tables, then exit
    Sync,
    /// List one page of assets of a type
    Assets {
        page_index: String,
        page_size: String,
        asset_type: String,
    },
    /// Show one asset
    Asset { id: String },
    /// Show one project
    Project { id: String },
}

pub const USAGE: &str = "usage: spx-backend <sync | assets <pageIndex> <pageSize> <assetType> | asset <id> | project <id>>";

impl Command {
    pub fn from_args() -> Result<Self> {
        Self::parse(std::env::args().skip(1))
    }

    pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let args: Vec<String> = args.into_iter().collect();
        let words: Vec<&str> = args.iter().map(String::as_str).collect();

        let command = match words.as_slice() {
            ["sync"] => Command::Sync,
            ["assets", page_index, page_size, asset_type] => Command::Assets {
                page_index: page_index.to_string(),
                page_size: page_size.to_string(),
                asset_type: asset_type.to_string(),
            },
            ["asset", id] => Command::Asset { id: id.to_string() },
            ["project", id] => Command::Project { id: id.to_string() },
            _ => bail!("{}", USAGE),
        };
        Ok(command)
    }
}
