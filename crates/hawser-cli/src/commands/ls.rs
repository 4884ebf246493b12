//! List directory contents.

use anyhow::Result;
use clap::Args as ClapArgs;
use serde::Serialize;

use crate::commands::{format_mtime, format_size, type_label};
use crate::connect::{ConnectOpts, Remote};

#[derive(ClapArgs, Clone)]
pub struct Args {
    /// Remote directory URL
    pub url: String,

    /// Show size and modification time
    #[arg(short, long)]
    pub long: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct LsOutput {
    path: String,
    entries: Vec<EntryInfo>,
}

#[derive(Serialize)]
struct EntryInfo {
    name: String,
    #[serde(rename = "type")]
    entry_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    modified: Option<String>,
}

pub fn run(args: &Args, opts: &ConnectOpts) -> Result<()> {
    let remote = Remote::open(&args.url, opts)?;
    let mut entries = remote.fs.list(&remote.path)?;
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    if args.json {
        let output = LsOutput {
            path: remote.path.clone(),
            entries: entries
                .iter()
                .map(|e| EntryInfo {
                    name: e.name.clone(),
                    entry_type: type_label(e.info.file_type),
                    size: e.info.size,
                    modified: e
                        .info
                        .modified
                        .map(|t| humantime::format_rfc3339_seconds(t).to_string()),
                })
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if args.long {
        for e in &entries {
            println!(
                "{:<5} {:>10} {:<20} {}",
                type_label(e.info.file_type),
                e.info.size.map_or_else(|| "-".to_owned(), format_size),
                format_mtime(e.info.modified),
                e.name
            );
        }
    } else {
        for e in &entries {
            println!("{}", e.name);
        }
    }

    remote.fs.close();
    Ok(())
}
