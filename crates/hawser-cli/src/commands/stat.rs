//! Show attributes of one entry.

use anyhow::Result;
use clap::Args as ClapArgs;
use serde::Serialize;

use crate::commands::{format_mtime, format_size, type_label};
use crate::connect::{ConnectOpts, Remote};

#[derive(ClapArgs, Clone)]
pub struct Args {
    /// Remote entry URL
    pub url: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct StatOutput {
    path: String,
    #[serde(rename = "type")]
    entry_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    modified: Option<String>,
}

pub fn run(args: &Args, opts: &ConnectOpts) -> Result<()> {
    let remote = Remote::open(&args.url, opts)?;
    let info = remote.fs.stat(&remote.path)?;

    if args.json {
        let output = StatOutput {
            path: remote.path.clone(),
            entry_type: type_label(info.file_type),
            size: info.size,
            modified: info
                .modified
                .map(|t| humantime::format_rfc3339_seconds(t).to_string()),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("path:     {}", remote.path);
        println!("type:     {}", type_label(info.file_type));
        println!(
            "size:     {}",
            info.size.map_or_else(|| "-".to_owned(), format_size)
        );
        println!("modified: {}", format_mtime(info.modified));
    }

    remote.fs.close();
    Ok(())
}
