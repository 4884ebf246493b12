//! Upload a local file.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args as ClapArgs;

use hawser_core::WriteMode;

use crate::commands::format_size;
use crate::connect::{ConnectOpts, Remote};

#[derive(ClapArgs, Clone)]
pub struct Args {
    /// Local source file
    pub source: PathBuf,

    /// Remote target URL
    pub url: String,

    /// Append to the remote file instead of replacing it
    #[arg(long)]
    pub append: bool,
}

pub fn run(args: &Args, opts: &ConnectOpts) -> Result<()> {
    let remote = Remote::open(&args.url, opts)?;
    let mode = if args.append {
        WriteMode::Append
    } else {
        WriteMode::Overwrite
    };
    let bytes = remote.fs.upload(&args.source, &remote.path, mode)?;
    if !opts.quiet {
        eprintln!(
            "{} -> {} ({})",
            args.source.display(),
            remote.path,
            format_size(bytes)
        );
    }
    remote.fs.close();
    Ok(())
}
