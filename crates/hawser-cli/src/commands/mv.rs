//! Rename within one mount.

use anyhow::Result;
use clap::Args as ClapArgs;

use crate::connect::{ConnectOpts, Remote};

#[derive(ClapArgs, Clone)]
pub struct Args {
    /// Remote source URL
    pub url: String,

    /// Target path on the same mount (no scheme or host)
    pub to: String,
}

pub fn run(args: &Args, opts: &ConnectOpts) -> Result<()> {
    let remote = Remote::open(&args.url, opts)?;
    remote.fs.rename(&remote.path, &args.to)?;
    remote.fs.close();
    Ok(())
}
