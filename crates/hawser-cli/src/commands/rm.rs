//! Delete a remote file or directory.

use anyhow::Result;
use clap::Args as ClapArgs;

use crate::connect::{ConnectOpts, Remote};

#[derive(ClapArgs, Clone)]
pub struct Args {
    /// Remote entry URL
    pub url: String,
}

pub fn run(args: &Args, opts: &ConnectOpts) -> Result<()> {
    let remote = Remote::open(&args.url, opts)?;
    remote.fs.remove(&remote.path)?;
    remote.fs.close();
    Ok(())
}
