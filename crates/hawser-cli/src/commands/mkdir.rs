//! Create a remote directory.

use anyhow::Result;
use clap::Args as ClapArgs;

use crate::connect::{ConnectOpts, Remote};

#[derive(ClapArgs, Clone)]
pub struct Args {
    /// Remote directory URL
    pub url: String,
}

pub fn run(args: &Args, opts: &ConnectOpts) -> Result<()> {
    let remote = Remote::open(&args.url, opts)?;
    remote.fs.mkdir(&remote.path)?;
    remote.fs.close();
    Ok(())
}
