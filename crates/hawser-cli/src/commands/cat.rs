//! Write a remote file to stdout.

use std::io::{self, Write};

use anyhow::Result;
use clap::Args as ClapArgs;

use crate::connect::{ConnectOpts, Remote};

#[derive(ClapArgs, Clone)]
pub struct Args {
    /// Remote file URL
    pub url: String,
}

pub fn run(args: &Args, opts: &ConnectOpts) -> Result<()> {
    let remote = Remote::open(&args.url, opts)?;
    let data = remote.fs.read(&remote.path)?;
    io::stdout().write_all(&data)?;
    remote.fs.close();
    Ok(())
}
