//! Download a remote file.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Args as ClapArgs;

use crate::commands::format_size;
use crate::connect::{ConnectOpts, Remote};

#[derive(ClapArgs, Clone)]
pub struct Args {
    /// Remote file URL
    pub url: String,

    /// Local target path (defaults to the remote file name)
    pub target: Option<PathBuf>,
}

pub fn run(args: &Args, opts: &ConnectOpts) -> Result<()> {
    let remote = Remote::open(&args.url, opts)?;

    let target = match &args.target {
        Some(path) => path.clone(),
        None => {
            let Some((_, name)) = hawser_core::path::split_parent(&remote.path) else {
                bail!("cannot derive a local file name from {}", remote.path);
            };
            PathBuf::from(name)
        }
    };

    let bytes = remote.fs.download(&remote.path, &target)?;
    if !opts.quiet {
        eprintln!("{} -> {} ({})", remote.path, target.display(), format_size(bytes));
    }
    remote.fs.close();
    Ok(())
}
