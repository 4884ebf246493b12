//! `hawser` — file operations against remote mounts (FTP, FTPS, SFTP,
//! SMB2) over one pooled session per mount.

#![forbid(unsafe_code)]

mod commands;
mod connect;
mod exit_code;

use std::io::{self, IsTerminal, Read};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::{cat, get, ls, mkdir, mv, put, rm, stat};

/// File operations against remote mounts.
#[derive(Parser)]
#[command(name = "hawser")]
#[command(author, version)]
#[command(propagate_version = true)]
#[command(after_help = "EXAMPLES:
    # List a directory
    hawser ls ftp://mirror.example.org/pub

    # Download over SFTP, reading the password from stdin
    echo \"$SECRET\" | hawser --password-stdin get sftp://deploy@build.example.org/artifacts/app.tar.gz

    # Upload, appending to a remote log
    hawser put --append report.log ftps://ops@files.example.org/logs/report.log

    # SMB share (build with --features smb)
    hawser ls smb://CORP\\;svc@nas.example.org/projects/alpha
")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Password for the remote (insecure; prefer --password-stdin)
    #[arg(long, env = "HAWSER_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    /// Read the password from stdin (single line)
    #[arg(long, conflicts_with = "password", global = true)]
    password_stdin: bool,

    /// Connect timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 10, global = true)]
    connect_timeout: u64,

    /// I/O timeout in seconds (transport default when omitted)
    #[arg(long, value_name = "SECS", global = true)]
    io_timeout: Option<u64>,

    /// Use active mode for FTP data connections
    #[arg(long, global = true)]
    ftp_active: bool,

    /// Verify SSH host keys against ~/.ssh/known_hosts
    #[arg(long, global = true)]
    strict_host_key: bool,

    /// SSH private key file for SFTP
    #[arg(long, value_name = "FILE", global = true)]
    identity: Option<std::path::PathBuf>,

    /// SMB workgroup
    #[arg(long, value_name = "NAME", global = true)]
    workgroup: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List directory contents
    Ls(ls::Args),
    /// Show entry attributes
    Stat(stat::Args),
    /// Write a remote file to stdout
    Cat(cat::Args),
    /// Download a remote file
    Get(get::Args),
    /// Upload a local file
    Put(put::Args),
    /// Create a directory
    Mkdir(mkdir::Args),
    /// Delete a file or directory
    Rm(rm::Args),
    /// Rename within one mount
    Mv(mv::Args),
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::from(exit_code::SUCCESS),
        Err(e) => {
            let code = exit_code::categorize(&e);
            let args: Vec<String> = std::env::args().collect();
            let is_quiet = args.iter().any(|a| a == "-q" || a == "--quiet");
            if !is_quiet {
                eprintln!("Error: {e:#}");
            }
            ExitCode::from(code)
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let password = resolve_password(&cli)?;
    let opts = connect::ConnectOpts {
        password,
        connect_timeout: std::time::Duration::from_secs(cli.connect_timeout),
        io_timeout: cli.io_timeout.map(std::time::Duration::from_secs),
        ftp_active: cli.ftp_active,
        strict_host_key: cli.strict_host_key,
        identity: cli.identity.clone(),
        workgroup: cli.workgroup.clone(),
        quiet: cli.quiet,
    };

    match &cli.command {
        Commands::Ls(args) => ls::run(args, &opts),
        Commands::Stat(args) => stat::run(args, &opts),
        Commands::Cat(args) => cat::run(args, &opts),
        Commands::Get(args) => get::run(args, &opts),
        Commands::Put(args) => put::run(args, &opts),
        Commands::Mkdir(args) => mkdir::run(args, &opts),
        Commands::Rm(args) => rm::run(args, &opts),
        Commands::Mv(args) => mv::run(args, &opts),
    }
}

fn resolve_password(cli: &Cli) -> Result<Option<String>> {
    if cli.password_stdin {
        if io::stdin().is_terminal() {
            bail!("--password-stdin given but stdin is a terminal");
        }
        let mut line = String::new();
        io::stdin()
            .read_to_string(&mut line)
            .context("reading password from stdin")?;
        let line = line.lines().next().unwrap_or("").to_owned();
        if line.is_empty() {
            bail!("--password-stdin given but stdin was empty");
        }
        return Ok(Some(line));
    }
    Ok(cli.password.clone())
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(io::stderr)
        .init();
}

