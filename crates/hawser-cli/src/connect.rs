//! URL → mounted file system dispatch.
//!
//! The operation URL carries everything: scheme, endpoint, credentials
//! and the remote path. The mount root is `/` for FTP/FTPS/SFTP, with
//! the URL path as the operation path; for SMB the first path component
//! names the share and joins the mount root, the remainder being the
//! operation path.

use anyhow::{Result, bail};
use secrecy::SecretString;
use url::Url;

use hawser_core::{Credentials, MountIdentity, MountOptions, RemoteFs, SessionFactory, VfsError};

/// Connection-relevant options gathered from the CLI surface.
pub struct ConnectOpts {
    pub password: Option<String>,
    pub connect_timeout: std::time::Duration,
    pub io_timeout: Option<std::time::Duration>,
    pub ftp_active: bool,
    pub strict_host_key: bool,
    pub identity: Option<std::path::PathBuf>,
    pub workgroup: Option<String>,
    pub quiet: bool,
}

impl ConnectOpts {
    fn mount_options(&self) -> MountOptions {
        MountOptions {
            connect_timeout: self.connect_timeout,
            io_timeout: self.io_timeout,
            eager_connect: true,
        }
    }
}

/// One mounted file system plus the path the command operates on.
pub struct Remote {
    pub fs: RemoteFs,
    pub path: String,
}

impl Remote {
    /// Mount the file system behind `url_str` and split off the
    /// operation path.
    pub fn open(url_str: &str, opts: &ConnectOpts) -> Result<Self> {
        let url = Url::parse(url_str)?;
        match url.scheme() {
            "ftp" => open_ftp(&url, opts, false),
            "ftps" => open_ftp(&url, opts, true),
            "sftp" => open_sftp(&url, opts),
            "smb" => open_smb(&url, opts),
            other => bail!(
                "unsupported scheme {other}://; supported: {}",
                enabled_schemes().join(", ")
            ),
        }
    }
}

/// Mount via the factory, honouring the eager-connect option.
fn mount(factory: Box<dyn SessionFactory>, options: &MountOptions) -> Result<RemoteFs, VfsError> {
    if options.eager_connect {
        RemoteFs::open(factory)
    } else {
        Ok(RemoteFs::open_lazy(factory))
    }
}

/// Rebuild credentials with the URL password taking precedence over the
/// CLI-supplied one.
fn merged_credentials(probe: &MountIdentity, opts: &ConnectOpts) -> Credentials {
    let password = probe
        .credentials()
        .password()
        .cloned()
        .or_else(|| opts.password.as_ref().map(|p| SecretString::from(p.clone())));
    let mut credentials = Credentials::new(probe.credentials().username(), password);
    if let Some(domain) = probe.credentials().domain() {
        credentials = credentials.with_domain(domain);
    }
    credentials
}

fn enabled_schemes() -> Vec<&'static str> {
    let mut schemes = Vec::new();
    #[cfg(feature = "ftp")]
    schemes.extend(["ftp", "ftps"]);
    #[cfg(feature = "sftp")]
    schemes.push("sftp");
    #[cfg(feature = "smb")]
    schemes.push("smb");
    schemes
}

#[cfg(feature = "ftp")]
fn open_ftp(url: &Url, opts: &ConnectOpts, secure: bool) -> Result<Remote> {
    use hawser_ftp::{FtpMountOptions, FtpSecurity, FtpSessionFactory};

    let probe = MountIdentity::from_url(url, FtpSessionFactory::DEFAULT_PORT)?;
    let path = probe.root().to_owned();
    let identity = MountIdentity::new(
        probe.host(),
        probe.port(),
        merged_credentials(&probe, opts),
        "/",
    );
    let options = FtpMountOptions {
        mount: opts.mount_options(),
        passive: !opts.ftp_active,
        security: if secure {
            FtpSecurity::Explicit
        } else {
            FtpSecurity::None
        },
    };
    let mount_options = options.mount.clone();
    let factory = FtpSessionFactory::new(identity, options)?;
    Ok(Remote {
        fs: mount(Box::new(factory), &mount_options)?,
        path,
    })
}

#[cfg(not(feature = "ftp"))]
fn open_ftp(_url: &Url, _opts: &ConnectOpts, _secure: bool) -> Result<Remote> {
    bail!("ftp support is not enabled; rebuild with --features ftp")
}

#[cfg(feature = "sftp")]
fn open_sftp(url: &Url, opts: &ConnectOpts) -> Result<Remote> {
    use hawser_sftp::{HostKeyPolicy, SftpMountOptions, SftpSessionFactory};

    let probe = MountIdentity::from_url(url, SftpSessionFactory::DEFAULT_PORT)?;
    let path = probe.root().to_owned();
    let identity = MountIdentity::new(
        probe.host(),
        probe.port(),
        merged_credentials(&probe, opts),
        "/",
    );
    let host_key = if opts.strict_host_key {
        HostKeyPolicy::known_hosts_default()?
    } else {
        HostKeyPolicy::AcceptAny
    };
    let options = SftpMountOptions {
        mount: opts.mount_options(),
        host_key,
        key_file: opts.identity.clone(),
    };
    let mount_options = options.mount.clone();
    let factory = SftpSessionFactory::new(identity, options)?;
    Ok(Remote {
        fs: mount(Box::new(factory), &mount_options)?,
        path,
    })
}

#[cfg(not(feature = "sftp"))]
fn open_sftp(_url: &Url, _opts: &ConnectOpts) -> Result<Remote> {
    bail!("sftp support is not enabled; rebuild with --features sftp")
}

#[cfg(feature = "smb")]
fn open_smb(url: &Url, opts: &ConnectOpts) -> Result<Remote> {
    use hawser_smb::{SmbMountOptions, SmbSessionFactory};

    let probe = MountIdentity::from_url(url, SmbSessionFactory::DEFAULT_PORT)?;

    // smb://host/share/a/b mounts share `/share` and operates on `/a/b`.
    let trimmed = probe.root().trim_start_matches('/');
    let (share, path) = match trimmed.split_once('/') {
        Some((share, rest)) => (format!("/{share}"), format!("/{rest}")),
        None if !trimmed.is_empty() => (format!("/{trimmed}"), "/".to_owned()),
        None => bail!("smb URLs must name a share: smb://host/share[/path]"),
    };

    let identity = MountIdentity::new(
        probe.host(),
        probe.port(),
        merged_credentials(&probe, opts),
        &share,
    );
    let options = SmbMountOptions {
        mount: opts.mount_options(),
        workgroup: opts.workgroup.clone(),
    };
    let mount_options = options.mount.clone();
    let factory = SmbSessionFactory::new(identity, options)?;
    Ok(Remote {
        fs: mount(Box::new(factory), &mount_options)?,
        path,
    })
}

#[cfg(not(feature = "smb"))]
fn open_smb(_url: &Url, _opts: &ConnectOpts) -> Result<Remote> {
    bail!("smb support is not enabled; rebuild with --features smb")
}
