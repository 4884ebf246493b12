//! SFTP session factory and session.
//!
//! The factory owns a single-thread tokio runtime; every session it
//! mints carries a handle to that runtime and drives its SSH traffic
//! through `block_on`, so the capability surface stays blocking.

use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use russh::client;
use russh::keys::known_hosts::{known_host_keys_path, learn_known_hosts_path};
use russh::keys::ssh_key;
use russh::keys::{PrivateKey, PrivateKeyWithHashAlg, load_secret_key};
use russh::Disconnect;
use russh_sftp::client::SftpSession as SftpClient;
use russh_sftp::client::error::Error as SftpClientError;
use russh_sftp::protocol::{OpenFlags, StatusCode};
use secrecy::ExposeSecret;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::runtime::Runtime;

use hawser_core::path::join_root;
use hawser_core::{
    Capability, DirEntry, FileInfo, FileType, MountIdentity, ProtocolKind, ProviderSession,
    SessionFactory, VfsError, WriteMode,
};

use crate::options::{HostKeyPolicy, SftpMountOptions};

const CAPABILITIES: &[Capability] = &[
    Capability::Read,
    Capability::Write,
    Capability::Append,
    Capability::List,
    Capability::Stat,
    Capability::Mkdir,
    Capability::Delete,
    Capability::Rename,
];

const COPY_CHUNK: usize = 32 * 1024;

/// Session factory for `sftp://` mounts.
pub struct SftpSessionFactory {
    identity: MountIdentity,
    options: SftpMountOptions,
    username: String,
    runtime: Arc<Runtime>,
}

impl SftpSessionFactory {
    /// Default SSH port.
    pub const DEFAULT_PORT: u16 = 22;

    /// Build a factory, resolving the effective user name and creating
    /// the runtime that will drive this mount's SSH traffic.
    pub fn new(identity: MountIdentity, options: SftpMountOptions) -> Result<Self, VfsError> {
        let username = if identity.credentials().username().is_empty() {
            whoami::username()
        } else {
            identity.credentials().username().to_owned()
        };
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| VfsError::Config(format!("cannot start sftp runtime: {e}")))?;
        Ok(Self {
            identity,
            options,
            username,
            runtime: Arc::new(runtime),
        })
    }

    async fn connect(&self) -> Result<(client::Handle<HostKeyHandler>, SftpClient), VfsError> {
        let endpoint = self.identity.endpoint();
        let config = Arc::new(client::Config {
            inactivity_timeout: self.options.mount.io_timeout,
            ..Default::default()
        });
        let handler = HostKeyHandler {
            host: self.identity.host().to_owned(),
            port: self.identity.port(),
            policy: self.options.host_key.clone(),
        };

        let addr = (self.identity.host(), self.identity.port());
        let mut handle = tokio::time::timeout(
            self.options.mount.connect_timeout,
            client::connect(config, addr, handler),
        )
        .await
        .map_err(|_| VfsError::Connect {
            endpoint: endpoint.clone(),
            message: format!(
                "connect timed out after {}s",
                self.options.mount.connect_timeout.as_secs()
            ),
        })?
        .map_err(|e| VfsError::Connect {
            endpoint: endpoint.clone(),
            message: e.to_string(),
        })?;

        self.authenticate(&mut handle).await?;

        let channel = handle
            .channel_open_session()
            .await
            .map_err(|e| VfsError::Connect {
                endpoint: endpoint.clone(),
                message: format!("cannot open session channel: {e}"),
            })?;
        channel
            .request_subsystem(true, "sftp")
            .await
            .map_err(|e| VfsError::Connect {
                endpoint: endpoint.clone(),
                message: format!("sftp subsystem rejected: {e}"),
            })?;
        let sftp = SftpClient::new(channel.into_stream())
            .await
            .map_err(|e| VfsError::Connect {
                endpoint,
                message: format!("sftp session init failed: {e}"),
            })?;

        Ok((handle, sftp))
    }

    async fn authenticate(
        &self,
        handle: &mut client::Handle<HostKeyHandler>,
    ) -> Result<(), VfsError> {
        let auth_failed = || VfsError::Auth {
            user: self.username.clone(),
            endpoint: self.identity.endpoint(),
        };

        if let Some(password) = self.identity.credentials().password() {
            let outcome = handle
                .authenticate_password(&self.username, password.expose_secret())
                .await
                .map_err(|e| VfsError::Connect {
                    endpoint: self.identity.endpoint(),
                    message: e.to_string(),
                })?;
            if !outcome.success() {
                return Err(auth_failed());
            }
            return Ok(());
        }

        let key = load_private_key(self.options.key_file.as_deref())?;
        let hash_alg = handle
            .best_supported_rsa_hash()
            .await
            .map_err(|e| VfsError::Connect {
                endpoint: self.identity.endpoint(),
                message: e.to_string(),
            })?
            .flatten();
        let outcome = handle
            .authenticate_publickey(
                &self.username,
                PrivateKeyWithHashAlg::new(Arc::new(key), hash_alg),
            )
            .await
            .map_err(|e| VfsError::Connect {
                endpoint: self.identity.endpoint(),
                message: e.to_string(),
            })?;
        if !outcome.success() {
            return Err(auth_failed());
        }
        Ok(())
    }
}

impl SessionFactory for SftpSessionFactory {
    fn create(&self) -> Result<Box<dyn ProviderSession>, VfsError> {
        let (handle, sftp) = self.runtime.block_on(self.connect())?;

        let root = self.identity.root().to_owned();
        if root != "/" {
            let attrs = self
                .runtime
                .block_on(sftp.metadata(&root))
                .map_err(|e| {
                    VfsError::Config(format!("cannot access working directory {root}: {e}"))
                })?;
            if !attrs.file_type().is_dir() {
                return Err(VfsError::Config(format!(
                    "working directory {root} is not a directory"
                )));
            }
        }

        tracing::debug!(
            endpoint = %self.identity.endpoint(),
            user = %self.username,
            "sftp session established"
        );

        Ok(Box::new(SftpProviderSession {
            runtime: Arc::clone(&self.runtime),
            sftp,
            ssh: handle,
            root,
            connected: true,
        }))
    }

    fn capabilities(&self) -> &'static [Capability] {
        CAPABILITIES
    }

    fn scheme(&self) -> &'static str {
        "sftp"
    }
}

/// SSH client handler enforcing the configured host-key policy.
struct HostKeyHandler {
    host: String,
    port: u16,
    policy: HostKeyPolicy,
}

impl client::Handler for HostKeyHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &ssh_key::PublicKey,
    ) -> Result<bool, Self::Error> {
        match &self.policy {
            HostKeyPolicy::AcceptAny => {
                tracing::warn!(
                    host = %self.host,
                    port = self.port,
                    "accepting SSH host key without verification"
                );
                Ok(true)
            }
            HostKeyPolicy::KnownHosts(path) => {
                verify_or_learn_host_key(&self.host, self.port, path, server_public_key)
            }
        }
    }
}

fn verify_or_learn_host_key(
    host: &str,
    port: u16,
    known_hosts_path: &Path,
    server_public_key: &ssh_key::PublicKey,
) -> Result<bool, russh::Error> {
    if let Some(parent) = known_hosts_path.parent() {
        std::fs::create_dir_all(parent).map_err(russh::Error::IO)?;
    }

    let known = known_host_keys_path(host, port, known_hosts_path)?;
    if known.iter().any(|(_, key)| key == server_public_key) {
        return Ok(true);
    }
    if known.is_empty() {
        learn_known_hosts_path(host, port, server_public_key, known_hosts_path)?;
        tracing::warn!(
            host,
            port,
            known_hosts = %known_hosts_path.display(),
            "learned new SSH host key"
        );
        return Ok(true);
    }
    Err(russh::Error::KeyChanged { line: known[0].0 })
}

/// Load the configured private key, or scan the usual `~/.ssh` names.
fn load_private_key(explicit: Option<&Path>) -> Result<PrivateKey, VfsError> {
    if let Some(path) = explicit {
        return load_secret_key(path, None).map_err(|e| {
            VfsError::Config(format!("cannot load SSH key {}: {e}", path.display()))
        });
    }

    let home =
        dirs::home_dir().ok_or_else(|| VfsError::Config("cannot determine home directory".into()))?;
    for name in ["id_ed25519", "id_rsa", "id_ecdsa"] {
        let candidate = home.join(".ssh").join(name);
        if candidate.exists() {
            match load_secret_key(&candidate, None) {
                Ok(key) => return Ok(key),
                Err(e) => {
                    tracing::debug!(path = %candidate.display(), error = %e, "skipping key");
                }
            }
        }
    }
    Err(VfsError::Config(
        "no password given and no usable SSH private key found in ~/.ssh".into(),
    ))
}

struct SftpProviderSession {
    runtime: Arc<Runtime>,
    sftp: SftpClient,
    ssh: client::Handle<HostKeyHandler>,
    root: String,
    connected: bool,
}

impl SftpProviderSession {
    fn full(&self, path: &str) -> String {
        join_root(&self.root, path)
    }
}

impl ProviderSession for SftpProviderSession {
    fn is_connected(&self) -> bool {
        self.connected && !self.ssh.is_closed()
    }

    fn disconnect(&mut self) {
        if !self.connected {
            return;
        }
        self.connected = false;
        let result = self.runtime.block_on(async {
            self.ssh
                .disconnect(Disconnect::ByApplication, "closing", "en")
                .await
        });
        if let Err(e) = result {
            tracing::warn!(error = %e, "ssh disconnect failed, dropping connection");
        }
    }

    fn list(&mut self, path: &str) -> Result<Vec<DirEntry>, VfsError> {
        let remote = self.full(path);
        let runtime = Arc::clone(&self.runtime);
        runtime.block_on(async {
            let dir = self
                .sftp
                .read_dir(&remote)
                .await
                .map_err(|e| map_sftp_err("readdir", path, &e))?;
            let mut entries = Vec::new();
            for entry in dir {
                let name = entry.file_name();
                if name == "." || name == ".." {
                    continue;
                }
                entries.push(DirEntry {
                    name,
                    info: info_from_attrs(&entry.metadata()),
                });
            }
            Ok(entries)
        })
    }

    fn stat(&mut self, path: &str) -> Result<FileInfo, VfsError> {
        let remote = self.full(path);
        let runtime = Arc::clone(&self.runtime);
        runtime.block_on(async {
            let attrs = self
                .sftp
                .metadata(&remote)
                .await
                .map_err(|e| map_sftp_err("stat", path, &e))?;
            Ok(info_from_attrs(&attrs))
        })
    }

    fn read_to(&mut self, path: &str, sink: &mut dyn Write) -> Result<u64, VfsError> {
        let remote = self.full(path);
        let runtime = Arc::clone(&self.runtime);
        runtime.block_on(async {
            let mut file = self
                .sftp
                .open_with_flags(&remote, OpenFlags::READ)
                .await
                .map_err(|e| map_sftp_err("open", path, &e))?;
            let mut chunk = vec![0u8; COPY_CHUNK];
            let mut total = 0u64;
            loop {
                let n = file
                    .read(&mut chunk)
                    .await
                    .map_err(|e| VfsError::from_io("read", path, &e))?;
                if n == 0 {
                    break;
                }
                sink.write_all(&chunk[..n])
                    .map_err(|e| VfsError::from_io("read", path, &e))?;
                total += n as u64;
            }
            Ok(total)
        })
    }

    fn write_from(
        &mut self,
        path: &str,
        source: &mut dyn Read,
        mode: WriteMode,
    ) -> Result<u64, VfsError> {
        let remote = self.full(path);
        let flags = match mode {
            WriteMode::Overwrite => OpenFlags::CREATE | OpenFlags::WRITE | OpenFlags::TRUNCATE,
            WriteMode::Append => OpenFlags::CREATE | OpenFlags::WRITE | OpenFlags::APPEND,
        };
        let runtime = Arc::clone(&self.runtime);
        runtime.block_on(async {
            let mut file = self
                .sftp
                .open_with_flags(&remote, flags)
                .await
                .map_err(|e| map_sftp_err("create", path, &e))?;
            let mut chunk = vec![0u8; COPY_CHUNK];
            let mut total = 0u64;
            loop {
                let n = match source.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => n,
                    Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(VfsError::from_io("write", path, &e)),
                };
                file.write_all(&chunk[..n])
                    .await
                    .map_err(|e| VfsError::from_io("write", path, &e))?;
                total += n as u64;
            }
            file.flush()
                .await
                .map_err(|e| VfsError::from_io("write", path, &e))?;
            file.shutdown()
                .await
                .map_err(|e| VfsError::from_io("close", path, &e))?;
            Ok(total)
        })
    }

    fn mkdir(&mut self, path: &str) -> Result<(), VfsError> {
        let remote = self.full(path);
        let runtime = Arc::clone(&self.runtime);
        runtime.block_on(async {
            self.sftp
                .create_dir(&remote)
                .await
                .map_err(|e| map_sftp_err("mkdir", path, &e))
        })
    }

    fn remove_file(&mut self, path: &str) -> Result<(), VfsError> {
        let remote = self.full(path);
        let runtime = Arc::clone(&self.runtime);
        runtime.block_on(async {
            self.sftp
                .remove_file(&remote)
                .await
                .map_err(|e| map_sftp_err("delete", path, &e))
        })
    }

    fn remove_dir(&mut self, path: &str) -> Result<(), VfsError> {
        let remote = self.full(path);
        let runtime = Arc::clone(&self.runtime);
        runtime.block_on(async {
            self.sftp
                .remove_dir(&remote)
                .await
                .map_err(|e| map_sftp_err("rmdir", path, &e))
        })
    }

    fn rename(&mut self, from: &str, to: &str) -> Result<(), VfsError> {
        let from_remote = self.full(from);
        let to_remote = self.full(to);
        let runtime = Arc::clone(&self.runtime);
        runtime.block_on(async {
            self.sftp
                .rename(&from_remote, &to_remote)
                .await
                .map_err(|e| map_sftp_err("rename", from, &e))
        })
    }
}

impl Drop for SftpProviderSession {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn info_from_attrs(attrs: &russh_sftp::protocol::FileAttributes) -> FileInfo {
    let kind = attrs.file_type();
    let file_type = if kind.is_dir() {
        FileType::Directory
    } else if kind.is_symlink() {
        FileType::Symlink
    } else if kind.is_file() {
        FileType::File
    } else {
        FileType::Other
    };
    FileInfo {
        file_type,
        size: attrs.size,
        modified: attrs
            .mtime
            .map(|secs| SystemTime::UNIX_EPOCH + Duration::from_secs(u64::from(secs))),
    }
}

/// Map a native client error onto the core taxonomy.
fn map_sftp_err(op: &'static str, path: &str, err: &SftpClientError) -> VfsError {
    match err {
        SftpClientError::Status(status) => {
            let kind = match status.status_code {
                StatusCode::NoSuchFile => ProtocolKind::NotFound,
                StatusCode::PermissionDenied => ProtocolKind::PermissionDenied,
                StatusCode::OpUnsupported => ProtocolKind::Unsupported,
                // Connection-class statuses behave like a dead transport.
                StatusCode::NoConnection | StatusCode::ConnectionLost | StatusCode::BadMessage => {
                    return VfsError::Io {
                        op,
                        message: err.to_string(),
                    };
                }
                _ => ProtocolKind::Other,
            };
            VfsError::Protocol {
                kind,
                path: path.to_owned(),
            }
        }
        _ => VfsError::Io {
            op,
            message: err.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_taxonomy() {
        let status = |code| {
            SftpClientError::Status(russh_sftp::protocol::Status {
                id: 0,
                status_code: code,
                error_message: String::new(),
                language_tag: String::new(),
            })
        };

        assert!(matches!(
            map_sftp_err("stat", "/x", &status(StatusCode::NoSuchFile)),
            VfsError::Protocol {
                kind: ProtocolKind::NotFound,
                ..
            }
        ));
        assert!(matches!(
            map_sftp_err("stat", "/x", &status(StatusCode::PermissionDenied)),
            VfsError::Protocol {
                kind: ProtocolKind::PermissionDenied,
                ..
            }
        ));
        assert!(map_sftp_err("stat", "/x", &status(StatusCode::ConnectionLost)).is_transient());
    }
}
