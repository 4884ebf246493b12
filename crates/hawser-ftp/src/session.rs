//! FTP session factory and session.
//!
//! One `suppaftp` control connection per session. The factory performs
//! connect, optional TLS upgrade, login, binary transfer type, data
//! connection mode and the initial working-directory change; a failure in
//! any of those maps onto the core error taxonomy and the session is
//! never handed out half-configured.

use std::io::{Read, Write};
use std::net::{SocketAddr, ToSocketAddrs};

use secrecy::ExposeSecret;
use suppaftp::native_tls::TlsConnector;
use suppaftp::types::FileType as FtpTransferType;
use suppaftp::{FtpError, FtpStream, Mode, NativeTlsConnector, NativeTlsFtpStream, Status};

use hawser_core::path::join_root;
use hawser_core::{
    Capability, DirEntry, FileInfo, FileType, MountIdentity, ProtocolKind, ProviderSession,
    SessionFactory, VfsError, WriteMode,
};

use crate::options::{FtpMountOptions, FtpSecurity};

/// User name substituted when the mount URL carries none.
const ANONYMOUS: &str = "anonymous";

/// Dispatch one call to whichever transport variant is live. Both stream
/// types expose the same inherent API.
macro_rules! with_stream {
    ($transport:expr, $s:ident => $call:expr) => {
        match &mut $transport {
            FtpTransport::Clear($s) => $call,
            FtpTransport::Secure($s) => $call,
        }
    };
}

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

/// Session factory for `ftp://` and `ftps://` mounts.
pub struct FtpSessionFactory {
    identity: MountIdentity,
    options: FtpMountOptions,
}

impl FtpSessionFactory {
    /// Default FTP control port.
    pub const DEFAULT_PORT: u16 = 21;

    /// Build a factory, validating the options bag.
    pub fn new(identity: MountIdentity, options: FtpMountOptions) -> Result<Self, VfsError> {
        if options.security == FtpSecurity::Implicit {
            return Err(VfsError::Config(
                "implicit FTPS is not supported; use explicit AUTH TLS (ftps:// with default \
                 options)"
                    .into(),
            ));
        }
        Ok(Self { identity, options })
    }

    fn resolve(&self) -> Result<SocketAddr, VfsError> {
        let endpoint = self.identity.endpoint();
        (self.identity.host(), self.identity.port())
            .to_socket_addrs()
            .map_err(|e| VfsError::Connect {
                endpoint: endpoint.clone(),
                message: e.to_string(),
            })?
            .next()
            .ok_or(VfsError::Connect {
                endpoint,
                message: "host resolved to no addresses".into(),
            })
    }

    fn connect_transport(&self, addr: SocketAddr) -> Result<FtpTransport, VfsError> {
        let endpoint = self.identity.endpoint();
        let timeout = self.options.mount.connect_timeout;
        match self.options.security {
            FtpSecurity::None => {
                let stream =
                    FtpStream::connect_timeout(addr, timeout).map_err(|e| VfsError::Connect {
                        endpoint,
                        message: e.to_string(),
                    })?;
                if let Some(io_timeout) = self.options.mount.io_timeout {
                    stream
                        .get_ref()
                        .set_read_timeout(Some(io_timeout))
                        .map_err(|e| VfsError::Connect {
                            endpoint: self.identity.endpoint(),
                            message: e.to_string(),
                        })?;
                }
                Ok(FtpTransport::Clear(stream))
            }
            FtpSecurity::Explicit => {
                let stream = NativeTlsFtpStream::connect_timeout(addr, timeout).map_err(|e| {
                    VfsError::Connect {
                        endpoint: endpoint.clone(),
                        message: e.to_string(),
                    }
                })?;
                let connector = TlsConnector::new().map_err(|e| VfsError::Connect {
                    endpoint: endpoint.clone(),
                    message: format!("TLS setup failed: {e}"),
                })?;
                let secure = stream
                    .into_secure(NativeTlsConnector::from(connector), self.identity.host())
                    .map_err(|e| VfsError::Connect {
                        endpoint,
                        message: format!("TLS handshake failed: {e}"),
                    })?;
                Ok(FtpTransport::Secure(secure))
            }
            // Rejected in `new`.
            FtpSecurity::Implicit => Err(VfsError::Config("implicit FTPS is not supported".into())),
        }
    }
}

impl SessionFactory for FtpSessionFactory {
    fn create(&self) -> Result<Box<dyn ProviderSession>, VfsError> {
        let addr = self.resolve()?;
        let mut transport = self.connect_transport(addr)?;

        let credentials = self.identity.credentials();
        let user = if credentials.username().is_empty() {
            ANONYMOUS
        } else {
            credentials.username()
        };
        let password = credentials
            .password()
            .map_or(ANONYMOUS.to_owned(), |p| p.expose_secret().to_owned());

        with_stream!(transport, s => s.login(user, password.as_str())).map_err(|e| match &e {
            FtpError::UnexpectedResponse(resp) if resp.status == Status::NotLoggedIn => {
                VfsError::Auth {
                    user: user.to_owned(),
                    endpoint: self.identity.endpoint(),
                }
            }
            _ => VfsError::Connect {
                endpoint: self.identity.endpoint(),
                message: e.to_string(),
            },
        })?;

        // Binary transfers only; a server refusing TYPE I is unusable.
        with_stream!(transport, s => s.transfer_type(FtpTransferType::Binary)).map_err(|e| {
            VfsError::Config(format!("server rejected binary transfer type: {e}"))
        })?;

        let mode = if self.options.passive {
            Mode::Passive
        } else {
            Mode::Active
        };
        with_stream!(transport, s => s.set_mode(mode));

        let root = self.identity.root();
        if root != "/" {
            with_stream!(transport, s => s.cwd(root)).map_err(|e| {
                VfsError::Config(format!("cannot enter working directory {root}: {e}"))
            })?;
        }

        tracing::debug!(
            endpoint = %self.identity.endpoint(),
            user,
            secure = self.options.security == FtpSecurity::Explicit,
            "ftp session established"
        );

        Ok(Box::new(FtpSession {
            transport,
            root: root.to_owned(),
            connected: true,
        }))
    }

    fn capabilities(&self) -> &'static [Capability] {
        CAPABILITIES
    }

    fn scheme(&self) -> &'static str {
        match self.options.security {
            FtpSecurity::None => "ftp",
            _ => "ftps",
        }
    }
}

enum FtpTransport {
    Clear(FtpStream),
    Secure(NativeTlsFtpStream),
}

struct FtpSession {
    transport: FtpTransport,
    root: String,
    connected: bool,
}

impl FtpSession {
    fn full(&self, path: &str) -> String {
        join_root(&self.root, path)
    }
}

impl ProviderSession for FtpSession {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn disconnect(&mut self) {
        if !self.connected {
            return;
        }
        self.connected = false;
        if let Err(e) = with_stream!(self.transport, s => s.quit()) {
            tracing::warn!(error = %e, "ftp quit failed, dropping connection");
        }
    }

    fn list(&mut self, path: &str) -> Result<Vec<DirEntry>, VfsError> {
        let remote = self.full(path);
        let lines = with_stream!(self.transport, s => s.list(Some(&remote)))
            .map_err(|e| map_ftp_err("list", path, e))?;

        let mut entries = Vec::with_capacity(lines.len());
        for line in &lines {
            match suppaftp::list::File::try_from(line.as_str()) {
                Ok(file) => {
                    if file.name() == "." || file.name() == ".." {
                        continue;
                    }
                    let file_type = if file.is_directory() {
                        FileType::Directory
                    } else if file.is_symlink() {
                        FileType::Symlink
                    } else {
                        FileType::File
                    };
                    entries.push(DirEntry {
                        name: file.name().to_owned(),
                        info: FileInfo {
                            file_type,
                            size: file.is_file().then(|| file.size() as u64),
                            modified: Some(file.modified()),
                        },
                    });
                }
                Err(e) => {
                    // Tolerate exotic listing formats instead of failing
                    // the whole directory.
                    tracing::trace!(line = %line, error = %e, "unparseable LIST line skipped");
                }
            }
        }
        Ok(entries)
    }

    fn stat(&mut self, path: &str) -> Result<FileInfo, VfsError> {
        let remote = self.full(path);
        if remote == self.root {
            return Ok(FileInfo::directory());
        }

        // SIZE answers for regular files.
        match with_stream!(self.transport, s => s.size(&remote)) {
            Ok(size) => {
                return Ok(FileInfo {
                    file_type: FileType::File,
                    size: Some(size as u64),
                    modified: None,
                });
            }
            Err(FtpError::UnexpectedResponse(_)) => {}
            Err(e) => return Err(map_ftp_err("stat", path, e)),
        }

        // Not a file; probe for a directory by entering and leaving it.
        let previous = with_stream!(self.transport, s => s.pwd())
            .map_err(|e| map_ftp_err("stat", path, e))?;
        match with_stream!(self.transport, s => s.cwd(&remote)) {
            Ok(()) => {
                with_stream!(self.transport, s => s.cwd(&previous))
                    .map_err(|e| map_ftp_err("stat", path, e))?;
                Ok(FileInfo::directory())
            }
            Err(FtpError::UnexpectedResponse(_)) => Err(VfsError::not_found(path)),
            Err(e) => Err(map_ftp_err("stat", path, e)),
        }
    }

    fn read_to(&mut self, path: &str, sink: &mut dyn Write) -> Result<u64, VfsError> {
        let remote = self.full(path);
        with_stream!(self.transport, s => s.retr(&remote, |reader| {
            std::io::copy(reader, &mut *sink).map_err(FtpError::ConnectionError)
        }))
        .map_err(|e| map_ftp_err("retrieve", path, e))
    }

    fn write_from(
        &mut self,
        path: &str,
        mut source: &mut dyn Read,
        mode: WriteMode,
    ) -> Result<u64, VfsError> {
        let remote = self.full(path);
        let result = match mode {
            WriteMode::Overwrite => {
                with_stream!(self.transport, s => s.put_file(&remote, &mut source))
            }
            WriteMode::Append => {
                with_stream!(self.transport, s => s.append_file(&remote, &mut source))
            }
        };
        result.map_err(|e| map_ftp_err("store", path, e))
    }

    fn mkdir(&mut self, path: &str) -> Result<(), VfsError> {
        let remote = self.full(path);
        with_stream!(self.transport, s => s.mkdir(&remote))
            .map_err(|e| map_ftp_err("mkdir", path, e))
    }

    fn remove_file(&mut self, path: &str) -> Result<(), VfsError> {
        let remote = self.full(path);
        with_stream!(self.transport, s => s.rm(&remote))
            .map_err(|e| map_ftp_err("delete", path, e))
    }

    fn remove_dir(&mut self, path: &str) -> Result<(), VfsError> {
        let remote = self.full(path);
        with_stream!(self.transport, s => s.rmdir(&remote))
            .map_err(|e| map_ftp_err("rmdir", path, e))
    }

    fn rename(&mut self, from: &str, to: &str) -> Result<(), VfsError> {
        let from_remote = self.full(from);
        let to_remote = self.full(to);
        with_stream!(self.transport, s => s.rename(&from_remote, &to_remote))
            .map_err(|e| map_ftp_err("rename", from, e))
    }
}

impl Drop for FtpSession {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Map a native client error onto the core taxonomy.
fn map_ftp_err(op: &'static str, path: &str, err: FtpError) -> VfsError {
    let message = err.to_string();
    match err {
        FtpError::ConnectionError(e) => VfsError::from_io(op, path, &e),
        FtpError::UnexpectedResponse(resp) => match protocol_kind_for(resp.status) {
            Classified::Protocol(kind) => VfsError::Protocol {
                kind,
                path: path.to_owned(),
            },
            Classified::Transient => VfsError::Io { op, message },
        },
        // Garbled control channel, bad addresses from PASV, TLS faults:
        // all consistent with a dead or dying connection.
        _ => VfsError::Io { op, message },
    }
}

enum Classified {
    Protocol(ProtocolKind),
    Transient,
}

fn protocol_kind_for(status: Status) -> Classified {
    match status {
        // 421: service closing the control connection.
        Status::NotAvailable => Classified::Transient,
        Status::FileUnavailable => Classified::Protocol(ProtocolKind::NotFound),
        Status::ExceededStorage => Classified::Protocol(ProtocolKind::Quota),
        Status::NotLoggedIn => Classified::Protocol(ProtocolKind::PermissionDenied),
        Status::BadFilename => Classified::Protocol(ProtocolKind::Other),
        _ => Classified::Protocol(ProtocolKind::Other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hawser_core::Credentials;

    fn identity() -> MountIdentity {
        MountIdentity::new("ftp.example.org", 21, Credentials::default(), "/pub")
    }

    #[test]
    fn implicit_ftps_is_rejected_at_construction() {
        let options = FtpMountOptions {
            security: FtpSecurity::Implicit,
            ..FtpMountOptions::default()
        };
        assert!(matches!(
            FtpSessionFactory::new(identity(), options),
            Err(VfsError::Config(_))
        ));
    }

    #[test]
    fn scheme_follows_security() {
        let plain = FtpSessionFactory::new(identity(), FtpMountOptions::default()).unwrap();
        assert_eq!(plain.scheme(), "ftp");
        let secure = FtpSessionFactory::new(identity(), FtpMountOptions::secure()).unwrap();
        assert_eq!(secure.scheme(), "ftps");
    }

    #[test]
    fn status_classification() {
        assert!(matches!(
            protocol_kind_for(Status::FileUnavailable),
            Classified::Protocol(ProtocolKind::NotFound)
        ));
        assert!(matches!(
            protocol_kind_for(Status::ExceededStorage),
            Classified::Protocol(ProtocolKind::Quota)
        ));
        assert!(matches!(
            protocol_kind_for(Status::NotAvailable),
            Classified::Transient
        ));
    }

    #[test]
    fn capabilities_cover_the_full_surface() {
        let factory = FtpSessionFactory::new(identity(), FtpMountOptions::default()).unwrap();
        assert!(factory.capabilities().contains(&Capability::Append));
        assert!(factory.capabilities().contains(&Capability::Rename));
    }
}
