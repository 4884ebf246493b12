//! SMB session factory and session.
//!
//! A session owns one authenticated `pavao::SmbClient` bound to a single
//! share. libsmbclient reports most server rejections as errno-shaped
//! I/O errors, which the core classifier turns into protocol errors.

use std::io::{Read, Write};

use pavao::{SmbClient, SmbCredentials, SmbDirentType, SmbError, SmbMode, SmbOpenOptions, SmbOptions};
use secrecy::ExposeSecret;

use hawser_core::path::{join_root, normalize_root, split_parent};
use hawser_core::{
    Capability, DirEntry, FileInfo, FileType, MountIdentity, ProtocolKind, ProviderSession,
    SessionFactory, VfsError, WriteMode, copy_stream,
};

use crate::options::SmbMountOptions;

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

/// Session factory for `smb://` mounts.
pub struct SmbSessionFactory {
    identity: MountIdentity,
    options: SmbMountOptions,
    share: String,
    root: String,
}

impl SmbSessionFactory {
    /// Default SMB port.
    pub const DEFAULT_PORT: u16 = 445;

    /// Build a factory, splitting the URL path into share and in-share
    /// root.
    pub fn new(identity: MountIdentity, options: SmbMountOptions) -> Result<Self, VfsError> {
        let (share, root) = split_share(identity.root())?;
        Ok(Self {
            identity,
            options,
            share,
            root,
        })
    }
}

/// First path component names the share; the rest is the mount root
/// inside it.
fn split_share(path: &str) -> Result<(String, String), VfsError> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Err(VfsError::Config(
            "smb mount URL must name a share: smb://host/share[/path]".into(),
        ));
    }
    match trimmed.split_once('/') {
        Some((share, rest)) => Ok((format!("/{share}"), normalize_root(rest))),
        None => Ok((format!("/{trimmed}"), "/".to_owned())),
    }
}

impl SessionFactory for SmbSessionFactory {
    fn create(&self) -> Result<Box<dyn ProviderSession>, VfsError> {
        let credentials = self.identity.credentials();
        let workgroup = credentials
            .domain()
            .map(str::to_owned)
            .or_else(|| self.options.workgroup.clone())
            .unwrap_or_default();
        let password = credentials
            .password()
            .map(|p| p.expose_secret().to_owned())
            .unwrap_or_default();

        let server = format!("smb://{}", self.identity.endpoint());
        let client = SmbClient::new(
            SmbCredentials::default()
                .server(&server)
                .share(&self.share)
                .username(credentials.username())
                .password(&password)
                .workgroup(&workgroup),
            SmbOptions::default().one_share_per_server(true),
        )
        .map_err(|e| VfsError::Connect {
            endpoint: self.identity.endpoint(),
            message: e.to_string(),
        })?;

        // The client connects lazily; bind the share now so a bad share
        // or bad credentials fail at session creation.
        client.stat(&self.root).map_err(|e| match classify(&e) {
            Classified::Denied => VfsError::Auth {
                user: credentials.username().to_owned(),
                endpoint: self.identity.endpoint(),
            },
            Classified::Missing => {
                VfsError::Config(format!("working directory {} does not exist", self.root))
            }
            Classified::Failed(message) => VfsError::Connect {
                endpoint: self.identity.endpoint(),
                message,
            },
        })?;

        tracing::debug!(
            endpoint = %self.identity.endpoint(),
            share = %self.share,
            "smb session established"
        );

        Ok(Box::new(SmbProviderSession {
            client: Some(client),
            root: self.root.clone(),
            share: self.share.clone(),
        }))
    }

    fn capabilities(&self) -> &'static [Capability] {
        CAPABILITIES
    }

    fn scheme(&self) -> &'static str {
        "smb"
    }
}

enum Classified {
    Denied,
    Missing,
    Failed(String),
}

fn classify(err: &SmbError) -> Classified {
    match err {
        SmbError::Io(e) if e.kind() == std::io::ErrorKind::PermissionDenied => Classified::Denied,
        SmbError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => Classified::Missing,
        other => Classified::Failed(other.to_string()),
    }
}

struct SmbProviderSession {
    client: Option<SmbClient>,
    root: String,
    share: String,
}

impl SmbProviderSession {
    fn client(&self, op: &'static str) -> Result<&SmbClient, VfsError> {
        self.client.as_ref().ok_or(VfsError::Io {
            op,
            message: "session already disconnected".into(),
        })
    }

    fn full(&self, path: &str) -> String {
        join_root(&self.root, path)
    }
}

impl ProviderSession for SmbProviderSession {
    fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    fn disconnect(&mut self) {
        // libsmbclient tears the connection down when the client drops.
        if self.client.take().is_some() {
            tracing::trace!(share = %self.share, "smb session dropped");
        }
    }

    fn list(&mut self, path: &str) -> Result<Vec<DirEntry>, VfsError> {
        let remote = self.full(path);
        let client = self.client("list")?;
        let dirents = client
            .list_dir(&remote)
            .map_err(|e| map_smb_err("list", path, &e))?;

        let mut entries = Vec::new();
        for dirent in dirents {
            let name = dirent.name().to_owned();
            if name == "." || name == ".." {
                continue;
            }
            let file_type = match dirent.get_type() {
                SmbDirentType::Dir => FileType::Directory,
                SmbDirentType::File => FileType::File,
                _ => FileType::Other,
            };
            // One round trip per entry for attributes; the listing itself
            // only carries names and kinds.
            let info = match file_type {
                FileType::File => client
                    .stat(&join_root(&remote, &name))
                    .map(|stat| FileInfo {
                        file_type,
                        size: Some(stat.size),
                        modified: Some(stat.modified),
                    })
                    .unwrap_or(FileInfo {
                        file_type,
                        size: None,
                        modified: None,
                    }),
                _ => FileInfo {
                    file_type,
                    size: None,
                    modified: None,
                },
            };
            entries.push(DirEntry { name, info });
        }
        Ok(entries)
    }

    fn stat(&mut self, path: &str) -> Result<FileInfo, VfsError> {
        let remote = self.full(path);
        let client = self.client("stat")?;
        let stat = client
            .stat(&remote)
            .map_err(|e| map_smb_err("stat", path, &e))?;

        // libsmbclient's stat does not carry a directory bit we can rely
        // on across servers; ask the parent listing for the entry kind.
        let file_type = match split_parent(&remote) {
            None => FileType::Directory,
            Some((parent, name)) => client
                .list_dir(parent)
                .ok()
                .and_then(|dirents| {
                    dirents.into_iter().find(|d| d.name() == name).map(|d| {
                        match d.get_type() {
                            SmbDirentType::Dir => FileType::Directory,
                            SmbDirentType::File => FileType::File,
                            _ => FileType::Other,
                        }
                    })
                })
                .unwrap_or(FileType::File),
        };

        Ok(FileInfo {
            file_type,
            size: (file_type == FileType::File).then_some(stat.size),
            modified: Some(stat.modified),
        })
    }

    fn read_to(&mut self, path: &str, sink: &mut dyn Write) -> Result<u64, VfsError> {
        let remote = self.full(path);
        let client = self.client("read")?;
        let mut file = client
            .open_with(&remote, SmbOpenOptions::default().read(true))
            .map_err(|e| map_smb_err("open", path, &e))?;
        copy_stream("read", path, &mut file, sink)
    }

    fn write_from(
        &mut self,
        path: &str,
        source: &mut dyn Read,
        mode: WriteMode,
    ) -> Result<u64, VfsError> {
        let remote = self.full(path);
        let client = self.client("write")?;
        let open_options = match mode {
            WriteMode::Overwrite => SmbOpenOptions::default().create(true).write(true),
            WriteMode::Append => SmbOpenOptions::default().create(true).append(true),
        };
        let mut file = client
            .open_with(&remote, open_options)
            .map_err(|e| map_smb_err("create", path, &e))?;
        copy_stream("write", path, source, &mut file)
    }

    fn mkdir(&mut self, path: &str) -> Result<(), VfsError> {
        let remote = self.full(path);
        let client = self.client("mkdir")?;
        client
            .mkdir(&remote, SmbMode::from(0o755))
            .map_err(|e| map_smb_err("mkdir", path, &e))
    }

    fn remove_file(&mut self, path: &str) -> Result<(), VfsError> {
        let remote = self.full(path);
        let client = self.client("delete")?;
        client
            .unlink(&remote)
            .map_err(|e| map_smb_err("delete", path, &e))
    }

    fn remove_dir(&mut self, path: &str) -> Result<(), VfsError> {
        let remote = self.full(path);
        let client = self.client("rmdir")?;
        client
            .rmdir(&remote)
            .map_err(|e| map_smb_err("rmdir", path, &e))
    }

    fn rename(&mut self, from: &str, to: &str) -> Result<(), VfsError> {
        let from_remote = self.full(from);
        let to_remote = self.full(to);
        let client = self.client("rename")?;
        client
            .rename(&from_remote, &to_remote)
            .map_err(|e| map_smb_err("rename", from, &e))
    }
}

/// Map a native client error onto the core taxonomy.
fn map_smb_err(op: &'static str, path: &str, err: &SmbError) -> VfsError {
    match err {
        SmbError::Io(e) => VfsError::from_io(op, path, e),
        other => VfsError::Protocol {
            kind: ProtocolKind::Other,
            path: format!("{path}: {other}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_split() {
        assert_eq!(
            split_share("/media/archive/2024").unwrap(),
            ("/media".to_owned(), "/archive/2024".to_owned())
        );
        assert_eq!(
            split_share("/media").unwrap(),
            ("/media".to_owned(), "/".to_owned())
        );
        assert!(matches!(split_share("/"), Err(VfsError::Config(_))));
    }

    #[test]
    fn io_errors_classify_through_errno() {
        let err = SmbError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no such file",
        ));
        assert!(matches!(
            map_smb_err("stat", "/x", &err),
            VfsError::Protocol {
                kind: ProtocolKind::NotFound,
                ..
            }
        ));
    }
}
