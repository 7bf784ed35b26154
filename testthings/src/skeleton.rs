//! Install copies of a template tree ("skeleton") into test directories.
//!
//! Only directories and regular files are installed. Symlinks and special
//! files are skipped. Permission bits are copied from the skeleton and then
//! raised to at least [`MINIMUM_FILE_PERM`] / [`MINIMUM_DIR_PERM`], so the
//! installed tree is always readable and removable by its owner.
//!
//! ```no_run
//! use testthings::TestScope;
//! use testthings::skeleton::Skeleton;
//!
//! let t = TestScope::new("fixtures");
//! let dir = t.temp_dir();
//! Skeleton::from_dir("tests/fixtures/project").install_or_fail(&t, &dir);
//! ```

mod source;

use std::fs;
use std::fs::DirBuilder;
use std::fs::OpenOptions;
use std::fs::Permissions;
use std::io;
use std::os::unix::fs::DirBuilderExt;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::fs::PermissionsExt;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use thiserror::Error;

pub use source::DirSource;
pub use source::Entries;
pub use source::MapFile;
pub use source::MapSource;
pub use source::NodeKind;
pub use source::SkeletonEntry;
pub use source::SkeletonSource;

use crate::types::Terminator;

/// Permission bits every installed file has at least.
pub const MINIMUM_FILE_PERM: u32 = 0o440;

/// Permission bits every installed directory has at least.
pub const MINIMUM_DIR_PERM: u32 = 0o700;

/// Mode used when creating the install directory itself.
pub const INSTALL_DIR_PERM: u32 = 0o750;

/// Permission floors applied during install.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallOptions {
    pub min_file_perm: u32,
    pub min_dir_perm: u32,
    pub install_dir_perm: u32,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            min_file_perm: MINIMUM_FILE_PERM,
            min_dir_perm: MINIMUM_DIR_PERM,
            install_dir_perm: INSTALL_DIR_PERM,
        }
    }
}

/// Why installing a single skeleton path failed.
#[derive(Debug, Error)]
pub enum InstallErrorKind {
    #[error("dir: {0}")]
    InstallDir(#[source] io::Error),

    #[error("walk: {0}")]
    Walk(#[source] io::Error),

    #[error("info: {0}")]
    Info(#[source] io::Error),

    #[error("{0}")]
    CreateDir(#[source] io::Error),

    #[error("unsupported file type: {0}")]
    Unsupported(NodeKind),

    #[error("open skel file: {0}")]
    Open(#[source] io::Error),

    #[error("install file: {0}")]
    Create(#[source] io::Error),

    #[error("{0}")]
    Copy(#[source] io::Error),

    #[error("permissions: {0}")]
    Permissions(#[source] io::Error),

    #[error("path must be relative and stay inside the install dir")]
    InvalidPath,
}

/// Returned when the skeleton cannot install some path.
#[derive(Debug, Error)]
#[error("skel path {path:?}: {kind}")]
pub struct SkeletonInstallError {
    path: PathBuf,
    #[source]
    kind: InstallErrorKind,
}

impl SkeletonInstallError {
    pub fn new(path: &Path, kind: InstallErrorKind) -> Self {
        Self {
            path: path.to_path_buf(),
            kind,
        }
    }

    /// Skeleton-relative path that failed.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> &InstallErrorKind {
        &self.kind
    }

    /// Underlying I/O error, if there is one.
    pub fn io_error(&self) -> Option<&io::Error> {
        match &self.kind {
            InstallErrorKind::InstallDir(err)
            | InstallErrorKind::Walk(err)
            | InstallErrorKind::Info(err)
            | InstallErrorKind::CreateDir(err)
            | InstallErrorKind::Open(err)
            | InstallErrorKind::Create(err)
            | InstallErrorKind::Copy(err)
            | InstallErrorKind::Permissions(err) => Some(err),
            InstallErrorKind::Unsupported(_) | InstallErrorKind::InvalidPath => None,
        }
    }

    /// Errors for node types the installer does not handle. These are
    /// skipped during install.
    pub fn is_unsupported_node(&self) -> bool {
        matches!(self.kind, InstallErrorKind::Unsupported(_))
    }
}

/// Creates fresh copies of a skeleton tree.
#[derive(Debug, Clone)]
pub struct Skeleton<S> {
    source: S,
    options: InstallOptions,
}

impl Skeleton<DirSource> {
    /// Skeleton backed by a template directory on disk.
    pub fn from_dir(root: impl Into<PathBuf>) -> Self {
        Self::new(DirSource::new(root))
    }
}

impl<S: SkeletonSource> Skeleton<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            options: InstallOptions::default(),
        }
    }

    pub fn with_options(mut self, options: InstallOptions) -> Self {
        self.options = options;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Install the skeleton into `dir`, creating it if needed.
    ///
    /// Existing files are never overwritten: a path that already exists in
    /// `dir` fails the install.
    pub fn install(&self, dir: impl AsRef<Path>) -> Result<(), SkeletonInstallError> {
        let dir = dir.as_ref();
        DirBuilder::new()
            .recursive(true)
            .mode(self.options.install_dir_perm)
            .create(dir)
            .map_err(|err| SkeletonInstallError::new(dir, InstallErrorKind::InstallDir(err)))?;

        let mut installed = 0usize;
        for entry in self.source.entries() {
            let entry = entry?;
            match self.install_entry(dir, &entry) {
                Ok(()) => installed += 1,
                Err(err) if err.is_unsupported_node() => {
                    tracing::debug!(
                        path = %entry.path.display(),
                        kind = %entry.kind,
                        "skipping skeleton node"
                    );
                }
                Err(err) => return Err(err),
            }
        }
        tracing::debug!(dir = %dir.display(), installed, "skeleton installed");
        Ok(())
    }

    /// Install the skeleton into `dir`, failing the test on error.
    #[track_caller]
    pub fn install_or_fail(&self, scope: &impl Terminator, dir: impl AsRef<Path>) {
        if let Err(err) = self.install(dir) {
            scope.fatal(&format!("skeleton install: {err}"));
        }
    }

    fn install_entry(&self, dir: &Path, entry: &SkeletonEntry) -> Result<(), SkeletonInstallError> {
        let fail = |kind| SkeletonInstallError::new(&entry.path, kind);
        if !is_contained(&entry.path) {
            return Err(fail(InstallErrorKind::InvalidPath));
        }
        let target = dir.join(&entry.path);

        match entry.kind {
            NodeKind::Dir => {
                if target.is_dir() {
                    return Ok(());
                }
                let mode = entry.mode | self.options.min_dir_perm;
                DirBuilder::new()
                    .recursive(true)
                    .mode(mode)
                    .create(&target)
                    .map_err(|err| fail(InstallErrorKind::CreateDir(err)))?;
                fs::set_permissions(&target, Permissions::from_mode(mode))
                    .map_err(|err| fail(InstallErrorKind::Permissions(err)))
            }
            NodeKind::File => {
                let mode = entry.mode | self.options.min_file_perm;
                let mut src = self
                    .source
                    .open(&entry.path)
                    .map_err(|err| fail(InstallErrorKind::Open(err)))?;
                let mut dst = OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .mode(mode)
                    .open(&target)
                    .map_err(|err| fail(InstallErrorKind::Create(err)))?;
                io::copy(&mut src, &mut dst).map_err(|err| fail(InstallErrorKind::Copy(err)))?;
                dst.set_permissions(Permissions::from_mode(mode))
                    .map_err(|err| fail(InstallErrorKind::Permissions(err)))
            }
            kind @ (NodeKind::Symlink | NodeKind::Other) => {
                Err(fail(InstallErrorKind::Unsupported(kind)))
            }
        }
    }
}

/// Whether joining `path` onto a directory stays inside it.
fn is_contained(path: &Path) -> bool {
    let mut components = path.components().peekable();
    components.peek().is_some() && components.all(|c| matches!(c, Component::Normal(_)))
}
