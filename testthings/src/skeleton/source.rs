use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io;
use std::io::Read;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::path::PathBuf;

use walkdir::WalkDir;

use super::InstallErrorKind;
use super::SkeletonInstallError;

/// Mode given to directories a [`MapSource`] synthesizes for its files.
const SYNTHESIZED_DIR_MODE: u32 = 0o555;

/// Kind of node found in a skeleton tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Dir,
    File,
    Symlink,
    Other,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Dir => "directory",
            NodeKind::File => "regular file",
            NodeKind::Symlink => "symlink",
            NodeKind::Other => "special file",
        };
        f.write_str(name)
    }
}

/// One node of a skeleton tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkeletonEntry {
    /// Path relative to the skeleton root.
    pub path: PathBuf,
    pub kind: NodeKind,
    /// Permission bits (`0o777` range).
    pub mode: u32,
}

/// Walk over the nodes of a [`SkeletonSource`].
pub type Entries<'a> = Box<dyn Iterator<Item = Result<SkeletonEntry, SkeletonInstallError>> + 'a>;

/// A tree that can be installed by [`Skeleton`](super::Skeleton).
pub trait SkeletonSource {
    /// Every node below the root, parents before their children.
    fn entries(&self) -> Entries<'_>;

    /// Open the regular file at `path` (relative to the root) for reading.
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + '_>>;
}

/// A template tree on disk. Symlinks are reported, never followed.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry(&self, entry: walkdir::DirEntry) -> Result<SkeletonEntry, SkeletonInstallError> {
        let path = entry
            .path()
            .strip_prefix(&self.root)
            .unwrap_or(entry.path())
            .to_path_buf();
        let metadata = entry.metadata().map_err(|err| {
            SkeletonInstallError::new(&path, InstallErrorKind::Info(io::Error::from(err)))
        })?;
        let file_type = metadata.file_type();
        let kind = if file_type.is_symlink() {
            NodeKind::Symlink
        } else if file_type.is_dir() {
            NodeKind::Dir
        } else if file_type.is_file() {
            NodeKind::File
        } else {
            NodeKind::Other
        };
        Ok(SkeletonEntry {
            path,
            kind,
            mode: metadata.permissions().mode() & 0o777,
        })
    }
}

impl SkeletonSource for DirSource {
    fn entries(&self) -> Entries<'_> {
        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name();
        Box::new(walker.into_iter().map(move |entry| match entry {
            Ok(entry) => self.entry(entry),
            Err(err) => {
                let path = err
                    .path()
                    .and_then(|p| p.strip_prefix(&self.root).ok())
                    .map(Path::to_path_buf)
                    .unwrap_or_default();
                Err(SkeletonInstallError::new(
                    &path,
                    InstallErrorKind::Walk(io::Error::from(err)),
                ))
            }
        }))
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(File::open(self.root.join(path))?))
    }
}

/// A node of a [`MapSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapFile {
    pub data: Vec<u8>,
    pub mode: u32,
    pub kind: NodeKind,
}

impl MapFile {
    pub fn file(data: impl Into<Vec<u8>>, mode: u32) -> Self {
        Self {
            data: data.into(),
            mode,
            kind: NodeKind::File,
        }
    }

    pub fn dir(mode: u32) -> Self {
        Self {
            data: Vec::new(),
            mode,
            kind: NodeKind::Dir,
        }
    }

    /// A symlink node; `target` is kept as the node's data.
    pub fn symlink(target: impl Into<Vec<u8>>) -> Self {
        Self {
            data: target.into(),
            mode: 0o777,
            kind: NodeKind::Symlink,
        }
    }
}

/// An in-memory tree keyed by relative path.
///
/// Parent directories that are not listed explicitly are synthesized with
/// mode `0o555`.
///
/// ```
/// use testthings::skeleton::{MapFile, MapSource};
///
/// let source = MapSource::new()
///     .with("etc/app.conf", MapFile::file("key = value\n", 0o644))
///     .with("bin/run.sh", MapFile::file("#!/bin/sh\n", 0o755));
/// assert_eq!(source.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MapSource {
    files: BTreeMap<PathBuf, MapFile>,
}

impl MapSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: impl Into<PathBuf>, file: MapFile) -> Self {
        self.insert(path, file);
        self
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, file: MapFile) -> Option<MapFile> {
        self.files.insert(path.into(), file)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn tree(&self) -> BTreeMap<PathBuf, SkeletonEntry> {
        let mut tree = BTreeMap::new();
        for (path, file) in &self.files {
            for parent in path.ancestors().skip(1) {
                if parent.as_os_str().is_empty() || self.files.contains_key(parent) {
                    continue;
                }
                tree.entry(parent.to_path_buf())
                    .or_insert_with(|| SkeletonEntry {
                        path: parent.to_path_buf(),
                        kind: NodeKind::Dir,
                        mode: SYNTHESIZED_DIR_MODE,
                    });
            }
            tree.insert(
                path.clone(),
                SkeletonEntry {
                    path: path.clone(),
                    kind: file.kind,
                    mode: file.mode & 0o777,
                },
            );
        }
        tree
    }
}

impl<P: Into<PathBuf>> FromIterator<(P, MapFile)> for MapSource {
    fn from_iter<I: IntoIterator<Item = (P, MapFile)>>(iter: I) -> Self {
        let mut source = Self::new();
        for (path, file) in iter {
            source.insert(path, file);
        }
        source
    }
}

impl SkeletonSource for MapSource {
    fn entries(&self) -> Entries<'_> {
        Box::new(self.tree().into_values().map(Ok))
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + '_>> {
        match self.files.get(path) {
            Some(file) if file.kind == NodeKind::File => Ok(Box::new(file.data.as_slice())),
            Some(file) => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is a {}", path.display(), file.kind),
            )),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )),
        }
    }
}
