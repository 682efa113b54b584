//! Where the root template is read from.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::TemplateError;

/// A read-only filesystem abstraction for embedded templates.
pub trait TemplateFs: Send + Sync + fmt::Debug {
    /// Read the file at `path` as UTF-8.
    fn read_to_string(&self, path: &str) -> io::Result<String>;
}

/// In-memory filesystem, handy for bundling templates into the binary.
#[derive(Debug, Clone, Default)]
pub struct MemoryFs {
    files: HashMap<String, String>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file and return the filesystem.
    pub fn with_file(mut self, path: impl Into<String>, contents: impl Into<String>) -> Self {
        self.insert(path, contents);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, contents: impl Into<String>) {
        self.files
            .insert(normalize(&path.into()).to_string(), contents.into());
    }
}

impl TemplateFs for MemoryFs {
    fn read_to_string(&self, path: &str) -> io::Result<String> {
        self.files.get(normalize(path)).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{} not found", path))
        })
    }
}

/// A filesystem rooted at a directory on disk.
#[derive(Debug, Clone)]
pub struct DirFs {
    root: PathBuf,
}

impl DirFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl TemplateFs for DirFs {
    fn read_to_string(&self, path: &str) -> io::Result<String> {
        std::fs::read_to_string(self.root.join(normalize(path)))
    }
}

fn normalize(path: &str) -> &str {
    path.trim_start_matches("./").trim_start_matches('/')
}

/// The root template location.
#[derive(Clone, Debug)]
pub enum TemplateSource {
    /// A path on the local filesystem.
    File(PathBuf),
    /// A path inside a provided filesystem.
    Embedded { fs: Arc<dyn TemplateFs>, path: String },
}

impl TemplateSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    pub fn embedded(fs: Arc<dyn TemplateFs>, path: impl Into<String>) -> Self {
        Self::Embedded {
            fs,
            path: path.into(),
        }
    }

    /// The path as configured.
    pub fn path(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Embedded { path, .. } => path.clone(),
        }
    }

    /// Base file name, used as the template name.
    pub fn name(&self) -> String {
        let path = self.path();
        Path::new(&path)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or(path)
    }

    /// Read the template source.
    pub fn load(&self) -> Result<String, TemplateError> {
        let result = match self {
            Self::File(path) => std::fs::read_to_string(path),
            Self::Embedded { fs, path } => fs.read_to_string(path),
        };
        result.map_err(|source| TemplateError::Io {
            path: self.path(),
            source,
        })
    }

    /// Same location, different filesystem. File sources become embedded.
    pub fn with_fs(&self, fs: Arc<dyn TemplateFs>) -> Self {
        Self::embedded(fs, self.path())
    }

    /// Same filesystem, different path.
    pub fn with_path(&self, path: impl Into<String>) -> Self {
        match self {
            Self::File(_) => Self::File(PathBuf::from(path.into())),
            Self::Embedded { fs, .. } => Self::embedded(fs.clone(), path),
        }
    }
}
