//! Loading modules from disk or from memory.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use tracing::{debug, info};

use crate::ast::Body;
use crate::parser::{ParseError, parse_body};

use super::ModulePath;

/// Failure to turn a directory or a set of sources into a module.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {filename}: {}", first_message(.errors))]
    Parse {
        filename: String,
        text: String,
        errors: Vec<ParseError>,
    },

    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: ignore::Error,
    },
}

fn first_message(errors: &[ParseError]) -> String {
    errors
        .first()
        .map(ToString::to_string)
        .unwrap_or_else(|| "unknown error".to_string())
}

/// One parsed configuration file.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub name: String,
    pub text: String,
    pub body: Body,
}

impl SourceFile {
    pub fn parse(name: impl Into<String>, text: impl Into<String>) -> Result<Self, LoadError> {
        let name = name.into();
        let text = text.into();
        match parse_body(&text) {
            Ok(body) => Ok(Self { name, text, body }),
            Err(errors) => Err(LoadError::Parse {
                filename: name,
                text,
                errors,
            }),
        }
    }

    /// 1-based line and column of a byte offset.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let before = &self.text[..offset.min(self.text.len())];
        let line = before.matches('\n').count() + 1;
        let column = match before.rfind('\n') {
            Some(nl) => before[nl + 1..].chars().count() + 1,
            None => before.chars().count() + 1,
        };
        (line, column)
    }
}

/// A module: every `.tf` file of one directory, parsed.
#[derive(Debug, Clone)]
pub struct SourceModule {
    path: ModulePath,
    dir: Option<PathBuf>,
    files: Vec<SourceFile>,
}

impl SourceModule {
    /// Build a module from in-memory `(filename, text)` pairs.
    pub fn from_sources<N, T>(
        path: ModulePath,
        sources: impl IntoIterator<Item = (N, T)>,
    ) -> Result<Self, LoadError>
    where
        N: Into<String>,
        T: Into<String>,
    {
        let mut files = sources
            .into_iter()
            .map(|(name, text)| SourceFile::parse(name, text))
            .collect::<Result<Vec<_>, _>>()?;
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(Self {
            path,
            dir: None,
            files,
        })
    }

    /// Read and parse the `*.tf` files directly inside `dir`.
    pub fn load(dir: &Path, path: ModulePath) -> Result<Self, LoadError> {
        let io = |source| LoadError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut names = Vec::new();
        for entry in fs::read_dir(dir).map_err(io)? {
            let entry = entry.map_err(io)?;
            let file_path = entry.path();
            if is_config_file(&file_path) && entry.file_type().map_err(io)?.is_file() {
                names.push(file_path);
            }
        }
        names.sort();

        let mut files = Vec::with_capacity(names.len());
        for file_path in names {
            let text = fs::read_to_string(&file_path).map_err(|source| LoadError::Io {
                path: file_path.clone(),
                source,
            })?;
            let name = file_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            files.push(SourceFile::parse(name, text)?);
        }

        info!(module = %path, dir = %dir.display(), files = files.len(), "loaded module");
        Ok(Self {
            path,
            dir: Some(dir.to_path_buf()),
            files,
        })
    }

    pub fn path(&self) -> &ModulePath {
        &self.path
    }

    /// The directory the module was loaded from, if any.
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn file(&self, name: &str) -> Option<&SourceFile> {
        self.files.iter().find(|f| f.name == name)
    }
}

fn is_config_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "tf")
}

/// Find the modules under `root`.
///
/// `root` itself is always the root module. With `recursive`, every other
/// directory holding `.tf` files becomes a child module named by its path
/// relative to `root`. Ignore files are honoured and `.terraform` is skipped.
pub fn discover_modules(
    root: &Path,
    recursive: bool,
) -> Result<Vec<(PathBuf, ModulePath)>, LoadError> {
    let mut modules = vec![(root.to_path_buf(), ModulePath::root())];
    if !recursive {
        return Ok(modules);
    }

    let mut children = BTreeSet::new();
    let walker = WalkBuilder::new(root)
        .filter_entry(|entry| entry.file_name() != ".terraform")
        .build();
    for entry in walker {
        let entry = entry.map_err(|source| LoadError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        let is_file = entry.file_type().is_some_and(|t| t.is_file());
        if !is_file || !is_config_file(entry.path()) {
            continue;
        }
        let Some(dir) = entry.path().parent() else {
            continue;
        };
        let Ok(relative) = dir.strip_prefix(root) else {
            continue;
        };
        if relative.as_os_str().is_empty() {
            continue;
        }
        children.insert(relative.to_path_buf());
    }

    for relative in children {
        let path = ModulePath::new(
            relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned()),
        );
        debug!(module = %path, "discovered child module");
        modules.push((root.join(&relative), path));
    }
    Ok(modules)
}
