//! File discovery: turns the paths given on the command line into the ordered set of files
//! to publish, each with a site-relative target path, a fingerprint and (for markdown) a
//! URL path.
//!
//! # Naming
//! - The first input, when it is a single markdown file, is published as the site root
//!   (`README.md`, or `README.mdx` for `.mdx` sources). Non-markdown single files keep their
//!   own name.
//! - Later single-file inputs keep their base filename.
//! - Directory inputs contribute every non-ignored regular file under its path relative to
//!   the directory, in sorted order.
//!
//! The project identity comes from the first input only: the file stem or the directory
//! name. Two inputs producing the same target path is an error.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::content_type::is_markdown_extension;
use crate::contract::FileManifestEntry;
use crate::error::{PublishError, PublishResult};
use crate::fingerprint::Fingerprint;
use crate::ignore_rules::{IgnoreRule, IgnoreSet};
use crate::path_resolver::resolve;

/// One content unit pending publication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// Absolute source path.
    pub original_location: PathBuf,
    /// Site-relative POSIX path the file is stored under.
    pub target_path: String,
    pub content: Vec<u8>,
    pub size_bytes: u64,
    pub fingerprint: Fingerprint,
    /// Lower-cased, without the leading dot. Empty when the file has no extension.
    pub extension: String,
    /// Served URL path; only set for markdown-class files.
    pub url_path: Option<String>,
}

impl DiscoveredFile {
    fn read(source: &Path, target_path: String) -> PublishResult<Self> {
        let original_location = absolute(source)?;
        let content = std::fs::read(&original_location).map_err(|e| PublishError::Io {
            path: original_location.clone(),
            source: e,
        })?;
        let extension = extension_of(&target_path);
        let url_path = is_markdown_extension(&extension).then(|| resolve(&target_path));
        Ok(Self {
            original_location,
            size_bytes: content.len() as u64,
            fingerprint: Fingerprint::from_bytes(&content),
            target_path,
            content,
            extension,
            url_path,
        })
    }

    pub fn is_content(&self) -> bool {
        self.url_path.is_some()
    }

    pub fn manifest_entry(&self) -> FileManifestEntry {
        FileManifestEntry {
            path: self.target_path.clone(),
            hash: self.fingerprint.clone(),
            size: self.size_bytes,
        }
    }
}

/// Output of [`discover`].
#[derive(Debug, Clone)]
pub struct Discovery {
    pub files: Vec<DiscoveredFile>,
    pub project_identity: String,
}

impl Discovery {
    /// False when nothing discovered is markdown; the site would publish without readable content.
    pub fn has_content(&self) -> bool {
        self.files.iter().any(DiscoveredFile::is_content)
    }

    pub fn manifest(&self) -> Vec<FileManifestEntry> {
        self.files.iter().map(DiscoveredFile::manifest_entry).collect()
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size_bytes).sum()
    }
}

/// Discover every file to publish from `inputs`, in input order.
pub fn discover<P: AsRef<Path>>(inputs: &[P]) -> PublishResult<Discovery> {
    let mut files: Vec<DiscoveredFile> = Vec::new();
    let mut owners: HashMap<String, PathBuf> = HashMap::new();
    let mut identity: Option<String> = None;

    for (position, input) in inputs.iter().enumerate() {
        let input = input.as_ref();
        let metadata = std::fs::metadata(input).map_err(|_| not_found(input))?;

        let batch = if metadata.is_file() {
            if identity.is_none() {
                identity = Some(file_stem(input));
            }
            vec![discover_file(input, position == 0)?]
        } else if metadata.is_dir() {
            if identity.is_none() {
                identity = Some(directory_name(input)?);
            }
            discover_directory(input)?
        } else {
            return Err(not_found(input));
        };

        for file in batch {
            if let Some(first) = owners.get(&file.target_path) {
                return Err(PublishError::DuplicateTargetPath {
                    target_path: file.target_path,
                    first: first.clone(),
                    second: file.original_location,
                });
            }
            owners.insert(file.target_path.clone(), file.original_location.clone());
            files.push(file);
        }
    }

    let Some(project_identity) = identity else {
        return Err(PublishError::NoFilesFound);
    };
    if files.is_empty() {
        warn!(inputs = inputs.len(), "No publishable files discovered");
        return Err(PublishError::NoFilesFound);
    }

    let discovery = Discovery {
        files,
        project_identity,
    };
    if !discovery.has_content() {
        warn!(
            project = %discovery.project_identity,
            "No markdown files found; the site will have no readable pages"
        );
    }
    info!(
        project = %discovery.project_identity,
        files = discovery.files.len(),
        bytes = discovery.total_bytes(),
        "Discovery complete"
    );
    Ok(discovery)
}

fn discover_file(path: &Path, first: bool) -> PublishResult<DiscoveredFile> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| not_found(path))?;
    let extension = extension_of(&file_name);

    let target_path = if first && is_markdown_extension(&extension) {
        if extension == "mdx" {
            "README.mdx".to_string()
        } else {
            "README.md".to_string()
        }
    } else {
        file_name
    };
    debug!(source = %path.display(), target = %target_path, "Discovered single file");
    DiscoveredFile::read(path, target_path)
}

fn discover_directory(root: &Path) -> PublishResult<Vec<DiscoveredFile>> {
    let rules = IgnoreSet::for_directory(root)?;
    let mut found: Vec<(String, PathBuf)> = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 {
                return true;
            }
            match entry.path().strip_prefix(root) {
                Ok(rel) => {
                    let ignored = rules.is_ignored(rel, entry.file_type().is_dir());
                    if ignored {
                        debug!(path = %rel.display(), "Ignored");
                    }
                    !ignored
                }
                Err(_) => true,
            }
        });

    for entry in walker {
        let entry = entry.map_err(|e| PublishError::Io {
            path: e.path().unwrap_or(root).to_path_buf(),
            source: e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("directory walk failed")),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };
        found.push((to_posix(rel), entry.into_path()));
    }

    found.sort_by(|a, b| a.0.cmp(&b.0));
    debug!(root = %root.display(), files = found.len(), "Walked directory");

    found
        .into_iter()
        .map(|(target_path, source)| DiscoveredFile::read(&source, target_path))
        .collect()
}

fn not_found(path: &Path) -> PublishError {
    PublishError::NotFoundOrInvalidPath {
        path: path.to_path_buf(),
    }
}

fn absolute(path: &Path) -> PublishResult<PathBuf> {
    std::fs::canonicalize(path).map_err(|e| PublishError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Base name of a directory input, resolving `.` and relative forms first.
fn directory_name(path: &Path) -> PublishResult<String> {
    let canonical = absolute(path)?;
    Ok(canonical
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "site".to_string()))
}

fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}

fn to_posix(rel: &Path) -> String {
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
