use crate::error::{FetchError, Result};
use crate::scanner::annotation_filter::{organized_filename, AnnotationKind};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// An extracted file whose name matched one of the annotation patterns.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationFile {
    pub source_path: PathBuf,
    pub relative_path: PathBuf,
    pub kind: AnnotationKind,
    /// Name of the immediate parent directory, taken verbatim.
    pub species_id: String,
}

impl AnnotationFile {
    pub fn new(source_path: PathBuf, relative_path: PathBuf, kind: AnnotationKind) -> Self {
        let species_id = source_path
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            source_path,
            relative_path,
            kind,
            species_id,
        }
    }

    pub fn target_filename(&self, family: &str) -> String {
        organized_filename(&self.species_id, family, self.kind)
    }
}

/// Matches found in one scratch tree, grouped by kind in walk order.
#[derive(Debug, Default)]
pub struct ScanResult {
    pub coding_sequences: Vec<AnnotationFile>,
    pub gene_features: Vec<AnnotationFile>,
}

impl ScanResult {
    pub fn total(&self) -> usize {
        self.coding_sequences.len() + self.gene_features.len()
    }

    /// CDS matches first, then GFF matches.
    pub fn iter(&self) -> impl Iterator<Item = &AnnotationFile> {
        self.coding_sequences.iter().chain(self.gene_features.iter())
    }
}

pub struct AnnotationScanner {
    root: PathBuf,
}

impl AnnotationScanner {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Walks the whole tree at any depth. Walk errors abort the scan.
    pub fn scan(&self) -> Result<ScanResult> {
        self.ensure_directory()?;

        let mut result = ScanResult::default();
        for path in self.walk_files()? {
            let Some(kind) = AnnotationKind::classify(&path) else {
                continue;
            };

            let relative_path = self.relative(&path)?;
            debug!("Matched {} file: {}", kind, relative_path.display());

            let file = AnnotationFile::new(path, relative_path, kind);
            match kind {
                AnnotationKind::CodingSequence => result.coding_sequences.push(file),
                AnnotationKind::GeneFeature => result.gene_features.push(file),
            }
        }

        Ok(result)
    }

    /// Every regular file under the root, relative to it.
    pub fn list_files(&self) -> Result<Vec<PathBuf>> {
        self.ensure_directory()?;

        self.walk_files()?
            .iter()
            .map(|path| self.relative(path))
            .collect()
    }

    fn walk_files(&self) -> Result<Vec<PathBuf>> {
        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name();

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    fn ensure_directory(&self) -> Result<()> {
        if !self.root.is_dir() {
            return Err(FetchError::InvalidPath {
                path: format!("{} is not a directory", self.root.display()),
            });
        }
        Ok(())
    }

    fn relative(&self, path: &Path) -> Result<PathBuf> {
        path.strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .map_err(|_| FetchError::InvalidPath {
                path: format!(
                    "Cannot calculate relative path for {} from root {}",
                    path.display(),
                    self.root.display()
                ),
            })
    }
}
