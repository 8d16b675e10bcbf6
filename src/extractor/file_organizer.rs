use crate::config::Config;
use crate::error::{FetchError, Result};
use crate::scanner::{AnnotationFile, AnnotationKind, ScanResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct OrganizeProgress {
    pub files_processed: usize,
    pub total_files: usize,
    pub bytes_processed: u64,
    pub current_file: Option<String>,
    pub start_time: Instant,
}

impl OrganizeProgress {
    pub fn new(total_files: usize) -> Self {
        Self {
            files_processed: 0,
            total_files,
            bytes_processed: 0,
            current_file: None,
            start_time: Instant::now(),
        }
    }

    pub fn update_file(&mut self, filename: String, bytes: u64) {
        self.files_processed += 1;
        self.bytes_processed += bytes;
        self.current_file = Some(filename);
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// A renamed file in one of the two output directories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizedFile {
    pub kind: AnnotationKind,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub size: u64,
}

/// Moves matched annotation files into the flat CDS and GFF directories.
#[derive(Debug, Clone)]
pub struct FileOrganizer {
    cds_dir: PathBuf,
    gff_dir: PathBuf,
    buffer_size: usize,
}

impl FileOrganizer {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(cds_dir: P, gff_dir: Q) -> Self {
        Self {
            cds_dir: cds_dir.into(),
            gff_dir: gff_dir.into(),
            buffer_size: 64 * 1024,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.cds_directory(), config.gff_directory())
    }

    pub fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.cds_dir)?;
        fs::create_dir_all(&self.gff_dir)?;
        Ok(())
    }

    pub fn cds_dir(&self) -> &Path {
        &self.cds_dir
    }

    pub fn gff_dir(&self) -> &Path {
        &self.gff_dir
    }

    pub fn destination_dir(&self, kind: AnnotationKind) -> &Path {
        match kind {
            AnnotationKind::CodingSequence => &self.cds_dir,
            AnnotationKind::GeneFeature => &self.gff_dir,
        }
    }

    /// Moves every match, CDS first. A later file with the same target
    /// name replaces an earlier one. The first failed move aborts.
    pub fn organize(
        &self,
        matches: &ScanResult,
        family: &str,
        progress_callback: Option<&dyn Fn(&OrganizeProgress)>,
    ) -> Result<(Vec<OrganizedFile>, OrganizeProgress)> {
        let mut progress = OrganizeProgress::new(matches.total());
        let mut organized = Vec::with_capacity(matches.total());

        for file in matches.iter() {
            if let Some(callback) = progress_callback {
                callback(&progress);
            }

            let moved = self.organize_file(file, family)?;
            let name = moved
                .destination
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            info!("Moved {} file: {}", file.kind, name);
            progress.update_file(name, moved.size);
            organized.push(moved);
        }

        if let Some(callback) = progress_callback {
            callback(&progress);
        }

        Ok((organized, progress))
    }

    fn organize_file(&self, file: &AnnotationFile, family: &str) -> Result<OrganizedFile> {
        let destination = self
            .destination_dir(file.kind)
            .join(file.target_filename(family));

        if destination.exists() {
            debug!("Overwriting existing {}", destination.display());
        }

        let size = self.move_file(&file.source_path, &destination)?;

        Ok(OrganizedFile {
            kind: file.kind,
            source: file.relative_path.clone(),
            destination,
            size,
        })
    }

    /// Rename, falling back to copy-and-delete when the rename is refused
    /// (for example across filesystems).
    pub fn move_file(&self, source: &Path, dest: &Path) -> Result<u64> {
        self.move_file_with(source, dest, |from, to| fs::rename(from, to))
    }

    fn move_file_with<R>(&self, source: &Path, dest: &Path, rename: R) -> Result<u64>
    where
        R: FnOnce(&Path, &Path) -> io::Result<()>,
    {
        if !source.is_file() {
            return Err(FetchError::InvalidPath {
                path: format!("Source is not a file: {}", source.display()),
            });
        }

        let size = fs::metadata(source)?.len();

        match rename(source, dest) {
            Ok(()) => Ok(size),
            Err(e) => {
                debug!(
                    "rename {} -> {} failed ({}), copying instead",
                    source.display(),
                    dest.display(),
                    e
                );
                let copied = self.copy_file_with_buffer(source, dest)?;
                fs::remove_file(source)?;
                Ok(copied)
            }
        }
    }

    fn copy_file_with_buffer(&self, source: &Path, dest: &Path) -> Result<u64> {
        let source_file = fs::File::open(source)?;
        let dest_file = fs::File::create(dest)?;

        let mut reader = BufReader::with_capacity(self.buffer_size, source_file);
        let mut writer = BufWriter::with_capacity(self.buffer_size, dest_file);

        let mut total_bytes = 0u64;
        let mut buffer = vec![0u8; 8192];

        loop {
            let bytes_read = reader.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            writer.write_all(&buffer[..bytes_read])?;
            total_bytes += bytes_read as u64;
        }

        writer.flush()?;

        if let Ok(source_metadata) = fs::metadata(source) {
            if let Ok(modified_time) = source_metadata.modified() {
                let _ = filetime::set_file_mtime(
                    dest,
                    filetime::FileTime::from_system_time(modified_time),
                );
            }
        }

        Ok(total_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::AnnotationScanner;
    use tempfile::TempDir;

    fn setup() -> (TempDir, FileOrganizer) {
        let temp_dir = TempDir::new().unwrap();
        let organizer = FileOrganizer::new(
            temp_dir.path().join("out/cds_files"),
            temp_dir.path().join("out/gff_files"),
        );
        organizer.initialize().unwrap();
        (temp_dir, organizer)
    }

    fn touch(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_initialize_creates_both_directories() {
        let (_temp_dir, organizer) = setup();
        assert!(organizer.cds_dir().is_dir());
        assert!(organizer.gff_dir().is_dir());
    }

    #[test]
    fn test_organize_renames_by_parent_directory() {
        let (temp_dir, organizer) = setup();
        let scratch = temp_dir.path().join("temp_gobiidae");
        touch(&scratch, "speciesA/cds_from_genomic.fna", ">a\n");
        touch(&scratch, "speciesB/sub/annotation.gff", "##gff-version 3\n");

        let matches = AnnotationScanner::new(&scratch).scan().unwrap();
        let (organized, progress) = organizer.organize(&matches, "gobiidae", None).unwrap();

        assert_eq!(organized.len(), 2);
        assert_eq!(progress.files_processed, 2);
        assert_eq!(progress.total_files, 2);
        assert!(organizer.cds_dir().join("speciesA_gobiidae.fna").is_file());
        assert!(organizer.gff_dir().join("sub_gobiidae.gff").is_file());
        assert!(!scratch.join("speciesA/cds_from_genomic.fna").exists());
    }

    #[test]
    fn test_same_target_name_last_write_wins() {
        let (temp_dir, organizer) = setup();
        let scratch = temp_dir.path().join("temp_gobiidae");
        touch(&scratch, "a/speciesA/cds_from_genomic.fna", "first");
        touch(&scratch, "b/speciesA/cds_from_genomic.fna", "second");

        let matches = AnnotationScanner::new(&scratch).scan().unwrap();
        let (organized, _) = organizer.organize(&matches, "gobiidae", None).unwrap();

        assert_eq!(organized.len(), 2);
        let outputs: Vec<_> = fs::read_dir(organizer.cds_dir()).unwrap().collect();
        assert_eq!(outputs.len(), 1);
        assert_eq!(
            fs::read_to_string(organizer.cds_dir().join("speciesA_gobiidae.fna")).unwrap(),
            "second"
        );
    }

    #[test]
    fn test_progress_callback_is_invoked() {
        let (temp_dir, organizer) = setup();
        let scratch = temp_dir.path().join("temp_x");
        touch(&scratch, "s1/genomic.gff", "x");

        let matches = AnnotationScanner::new(&scratch).scan().unwrap();
        let calls = std::cell::Cell::new(0);
        let callback = |_: &OrganizeProgress| calls.set(calls.get() + 1);
        organizer.organize(&matches, "x", Some(&callback)).unwrap();

        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_copy_fallback_preserves_contents() {
        let (temp_dir, organizer) = setup();
        let source = temp_dir.path().join("source.gff");
        fs::write(&source, "feature data").unwrap();
        let dest = organizer.gff_dir().join("copied.gff");

        let bytes = organizer.copy_file_with_buffer(&source, &dest).unwrap();

        assert_eq!(bytes, 12);
        assert_eq!(fs::read_to_string(dest).unwrap(), "feature data");
    }

    #[test]
    fn test_move_falls_back_to_copy_when_rename_fails() {
        let (temp_dir, organizer) = setup();
        let source = temp_dir.path().join("cds_from_genomic.fna");
        fs::write(&source, ">cds\nATG\n").unwrap();
        let dest = organizer.cds_dir().join("speciesA_gobiidae.fna");

        let size = organizer
            .move_file_with(&source, &dest, |_, _| {
                Err(io::Error::new(io::ErrorKind::Other, "cross-device link"))
            })
            .unwrap();

        assert_eq!(size, 8);
        assert!(!source.exists());
        assert_eq!(fs::read_to_string(&dest).unwrap(), ">cds\nATG\n");
    }

    #[test]
    fn test_failed_fallback_keeps_source() {
        let (temp_dir, organizer) = setup();
        let source = temp_dir.path().join("annotation.gff");
        fs::write(&source, "##gff-version 3\n").unwrap();

        // A non-empty directory in the way defeats both rename and copy.
        let dest = organizer.gff_dir().join("sub_gobiidae.gff");
        fs::create_dir_all(dest.join("occupied")).unwrap();

        let result = organizer.move_file(&source, &dest);

        assert!(matches!(result, Err(FetchError::Io(_))));
        assert_eq!(fs::read_to_string(&source).unwrap(), "##gff-version 3\n");
    }

    #[test]
    fn test_move_missing_source_is_error() {
        let (temp_dir, organizer) = setup();
        let result = organizer.move_file(
            &temp_dir.path().join("missing.fna"),
            &organizer.cds_dir().join("x.fna"),
        );
        assert!(matches!(result, Err(FetchError::InvalidPath { .. })));
    }
}
