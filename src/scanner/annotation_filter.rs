use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Exact filename of RefSeq coding-sequence FASTA files inside an archive.
pub const CDS_FILENAME: &str = "cds_from_genomic.fna";

/// Suffix matched by the `*.gff` gene-feature pattern.
pub const GFF_SUFFIX: &str = ".gff";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    CodingSequence,
    GeneFeature,
}

impl AnnotationKind {
    /// Extension given to organized files of this kind.
    pub fn extension(self) -> &'static str {
        match self {
            AnnotationKind::CodingSequence => "fna",
            AnnotationKind::GeneFeature => "gff",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AnnotationKind::CodingSequence => "CDS",
            AnnotationKind::GeneFeature => "GFF",
        }
    }

    /// Classify by filename only; directories along the path are ignored.
    pub fn classify(path: &Path) -> Option<Self> {
        let filename = path.file_name()?.to_str()?;

        if filename == CDS_FILENAME {
            Some(AnnotationKind::CodingSequence)
        } else if filename.ends_with(GFF_SUFFIX) {
            Some(AnnotationKind::GeneFeature)
        } else {
            None
        }
    }
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// `{species}_{family}.{ext}`
pub fn organized_filename(species_id: &str, family: &str, kind: AnnotationKind) -> String {
    format!("{}_{}.{}", species_id, family, kind.extension())
}
