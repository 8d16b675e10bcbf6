pub mod annotation_filter;
pub mod annotation_scanner;

pub use annotation_filter::{organized_filename, AnnotationKind, CDS_FILENAME, GFF_SUFFIX};
pub use annotation_scanner::{AnnotationFile, AnnotationScanner, ScanResult};
