pub mod archive_extractor;
pub mod file_organizer;
pub mod pipeline;

pub use archive_extractor::{scratch_dir_name, ArchiveExtractor};
pub use file_organizer::{FileOrganizer, OrganizeProgress, OrganizedFile};
pub use pipeline::{AnnotationPipeline, OrganizeOutcome};
