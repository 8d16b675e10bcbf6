use crate::report::FailedStep;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("NCBI datasets tool unavailable at {path}: {message}")]
    ToolUnavailable { path: String, message: String },

    #[error("Command `{command}` failed with exit code {code:?}")]
    ToolFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Invalid preview output: {message}")]
    InvalidPreview { message: String },

    #[error("At least one of CDS or GFF files must be downloaded")]
    NoContentSelected,

    #[error("No {family} genomes with {assembly_level}-level assemblies found")]
    NoRecordsFound {
        family: String,
        assembly_level: String,
    },

    #[error("Zip file {path} not found")]
    ArchiveNotFound { path: String },

    #[error("Archive operation failed: {message}")]
    Archive {
        message: String,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Path validation failed: {path}")]
    InvalidPath { path: String },

    #[error("Background task failed: {message}")]
    Task { message: String },

    #[error("All {total} taxa failed for family {family}")]
    AllTaxaFailed {
        family: String,
        total: usize,
        errors: Vec<String>,
        step: Option<FailedStep>,
    },

    #[error("Operation was cancelled by user")]
    Cancelled,
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for FetchError {
    fn user_message(&self) -> String {
        match self {
            FetchError::ToolUnavailable { path, message } => {
                format!("Error accessing datasets tool {}: {}", path, message)
            }
            FetchError::ToolFailed {
                command,
                code,
                stderr,
            } => {
                let code = code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".to_string());
                if stderr.trim().is_empty() {
                    format!("`{}` exited with status {}", command, code)
                } else {
                    format!(
                        "`{}` exited with status {}: {}",
                        command,
                        code,
                        stderr.trim()
                    )
                }
            }
            FetchError::NoRecordsFound {
                family,
                assembly_level,
            } => format!(
                "No {} species with {}-level assemblies found",
                family, assembly_level
            ),
            FetchError::ArchiveNotFound { path } => format!("Zip file {} not found", path),
            FetchError::Archive { message, source } => format!("{}: {}", message, source),
            FetchError::Config { message } => format!("Configuration error: {}", message),
            FetchError::InvalidPath { path } => format!("Invalid file path: {}", path),
            FetchError::AllTaxaFailed {
                family,
                total,
                errors,
                ..
            } => {
                let mut message =
                    format!("Download process failed for {} ({} taxa attempted)", family, total);
                for error in errors {
                    message.push_str("\n  - ");
                    message.push_str(error);
                }
                message
            }
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            FetchError::ToolUnavailable { .. } => Some(
                "NCBI datasets tool not available. Please check the path with --datasets-tool or the DATASETS_TOOL environment variable.".to_string()
            ),
            FetchError::NoContentSelected => Some(
                "Remove --no-cds or --no-gff so that at least one file type is downloaded.".to_string()
            ),
            FetchError::NoRecordsFound { .. } => Some(
                "Check the family name spelling (e.g., gobiidae, apogonidae, salmonidae) or try a different --assembly-level.".to_string()
            ),
            FetchError::ArchiveNotFound { .. } => Some(
                "The download step did not produce an archive. Re-run with -v to see the datasets command output.".to_string()
            ),
            FetchError::Config { .. } => Some(
                "Check your configuration file syntax and ensure all required fields are present.".to_string()
            ),
            FetchError::AllTaxaFailed {
                step: Some(FailedStep::Download),
                ..
            } => Some(
                "The datasets download did not complete. Check network access, the --work-dir location and the tool output above (re-run with -v).".to_string()
            ),
            FetchError::AllTaxaFailed { .. } => Some(
                "The genome assemblies may not have gene annotations. Re-run with -v for details.".to_string()
            ),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for FetchError {
    fn from(error: toml::de::Error) -> Self {
        FetchError::Config {
            message: error.to_string(),
        }
    }
}

impl From<walkdir::Error> for FetchError {
    fn from(error: walkdir::Error) -> Self {
        let message = error.to_string();
        match error.into_io_error() {
            Some(io) => FetchError::Io(io),
            None => FetchError::InvalidPath { path: message },
        }
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;
