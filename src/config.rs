use crate::datasets::ContentKind;
use crate::error::{FetchError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

pub const DEFAULT_TOOL_PATH: &str = "datasets";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    pub datasets: DatasetsConfig,
    pub download: DownloadConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatasetsConfig {
    pub tool_path: PathBuf,
    pub assembly_level: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadConfig {
    pub include_cds: bool,
    pub include_gff: bool,
    /// Directory that receives the archive and the `temp_{family}` scratch tree.
    pub work_directory: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    pub base_directory: PathBuf,
    pub cds_subdirectory: String,
    pub gff_subdirectory: String,
}

impl Default for DatasetsConfig {
    fn default() -> Self {
        Self {
            tool_path: PathBuf::from(DEFAULT_TOOL_PATH),
            assembly_level: "chromosome".to_string(),
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            include_cds: true,
            include_gff: true,
            work_directory: PathBuf::from("."),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            base_directory: PathBuf::from("refseq_data"),
            cds_subdirectory: "cds_files".to_string(),
            gff_subdirectory: "gff_files".to_string(),
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(FetchError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| FetchError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| FetchError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = [
                    "refseq-fetch.toml",
                    ".refseq-fetch.toml",
                    "refseq-fetch.config.toml",
                ];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(ref tool_path) = cli_args.tool_path {
            self.datasets.tool_path = tool_path.clone();
        }

        if let Some(ref level) = cli_args.assembly_level {
            self.datasets.assembly_level = level.clone();
        }

        if let Some(ref output_dir) = cli_args.output_dir {
            self.output.base_directory = output_dir.clone();
        }

        if let Some(ref work_dir) = cli_args.work_dir {
            self.download.work_directory = work_dir.clone();
        }

        // The skip flags can only switch a kind off.
        if cli_args.no_cds {
            self.download.include_cds = false;
        }
        if cli_args.no_gff {
            self.download.include_gff = false;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.download.include_cds && !self.download.include_gff {
            return Err(FetchError::NoContentSelected);
        }

        if self.datasets.tool_path.as_os_str().is_empty() {
            return Err(FetchError::Config {
                message: "Path to the datasets tool must not be empty".to_string(),
            });
        }

        if self.datasets.assembly_level.trim().is_empty() {
            return Err(FetchError::Config {
                message: "Assembly level must not be empty".to_string(),
            });
        }

        for (label, name) in [
            ("CDS", &self.output.cds_subdirectory),
            ("GFF", &self.output.gff_subdirectory),
        ] {
            if !is_flat_directory_name(name) {
                return Err(FetchError::Config {
                    message: format!(
                        "{} subdirectory must be a single directory name, got '{}'",
                        label, name
                    ),
                });
            }
        }

        if self.output.cds_subdirectory == self.output.gff_subdirectory {
            return Err(FetchError::Config {
                message: "CDS and GFF subdirectories must differ".to_string(),
            });
        }

        if let Some(parent) = self.output.base_directory.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                return Err(FetchError::Config {
                    message: format!("Parent directory does not exist: {}", parent.display()),
                });
            }
        }

        Ok(())
    }

    /// Content kinds enabled for download, in `--include` order.
    pub fn content_kinds(&self) -> Vec<ContentKind> {
        let mut kinds = Vec::with_capacity(2);
        if self.download.include_cds {
            kinds.push(ContentKind::Cds);
        }
        if self.download.include_gff {
            kinds.push(ContentKind::Gff3);
        }
        kinds
    }

    pub fn cds_directory(&self) -> PathBuf {
        self.output.base_directory.join(&self.output.cds_subdirectory)
    }

    pub fn gff_directory(&self) -> PathBuf {
        self.output.base_directory.join(&self.output.gff_subdirectory)
    }

    pub fn create_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config).unwrap_or_else(|_| String::new())
    }
}

fn is_flat_directory_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub tool_path: Option<PathBuf>,
    pub assembly_level: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub work_dir: Option<PathBuf>,
    pub no_cds: bool,
    pub no_gff: bool,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tool_path(mut self, tool_path: Option<PathBuf>) -> Self {
        self.tool_path = tool_path;
        self
    }

    pub fn with_assembly_level(mut self, level: Option<String>) -> Self {
        self.assembly_level = level;
        self
    }

    pub fn with_output_dir(mut self, output_dir: Option<PathBuf>) -> Self {
        self.output_dir = output_dir;
        self
    }

    pub fn with_work_dir(mut self, work_dir: Option<PathBuf>) -> Self {
        self.work_dir = work_dir;
        self
    }

    pub fn with_skip_cds(mut self, skip: bool) -> Self {
        self.no_cds = skip;
        self
    }

    pub fn with_skip_gff(mut self, skip: bool) -> Self {
        self.no_gff = skip;
        self
    }
}
