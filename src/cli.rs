use crate::config::{CliOverrides, Config};
use crate::error::{FetchError, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "refseq-fetch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Download RefSeq CDS and GFF annotations for a taxonomic family")]
#[command(
    long_about = "refseq-fetch asks the NCBI datasets tool for chromosome-level assemblies of a \
                  taxonomic family, downloads the annotation archive and sorts the coding \
                  sequences and gene features into two flat output directories."
)]
#[command(after_help = "EXAMPLES:\n  \
    refseq-fetch --family Gobiidae\n  \
    refseq-fetch --family Cichlidae --output-dir cichlid_data --no-gff\n  \
    refseq-fetch --family Salmonidae --datasets-tool /opt/ncbi/datasets -v\n  \
    refseq-fetch --generate-config --config refseq-fetch.toml")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Taxonomic family to download (e.g. Gobiidae)
    #[arg(long, required_unless_present = "generate_config")]
    pub family: Option<String>,

    /// Base output directory (defaults to refseq_data)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Skip coding-sequence downloads
    #[arg(long)]
    pub no_cds: bool,

    /// Skip gene-feature downloads
    #[arg(long)]
    pub no_gff: bool,

    /// Path to the NCBI datasets binary
    #[arg(long, env = "DATASETS_TOOL")]
    pub datasets_tool: Option<PathBuf>,

    /// Directory that receives the archive and the scratch directory
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// Assembly level passed to the datasets tool
    #[arg(long)]
    pub assembly_level: Option<String>,

    /// Configuration file path
    #[arg(short, long, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Verbose output level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Show the commands that would run without invoking the tool
    #[arg(long)]
    pub dry_run: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        CliOverrides::new()
            .with_tool_path(self.datasets_tool.clone())
            .with_assembly_level(self.assembly_level.clone())
            .with_output_dir(self.output_dir.clone())
            .with_work_dir(self.work_dir.clone())
            .with_skip_cds(self.no_cds)
            .with_skip_gff(self.no_gff)
    }

    /// The family name, trimmed. Empty names are rejected.
    pub fn family_name(&self) -> Result<String> {
        let family = self.family.as_deref().map(str::trim).unwrap_or_default();
        if family.is_empty() {
            return Err(FetchError::Config {
                message: "A family name is required (--family <NAME>)".to_string(),
            });
        }
        Ok(family.to_string())
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["refseq-fetch"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_minimal_invocation() {
        let cli = parse(&["--family", "Gobiidae"]);
        assert_eq!(cli.family_name().unwrap(), "Gobiidae");
        assert!(!cli.no_cds);
        assert!(!cli.no_gff);
        assert!(matches!(cli.output_format, OutputFormat::Human));
    }

    #[test]
    fn test_family_required() {
        assert!(Cli::try_parse_from(["refseq-fetch", "--no-cds"]).is_err());
        assert!(Cli::try_parse_from(["refseq-fetch", "--generate-config"]).is_ok());
    }

    #[test]
    fn test_blank_family_rejected() {
        let cli = parse(&["--family", "  "]);
        assert!(matches!(cli.family_name(), Err(FetchError::Config { .. })));
    }

    #[test]
    fn test_overrides_from_flags() {
        let cli = parse(&[
            "--family",
            "Gobiidae",
            "-o",
            "out",
            "--no-gff",
            "--datasets-tool",
            "/opt/datasets",
            "--work-dir",
            "/tmp/work",
            "--assembly-level",
            "complete",
        ]);
        let overrides = cli.create_cli_overrides();

        assert_eq!(overrides.output_dir, Some(PathBuf::from("out")));
        assert_eq!(overrides.tool_path, Some(PathBuf::from("/opt/datasets")));
        assert_eq!(overrides.work_dir, Some(PathBuf::from("/tmp/work")));
        assert_eq!(overrides.assembly_level.as_deref(), Some("complete"));
        assert!(!overrides.no_cds);
        assert!(overrides.no_gff);
    }

    #[test]
    fn test_both_kinds_disabled_fails_validation() {
        let cli = parse(&["--family", "Gobiidae", "--no-cds", "--no-gff"]);
        assert!(matches!(
            cli.load_config(),
            Err(FetchError::NoContentSelected)
        ));
    }

    #[test]
    fn test_verbosity_level() {
        assert_eq!(parse(&["--family", "x", "-vv"]).verbosity_level(), 2);
        assert_eq!(parse(&["--family", "x", "-q"]).verbosity_level(), 0);
        assert!(Cli::try_parse_from(["refseq-fetch", "--family", "x", "-q", "-v"]).is_err());
    }
}
