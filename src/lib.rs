pub mod cli;
pub mod config;
pub mod datasets;
pub mod error;
pub mod extractor;
pub mod logging;
pub mod report;
pub mod scanner;
pub mod ui;

// Public API re-exports
pub use cli::{Cli, OutputFormat};
pub use config::{CliOverrides, Config, DatasetsConfig, DownloadConfig, OutputConfig};
pub use error::{FetchError, Result, UserFriendlyError};

// Core functionality re-exports
pub use datasets::{ContentKind, DatasetsCli, DatasetsClient, ToolOutput, ToolRunner};
pub use extractor::{
    AnnotationPipeline, ArchiveExtractor, FileOrganizer, OrganizeOutcome, OrganizeProgress,
    OrganizedFile,
};
pub use report::{ConfigSnapshot, FailedStep, FamilyReport, TaxonResult};
pub use scanner::{AnnotationFile, AnnotationKind, AnnotationScanner};
pub use ui::{GracefulShutdown, OutputFormatter, OutputMode, ProgressManager};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task;
use tracing::{error, info, warn};

/// Fetches and organizes RefSeq annotations one family at a time.
pub struct RefSeqFetch {
    config: Config,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
    shutdown: GracefulShutdown,
    client: DatasetsClient,
    pipeline: AnnotationPipeline,
}

impl RefSeqFetch {
    /// Uses the configured datasets binary and installs the Ctrl-C handler.
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Result<Self> {
        let runner: Arc<dyn ToolRunner> =
            Arc::new(DatasetsCli::new(config.datasets.tool_path.clone()));
        let shutdown = GracefulShutdown::new()?;

        Ok(Self::with_runner(
            config,
            output_mode,
            verbose,
            quiet,
            runner,
            shutdown,
        ))
    }

    pub fn with_runner(
        config: Config,
        output_mode: OutputMode,
        verbose: u8,
        quiet: bool,
        runner: Arc<dyn ToolRunner>,
        shutdown: GracefulShutdown,
    ) -> Self {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(!quiet && output_mode == OutputMode::Human);
        let client =
            DatasetsClient::new(runner).with_assembly_level(config.datasets.assembly_level.clone());
        let pipeline = AnnotationPipeline::new(
            ArchiveExtractor::new(config.download.work_directory.clone()),
            FileOrganizer::from_config(&config),
        );

        Self {
            config,
            output_formatter,
            progress_manager,
            shutdown,
            client,
            pipeline,
        }
    }

    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        let output_mode = match cli_args.output_format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        };

        Self::new(config, output_mode, cli_args.verbosity_level(), cli_args.quiet)
    }

    /// Runs `--version`; an error here means no family can be processed.
    pub async fn check_tool(&self) -> Result<String> {
        let client = self.client.clone();
        let version = task::spawn_blocking(move || client.version())
            .await
            .map_err(join_error)??;

        info!("Using NCBI datasets: {}", version);
        self.output_formatter
            .debug(&format!("Using NCBI datasets: {}", version));
        Ok(version)
    }

    /// Preview record count. Tool failures and bad output count as zero.
    pub async fn check_availability(&self, family: &str) -> Result<u64> {
        let spinner = self
            .progress_manager
            .create_spinner(&format!("Searching for {} assemblies...", family));

        let client = self.client.clone();
        let family_owned = family.to_string();
        let count = task::spawn_blocking(move || client.record_count(&family_owned))
            .await
            .map_err(join_error)?;

        spinner.finish_and_clear();
        Ok(count)
    }

    /// Downloads the archive for a taxon into the work directory.
    pub async fn download_archive(&self, taxon: &str) -> Result<PathBuf> {
        let spinner = self
            .progress_manager
            .create_spinner(&format!("Downloading {} annotations...", taxon));

        let client = self.client.clone();
        let kinds = self.config.content_kinds();
        let work_dir = self.config.download.work_directory.clone();
        let taxon_owned = taxon.to_string();
        let result =
            task::spawn_blocking(move || client.download(&taxon_owned, &kinds, &work_dir))
                .await
                .map_err(join_error)?;

        spinner.finish_and_clear();
        result
    }

    /// Extracts the archive and moves matching annotations into place.
    pub async fn extract_and_organize(&self, archive: &Path, taxon: &str) -> Result<OrganizeOutcome> {
        self.output_formatter
            .start_operation(&format!("Organizing {} annotation files", taxon));

        let file_progress = self.progress_manager.create_file_progress(0);
        let pipeline = self.pipeline.clone();
        let archive = archive.to_path_buf();
        let taxon_owned = taxon.to_string();
        let pb = file_progress.clone();

        let outcome = task::spawn_blocking(move || {
            let callback = move |progress: &OrganizeProgress| {
                ui::progress::update_file_progress(&pb, progress);
            };
            pipeline.extract_and_organize(&archive, &taxon_owned, Some(&callback))
        })
        .await
        .map_err(join_error)?;

        match outcome {
            Ok(outcome) => {
                ui::progress::finish_progress_with_summary(
                    &file_progress,
                    &format!("Organized {} files", outcome.matched()),
                    outcome.elapsed,
                );
                Ok(outcome)
            }
            Err(e) => {
                file_progress.abandon();
                Err(e)
            }
        }
    }

    /// Check availability, download, extract and organize one family.
    pub async fn download_family(&self, family: &str) -> Result<FamilyReport> {
        self.shutdown.check_shutdown()?;

        let mut report = FamilyReport::new(family, &self.config);
        self.output_formatter
            .start_operation(&format!("Processing family: {}", family));

        self.pipeline.organizer().initialize()?;
        std::fs::create_dir_all(&self.config.download.work_directory)?;

        let record_count = self.check_availability(family).await?;
        report.record_count = record_count;
        self.shutdown.check_shutdown()?;

        let taxa = available_taxa(family, record_count);
        if taxa.is_empty() {
            return Err(FetchError::NoRecordsFound {
                family: family.to_string(),
                assembly_level: self.config.datasets.assembly_level.clone(),
            });
        }

        self.output_formatter.info(&format!(
            "Found {} {} genomes with {}-level assemblies",
            record_count, family, self.config.datasets.assembly_level
        ));

        for taxon in &taxa {
            self.shutdown.check_shutdown()?;
            let result = self.process_taxon(taxon).await?;
            report.taxa.push(result);
        }

        report.finish();
        info!(
            "Download summary for {}: {}/{} taxa processed successfully",
            family,
            report.taxa_succeeded(),
            report.taxa_total()
        );

        if !report.is_success() {
            return Err(FetchError::AllTaxaFailed {
                family: family.to_string(),
                total: report.taxa_total(),
                errors: report.errors(),
                step: report.failed_step(),
            });
        }

        self.output_formatter.success(&format!(
            "Organized annotations for {} into {}",
            family,
            self.config.output.base_directory.display()
        ));

        Ok(report)
    }

    /// Per-taxon failures are recorded, not returned. Only cancellation and
    /// background-task failures propagate.
    async fn process_taxon(&self, taxon: &str) -> Result<TaxonResult> {
        let archive = match self.download_archive(taxon).await {
            Ok(path) => path,
            Err(e) if is_abort(&e) => return Err(e),
            Err(e) => {
                warn!("Failed to download data for {}: {}", taxon, e);
                return Ok(TaxonResult::failed(taxon, FailedStep::Download, e.to_string()));
            }
        };
        self.shutdown.check_shutdown()?;

        match self.extract_and_organize(&archive, taxon).await {
            Ok(outcome) => {
                let success = outcome.is_success();
                if !success {
                    warn!("No annotation files were organized for {}", taxon);
                }
                Ok(TaxonResult {
                    taxon: taxon.to_string(),
                    success,
                    failed_step: (!success).then_some(FailedStep::Organize),
                    error: (!success).then(|| "no CDS or GFF files found".to_string()),
                    organized: outcome.organized,
                    unmatched_listing: outcome.unmatched_listing,
                })
            }
            Err(e) if is_abort(&e) => Err(e),
            Err(e) => {
                error!("Error processing {}: {}", archive.display(), e);
                Ok(TaxonResult::failed(taxon, FailedStep::Organize, e.to_string()))
            }
        }
    }

    /// Command lines a real run would execute, in order.
    pub fn planned_commands(&self, family: &str) -> Result<Vec<String>> {
        let version = self.client.command_line(&["--version".to_string()]);
        let preview = self.client.command_line(&self.client.preview_args(family));
        let download = self
            .client
            .command_line(&self.client.download_args(family, &self.config.content_kinds())?);
        Ok(vec![version, preview, download])
    }

    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        let sample_config = Config::create_sample_config();
        std::fs::write(output_path.as_ref(), sample_config)?;
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    pub fn request_shutdown(&self) {
        self.shutdown.request_shutdown();
    }

    pub fn handle_error(&self, error: &FetchError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}

/// Taxa to process for a family: the family itself when the preview found
/// records, otherwise none.
pub fn available_taxa(family: &str, record_count: u64) -> Vec<String> {
    if record_count > 0 {
        vec![family.to_string()]
    } else {
        Vec::new()
    }
}

fn is_abort(error: &FetchError) -> bool {
    matches!(error, FetchError::Cancelled | FetchError::Task { .. })
}

fn join_error(e: task::JoinError) -> FetchError {
    FetchError::Task {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::mock::RecordingRunner;
    use crate::extractor::archive_extractor::test_support::zip_bytes;
    use tempfile::TempDir;

    struct Harness {
        _dir: TempDir,
        work_dir: PathBuf,
        fetcher: RefSeqFetch,
        runner: Arc<RecordingRunner>,
    }

    fn harness(runner: RecordingRunner) -> Harness {
        harness_with(runner, |_| {})
    }

    fn harness_with(runner: RecordingRunner, adjust: impl FnOnce(&mut Config)) -> Harness {
        let dir = TempDir::new().unwrap();
        let work_dir = dir.path().to_path_buf();

        let mut config = Config::default();
        config.download.work_directory = work_dir.clone();
        config.output.base_directory = work_dir.join("refseq_data");
        adjust(&mut config);

        let runner = Arc::new(runner);
        let fetcher = RefSeqFetch::with_runner(
            config,
            OutputMode::Plain,
            0,
            true,
            runner.clone(),
            GracefulShutdown::new_for_test(),
        );

        Harness {
            _dir: dir,
            work_dir,
            fetcher,
            runner,
        }
    }

    #[tokio::test]
    async fn test_zero_records_skips_download() {
        let h = harness(
            RecordingRunner::new().with_preview(ToolOutput::ok(r#"{"record_count": 0}"#)),
        );

        let result = h.fetcher.download_family("Gobiidae").await;

        assert!(matches!(result, Err(FetchError::NoRecordsFound { .. })));
        assert_eq!(h.runner.download_calls(), 0);
        assert!(available_taxa("Gobiidae", 0).is_empty());
        assert_eq!(available_taxa("Gobiidae", 4), vec!["Gobiidae"]);
    }

    #[tokio::test]
    async fn test_preview_failure_counts_as_no_data() {
        let h = harness(RecordingRunner::new().with_preview(ToolOutput::failed(1, "boom")));

        let result = h.fetcher.download_family("Gobiidae").await;

        assert!(matches!(result, Err(FetchError::NoRecordsFound { .. })));
        assert_eq!(h.runner.download_calls(), 0);
    }

    #[tokio::test]
    async fn test_full_family_run() {
        let archive = zip_bytes(&[
            (
                "ncbi_dataset/data/GCF_000001.1/cds_from_genomic.fna",
                ">cds\nATG\n",
            ),
            ("ncbi_dataset/data/GCF_000001.1/genomic.gff", "##gff-version 3\n"),
            ("ncbi_dataset/data/assembly_data_report.jsonl", "{}\n"),
        ]);
        let h = harness(
            RecordingRunner::new()
                .with_preview(ToolOutput::ok(r#"{"record_count": 3}"#))
                .with_archive(archive),
        );

        let report = h.fetcher.download_family("Gobiidae").await.unwrap();

        assert_eq!(report.record_count, 3);
        assert_eq!(report.taxa_total(), 1);
        assert_eq!(report.taxa_succeeded(), 1);

        let output = h.work_dir.join("refseq_data");
        assert!(output
            .join("cds_files/GCF_000001.1_Gobiidae.fna")
            .is_file());
        assert!(output
            .join("gff_files/GCF_000001.1_Gobiidae.gff")
            .is_file());
        assert!(!h.work_dir.join("temp_Gobiidae").exists());
        assert!(!h
            .work_dir
            .join("refseq_Gobiidae_chromosome_data.zip")
            .exists());

        let calls = h.runner.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].is_preview());
        assert!(calls[1].is_download());
        assert_eq!(calls[1].current_dir, h.work_dir);
    }

    #[tokio::test]
    async fn test_download_failure_fails_all_taxa() {
        let h = harness(RecordingRunner::new().with_download(ToolOutput::failed(2, "network")));

        let result = h.fetcher.download_family("Gobiidae").await;

        match result {
            Err(FetchError::AllTaxaFailed {
                total, errors, step, ..
            }) => {
                assert_eq!(total, 1);
                assert_eq!(step, Some(FailedStep::Download));
                assert_eq!(errors.len(), 1);
                assert!(errors[0].contains("exit code Some(2)"));
            }
            other => panic!("unexpected result: {:?}", other.map(|r| r.family)),
        }
        assert_eq!(h.runner.download_calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_work_directory_is_created() {
        let archive = zip_bytes(&[("GCF_1/genomic.gff", "##gff-version 3\n")]);
        let h = harness_with(RecordingRunner::new().with_archive(archive), |config| {
            config.download.work_directory = config
                .output
                .base_directory
                .with_file_name("nested/work");
        });
        let work_dir = h.work_dir.join("nested/work");

        let report = h.fetcher.download_family("Gobiidae").await.unwrap();

        assert!(report.is_success());
        assert!(work_dir.is_dir());
        let download = h.runner.calls().into_iter().find(|c| c.is_download()).unwrap();
        assert_eq!(download.current_dir, work_dir);
    }

    #[tokio::test]
    async fn test_no_matching_files_fails_but_cleans_up() {
        let archive = zip_bytes(&[("ncbi_dataset/data/GCF_1/genomic.fna", ">chr1\n")]);
        let h = harness(RecordingRunner::new().with_archive(archive));

        let result = h.fetcher.download_family("Gobiidae").await;

        assert!(matches!(
            result,
            Err(FetchError::AllTaxaFailed {
                step: Some(FailedStep::Organize),
                ..
            })
        ));
        assert!(!h.work_dir.join("temp_Gobiidae").exists());
        assert!(!h
            .work_dir
            .join("refseq_Gobiidae_chromosome_data.zip")
            .exists());
    }

    #[tokio::test]
    async fn test_download_uses_selected_kinds() {
        let archive = zip_bytes(&[("GCF_1/genomic.gff", "##gff-version 3\n")]);
        let h = harness_with(RecordingRunner::new().with_archive(archive), |config| {
            config.download.include_cds = false;
        });

        h.fetcher.download_family("Gobiidae").await.unwrap();

        let calls = h.runner.calls();
        let download = calls.iter().find(|c| c.is_download()).unwrap();
        let include = download
            .args
            .iter()
            .skip_while(|a| *a != "--include")
            .nth(1)
            .unwrap();
        assert_eq!(include, "gff3");

        let preview = calls.iter().find(|c| c.is_preview()).unwrap();
        assert!(preview.args.contains(&"cds,gff3".to_string()));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let h = harness(RecordingRunner::new());
        h.fetcher.request_shutdown();

        let result = h.fetcher.download_family("Gobiidae").await;

        assert!(matches!(result, Err(FetchError::Cancelled)));
        assert!(h.runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_check_tool() {
        let h = harness(RecordingRunner::new());
        assert_eq!(h.fetcher.check_tool().await.unwrap(), "datasets version: 16.22.1");

        let broken = harness(
            RecordingRunner::new().with_version(ToolOutput::failed(127, "not found")),
        );
        assert!(matches!(
            broken.fetcher.check_tool().await,
            Err(FetchError::ToolUnavailable { .. })
        ));
    }

    #[test]
    fn test_planned_commands() {
        let h = harness(RecordingRunner::new());
        let commands = h.fetcher.planned_commands("Gobiidae").unwrap();

        assert_eq!(commands[0], "datasets --version");
        assert!(commands[1].ends_with("--preview"));
        assert!(commands[2]
            .ends_with("--include cds,gff3 --assembly-level chromosome --filename refseq_Gobiidae_chromosome_data.zip"));
    }

    #[test]
    fn test_sample_config_generation() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("sample.toml");

        RefSeqFetch::generate_sample_config(&config_path).unwrap();

        let content = std::fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[datasets]"));
        assert!(content.contains("[download]"));
        assert!(content.contains("[output]"));
    }
}
