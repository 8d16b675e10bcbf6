use clap::Parser;
use refseq_fetch::logging::init_logging;
use refseq_fetch::{
    Cli, FetchError, OutputFormatter, OutputMode, RefSeqFetch, UserFriendlyError,
};
use std::process;

const DEFAULT_CONFIG_FILE: &str = "refseq-fetch.toml";

#[tokio::main]
async fn main() {
    let exit_code = run().await;
    process::exit(exit_code);
}

async fn run() -> i32 {
    let cli = Cli::parse();

    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    init_logging(cli.verbosity_level(), cli.quiet);

    let family = match cli.family_name() {
        Ok(family) => family,
        Err(e) => {
            print_startup_error(&e);
            return 1;
        }
    };

    // Configuration problems, including both kinds disabled, stop here
    // before the datasets tool is ever run.
    let fetcher = match RefSeqFetch::from_cli(&cli) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            print_startup_error(&e);
            return 1;
        }
    };

    if cli.dry_run {
        return handle_dry_run(&fetcher, &family);
    }

    if let Err(e) = fetcher.check_tool().await {
        fetcher.handle_error(&e);
        return exit_code_for(&e);
    }

    match fetcher.download_family(&family).await {
        Ok(report) => {
            fetcher.output_formatter().print_fetch_report(&report);
            0
        }
        Err(e) => {
            fetcher.handle_error(&e);
            exit_code_for(&e)
        }
    }
}

fn exit_code_for(error: &FetchError) -> i32 {
    match error {
        FetchError::Cancelled => 130,
        _ => 1,
    }
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());

    match RefSeqFetch::generate_sample_config(&config_path) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", config_path);
            println!("\nTo use this configuration:");
            println!("  refseq-fetch --family <NAME> --config {}", config_path);
            println!("\nEdit the file to customize settings for your needs.");
            0
        }
        Err(e) => {
            eprintln!(
                "Failed to generate configuration file: {}",
                e.user_message()
            );
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

fn handle_dry_run(fetcher: &RefSeqFetch, family: &str) -> i32 {
    let formatter = fetcher.output_formatter();
    let config = fetcher.config();

    formatter.warning("DRY RUN MODE - the datasets tool will not be invoked");
    formatter.print_separator();

    let commands = match fetcher.planned_commands(family) {
        Ok(commands) => commands,
        Err(e) => {
            formatter.print_user_friendly_error(&e);
            return 1;
        }
    };

    println!("Family: {}", family);
    println!("Commands:");
    for command in &commands {
        println!("  {}", command);
    }
    println!("Work directory: {}", config.download.work_directory.display());
    println!("CDS files -> {}", config.cds_directory().display());
    println!("GFF files -> {}", config.gff_directory().display());

    formatter.print_separator();
    formatter.success("Dry run completed successfully");
    0
}

fn print_startup_error(error: &FetchError) {
    let formatter = OutputFormatter::new(OutputMode::Human, 0, false);
    formatter.print_user_friendly_error(error);
}
