use crate::commands::{
    run_cache_clear, run_cache_show, run_extract, run_load, run_watch, ExtractArgs, LoadArgs,
    WatchArgs,
};
use clap::{Parser, Subcommand};
use report_widget::config::AppConfig;
use report_widget::error::AppError;
use report_widget::telemetry;

#[derive(Parser, Debug)]
#[command(
    name = "Report Widget",
    about = "Fetch, cache and publish the job market report shown by the display widget",
    version
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Run one cache-gated load and publish the report (default command)
    Load(LoadArgs),
    /// Extract a report from a local CSV export without touching the cache
    Extract(ExtractArgs),
    /// Reload and publish the report on a fixed cadence until interrupted
    Watch(WatchArgs),
    /// Inspect or clear the cached report
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum CacheCommand {
    /// Print the cached report with its age
    Show,
    /// Delete the cached report
    Clear,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let command = cli
        .command
        .unwrap_or_else(|| Command::Load(LoadArgs::default()));

    match command {
        Command::Load(args) => run_load(args, &config).await,
        Command::Extract(args) => run_extract(args, &config),
        Command::Watch(args) => run_watch(args, &config).await,
        Command::Cache {
            command: CacheCommand::Show,
        } => run_cache_show(&config),
        Command::Cache {
            command: CacheCommand::Clear,
        } => run_cache_clear(&config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use report_widget::extract::AddressingKind;
    use report_widget::source::SourceSpec;
    use std::path::PathBuf;

    #[test]
    fn no_subcommand_defaults_to_load() {
        let cli = Cli::try_parse_from(["report-widget"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn extract_accepts_layout_overrides() {
        let cli = Cli::try_parse_from([
            "report-widget",
            "extract",
            "--csv",
            "export.csv",
            "--addressing",
            "fixed-position",
            "--max-entries",
            "5",
        ])
        .expect("parses");

        let Some(Command::Extract(args)) = cli.command else {
            panic!("expected extract command");
        };
        assert_eq!(args.csv, PathBuf::from("export.csv"));
        assert_eq!(args.addressing, Some(AddressingKind::FixedPosition));
        assert_eq!(args.max_entries, Some(5));
    }

    #[test]
    fn watch_parses_source_and_cadence() {
        let cli = Cli::try_parse_from([
            "report-widget",
            "watch",
            "--source",
            "https://example.com/export.csv",
            "--every",
            "300",
            "--cycles",
            "2",
        ])
        .expect("parses");

        let Some(Command::Watch(args)) = cli.command else {
            panic!("expected watch command");
        };
        assert!(matches!(args.source, Some(SourceSpec::Url(_))));
        assert_eq!(args.every, Some(300));
        assert_eq!(args.cycles, Some(2));
    }

    #[test]
    fn rejects_unknown_addressing_mode() {
        let result = Cli::try_parse_from([
            "report-widget",
            "extract",
            "--csv",
            "export.csv",
            "--addressing",
            "grid",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn cache_subcommands_parse() {
        let cli = Cli::try_parse_from(["report-widget", "cache", "clear"]).expect("parses");
        assert!(matches!(
            cli.command,
            Some(Command::Cache {
                command: CacheCommand::Clear
            })
        ));
    }
}
