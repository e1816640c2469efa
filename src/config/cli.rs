use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the revalidate operator binary.
#[derive(Debug, Parser)]
#[command(
    name = "revalidate",
    version,
    about = "Trigger and inspect on-demand revalidation of a headless front end"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "REVALIDATE_CONFIG_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath,
        global = true
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: GlobalOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Revalidate paths or URLs now, ignoring the cooldown window.
    Push(PushArgs),
    /// Inspect or clear the dispatch audit log.
    Logs(LogsArgs),
}

#[derive(Debug, Args, Clone)]
pub struct PushArgs {
    /// Relative paths or absolute URLs on the site.
    #[arg(value_name = "TARGET", required = true)]
    pub targets: Vec<String>,
}

#[derive(Debug, Args, Clone)]
pub struct LogsArgs {
    #[command(subcommand)]
    pub command: LogsCommand,
}

#[derive(Debug, Subcommand, Clone)]
pub enum LogsCommand {
    /// Print audit entries, newest first.
    List(LogsListArgs),
    /// Delete the audit log.
    Clear,
}

#[derive(Debug, Args, Clone, Default)]
pub struct LogsListArgs {
    /// Show at most this many entries.
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,

    /// Print entries as a JSON array.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub json: bool,
}

#[derive(Debug, Args, Default, Clone)]
pub struct GlobalOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Override the public base URL of the CMS site.
    #[arg(long = "site-base-url", value_name = "URL", value_hint = ValueHint::Url, global = true)]
    pub site_base_url: Option<String>,

    /// Override the revalidation endpoint URL.
    #[arg(long = "endpoint-url", value_name = "URL", value_hint = ValueHint::Url, global = true)]
    pub endpoint_url: Option<String>,

    /// Override the revalidation auth token.
    #[arg(long = "endpoint-token", value_name = "TOKEN", global = true)]
    pub endpoint_token: Option<String>,

    /// Override the audit log file location.
    #[arg(long = "audit-path", value_name = "PATH", value_hint = ValueHint::FilePath, global = true)]
    pub audit_path: Option<PathBuf>,
}
