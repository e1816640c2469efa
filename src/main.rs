use std::{process, sync::Arc};

use revalidate::{
    application::error::AppError,
    config::{self, Command, LogsCommand, LogsListArgs, PushArgs},
    infra::{audit_store::FileAuditStore, error::InfraError, telemetry},
    revalidation::{EndpointConfig, RevalidationConfig, RevalidationEngine},
};
use revalidate_api_types::DispatchAttempt;
use time::format_description::well_known::Rfc3339;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli().map_err(|err| {
        InfraError::configuration(format!("failed to load configuration: {err}"))
    })?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    let engine = build_engine(&settings)?;

    match cli_args.command {
        Command::Push(args) => run_push(&engine, args).await,
        Command::Logs(args) => match args.command {
            LogsCommand::List(list) => run_logs_list(&engine, list).await,
            LogsCommand::Clear => run_logs_clear(&engine).await,
        },
    }
}

fn build_engine(settings: &config::Settings) -> Result<RevalidationEngine, AppError> {
    let store = Arc::new(FileAuditStore::new(settings.audit.path.clone()));
    let endpoint = EndpointConfig::new(
        settings.endpoint.url.clone(),
        settings.endpoint.token.clone(),
    );
    let engine = RevalidationEngine::new(RevalidationConfig::from(settings), endpoint, store)?;
    Ok(engine)
}

async fn run_push(engine: &RevalidationEngine, args: PushArgs) -> Result<(), AppError> {
    let paths = args
        .targets
        .iter()
        .map(|target| engine.normalize(target))
        .collect();

    let report = engine.force_paths(paths).await?;
    for attempt in &report.attempts {
        println!("{}", describe_attempt(attempt));
    }

    if report.is_success() {
        info!(dispatched = report.dispatched(), "Push finished");
        Ok(())
    } else {
        Err(AppError::unexpected(format!(
            "{} of {} revalidation requests failed",
            report.failures(),
            report.dispatched()
        )))
    }
}

async fn run_logs_list(engine: &RevalidationEngine, args: LogsListArgs) -> Result<(), AppError> {
    let mut entries = engine.audit().list().await;
    if let Some(limit) = args.limit {
        entries.truncate(limit);
    }

    if args.json {
        let rendered = serde_json::to_string_pretty(&entries)
            .map_err(|err| AppError::unexpected(format!("failed to encode audit log: {err}")))?;
        println!("{rendered}");
        return Ok(());
    }

    if entries.is_empty() {
        println!("audit log is empty");
    }
    for attempt in &entries {
        println!("{}", describe_attempt(attempt));
    }
    Ok(())
}

async fn run_logs_clear(engine: &RevalidationEngine) -> Result<(), AppError> {
    if engine.audit().clear().await {
        println!("audit log cleared");
        Ok(())
    } else {
        Err(AppError::unexpected("failed to clear audit log"))
    }
}

fn describe_attempt(attempt: &DispatchAttempt) -> String {
    let timestamp = attempt
        .timestamp
        .format(&Rfc3339)
        .unwrap_or_else(|_| attempt.timestamp.to_string());
    let detail = match (attempt.status_code, attempt.transport_failure()) {
        (Some(code), _) => code.to_string(),
        (None, Some(failure)) => format!("{}: {}", failure.code, failure.message),
        (None, None) => "-".to_string(),
    };
    format!(
        "{timestamp}  {:<7}  {:<40}  {detail}",
        attempt.status.as_str(),
        attempt.path
    )
}
