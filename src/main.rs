use std::{path::PathBuf, process, sync::Arc};

use bytes::Bytes;
use courier_intake::{
    admission::AdmissionController,
    application::error::AppError,
    cache::{Cache, CacheConfig, CacheProfile, ScopedCache},
    config::{self, Command, FrameFormat, MintArgs, ScanArgs, Settings},
    domain::scan::ScanResponse,
    identity::IdentifierIssuer,
    infra::{error::InfraError, telemetry},
    intake::{
        DisabledVisionAnalyzer, FrameOutcome, HttpVisionAnalyzer, ImageQrDecoder,
        InMemoryScanRepository, LocalDecoder, ScanIntake, TextPayloadDecoder, VisionAnalyzer,
    },
};
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;
use uuid::Uuid;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(i32::from(error.exit_code()));
    }
}

fn report_application_error(error: &AppError) {
    let report = error.report();
    if dispatcher::has_been_set() {
        error!(error = %error, chain = ?report.messages, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(std::io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, chain = ?report.messages, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match cli_args.command {
        Command::Mint(args) => run_mint(&settings, args),
        Command::Scan(args) => run_scan(&settings, args).await,
    }
}

fn run_mint(settings: &Settings, args: MintArgs) -> Result<(), AppError> {
    let cache: Arc<Cache<Uuid, String>> = Arc::new(Cache::new());
    let qr_codes = ScopedCache::new(CacheProfile::QR_CODES, Arc::clone(&cache));
    let issuer = IdentifierIssuer::new(settings.intake.tracking_prefix.clone());

    for _ in 0..args.count {
        let uuid = issuer.issue_uuid(cache.as_ref())?;
        let issued = issuer.issue_tracking_number(uuid)?;
        qr_codes
            .record(uuid, issued.tracking_number().to_owned())
            .map_err(|err| AppError::unexpected(err.to_string()))?;

        let line = serde_json::to_string(&issued)
            .map_err(|err| AppError::unexpected(format!("failed to encode output: {err}")))?;
        println!("{line}");
    }

    info!(issued = args.count, "identifier pairs issued");
    Ok(())
}

#[derive(Debug, Serialize)]
struct ScanReport {
    file: String,
    #[serde(flatten)]
    outcome: FrameOutcome,
}

async fn run_scan(settings: &Settings, args: ScanArgs) -> Result<(), AppError> {
    let vision: Arc<dyn VisionAnalyzer> = match settings.vision.endpoint.as_deref() {
        Some(endpoint) => {
            let analyzer = HttpVisionAnalyzer::new(
                endpoint,
                settings.vision.model.clone(),
                settings.vision.api_key.clone(),
                settings.vision.timeout,
            )
            .map_err(|err| InfraError::configuration(format!("vision.endpoint: {err}")))?;
            info!(
                endpoint = %analyzer.endpoint(),
                model = %settings.vision.model,
                "vision analyzer configured"
            );
            Arc::new(analyzer)
        }
        None => {
            warn!("no vision endpoint configured; every admitted frame will fail analysis");
            Arc::new(DisabledVisionAnalyzer)
        }
    };

    let decoder: Arc<dyn LocalDecoder> = match args.format {
        FrameFormat::Image => Arc::new(ImageQrDecoder),
        FrameFormat::Text => Arc::new(TextPayloadDecoder),
    };

    let cache: Arc<Cache<Uuid, ScanResponse>> = Arc::new(Cache::new());
    let admission = AdmissionController::new();
    let sweeper = admission.spawn_sweeper(settings.admission.sweep_interval);

    let intake = Arc::new(ScanIntake::new(
        decoder,
        vision,
        Arc::new(InMemoryScanRepository::new()),
        admission,
        Arc::clone(&cache),
        settings.intake_config(),
    ));

    let mut tasks = JoinSet::new();
    for (index, path) in args.files.into_iter().enumerate() {
        let frame = tokio::fs::read(&path).await.map_err(InfraError::from)?;
        let intake = Arc::clone(&intake);
        let caller = args.caller.clone();
        tasks.spawn(async move {
            let outcome = intake.process_frame(&caller, Bytes::from(frame)).await;
            (index, path, outcome)
        });
    }

    let mut results: Vec<(usize, PathBuf, FrameOutcome)> = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        let (index, path, outcome) =
            joined.map_err(|err| AppError::unexpected(format!("scan task failed: {err}")))?;
        results.push((index, path, outcome?));
    }
    sweeper.abort();
    results.sort_by_key(|(index, _, _)| *index);

    let found = results.iter().filter(|(_, _, outcome)| outcome.is_found()).count();
    for (_, path, outcome) in results {
        let report = ScanReport {
            file: path.display().to_string(),
            outcome,
        };
        let line = serde_json::to_string(&report)
            .map_err(|err| AppError::unexpected(format!("failed to encode output: {err}")))?;
        println!("{line}");
    }

    let stats = cache.stats(CacheConfig::from(&settings.cache).stats_max_age());
    info!(found, %stats, "scan run finished");
    Ok(())
}
