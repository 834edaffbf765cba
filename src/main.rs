use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use genmedia_relay::{
    app,
    app_state::VideoState,
    config::AppConfig,
    services::{
        jobs::JobStore,
        kling::KlingClient,
        locator::{ArtifactLocator, StorageNaming},
        provider::GenerationOptions,
        signing,
        storage::S3Storage,
        worker::PollSettings,
    },
};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");
    let kling = config
        .kling_credentials()
        .expect("Kling credentials are required by the video service");

    tracing::info!("Initializing video generation server");

    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    metrics::describe_counter!("media_jobs_submitted_total", "Jobs accepted by a provider");
    metrics::describe_counter!("media_jobs_succeeded_total", "Jobs whose result was stored");
    metrics::describe_counter!("media_jobs_failed_total", "Jobs that ended in failure or timeout");
    metrics::describe_histogram!("media_job_duration_seconds", "Time from submission to terminal state");
    metrics::describe_gauge!("media_jobs_in_flight", "Background workers currently running");

    tracing::info!(bucket = %config.s3_bucket_name, region = %config.s3_region, "Initializing S3 storage client");
    let storage = S3Storage::new(
        &config.s3_bucket_name,
        &config.s3_region,
        config.s3_endpoint.as_deref(),
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
    )
    .expect("Failed to initialize S3 client");

    tracing::info!(base_url = %config.kling_base_url, scheme = ?config.kling_auth_scheme, "Initializing Kling client");
    let provider = KlingClient::new(
        &config.kling_base_url,
        signing::signer_for(config.kling_auth_scheme, kling.access_key, kling.secret_key),
    );

    let naming = StorageNaming::new(&config.s3_bucket_name, &config.s3_region)
        .with_public_base_url(config.s3_public_base_url.clone());

    let state = VideoState::new(
        Arc::new(JobStore::new()),
        Arc::new(storage),
        Arc::new(provider),
        ArtifactLocator::new(naming, "ai-videos", "mp4"),
        GenerationOptions {
            model_name: config.kling_model_name.clone(),
            ..GenerationOptions::default()
        },
        PollSettings::new(config.video_poll_interval(), config.video_timeout()),
    );

    let app = app::video_router(state, Some(prometheus_handle));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Video service listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
