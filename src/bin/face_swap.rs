use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use genmedia_relay::{
    app,
    app_state::FaceSwapState,
    config::AppConfig,
    services::{
        face_swap::FaceSwapClient,
        jobs::JobStore,
        locator::{ArtifactLocator, StorageNaming},
        presets::PresetRegistry,
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

    let config = AppConfig::from_env().expect("Failed to load configuration from environment");
    let credentials = config
        .face_swap_credentials()
        .expect("Face-swap provider settings are required by the face-swap service");

    tracing::info!("Starting face swap server");

    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    metrics::describe_counter!("media_jobs_submitted_total", "Jobs accepted by a provider");
    metrics::describe_counter!("media_jobs_succeeded_total", "Jobs whose result was stored");
    metrics::describe_counter!("media_jobs_failed_total", "Jobs that ended in failure or timeout");
    metrics::describe_histogram!("media_job_duration_seconds", "Time from submission to terminal state");
    metrics::describe_gauge!("media_jobs_in_flight", "Background workers currently running");

    let presets = match &config.face_swap_presets_path {
        Some(path) => {
            tracing::info!(path = %path, "Loading preset registry");
            PresetRegistry::from_file(path).expect("Failed to load preset registry")
        }
        None => PresetRegistry::bundled().expect("Bundled preset registry is invalid"),
    };

    let storage = S3Storage::new(
        &config.s3_bucket_name,
        &config.s3_region,
        config.s3_endpoint.as_deref(),
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
    )
    .expect("Failed to initialize S3 client");

    let provider = FaceSwapClient::new(
        credentials.base_url,
        credentials.client_id,
        credentials.client_secret,
    );

    let naming = StorageNaming::new(&config.s3_bucket_name, &config.s3_region)
        .with_public_base_url(config.s3_public_base_url.clone());

    let state = FaceSwapState {
        jobs: Arc::new(JobStore::new()),
        storage: Arc::new(storage),
        provider: Arc::new(provider),
        presets: Arc::new(presets),
        result_locator: Arc::new(ArtifactLocator::new(naming.clone(), "face-swap/results", "jpg")),
        upload_locator: Arc::new(ArtifactLocator::new(naming, "face-swap/uploads", "jpg")),
        settings: PollSettings::new(config.face_swap_poll_interval(), config.face_swap_timeout()),
    };

    let app = app::face_swap_router(state, Some(prometheus_handle));

    let listener = tokio::net::TcpListener::bind(&config.face_swap_bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Face swap service listening on {}", config.face_swap_bind_addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
