use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use nestmtx_bridge::{
    serve_metrics, BroadcastEventPublisher, Config, InMemoryRepository, KeepAliveService,
    LocalPublishService, ProcessTeardown, PrometheusReporter, SdmCommandClient, SessionRepository,
    StaticTokenProvider, StreamSessionOrchestrator, WhipMediaEngine,
};

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse configuration
    let config = Config::parse();

    // Initialize logging
    let default_level = if config.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    info!("Starting nestmtx-bridge v{}", env!("CARGO_PKG_VERSION"));

    // Validate CLI configuration
    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        return Err(e);
    }
    info!("Configuration validated");

    // Initialize metrics
    PrometheusReporter::init_metrics()?;

    // Start metrics server
    let metrics_port = config.metrics_port;
    tokio::spawn(async move {
        serve_metrics(metrics_port).await;
    });
    info!("Metrics server started on port {}", config.metrics_port);

    // Create infrastructure implementations (dependency injection)
    let repository = Arc::new(
        InMemoryRepository::from_file(&config.cameras_file).map_err(|e| anyhow::anyhow!("{}", e))?,
    );
    let tokens = Arc::new(StaticTokenProvider::new(config.sdm_access_token.clone()));
    let commands = Arc::new(
        SdmCommandClient::new(&config.sdm_api_url, tokens, config.command_timeout())
            .map_err(|e| anyhow::anyhow!("{}", e))?,
    );
    let events = Arc::new(BroadcastEventPublisher::new(EVENT_CHANNEL_CAPACITY));

    // Create application services
    let orchestrator = Arc::new(StreamSessionOrchestrator::new(
        commands,
        repository.clone(),
        // Helpers are spawned by an external process manager and registered there
        Arc::new(ProcessTeardown::new()),
        events.clone(),
        Arc::new(PrometheusReporter::new()),
        config.to_orchestrator_settings(),
    ));

    let engine = Arc::new(
        WhipMediaEngine::new(&config.media_engine_url, config.command_timeout())
            .map_err(|e| anyhow::anyhow!("{}", e))?,
    );
    let mut publisher =
        LocalPublishService::new(engine, repository.clone(), config.to_endpoint_resolver());
    if let Some(target) = config
        .to_publish_target()
        .map_err(|e| anyhow::anyhow!("{}", e))?
    {
        publisher = publisher.with_publish_target(target);
    }

    // Report what each camera will expose
    let defaults = config.to_stream_defaults();
    for camera in repository.list_cameras().map_err(|e| anyhow::anyhow!("{}", e))? {
        let capabilities = camera.capabilities();
        let endpoints = publisher
            .endpoints(camera.id())
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        info!(
            camera_id = %camera.id(),
            name = %camera.display_name(),
            protocol = ?capabilities.preferred_protocol(),
            icon = capabilities.icon().unwrap_or("unknown"),
            startup = camera.startup_mode().as_str(),
            rtsp = endpoints.rtsp_tcp.as_deref().unwrap_or("-"),
            hls = endpoints.hls_m3u8.as_deref().unwrap_or("-"),
            "Camera registered"
        );
        if let Some(params) = camera.stream_parameters(&defaults) {
            info!(
                camera_id = %camera.id(),
                width = params.width,
                height = params.height,
                fps = params.fps,
                bitrate_k = params.bitrate_k.round(),
                "WebRTC stream parameters"
            );
        }
        match publisher.publish_destination(camera.id()) {
            Ok(Some(destination)) => {
                info!(camera_id = %camera.id(), destination = %destination, "Publish destination")
            }
            Ok(None) => {}
            Err(e) => warn!(camera_id = %camera.id(), error = %e, "No publish destination"),
        }
    }

    // Log session events
    let mut event_rx = events.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = event_rx.recv().await {
            info!(event = event.name(), camera_id = %event.camera_id(), "Session event");
        }
    });

    // Bring always-on cameras up and keep active streams alive
    let keepalive = Arc::new(KeepAliveService::new(
        orchestrator.clone(),
        repository.clone(),
        config.keepalive_interval(),
    ));
    let started = keepalive
        .start_always_on()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    info!("Started {} always-on camera(s)", started);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let keepalive_task = {
        let keepalive = keepalive.clone();
        tokio::spawn(async move { keepalive.run(shutdown_rx).await })
    };

    // Handle Ctrl+C
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received (Ctrl+C)"),
        Err(err) => error!("Failed to listen for shutdown signal: {}", err),
    }

    // Graceful shutdown
    let _ = shutdown_tx.send(true);
    if let Err(e) = keepalive_task.await {
        warn!("Keep-alive task ended abnormally: {}", e);
    }

    let stopped = keepalive
        .stop_all()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    info!("Stopped {} stream(s), bridge stopped gracefully", stopped);
    Ok(())
}
