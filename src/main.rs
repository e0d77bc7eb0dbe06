// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use incident_report_server::{
    api::router,
    auth::TokenIssuer,
    blob::{BlobStore, CloudinaryBlobStore, LocalBlobStore},
    cipher::FieldCipher,
    classifier::{Classifier, HttpClassifier},
    config::{AppConfig, LogFormat},
    state::AppState,
    storage::{DocumentStore, StoragePaths},
};
use tokio::{net::TcpListener, signal};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn build_blob_store(
    config: &AppConfig,
    paths: &StoragePaths,
) -> Result<Arc<dyn BlobStore>, Box<dyn std::error::Error>> {
    match &config.cloudinary {
        Some(cloudinary) => Ok(Arc::new(CloudinaryBlobStore::new(cloudinary.clone())?)),
        None => {
            warn!("Cloudinary not configured, keeping evidence on local disk");
            Ok(Arc::new(LocalBlobStore::new(paths.uploads_dir())))
        }
    }
}

fn build_classifier(config: &AppConfig) -> Option<Arc<dyn Classifier>> {
    let url = config.ml_service_url.as_deref()?;
    match HttpClassifier::new(url) {
        Ok(classifier) => Some(Arc::new(classifier)),
        Err(e) => {
            warn!(error = %e, "Classifier unavailable, every report will be typed General");
            None
        }
    }
}

/// Cancel `token` on SIGINT or SIGTERM.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT, initiating graceful shutdown..."),
        () = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }

    token.cancel();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    init_tracing(config.log_format);
    info!(?config, "Configuration loaded");

    let paths = StoragePaths::new(&config.data_dir);
    let mut storage = DocumentStore::new(paths.clone());
    storage.initialize()?;

    // Refuse to start with a key that cannot round-trip
    let cipher = FieldCipher::new(&config.aes_secret)?;
    if !cipher.self_test() {
        return Err("field cipher self-test failed".into());
    }

    let blobs = build_blob_store(&config, &paths)?;
    let classifier = build_classifier(&config);
    let tokens = TokenIssuer::new(
        &config.jwt_secret,
        config.jwt_issuer.clone(),
        chrono::Duration::try_hours(config.jwt_ttl_hours)
            .ok_or("JWT_TTL_HOURS out of range")?,
    );

    let state = AppState::new(storage, cipher, blobs, classifier, tokens);

    if let Some(seed) = &config.admin_seed {
        if state.ngos.seed_admin(&seed.name, &seed.email, &seed.password)? {
            info!(email = %seed.email, "Seeded administrator account");
        }
    }

    let app = router(state);
    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr).await?;
    info!(
        "Incident report server listening on http://{addr} (docs at /docs, evidence backend: {})",
        if config.cloudinary.is_some() { "cloudinary" } else { "local" }
    );

    let shutdown = CancellationToken::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    info!("Server stopped");
    Ok(())
}
