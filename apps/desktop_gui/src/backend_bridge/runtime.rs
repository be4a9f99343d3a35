//! Runtime bridge between UI command queue and backend event intake.

use std::{sync::Arc, thread};

use client_core::{ClientSettings, HttpTryOnService, ProgressCallback, TryOnService};
use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};
use crate::ui::images::decode_preview_image;

/// Starts the worker thread. It owns a tokio runtime and runs every command
/// as its own task, so the two slot uploads proceed independently.
pub fn launch(cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>, settings: ClientSettings) {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        let service: Arc<dyn TryOnService> = match HttpTryOnService::new(&settings) {
            Ok(service) => {
                tracing::info!(base_url = %service.base_url(), "try-on service client ready");
                Arc::new(service)
            }
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: {err:#}"),
                )));
                tracing::error!("failed to build try-on service client: {err:#}");
                return;
            }
        };
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker ready".to_string()));

        while let Ok(cmd) = cmd_rx.recv() {
            tracing::debug!(command = cmd.name(), "backend: dispatching command");
            runtime.spawn(run_command(Arc::clone(&service), ui_tx.clone(), cmd));
        }
        tracing::info!("backend: command queue closed, worker exiting");
    });
}

/// Completion events must reach the UI or a slot or the controller would
/// stay busy forever. A full queue is waited on from the blocking pool so
/// runtime workers stay free for the other in-flight requests.
async fn deliver(ui_tx: &Sender<UiEvent>, event: UiEvent) {
    let event = match ui_tx.try_send(event) {
        Ok(()) => return,
        Err(TrySendError::Disconnected(_)) => {
            tracing::warn!("backend: ui event queue closed");
            return;
        }
        Err(TrySendError::Full(event)) => event,
    };

    tracing::debug!("backend: ui event queue full, waiting for the ui to drain it");
    let ui_tx = ui_tx.clone();
    match tokio::task::spawn_blocking(move || ui_tx.send(event)).await {
        Ok(Ok(())) => {}
        Ok(Err(_)) => tracing::warn!("backend: ui event queue closed"),
        Err(err) => tracing::error!("backend: ui event delivery task failed: {err}"),
    }
}

async fn run_command(service: Arc<dyn TryOnService>, ui_tx: Sender<UiEvent>, cmd: BackendCommand) {
    match cmd {
        BackendCommand::UploadImage { ticket, file } => {
            let progress_tx = ui_tx.clone();
            let progress: ProgressCallback = Arc::new(move |progress| {
                let _ = progress_tx.try_send(UiEvent::UploadProgress { ticket, progress });
            });
            let result = service.upload_image(&file, Some(progress)).await;
            match &result {
                Ok(url) => tracing::info!(
                    slot = %ticket.slot,
                    generation = ticket.generation,
                    %url,
                    "backend: upload stored"
                ),
                Err(err) => tracing::warn!(
                    slot = %ticket.slot,
                    generation = ticket.generation,
                    error = %err,
                    "backend: upload failed"
                ),
            }
            deliver(&ui_tx, UiEvent::UploadFinished { ticket, result }).await;
        }
        BackendCommand::SubmitTryOn { request } => {
            let result = service.submit_try_on(&request).await;
            if let Err(err) = &result {
                tracing::warn!(kind = err.kind(), error = %err, "backend: try-on failed");
            }
            deliver(&ui_tx, UiEvent::TryOnFinished(result)).await;
        }
        BackendCommand::FetchResultImage { image_url } => {
            let event = match service.fetch_image(&image_url).await {
                Ok(bytes) => match decode_preview_image(&bytes) {
                    Ok(image) => UiEvent::ResultImageLoaded {
                        image_url,
                        image,
                        original_bytes: bytes,
                    },
                    Err(err) => UiEvent::ResultImageFailed {
                        image_url,
                        reason: format!("Failed to decode result image: {err}"),
                    },
                },
                Err(err) => UiEvent::ResultImageFailed {
                    image_url,
                    reason: format!("Failed to download result image: {}", err.detail()),
                },
            };
            deliver(&ui_tx, event).await;
        }
        BackendCommand::CheckHealth => {
            let result = service.check_health().await;
            deliver(&ui_tx, UiEvent::HealthChecked(result)).await;
        }
    }
}
