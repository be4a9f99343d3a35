use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use chrono::{DateTime, Local};
use client_core::{
    ClientSettings, ImageFile, ImageSlots, NotificationKind, ProgressIndicator, ResultPanel,
    TryOnError, TryOnSession, TryOnState, UploadCompletion,
};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use egui::TextureHandle;
use shared::domain::{GarmentType, SlotKind};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{err_label, UiError, UiErrorContext, UiEvent};
use crate::controller::orchestration::dispatch_backend_command;
use crate::ui::images::{
    decode_image_for_clipboard, decode_preview_image, fit_within, human_readable_bytes,
    write_clipboard_image, PreviewImage,
};

pub const RESULT_FILE_NAME: &str = "virtual-tryon-result.png";
const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "webp", "bmp"];
const SLOT_PREVIEW_MAX: egui::Vec2 = egui::vec2(360.0, 300.0);
const RESULT_PREVIEW_MAX: egui::Vec2 = egui::vec2(720.0, 520.0);

#[derive(Debug, Clone)]
pub struct StartupConfig {
    pub settings: ClientSettings,
    pub settings_source: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusBannerSeverity {
    Error,
}

#[derive(Debug, Clone)]
struct StatusBanner {
    severity: StatusBannerSeverity,
    message: String,
}

pub fn server_environment_label(server_url: &str) -> &'static str {
    let server = server_url.to_ascii_lowercase();
    if server.contains("127.0.0.1") || server.contains("localhost") {
        "Local"
    } else if server.contains("staging") {
        "Staging"
    } else if server.contains("dev") {
        "Development"
    } else {
        "Production"
    }
}

/// Picks the slot a drop lands in: the one under the pointer, or the only
/// empty slot when the platform does not report a pointer during drags.
pub fn drop_target(
    pointer: Option<egui::Pos2>,
    slot_rects: &HashMap<SlotKind, egui::Rect>,
    slots: &ImageSlots,
) -> Option<SlotKind> {
    if let Some(pos) = pointer {
        if let Some(kind) = SlotKind::ALL
            .into_iter()
            .find(|kind| slot_rects.get(kind).is_some_and(|rect| rect.contains(pos)))
        {
            return Some(kind);
        }
    }
    let mut empty = SlotKind::ALL
        .into_iter()
        .filter(|kind| slots.get(*kind).is_empty());
    match (empty.next(), empty.next()) {
        (Some(kind), None) => Some(kind),
        _ => None,
    }
}

/// Tracks the pointer while files hover over the window. Some platforms send
/// no pointer motion during an OS drag, which leaves `latest_pos` at wherever
/// the cursor was before the drag; such a position must not pick the slot.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct DropHover {
    active: bool,
    origin: Option<egui::Pos2>,
    moved: bool,
}

impl DropHover {
    pub fn observe(&mut self, pointer: Option<egui::Pos2>) {
        if !self.active {
            *self = Self {
                active: true,
                origin: pointer,
                moved: false,
            };
        } else if pointer != self.origin {
            self.moved = true;
        }
    }

    /// The pointer, if it has demonstrably followed the drag.
    pub fn trusted_pointer(&self, pointer: Option<egui::Pos2>) -> Option<egui::Pos2> {
        let moved = self.moved || (self.active && pointer != self.origin);
        if moved {
            pointer
        } else {
            None
        }
    }

    /// Pointer to place a drop with; ends the hover.
    pub fn finish(&mut self, pointer: Option<egui::Pos2>) -> Option<egui::Pos2> {
        let trusted = self.trusted_pointer(pointer);
        *self = Self::default();
        trusted
    }
}

fn image_file_from_drop(file: &egui::DroppedFile) -> Result<ImageFile, TryOnError> {
    let reported_mime = Some(file.mime.clone());
    if let Some(bytes) = &file.bytes {
        let name = if file.name.is_empty() {
            "dropped-image".to_string()
        } else {
            file.name.clone()
        };
        return Ok(ImageFile::new(name, reported_mime, bytes.clone()));
    }
    match &file.path {
        Some(path) => {
            let loaded = ImageFile::from_path(path)?;
            Ok(ImageFile::new(loaded.name, reported_mime, loaded.bytes))
        }
        None => Err(TryOnError::Io(
            "dropped item carried neither a path nor bytes".to_string(),
        )),
    }
}

fn default_pick_dir() -> Option<PathBuf> {
    dirs::picture_dir()
        .or_else(dirs::download_dir)
        .or_else(dirs::desktop_dir)
        .or_else(dirs::home_dir)
}

struct SlotPreview {
    generation: u64,
    texture: Option<TextureHandle>,
    decode_error: Option<String>,
}

enum ResultImageState {
    Loading,
    Ready {
        image: PreviewImage,
        original_bytes: Vec<u8>,
        texture: Option<TextureHandle>,
    },
    Error(String),
}

struct ResultImage {
    image_url: String,
    state: ResultImageState,
}

enum HealthState {
    Unknown,
    Checking,
    Online {
        message: Option<String>,
        checked_at: DateTime<Local>,
    },
    Offline {
        reason: String,
        checked_at: DateTime<Local>,
    },
}

/// Deferred result-panel actions; applied once the panel's borrows end.
enum ResultAction {
    Retry,
    Dismiss,
    Download,
    CopyImage,
    ReloadImage(String),
}

pub struct DesktopGuiApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,

    session: TryOnSession,
    server_url: String,
    settings_source: Option<PathBuf>,

    slot_previews: HashMap<SlotKind, SlotPreview>,
    slot_rects: HashMap<SlotKind, egui::Rect>,
    drop_hover: DropHover,
    result_image: Option<ResultImage>,
    health: HealthState,

    status: String,
    status_banner: Option<StatusBanner>,
}

impl DesktopGuiApp {
    pub fn bootstrap(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        startup: StartupConfig,
    ) -> Self {
        let mut app = Self {
            cmd_tx,
            ui_rx,
            session: TryOnSession::new(&startup.settings),
            server_url: startup.settings.api_base_url.clone(),
            settings_source: startup.settings_source,
            slot_previews: HashMap::new(),
            slot_rects: HashMap::new(),
            drop_hover: DropHover::default(),
            result_image: None,
            health: HealthState::Unknown,
            status: "Choose a person photo and a garment photo".to_string(),
            status_banner: None,
        };
        app.check_health();
        app
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::Error(err) => self.show_error(err),
                UiEvent::UploadProgress { ticket, progress } => {
                    self.session.upload_progress(ticket, progress);
                }
                UiEvent::UploadFinished { ticket, result } => {
                    match self.session.finish_upload(ticket, result) {
                        UploadCompletion::Stored { .. } => {
                            self.status = format!("{} uploaded", ticket.slot.label());
                        }
                        UploadCompletion::Failed(err) => {
                            self.status = format!(
                                "{} upload failed: {}",
                                ticket.slot.label(),
                                err.detail()
                            );
                        }
                        UploadCompletion::Stale => {}
                    }
                }
                UiEvent::TryOnFinished(result) => self.apply_try_on_result(result),
                UiEvent::ResultImageLoaded {
                    image_url,
                    image,
                    original_bytes,
                } => {
                    if let Some(current) = self
                        .result_image
                        .as_mut()
                        .filter(|current| current.image_url == image_url)
                    {
                        current.state = ResultImageState::Ready {
                            image,
                            original_bytes,
                            texture: None,
                        };
                    }
                }
                UiEvent::ResultImageFailed { image_url, reason } => {
                    if let Some(current) = self
                        .result_image
                        .as_mut()
                        .filter(|current| current.image_url == image_url)
                    {
                        tracing::warn!(%image_url, %reason, "result image unavailable");
                        current.state = ResultImageState::Error(reason);
                    }
                }
                UiEvent::HealthChecked(result) => {
                    let checked_at = Local::now();
                    self.health = match result {
                        Ok(reply) if reply.is_ok() => HealthState::Online {
                            message: reply.message,
                            checked_at,
                        },
                        Ok(reply) => HealthState::Offline {
                            reason: reply
                                .message
                                .unwrap_or_else(|| format!("status {}", reply.status)),
                            checked_at,
                        },
                        Err(err) => HealthState::Offline {
                            reason: err.detail().to_string(),
                            checked_at,
                        },
                    };
                }
            }
        }
    }

    fn show_error(&mut self, err: UiError) {
        tracing::warn!(context = ?err.context(), message = err.message(), "ui error");
        self.status = format!("{}: {}", err_label(err.category()), err.message());
        if err.is_startup_failure() {
            self.status_banner = Some(StatusBanner {
                severity: StatusBannerSeverity::Error,
                message: format!(
                    "The network worker could not start ({}). Uploads and try-on are unavailable.",
                    err.message()
                ),
            });
        } else {
            self.session.notifications.error(err.message().to_string());
        }
    }

    fn check_health(&mut self) {
        if dispatch_backend_command(&self.cmd_tx, BackendCommand::CheckHealth, &mut self.status) {
            self.health = HealthState::Checking;
        }
    }

    fn select_image(&mut self, slot: SlotKind, file: ImageFile) {
        let ticket = match self.session.select_file(slot, &file) {
            Ok(ticket) => ticket,
            Err(err) => {
                self.status = err.detail().to_string();
                return;
            }
        };
        tracing::info!(
            %slot,
            generation = ticket.generation,
            file = %file.name,
            bytes = file.len(),
            "image selected"
        );
        self.status = format!(
            "Uploading {} ({})",
            file.name,
            human_readable_bytes(file.len())
        );
        if !dispatch_backend_command(
            &self.cmd_tx,
            BackendCommand::UploadImage { ticket, file },
            &mut self.status,
        ) {
            let reason = TryOnError::Upload(self.status.clone());
            self.session.finish_upload(ticket, Err(reason));
        }
    }

    fn select_image_from_path(&mut self, slot: SlotKind, path: &Path) {
        match ImageFile::from_path(path) {
            Ok(file) => self.select_image(slot, file),
            Err(err) => self.show_error(UiError::from_try_on(UiErrorContext::Upload, &err)),
        }
    }

    fn pick_image(&mut self, slot: SlotKind) {
        let mut dialog = rfd::FileDialog::new()
            .set_title(format!("Choose {}", slot.label().to_ascii_lowercase()))
            .add_filter("Images", &IMAGE_EXTENSIONS);
        if let Some(dir) = default_pick_dir() {
            dialog = dialog.set_directory(dir);
        }
        if let Some(path) = dialog.pick_file() {
            self.select_image_from_path(slot, &path);
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let (dropped, hovering, pointer) = ctx.input(|input| {
            (
                input.raw.dropped_files.clone(),
                !input.raw.hovered_files.is_empty(),
                input.pointer.latest_pos(),
            )
        });
        let Some(first) = dropped.first() else {
            if hovering {
                self.drop_hover.observe(pointer);
            } else {
                self.drop_hover = DropHover::default();
            }
            return;
        };
        let pointer = self.drop_hover.finish(pointer);
        if dropped.len() > 1 {
            self.session
                .notifications
                .info("Only the first dropped file is used");
        }

        let Some(slot) = drop_target(pointer, &self.slot_rects, &self.session.slots) else {
            self.session
                .notifications
                .info("Drop the image onto the person or garment area");
            return;
        };
        match image_file_from_drop(first) {
            Ok(file) => self.select_image(slot, file),
            Err(err) => self.show_error(UiError::from_try_on(UiErrorContext::Upload, &err)),
        }
    }

    fn reset_slot(&mut self, slot: SlotKind) {
        self.session.reset_slot(slot);
        self.slot_previews.remove(&slot);
        self.status = format!("{} cleared", slot.label());
    }

    fn trigger_try_on(&mut self, retry: bool) {
        let started = if retry {
            self.session.retry()
        } else {
            self.session.begin_try_on()
        };
        let request = match started {
            Ok(request) => request,
            Err(err) => {
                self.status = err.detail().to_string();
                return;
            }
        };
        tracing::info!(
            garment_type = %request.garment_type,
            retry,
            "try-on requested"
        );
        self.result_image = None;
        self.status = "Generating try-on result...".to_string();
        if !dispatch_backend_command(
            &self.cmd_tx,
            BackendCommand::SubmitTryOn { request },
            &mut self.status,
        ) {
            let reason = TryOnError::Transport(self.status.clone());
            self.apply_try_on_result(Err(reason));
        }
    }

    fn apply_try_on_result(
        &mut self,
        result: Result<shared::protocol::TryOnOutcome, TryOnError>,
    ) {
        let fetch = match self.session.finish_try_on(result) {
            Ok(TryOnState::Succeeded { image_url, .. }) => Some(image_url.clone()),
            Ok(TryOnState::SubmittedAsync { .. }) => {
                self.status = "Try-on submitted; the result is not available yet".to_string();
                None
            }
            Ok(TryOnState::Failed { error }) => {
                self.status = format!("Try-on failed: {}", error.detail());
                None
            }
            Ok(_) => None,
            Err(err) => {
                tracing::warn!(error = %err, "ignoring try-on completion");
                None
            }
        };
        if let Some(image_url) = fetch {
            self.status = "Try-on completed".to_string();
            self.request_result_image(image_url);
        }
    }

    fn request_result_image(&mut self, image_url: String) {
        self.result_image = Some(ResultImage {
            image_url: image_url.clone(),
            state: ResultImageState::Loading,
        });
        if !dispatch_backend_command(
            &self.cmd_tx,
            BackendCommand::FetchResultImage {
                image_url: image_url.clone(),
            },
            &mut self.status,
        ) {
            self.result_image = Some(ResultImage {
                image_url,
                state: ResultImageState::Error(self.status.clone()),
            });
        }
    }

    fn result_bytes(&self) -> Option<&[u8]> {
        match self.result_image.as_ref().map(|result| &result.state) {
            Some(ResultImageState::Ready { original_bytes, .. }) => Some(original_bytes),
            _ => None,
        }
    }

    fn save_result_as(&mut self) {
        let Some(bytes) = self.result_bytes().map(<[u8]>::to_vec) else {
            return;
        };
        let mut dialog = rfd::FileDialog::new()
            .set_file_name(RESULT_FILE_NAME)
            .add_filter("PNG image", &["png"]);
        if let Some(dir) = dirs::download_dir() {
            dialog = dialog.set_directory(dir);
        }
        let Some(path) = dialog.save_file() else {
            return;
        };
        match fs::write(&path, bytes) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "result saved");
                self.session
                    .notifications
                    .success(format!("Saved result to {}", path.display()));
            }
            Err(err) => self.show_error(UiError::from_message(
                UiErrorContext::SaveResult,
                format!("Failed to save result: {err}"),
            )),
        }
    }

    fn copy_result_to_clipboard(&mut self) {
        let Some(bytes) = self.result_bytes() else {
            return;
        };
        match decode_image_for_clipboard(bytes)
            .and_then(|(rgba, width, height)| write_clipboard_image(&rgba, width, height))
        {
            Ok(()) => {
                self.session
                    .notifications
                    .success("Copied result image to clipboard");
            }
            Err(err) => self.show_error(UiError::from_message(
                UiErrorContext::Clipboard,
                format!("Failed to copy result image: {err}"),
            )),
        }
    }

    fn apply_result_action(&mut self, action: ResultAction) {
        match action {
            ResultAction::Retry => self.trigger_try_on(true),
            ResultAction::Dismiss => match self.session.dismiss_result() {
                Ok(()) => self.result_image = None,
                Err(err) => self.status = err.detail().to_string(),
            },
            ResultAction::Download => self.save_result_as(),
            ResultAction::CopyImage => self.copy_result_to_clipboard(),
            ResultAction::ReloadImage(image_url) => self.request_result_image(image_url),
        }
    }

    fn sync_slot_previews(&mut self, ctx: &egui::Context) {
        for kind in SlotKind::ALL {
            let slot = self.session.slots.get(kind);
            let Some(preview) = slot.preview() else {
                self.slot_previews.remove(&kind);
                continue;
            };
            let generation = slot.generation();
            if self
                .slot_previews
                .get(&kind)
                .is_some_and(|cached| cached.generation == generation)
            {
                continue;
            }
            let entry = match decode_preview_image(&preview.bytes) {
                Ok(image) => SlotPreview {
                    generation,
                    texture: Some(ctx.load_texture(
                        format!("slot-preview:{kind}:{generation}"),
                        image.color_image(),
                        egui::TextureOptions::LINEAR,
                    )),
                    decode_error: None,
                },
                Err(err) => {
                    tracing::debug!(slot = %kind, error = %err, "preview decode failed");
                    SlotPreview {
                        generation,
                        texture: None,
                        decode_error: Some(err),
                    }
                }
            };
            self.slot_previews.insert(kind, entry);
        }
    }

    fn show_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                ui.heading("Virtual Try-On");
                ui.separator();

                let environment = server_environment_label(&self.server_url);
                let (color, text, hover) = match &self.health {
                    HealthState::Unknown => (
                        egui::Color32::GRAY,
                        format!("{environment} · not checked"),
                        String::new(),
                    ),
                    HealthState::Checking => (
                        egui::Color32::LIGHT_BLUE,
                        format!("{environment} · checking"),
                        String::new(),
                    ),
                    HealthState::Online {
                        message,
                        checked_at,
                    } => (
                        egui::Color32::from_rgb(67, 181, 129),
                        format!("{environment} · online"),
                        format!(
                            "{} (checked {})",
                            message.as_deref().unwrap_or("service healthy"),
                            checked_at.format("%H:%M:%S")
                        ),
                    ),
                    HealthState::Offline { reason, checked_at } => (
                        egui::Color32::from_rgb(240, 71, 71),
                        format!("{environment} · unreachable"),
                        format!("{reason} (checked {})", checked_at.format("%H:%M:%S")),
                    ),
                };
                let (dot, _) = ui.allocate_exact_size(egui::vec2(10.0, 10.0), egui::Sense::hover());
                ui.painter().circle_filled(dot.center(), 5.0, color);
                let badge = ui.label(text);
                if !hover.is_empty() {
                    badge.on_hover_text(hover);
                }
                ui.label(egui::RichText::new(&self.server_url).weak())
                    .on_hover_text(match &self.settings_source {
                        Some(path) => format!("Settings loaded from {}", path.display()),
                        None => "Built-in settings".to_string(),
                    });

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let checking = matches!(self.health, HealthState::Checking);
                    if ui
                        .add_enabled(!checking, egui::Button::new("Check connection"))
                        .clicked()
                    {
                        self.check_health();
                    }
                });
            });
            ui.add_space(4.0);
        });
    }

    fn show_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.small(egui::RichText::new(&self.status).weak());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.small(
                        egui::RichText::new(self.session.controller.state().name()).weak(),
                    );
                });
            });
        });
    }

    fn show_status_banner(&mut self, ui: &mut egui::Ui) {
        let Some(banner) = &self.status_banner else {
            return;
        };
        let (fill, stroke) = match banner.severity {
            StatusBannerSeverity::Error => (
                egui::Color32::from_rgb(111, 53, 53),
                egui::Stroke::new(1.0, egui::Color32::from_rgb(175, 96, 96)),
            ),
        };
        let message = banner.message.clone();

        egui::Frame::NONE
            .fill(fill)
            .stroke(stroke)
            .corner_radius(8.0)
            .inner_margin(egui::Margin::symmetric(10, 8))
            .show(ui, |ui| {
                ui.horizontal_wrapped(|ui| {
                    ui.label(egui::RichText::new(message).color(egui::Color32::WHITE));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Dismiss").clicked() {
                            self.status_banner = None;
                        }
                    });
                });
            });
        ui.add_space(8.0);
    }

    fn show_slot(&mut self, ui: &mut egui::Ui, kind: SlotKind, drop_pointer: Option<egui::Pos2>) {
        let highlighted = self
            .slot_rects
            .get(&kind)
            .zip(drop_pointer)
            .is_some_and(|(rect, pos)| rect.contains(pos));
        let stroke = if highlighted {
            egui::Stroke::new(2.0, ui.visuals().selection.stroke.color)
        } else {
            ui.visuals().widgets.noninteractive.bg_stroke
        };

        let mut pick = false;
        let mut clear = false;
        let response = egui::Frame::new()
            .stroke(stroke)
            .corner_radius(8.0)
            .inner_margin(egui::Margin::same(12))
            .show(ui, |ui| {
                ui.set_min_width(ui.available_width());
                ui.set_min_height(SLOT_PREVIEW_MAX.y + 80.0);
                let slot = self.session.slots.get(kind);

                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new(kind.label()).strong());
                    if slot.reference_url().is_some() {
                        ui.label(
                            egui::RichText::new("uploaded")
                                .small()
                                .color(egui::Color32::from_rgb(67, 181, 129)),
                        );
                    }
                });
                ui.add_space(6.0);

                let cached = self.slot_previews.get(&kind);
                match (slot.preview(), cached.and_then(|cached| cached.texture.as_ref())) {
                    (Some(_), Some(texture)) => {
                        let size = fit_within(texture.size_vec2(), SLOT_PREVIEW_MAX);
                        let button = egui::Button::image(
                            egui::Image::new(texture).fit_to_exact_size(size),
                        );
                        if ui
                            .add(button)
                            .on_hover_text("Click to choose another image")
                            .clicked()
                        {
                            pick = true;
                        }
                    }
                    (Some(preview), None) => {
                        let reason = cached
                            .and_then(|cached| cached.decode_error.as_deref())
                            .unwrap_or("decoding");
                        ui.label(format!("{} (preview unavailable)", preview.file_name))
                            .on_hover_text(reason);
                    }
                    (None, _) => {
                        let placeholder = egui::Button::new(
                            egui::RichText::new("Click to choose an image\nor drop one here")
                                .size(15.0),
                        )
                        .min_size(egui::vec2(ui.available_width(), SLOT_PREVIEW_MAX.y * 0.6));
                        if ui.add(placeholder).clicked() {
                            pick = true;
                        }
                    }
                }

                if let Some(preview) = slot.preview() {
                    ui.small(format!(
                        "{} · {}",
                        preview.file_name,
                        human_readable_bytes(preview.bytes.len() as u64)
                    ));
                }

                if let Some(progress) = slot.progress() {
                    show_progress(ui, progress);
                }

                ui.add_space(6.0);
                ui.horizontal(|ui| {
                    if ui.button("Choose image...").clicked() {
                        pick = true;
                    }
                    if ui
                        .add_enabled(!slot.is_empty(), egui::Button::new("Clear"))
                        .clicked()
                    {
                        clear = true;
                    }
                });
            })
            .response;

        self.slot_rects.insert(kind, response.rect);
        if pick {
            self.pick_image(kind);
        } else if clear {
            self.reset_slot(kind);
        }
    }

    fn show_controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Garment type");
            let mut garment_type = self.session.garment_type();
            egui::ComboBox::from_id_salt("garment_type")
                .selected_text(garment_type.label())
                .show_ui(ui, |ui| {
                    for option in GarmentType::ALL {
                        ui.selectable_value(&mut garment_type, option, option.label());
                    }
                });
            if garment_type != self.session.garment_type() {
                tracing::debug!(%garment_type, "garment type changed");
                self.session.set_garment_type(garment_type);
            }

            ui.add_space(12.0);
            let enabled = self.session.can_try_on();
            let trigger = ui
                .add_enabled(
                    enabled,
                    egui::Button::new(egui::RichText::new("Try it on").strong())
                        .min_size(egui::vec2(140.0, 32.0)),
                )
                .on_disabled_hover_text(if self.session.controller.is_submitting() {
                    "A try-on is already running"
                } else {
                    "Upload both a person photo and a garment photo first"
                });
            if trigger.clicked() {
                self.trigger_try_on(false);
            }
        });
    }

    fn show_result_panel(&mut self, ui: &mut egui::Ui) {
        let mut action = None;
        let panel = self.session.result_panel();
        if panel == ResultPanel::Hidden {
            return;
        }

        egui::Frame::new()
            .stroke(ui.visuals().widgets.noninteractive.bg_stroke)
            .corner_radius(8.0)
            .inner_margin(egui::Margin::same(12))
            .show(ui, |ui| {
                ui.set_min_width(ui.available_width());
                ui.label(egui::RichText::new("Result").strong());
                ui.add_space(6.0);
                match panel {
                    ResultPanel::Hidden => {}
                    ResultPanel::Loading => {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.label("Generating try-on result, this can take a while...");
                        });
                    }
                    ResultPanel::Image { image_url } => {
                        show_result_image(ui, self.result_image.as_mut(), image_url, &mut action);
                    }
                    ResultPanel::Pending => {
                        ui.label(
                            "The try-on was accepted and is still being processed. \
                             The result is not available yet.",
                        );
                        if ui.button("Try again").clicked() {
                            action = Some(ResultAction::Dismiss);
                        }
                    }
                    ResultPanel::Error { detail } => {
                        ui.colored_label(
                            ui.visuals().error_fg_color,
                            format!("Try-on failed: {detail}"),
                        );
                        ui.horizontal(|ui| {
                            if ui
                                .button("Retry")
                                .on_hover_text("Resubmit the same images")
                                .clicked()
                            {
                                action = Some(ResultAction::Retry);
                            }
                            if ui.button("Try again").clicked() {
                                action = Some(ResultAction::Dismiss);
                            }
                        });
                    }
                }
            });

        if let Some(action) = action {
            self.apply_result_action(action);
        }
    }

    fn show_toasts(&mut self, ctx: &egui::Context) {
        if self.session.notifications.is_empty() {
            return;
        }
        let mut dismissed = Vec::new();
        egui::Area::new(egui::Id::new("notification_toasts"))
            .anchor(egui::Align2::RIGHT_TOP, egui::vec2(-16.0, 56.0))
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                for notification in self.session.notifications.active() {
                    let fill = match notification.kind {
                        NotificationKind::Success => egui::Color32::from_rgb(35, 99, 70),
                        NotificationKind::Error => egui::Color32::from_rgb(111, 53, 53),
                        NotificationKind::Info => egui::Color32::from_rgb(45, 66, 99),
                    };
                    egui::Frame::NONE
                        .fill(fill)
                        .corner_radius(6.0)
                        .inner_margin(egui::Margin::symmetric(10, 6))
                        .show(ui, |ui| {
                            ui.set_max_width(320.0);
                            ui.horizontal(|ui| {
                                ui.label(
                                    egui::RichText::new(&notification.message)
                                        .color(egui::Color32::WHITE),
                                );
                                if ui.small_button("✕").clicked() {
                                    dismissed.push(notification.id);
                                }
                            });
                        });
                    ui.add_space(4.0);
                }
            });
        for id in dismissed {
            self.session.notifications.dismiss(id);
        }
    }

    fn is_busy(&self) -> bool {
        self.session.controller.is_submitting()
            || SlotKind::ALL
                .into_iter()
                .any(|kind| self.session.slots.get(kind).is_uploading())
            || matches!(
                self.result_image.as_ref().map(|result| &result.state),
                Some(ResultImageState::Loading)
            )
    }
}

fn show_progress(ui: &mut egui::Ui, progress: ProgressIndicator) {
    match progress.fraction() {
        Some(fraction) => {
            ui.add(
                egui::ProgressBar::new(fraction).text(progress.label()),
            );
        }
        None => {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(progress.label());
            });
        }
    }
}

fn show_result_image(
    ui: &mut egui::Ui,
    result: Option<&mut ResultImage>,
    image_url: &str,
    action: &mut Option<ResultAction>,
) {
    let Some(result) = result.filter(|result| result.image_url == image_url) else {
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label("Preparing result image...");
        });
        return;
    };

    match &mut result.state {
        ResultImageState::Loading => {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Downloading result image...");
            });
        }
        ResultImageState::Ready { image, texture, .. } => {
            let texture = texture.get_or_insert_with(|| {
                ui.ctx().load_texture(
                    "tryon-result",
                    image.color_image(),
                    egui::TextureOptions::LINEAR,
                )
            });
            let max = egui::vec2(
                ui.available_width().min(RESULT_PREVIEW_MAX.x),
                RESULT_PREVIEW_MAX.y,
            );
            let size = fit_within(image.size(), max);
            ui.add(egui::Image::new(&*texture).fit_to_exact_size(size));
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                if ui.button("Download").clicked() {
                    *action = Some(ResultAction::Download);
                }
                if ui.button("Copy image").clicked() {
                    *action = Some(ResultAction::CopyImage);
                }
                if ui.button("Try again").clicked() {
                    *action = Some(ResultAction::Dismiss);
                }
            });
        }
        ResultImageState::Error(reason) => {
            ui.colored_label(ui.visuals().error_fg_color, reason.as_str());
            if ui.button("Reload image").clicked() {
                *action = Some(ResultAction::ReloadImage(result.image_url.clone()));
            }
        }
    }
}

impl eframe::App for DesktopGuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        self.handle_dropped_files(ctx);
        self.session.notifications.expire(Instant::now());
        self.sync_slot_previews(ctx);

        self.show_top_bar(ctx);
        self.show_status_bar(ctx);

        let files_hovering = ctx.input(|input| !input.raw.hovered_files.is_empty());
        let drop_pointer = if files_hovering {
            self.drop_hover.trusted_pointer(ctx.pointer_latest_pos())
        } else {
            None
        };
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    self.show_status_banner(ui);
                    ui.columns(2, |columns| {
                        self.show_slot(&mut columns[0], SlotKind::Person, drop_pointer);
                        self.show_slot(&mut columns[1], SlotKind::Garment, drop_pointer);
                    });
                    ui.add_space(12.0);
                    self.show_controls(ui);
                    ui.add_space(12.0);
                    self.show_result_panel(ui);
                });
        });

        self.show_toasts(ctx);

        if self.is_busy() || files_hovering {
            ctx.request_repaint_after(Duration::from_millis(50));
        } else {
            ctx.request_repaint_after(Duration::from_millis(250));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_core::{NotificationCenter, UploadManager};

    #[test]
    fn labels_server_environments() {
        assert_eq!(server_environment_label("http://localhost:5001"), "Local");
        assert_eq!(server_environment_label("http://127.0.0.1:5001"), "Local");
        assert_eq!(
            server_environment_label("https://staging.tryon.example.com"),
            "Staging"
        );
        assert_eq!(
            server_environment_label("https://dev.tryon.example.com"),
            "Development"
        );
        assert_eq!(
            server_environment_label("https://tryon.example.com"),
            "Production"
        );
    }

    fn rects() -> HashMap<SlotKind, egui::Rect> {
        HashMap::from([
            (
                SlotKind::Person,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(100.0, 100.0)),
            ),
            (
                SlotKind::Garment,
                egui::Rect::from_min_max(egui::pos2(110.0, 0.0), egui::pos2(210.0, 100.0)),
            ),
        ])
    }

    fn png(name: &str) -> ImageFile {
        ImageFile::new(name, Some("image/png".to_string()), vec![1u8, 2, 3])
    }

    #[test]
    fn drop_under_pointer_targets_that_slot() {
        let slots = ImageSlots::default();
        assert_eq!(
            drop_target(Some(egui::pos2(150.0, 50.0)), &rects(), &slots),
            Some(SlotKind::Garment)
        );
        assert_eq!(
            drop_target(Some(egui::pos2(20.0, 20.0)), &rects(), &slots),
            Some(SlotKind::Person)
        );
    }

    #[test]
    fn drop_without_pointer_falls_back_to_single_empty_slot() {
        let manager = UploadManager::new(1024);
        let mut notices = NotificationCenter::new(Duration::from_secs(3));
        let mut slots = ImageSlots::default();

        assert_eq!(drop_target(None, &rects(), &slots), None);
        assert_eq!(
            drop_target(Some(egui::pos2(105.0, 50.0)), &rects(), &slots),
            None
        );

        manager
            .begin_upload(&mut slots, SlotKind::Person, &png("p1.png"), &mut notices)
            .expect("valid image");
        assert_eq!(
            drop_target(None, &rects(), &slots),
            Some(SlotKind::Garment)
        );
    }

    #[test]
    fn pointer_that_never_moved_during_hover_is_not_trusted() {
        let stale = Some(egui::pos2(20.0, 20.0));
        let mut hover = DropHover::default();
        hover.observe(stale);
        hover.observe(stale);

        assert_eq!(hover.trusted_pointer(stale), None);
        assert_eq!(hover.finish(stale), None);
        assert_eq!(hover, DropHover::default());
    }

    #[test]
    fn pointer_that_followed_the_drag_places_the_drop() {
        let mut hover = DropHover::default();
        hover.observe(Some(egui::pos2(20.0, 20.0)));
        hover.observe(Some(egui::pos2(80.0, 40.0)));

        let pointer = hover.finish(Some(egui::pos2(150.0, 50.0)));
        assert_eq!(pointer, Some(egui::pos2(150.0, 50.0)));
        assert_eq!(
            drop_target(pointer, &rects(), &ImageSlots::default()),
            Some(SlotKind::Garment)
        );
    }

    #[test]
    fn stale_pointer_drop_uses_the_single_empty_slot() {
        let manager = UploadManager::new(1024);
        let mut notices = NotificationCenter::new(Duration::from_secs(3));
        let mut slots = ImageSlots::default();
        manager
            .begin_upload(&mut slots, SlotKind::Garment, &png("g1.png"), &mut notices)
            .expect("valid image");

        // The cursor last rested over the garment slot before the OS drag began.
        let stale = Some(egui::pos2(150.0, 50.0));
        let mut hover = DropHover::default();
        hover.observe(stale);

        let pointer = hover.finish(stale);
        assert_eq!(
            drop_target(pointer, &rects(), &slots),
            Some(SlotKind::Person)
        );
    }

    #[test]
    fn dropped_bytes_keep_reported_mime() {
        let dropped = egui::DroppedFile {
            name: "blob".to_string(),
            mime: "image/webp".to_string(),
            bytes: Some(std::sync::Arc::from(vec![1u8, 2, 3])),
            ..Default::default()
        };
        let file = image_file_from_drop(&dropped).expect("bytes");
        assert_eq!(file.name, "blob");
        assert_eq!(file.effective_mime().as_deref(), Some("image/webp"));
        assert_eq!(file.len(), 3);
    }

    #[test]
    fn dropped_path_is_read_from_disk() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("garment.jpg");
        fs::write(&path, [0xFFu8, 0xD8, 0xFF]).expect("write");

        let dropped = egui::DroppedFile {
            path: Some(path.clone()),
            ..Default::default()
        };
        let file = image_file_from_drop(&dropped).expect("path");
        assert_eq!(file.name, "garment.jpg");
        assert_eq!(file.effective_mime().as_deref(), Some("image/jpeg"));
    }

    #[test]
    fn empty_drop_is_an_io_error() {
        let err = image_file_from_drop(&egui::DroppedFile::default()).unwrap_err();
        assert!(matches!(err, TryOnError::Io(_)));
    }
}
