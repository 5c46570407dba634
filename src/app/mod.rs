mod state;
mod ui;

use crate::config::UploaderConfig;
use crate::upload::{selection, BatchUploader, FileDescriptor, FileTransferChannel};
use eframe::{egui, App};
pub use state::{NoticeKind, Screen, UploadState};
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Handle;
use tracing::{info, warn};

pub struct StudyUploader {
    uploader: BatchUploader,
    channel: Arc<dyn FileTransferChannel>,
    runtime: Handle,
    state: UploadState,
}

impl StudyUploader {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        config: &UploaderConfig,
        channel: Arc<dyn FileTransferChannel>,
        runtime: Handle,
    ) -> Self {
        info!("initializing study material uploader");
        Self {
            uploader: BatchUploader::new(config.validation_rules(), config.completion_policy),
            channel,
            runtime,
            state: UploadState::default(),
        }
    }

    pub fn pick_files(&mut self) {
        let extensions: Vec<&str> = self
            .uploader
            .rules()
            .accepted_extensions()
            .iter()
            .map(String::as_str)
            .collect();
        if let Some(paths) = rfd::FileDialog::new()
            .add_filter("Study material", extensions.as_slice())
            .pick_files()
        {
            self.select(selection::from_paths(paths));
        }
    }

    pub fn pick_folder(&mut self) {
        if let Some(folder) = rfd::FileDialog::new().pick_folder() {
            let files = selection::from_folder(&folder, self.uploader.rules());
            self.select(files);
        }
    }

    fn accept_drops(&mut self, ctx: &egui::Context) {
        let (hovering, dropped) = ctx.input(|i| {
            (
                !i.raw.hovered_files.is_empty(),
                i.raw.dropped_files.clone(),
            )
        });
        self.state.dragging = hovering;
        if dropped.is_empty() {
            return;
        }

        let files: Vec<FileDescriptor> = dropped.iter().filter_map(descriptor_from_drop).collect();
        self.select(files);
    }

    /// Replaces the batch; an empty selection keeps the current one.
    pub fn select(&mut self, files: Vec<FileDescriptor>) {
        match self.uploader.select(files) {
            Ok(()) => {
                self.state.result_ids.clear();
                self.state.overall = 0;
            }
            Err(e) => {
                warn!(error = %e, "selection rejected");
                self.state.notify_error(&e);
            }
        }
    }

    pub fn clear(&mut self) {
        match self.uploader.clear() {
            Ok(()) => {
                info!("clearing selection");
                self.state.clear();
            }
            Err(e) => self.state.notify_error(&e),
        }
    }

    pub fn start_upload(&mut self) {
        let (sender, receiver) = std_mpsc::channel();
        match self.uploader.start(Arc::clone(&self.channel), sender) {
            Ok(run) => {
                self.state.begin_run(receiver);
                self.runtime.spawn(run.execute());
            }
            Err(e) => {
                warn!(error = %e, "upload not started");
                self.state.notify_error(&e);
            }
        }
    }

    pub fn update_state(&mut self, ctx: &egui::Context) {
        if self.state.drain_events() {
            ctx.request_repaint();
        }
        self.state.expire_notices(Instant::now());
        if self.state.uploading || !self.state.notices.is_empty() {
            ctx.request_repaint();
        }
    }
}

fn descriptor_from_drop(file: &egui::DroppedFile) -> Option<FileDescriptor> {
    if let Some(path) = &file.path {
        return selection::from_paths([path.clone()]).pop();
    }
    file.bytes
        .as_ref()
        .map(|bytes| FileDescriptor::from_bytes(file.name.clone(), Arc::clone(bytes)))
}

impl App for StudyUploader {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.accept_drops(ctx);
        self.update_state(ctx);
        self.render(ctx);
    }
}
