use super::{NoticeKind, Screen, StudyUploader};
use crate::upload::FileUploadStatus;
use crate::utils::file_size::{format_kib, format_size};
use eframe::egui::{self, Align, Color32, RichText};

const ACCENT: Color32 = Color32::from_rgb(63, 81, 181);
const SUCCESS: Color32 = Color32::from_rgb(0, 160, 0);
const FAILURE: Color32 = Color32::from_rgb(220, 50, 50);
const MUTED: Color32 = Color32::from_rgb(150, 150, 150);

impl StudyUploader {
    pub fn render(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("notices")
            .show_separator_line(false)
            .show(ctx, |ui| self.render_notices(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.add_space(20.0);
                ui.vertical_centered(|ui| {
                    ui.heading("Upload study material");
                    ui.add_space(5.0);
                    ui.label(
                        RichText::new(format!(
                            "Drag & drop files or choose from your device. Supported: {} (≤ {} each)",
                            self.supported_list(),
                            format_size(self.uploader.rules().max_file_size())
                        ))
                        .color(ui.visuals().text_color().gamma_multiply(0.7)),
                    );
                });
                ui.add_space(20.0);

                if let Screen::Completed(report) = &self.state.screen {
                    let report = report.clone();
                    self.render_completed(ui, &report);
                } else {
                    self.render_dropzone(ui);
                    ui.add_space(12.0);
                    self.render_actions(ui);
                    ui.add_space(12.0);
                    self.render_progress(ui);
                }
            });
        });
    }

    fn supported_list(&self) -> String {
        self.uploader
            .rules()
            .accepted_extensions()
            .iter()
            .map(|ext| format!(".{}", ext))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn render_dropzone(&mut self, ui: &mut egui::Ui) {
        let stroke_color = if self.state.dragging { ACCENT } else { MUTED };
        egui::Frame::group(ui.style())
            .stroke(egui::Stroke::new(1.5, stroke_color))
            .inner_margin(16.0)
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.vertical_centered(|ui| {
                    ui.label("Drag & drop files here, or");
                    ui.horizontal(|ui| {
                        let enabled = !self.state.uploading;
                        if ui
                            .add_enabled(enabled, egui::Button::new("📄 Choose files"))
                            .clicked()
                        {
                            self.pick_files();
                        }
                        if ui
                            .add_enabled(enabled, egui::Button::new("📁 Choose folder"))
                            .clicked()
                        {
                            self.pick_folder();
                        }
                    });
                    ui.add_space(8.0);

                    let files = self.uploader.files();
                    if files.is_empty() {
                        ui.label(RichText::new("No files selected").color(MUTED));
                    } else {
                        for (i, file) in files.iter().enumerate() {
                            ui.label(format!(
                                "{}. {} ({})",
                                i + 1,
                                file.name,
                                format_kib(file.size)
                            ));
                        }
                    }
                });
            });
    }

    fn render_actions(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let count = self.uploader.files().len();
            let can_upload = count > 0 && !self.state.uploading;
            let upload = egui::Button::new(format!("⬆ Upload ({})", count))
                .min_size(egui::vec2(160.0, 36.0));
            if ui.add_enabled(can_upload, upload).clicked() {
                self.start_upload();
            }

            if ui
                .add_enabled(!self.state.uploading, egui::Button::new("✖ Clear"))
                .clicked()
            {
                self.clear();
            }
        });
    }

    fn render_progress(&mut self, ui: &mut egui::Ui) {
        if self.state.uploading {
            let bar = egui::ProgressBar::new(self.state.overall as f32 / 100.0)
                .show_percentage()
                .animate(false)
                .fill(ACCENT);
            ui.add(bar);
        }

        if let Some(snapshot) = self.uploader.snapshot() {
            ui.add_space(8.0);
            for file in &snapshot.files {
                ui.horizontal(|ui| match file.status {
                    FileUploadStatus::Pending => {
                        ui.colored_label(MUTED, format!("⏳ {}", file.name));
                    }
                    FileUploadStatus::Uploading => {
                        ui.label(format!("⬆ {} - {:.0}%", file.name, file.last_progress));
                    }
                    FileUploadStatus::Succeeded => {
                        ui.colored_label(SUCCESS, format!("✅ {}", file.name));
                    }
                    FileUploadStatus::Failed => {
                        ui.colored_label(FAILURE, format!("❌ {}", file.name));
                    }
                });
            }
        }

        let status = self.state.status_text();
        if !status.is_empty() {
            ui.add_space(6.0);
            ui.label(status);
        }
    }

    fn render_completed(&mut self, ui: &mut egui::Ui, report: &crate::upload::BatchReport) {
        ui.group(|ui| {
            ui.vertical_centered(|ui| {
                ui.label(
                    RichText::new(format!(
                        "✅ {} of {} files uploaded",
                        report.succeeded, report.total
                    ))
                    .color(SUCCESS)
                    .strong(),
                );
                ui.add_space(8.0);
                for id in &report.result_ids {
                    ui.label(RichText::new(id).monospace());
                }
                for failure in &report.failures {
                    ui.colored_label(FAILURE, format!("{} - {}", failure.name, failure.reason));
                }
                ui.add_space(12.0);
                if ui.button("Upload more material").clicked() {
                    self.clear();
                }
            });
        });
    }

    fn render_notices(&self, ui: &mut egui::Ui) {
        ui.with_layout(egui::Layout::bottom_up(Align::Center), |ui| {
            ui.add_space(8.0);
            for notice in self.state.notices.iter().rev() {
                let color = match notice.kind {
                    NoticeKind::Info => ui.visuals().text_color(),
                    NoticeKind::Error => FAILURE,
                };
                ui.colored_label(color, &notice.text);
            }
        });
    }
}
