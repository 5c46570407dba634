use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::upload::types::{
    BatchEvent, BatchReport, ChannelEvent, FileDescriptor, FileFailure, FileUploadState,
    FileUploadStatus, RunSnapshot,
};

/// Decides whether a finished run counts as successful.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionPolicy {
    /// At least one file produced an identifier.
    #[default]
    AnySucceeded,
    /// Every file produced an identifier.
    AllSucceeded,
}

impl CompletionPolicy {
    pub fn is_satisfied(self, succeeded: usize, total: usize) -> bool {
        match self {
            CompletionPolicy::AnySucceeded => succeeded > 0,
            CompletionPolicy::AllSucceeded => total > 0 && succeeded == total,
        }
    }
}

/// `round(((completed + percent / 100) / total) * 100)`, clamped to 0..=100.
pub fn aggregate_progress(completed: usize, percent: f64, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let overall = ((completed as f64 + percent / 100.0) / total as f64 * 100.0).round();
    overall.clamp(0.0, 100.0) as u8
}

/// Client side id for a success response that carried none.
pub fn fallback_id(index: usize) -> String {
    let millis = Utc::now().timestamp_millis();
    let salt: u32 = rand::thread_rng().gen_range(0..100_000);
    format!("local-{}-{}-{}", millis, salt, index)
}

/// State of one upload run. The run's coordinating loop is its only writer.
#[derive(Debug)]
pub struct RunTracker {
    files: Vec<FileUploadState>,
    completed: usize,
    overall: u8,
    result_ids: Vec<String>,
    failures: Vec<FileFailure>,
    policy: CompletionPolicy,
}

impl RunTracker {
    pub fn new(files: &[FileDescriptor], policy: CompletionPolicy) -> Self {
        let files = files
            .iter()
            .enumerate()
            .map(|(index, file)| FileUploadState {
                index,
                name: file.name.clone(),
                status: FileUploadStatus::Pending,
                last_progress: 0.0,
                result_id: None,
            })
            .collect();

        Self {
            files,
            completed: 0,
            overall: 0,
            result_ids: Vec::new(),
            failures: Vec::new(),
            policy,
        }
    }

    pub fn total(&self) -> usize {
        self.files.len()
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn overall(&self) -> u8 {
        self.overall
    }

    pub fn files(&self) -> &[FileUploadState] {
        &self.files
    }

    pub fn result_ids(&self) -> &[String] {
        &self.result_ids
    }

    pub fn is_finished(&self) -> bool {
        self.completed == self.files.len()
    }

    pub fn mark_uploading(&mut self, index: usize) {
        if let Some(file) = self.files.get_mut(index) {
            if file.status == FileUploadStatus::Pending {
                file.status = FileUploadStatus::Uploading;
            }
        }
    }

    /// Applies one channel event for the file at `index` and returns the
    /// notifications it produced.
    pub fn apply(&mut self, index: usize, event: ChannelEvent) -> Vec<BatchEvent> {
        let Some(file) = self.files.get(index) else {
            warn!(index, "event for unknown file index");
            return Vec::new();
        };
        if file.status.is_terminal() {
            warn!(file = %file.name, ?event, "event after terminal state ignored");
            return Vec::new();
        }

        match event {
            ChannelEvent::Progress(percent) => self.on_progress(index, percent),
            ChannelEvent::Done { id } => self.on_success(index, id),
            ChannelEvent::Failed(reason) => self.on_failure(index, reason),
        }
    }

    /// The channel of `index` ended. Without a terminal event first, the file fails.
    pub fn close(&mut self, index: usize) -> Vec<BatchEvent> {
        match self.files.get(index) {
            Some(file) if !file.status.is_terminal() => {
                self.on_failure(index, "channel closed before completion".to_string())
            }
            _ => Vec::new(),
        }
    }

    pub fn report(&self) -> BatchReport {
        let total = self.total();
        let succeeded = self.result_ids.len();
        BatchReport {
            total,
            succeeded,
            failures: self.failures.clone(),
            result_ids: self.result_ids.clone(),
            advance: self.is_finished() && self.policy.is_satisfied(succeeded, total),
        }
    }

    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            overall: self.overall,
            files: self.files.clone(),
            result_ids: self.result_ids.clone(),
            finished: self.is_finished(),
        }
    }

    fn on_progress(&mut self, index: usize, percent: f64) -> Vec<BatchEvent> {
        if !percent.is_finite() {
            return Vec::new();
        }
        let percent = percent.clamp(0.0, 100.0);
        let file = &mut self.files[index];
        file.status = FileUploadStatus::Uploading;
        if percent < file.last_progress {
            debug!(file = %file.name, percent, last = file.last_progress, "progress regression ignored");
            return Vec::new();
        }
        file.last_progress = percent;

        let overall = aggregate_progress(self.completed, percent, self.total());
        self.publish(overall)
    }

    fn on_success(&mut self, index: usize, id: Option<String>) -> Vec<BatchEvent> {
        let id = match id.filter(|id| !id.trim().is_empty()) {
            Some(id) => id,
            None => {
                let generated = fallback_id(index);
                warn!(file = %self.files[index].name, id = %generated, "success response without file id, using fallback");
                generated
            }
        };

        let file = &mut self.files[index];
        file.status = FileUploadStatus::Succeeded;
        file.last_progress = 100.0;
        file.result_id = Some(id.clone());
        let name = file.name.clone();
        info!(file = %name, id = %id, "upload finished");

        self.result_ids.push(id.clone());
        self.completed += 1;

        let mut events = vec![BatchEvent::FileSucceeded { index, name, id }];
        events.extend(self.after_terminal());
        events
    }

    fn on_failure(&mut self, index: usize, reason: String) -> Vec<BatchEvent> {
        let file = &mut self.files[index];
        file.status = FileUploadStatus::Failed;
        let name = file.name.clone();
        warn!(file = %name, %reason, "upload failed");

        self.failures.push(FileFailure {
            name: name.clone(),
            reason: reason.clone(),
        });
        self.completed += 1;

        let mut events = vec![BatchEvent::FileFailed {
            index,
            name,
            reason,
        }];
        events.extend(self.after_terminal());
        events
    }

    fn after_terminal(&mut self) -> Vec<BatchEvent> {
        let overall = aggregate_progress(self.completed, 0.0, self.total());
        let mut events = self.publish(overall);
        if self.is_finished() {
            let report = self.report();
            info!(
                total = report.total,
                succeeded = report.succeeded,
                failed = report.failures.len(),
                advance = report.advance,
                "upload run finished"
            );
            events.push(BatchEvent::Finished(report));
        }
        events
    }

    /// Keeps the published value a high-water mark across interleaved files.
    fn publish(&mut self, overall: u8) -> Vec<BatchEvent> {
        if overall <= self.overall {
            return Vec::new();
        }
        self.overall = overall;
        vec![BatchEvent::Progress { overall }]
    }
}
