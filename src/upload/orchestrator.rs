use futures::stream::{self, StreamExt};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

use crate::upload::channel::FileTransferChannel;
use crate::upload::error::UploadError;
use crate::upload::tracker::{CompletionPolicy, RunTracker};
use crate::upload::types::{BatchEvent, BatchReport, FileDescriptor, RunSnapshot};
use crate::upload::validation::ValidationRules;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPhase {
    Idle,
    Active,
}

/// Owns the selected batch and at most one upload run over it.
pub struct BatchUploader {
    files: Vec<FileDescriptor>,
    rules: ValidationRules,
    policy: CompletionPolicy,
    run: Option<Arc<Mutex<RunTracker>>>,
}

impl BatchUploader {
    pub fn new(rules: ValidationRules, policy: CompletionPolicy) -> Self {
        Self {
            files: Vec::new(),
            rules,
            policy,
            run: None,
        }
    }

    pub fn files(&self) -> &[FileDescriptor] {
        &self.files
    }

    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    pub fn phase(&self) -> BatchPhase {
        match &self.run {
            Some(run) if !lock(run).is_finished() => BatchPhase::Active,
            _ => BatchPhase::Idle,
        }
    }

    pub fn is_active(&self) -> bool {
        self.phase() == BatchPhase::Active
    }

    /// Replaces the batch. Results of a previous, finished run are discarded.
    pub fn select(&mut self, files: Vec<FileDescriptor>) -> Result<(), UploadError> {
        if files.is_empty() {
            return Err(UploadError::EmptySelection);
        }
        if self.is_active() {
            return Err(UploadError::RunActive);
        }
        info!(count = files.len(), "files selected");
        self.files = files;
        self.run = None;
        Ok(())
    }

    pub fn clear(&mut self) -> Result<(), UploadError> {
        if self.is_active() {
            return Err(UploadError::RunActive);
        }
        self.files.clear();
        self.run = None;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), UploadError> {
        self.rules.check_batch(&self.files)
    }

    /// Validates the whole batch and, only if every file passes, prepares a
    /// run that opens one channel per file when executed.
    pub fn start(
        &mut self,
        channel: Arc<dyn FileTransferChannel>,
        events: Sender<BatchEvent>,
    ) -> Result<UploadRun, UploadError> {
        if self.is_active() {
            return Err(UploadError::RunActive);
        }
        self.validate()?;

        let tracker = Arc::new(Mutex::new(RunTracker::new(&self.files, self.policy)));
        self.run = Some(Arc::clone(&tracker));
        info!(total = self.files.len(), "starting upload run");

        Ok(UploadRun {
            tracker,
            channel,
            files: self.files.clone(),
            events,
        })
    }

    pub fn snapshot(&self) -> Option<RunSnapshot> {
        self.run.as_ref().map(|run| lock(run).snapshot())
    }
}

/// A started run. `execute` drives every channel to its terminal event.
pub struct UploadRun {
    tracker: Arc<Mutex<RunTracker>>,
    channel: Arc<dyn FileTransferChannel>,
    files: Vec<FileDescriptor>,
    events: Sender<BatchEvent>,
}

impl UploadRun {
    pub async fn execute(self) -> BatchReport {
        let UploadRun {
            tracker,
            channel,
            files,
            events,
        } = self;

        let _ = events.send(BatchEvent::Started { total: files.len() });

        // Every channel is opened up front; `None` marks the end of a file's stream.
        let streams = files
            .iter()
            .enumerate()
            .map(|(index, file)| {
                lock(&tracker).mark_uploading(index);
                debug!(file = %file.name, index, "opening transfer channel");
                channel
                    .open(file)
                    .map(move |event| (index, Some(event)))
                    .chain(stream::once(async move { (index, None) }))
                    .boxed()
            })
            .collect::<Vec<_>>();

        let mut merged = stream::select_all(streams);
        while let Some((index, event)) = merged.next().await {
            let updates = {
                let mut tracker = lock(&tracker);
                match event {
                    Some(event) => tracker.apply(index, event),
                    None => tracker.close(index),
                }
            };
            for update in updates {
                let _ = events.send(update);
            }
        }

        let report = lock(&tracker).report();
        report
    }
}

fn lock(tracker: &Mutex<RunTracker>) -> MutexGuard<'_, RunTracker> {
    tracker.lock().unwrap_or_else(PoisonError::into_inner)
}
