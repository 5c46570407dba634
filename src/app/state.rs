use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use crate::upload::{BatchEvent, BatchReport, UploadError};

const NOTICE_DURATION: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub text: String,
    pub kind: NoticeKind,
    expires_at: Instant,
}

#[derive(Debug, Clone, Default)]
pub enum Screen {
    #[default]
    Select,
    Completed(BatchReport),
}

/// What the window shows between frames.
#[derive(Default)]
pub struct UploadState {
    pub screen: Screen,
    pub overall: u8,
    pub uploading: bool,
    pub result_ids: Vec<String>,
    pub notices: Vec<Notice>,
    pub dragging: bool,
    pub event_receiver: Option<Receiver<BatchEvent>>,
}

impl UploadState {
    pub fn clear(&mut self) {
        *self = UploadState::default();
    }

    pub fn begin_run(&mut self, receiver: Receiver<BatchEvent>) {
        self.overall = 0;
        self.uploading = true;
        self.result_ids.clear();
        self.event_receiver = Some(receiver);
    }

    pub fn notify(&mut self, text: impl Into<String>, kind: NoticeKind) {
        self.notices.push(Notice {
            text: text.into(),
            kind,
            expires_at: Instant::now() + NOTICE_DURATION,
        });
    }

    pub fn notify_error(&mut self, error: &UploadError) {
        self.notify(error.to_string(), NoticeKind::Error);
    }

    pub fn expire_notices(&mut self, now: Instant) {
        self.notices.retain(|notice| notice.expires_at > now);
    }

    /// Drains pending run events. Returns true when anything changed.
    pub fn drain_events(&mut self) -> bool {
        let Some(receiver) = &self.event_receiver else {
            return false;
        };
        let events: Vec<BatchEvent> = receiver.try_iter().collect();
        let changed = !events.is_empty();
        for event in events {
            self.apply(event);
        }
        changed
    }

    pub fn apply(&mut self, event: BatchEvent) {
        match event {
            BatchEvent::Started { .. } => {
                self.overall = 0;
                self.uploading = true;
            }
            BatchEvent::Progress { overall } => self.overall = overall,
            BatchEvent::FileSucceeded { id, .. } => self.result_ids.push(id),
            BatchEvent::FileFailed { name, reason, .. } => {
                let error = UploadError::ChannelFailure { file: name, reason };
                self.notify_error(&error);
            }
            BatchEvent::Finished(report) => {
                self.uploading = false;
                self.event_receiver = None;
                if report.advance {
                    self.notify("All uploads complete.", NoticeKind::Info);
                    self.screen = Screen::Completed(report);
                } else if report.succeeded == 0 {
                    self.notify("No files were uploaded.", NoticeKind::Error);
                } else {
                    self.notify(
                        format!(
                            "{} of {} files uploaded.",
                            report.succeeded, report.total
                        ),
                        NoticeKind::Error,
                    );
                }
            }
        }
    }

    pub fn status_text(&self) -> String {
        if self.uploading {
            format!("Uploading… {}%", self.overall)
        } else if !self.result_ids.is_empty() {
            format!("Uploaded: {}", self.result_ids.join(", "))
        } else {
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::FileFailure;
    use std::sync::mpsc;

    fn report(succeeded: usize, total: usize, advance: bool) -> BatchReport {
        BatchReport {
            total,
            succeeded,
            failures: (succeeded..total)
                .map(|i| FileFailure {
                    name: format!("f{}.pdf", i),
                    reason: "boom".to_string(),
                })
                .collect(),
            result_ids: (0..succeeded).map(|i| format!("id-{}", i)).collect(),
            advance,
        }
    }

    #[test]
    fn events_drive_progress_and_completion() {
        let (tx, rx) = mpsc::channel();
        let mut state = UploadState::default();
        state.begin_run(rx);

        tx.send(BatchEvent::Started { total: 2 }).unwrap();
        tx.send(BatchEvent::Progress { overall: 25 }).unwrap();
        tx.send(BatchEvent::FileSucceeded {
            index: 0,
            name: "a.pdf".to_string(),
            id: "id-0".to_string(),
        })
        .unwrap();
        assert!(state.drain_events());
        assert_eq!(state.overall, 25);
        assert!(state.uploading);
        assert_eq!(state.status_text(), "Uploading… 25%");

        tx.send(BatchEvent::Finished(report(2, 2, true))).unwrap();
        state.drain_events();
        assert!(!state.uploading);
        assert!(state.event_receiver.is_none());
        assert!(matches!(state.screen, Screen::Completed(_)));
    }

    #[test]
    fn failures_become_notices() {
        let mut state = UploadState::default();
        state.apply(BatchEvent::FileFailed {
            index: 1,
            name: "b.pdf".to_string(),
            reason: "timeout".to_string(),
        });
        assert_eq!(state.notices.len(), 1);
        assert_eq!(state.notices[0].kind, NoticeKind::Error);
        assert!(state.notices[0].text.contains("b.pdf"));
    }

    #[test]
    fn run_without_advance_stays_on_selection() {
        let mut state = UploadState::default();
        state.apply(BatchEvent::Finished(report(0, 2, false)));
        assert!(matches!(state.screen, Screen::Select));
        assert_eq!(state.notices.last().unwrap().text, "No files were uploaded.");
    }

    #[test]
    fn notices_expire() {
        let mut state = UploadState::default();
        state.notify("hello", NoticeKind::Info);
        state.expire_notices(Instant::now());
        assert_eq!(state.notices.len(), 1);
        state.expire_notices(Instant::now() + NOTICE_DURATION * 2);
        assert!(state.notices.is_empty());
    }
}
