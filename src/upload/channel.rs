use futures::stream::BoxStream;

use crate::upload::types::{ChannelEvent, FileDescriptor};

/// Events of one file's transfer: zero or more `Progress`, then exactly one
/// `Done` or `Failed`.
pub type ChannelStream = BoxStream<'static, ChannelEvent>;

/// Capability to upload a single file and observe its progress.
pub trait FileTransferChannel: Send + Sync {
    fn open(&self, file: &FileDescriptor) -> ChannelStream;
}

#[cfg(test)]
pub(crate) mod scripted {
    use super::*;
    use futures::stream::{self, StreamExt};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory channel replaying a fixed script per file name.
    #[derive(Default)]
    pub struct ScriptedChannel {
        scripts: HashMap<String, Vec<ChannelEvent>>,
        opened: AtomicUsize,
    }

    impl ScriptedChannel {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn script(mut self, name: &str, events: Vec<ChannelEvent>) -> Self {
            self.scripts.insert(name.to_string(), events);
            self
        }

        pub fn opened(&self) -> usize {
            self.opened.load(Ordering::SeqCst)
        }
    }

    impl FileTransferChannel for ScriptedChannel {
        fn open(&self, file: &FileDescriptor) -> ChannelStream {
            self.opened.fetch_add(1, Ordering::SeqCst);
            let events = self.scripts.get(&file.name).cloned().unwrap_or_default();
            stream::iter(events).boxed()
        }
    }
}
