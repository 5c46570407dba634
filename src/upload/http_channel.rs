use bytes::Bytes;
use futures::stream::{self, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use serde::Deserialize;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, warn};

use crate::config::UploaderConfig;
use crate::upload::channel::{ChannelStream, FileTransferChannel};
use crate::upload::error::TransferError;
use crate::upload::types::{ChannelEvent, FileDescriptor, FileSource};

const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    file_id: Option<String>,
    file_name: Option<String>,
    message: Option<String>,
}

/// Uploads each file as a multipart `file` field to the backend's upload endpoint.
#[derive(Clone)]
pub struct HttpChannel {
    client: Client,
    upload_url: String,
}

impl HttpChannel {
    pub fn new(config: &UploaderConfig) -> Result<Self, TransferError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.api_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            upload_url: config.upload_url(),
        })
    }

    async fn send_file(
        client: &Client,
        url: &str,
        file: &FileDescriptor,
        events: &UnboundedSender<ChannelEvent>,
    ) -> Result<Option<String>, TransferError> {
        let content = match &file.source {
            FileSource::Path(path) => Bytes::from(tokio::fs::read(path).await?),
            FileSource::Memory(bytes) => Bytes::copy_from_slice(bytes),
        };
        let total = content.len() as u64;

        let chunks: Vec<Bytes> = (0..content.len())
            .step_by(CHUNK_SIZE)
            .map(|start| content.slice(start..(start + CHUNK_SIZE).min(content.len())))
            .collect();

        let progress = events.clone();
        let mut sent = 0u64;
        let body = stream::iter(chunks).map(move |chunk| {
            sent += chunk.len() as u64;
            let _ = progress.send(ChannelEvent::Progress(percent(sent, total)));
            Ok::<Bytes, std::io::Error>(chunk)
        });

        let part = Part::stream_with_length(Body::wrap_stream(body), total)
            .file_name(file.name.clone());
        let form = Form::new().part("file", part);

        debug!(file = %file.name, size = total, url, "sending upload request");
        let response = client.post(url).multipart(form).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response
                .json::<UploadResponse>()
                .await
                .ok()
                .and_then(|body| body.message);
            return Err(TransferError::Rejected { status, message });
        }

        if total == 0 {
            let _ = events.send(ChannelEvent::Progress(100.0));
        }

        match response.json::<UploadResponse>().await {
            Ok(body) => {
                debug!(
                    file = %file.name,
                    server_name = body.file_name.as_deref().unwrap_or_default(),
                    message = body.message.as_deref().unwrap_or_default(),
                    "upload accepted"
                );
                Ok(body.file_id)
            }
            Err(e) => {
                warn!(file = %file.name, error = %e, "could not decode upload response");
                Ok(None)
            }
        }
    }
}

impl FileTransferChannel for HttpChannel {
    fn open(&self, file: &FileDescriptor) -> ChannelStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = self.client.clone();
        let url = self.upload_url.clone();
        let file = file.clone();

        tokio::spawn(async move {
            let terminal = match Self::send_file(&client, &url, &file, &tx).await {
                Ok(id) => ChannelEvent::Done { id },
                Err(e) => ChannelEvent::Failed(e.to_string()),
            };
            let _ = tx.send(terminal);
        });

        UnboundedReceiverStream::new(rx).boxed()
    }
}

fn percent(sent: u64, total: u64) -> f64 {
    if total == 0 {
        return 100.0;
    }
    (sent as f64 / total as f64 * 100.0).round()
}
