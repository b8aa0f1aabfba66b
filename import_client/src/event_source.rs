use std::collections::{HashMap, VecDeque};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use importer_config::ImporterConfig;
use parking_lot::Mutex;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use reqwest_middleware::ClientWithMiddleware;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ImportClientError, Result};
use crate::http_client::{build_http_client, endpoint_url};
use crate::sse_parser::{SseEvent, SseParser};
use crate::types::JobId;

/// One open push connection.
#[async_trait::async_trait]
pub trait EventConnection: Send {
    /// The next event, or `None` once the server has ended the stream.
    ///
    /// Must be cancel safe: dropping the future between events loses nothing.
    async fn next_event(&mut self) -> Result<Option<SseEvent>>;

    /// Closes the connection.  Consumes it, so it cannot be closed twice.
    fn close(self: Box<Self>);
}

/// Opens push connections scoped to one job.
#[async_trait::async_trait]
pub trait EventSourceConnector: Send + Sync + 'static {
    async fn connect(&self, job_id: &JobId) -> Result<Box<dyn EventConnection>>;
}

type ByteStream = Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>;

/// Server-Sent Events over HTTP: `GET {endpoint}{progress_path}/{job_id}`.
pub struct HttpEventSource {
    client: ClientWithMiddleware,
    base_url: Url,
}

impl HttpEventSource {
    pub fn new(client: ClientWithMiddleware, config: &ImporterConfig) -> Result<Self> {
        let base_url = endpoint_url(&config.client.endpoint, &config.client.progress_path)?;
        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &ImporterConfig) -> Result<Self> {
        Self::new(build_http_client(config)?, config)
    }

    pub fn progress_url(&self, job_id: &JobId) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(job_id.as_str());
        }
        url
    }
}

#[async_trait::async_trait]
impl EventSourceConnector for HttpEventSource {
    async fn connect(&self, job_id: &JobId) -> Result<Box<dyn EventConnection>> {
        let url = self.progress_url(job_id);
        debug!(%url, "opening progress stream");

        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| ImportClientError::SubscriptionTransport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImportClientError::SubscriptionTransport(format!("server returned {status} for {url}")));
        }

        info!(%job_id, "progress stream connected");

        Ok(Box::new(HttpEventConnection {
            job_id: job_id.clone(),
            stream: Box::pin(response.bytes_stream()),
            parser: SseParser::new(),
            pending: VecDeque::new(),
        }))
    }
}

struct HttpEventConnection {
    job_id: JobId,
    stream: ByteStream,
    parser: SseParser,
    pending: VecDeque<SseEvent>,
}

#[async_trait::async_trait]
impl EventConnection for HttpEventConnection {
    async fn next_event(&mut self) -> Result<Option<SseEvent>> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(Some(event));
            }

            match self.stream.next().await {
                Some(Ok(chunk)) => self.pending.extend(self.parser.feed(&chunk)),
                Some(Err(e)) => return Err(ImportClientError::SubscriptionTransport(e.to_string())),
                None => {
                    if self.parser.has_partial_event() {
                        warn!(job_id = %self.job_id, "progress stream ended inside an event");
                    }
                    return Ok(None);
                },
            }
        }
    }

    fn close(self: Box<Self>) {
        // Dropping the body stream releases the connection.
        debug!(job_id = %self.job_id, "closing progress stream");
    }
}

/// A message pushed through a [`ChannelEventSender`].
#[derive(Debug)]
enum ChannelMessage {
    Event(SseEvent),
    Broken(String),
}

/// In-memory event source: each job's events are pushed through a [`ChannelEventSender`]
/// registered before the subscription connects.
#[derive(Default)]
pub struct ChannelEventSource {
    receivers: Mutex<HashMap<JobId, (mpsc::UnboundedReceiver<ChannelMessage>, Arc<AtomicUsize>)>>,
}

impl ChannelEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the event stream for `job_id`, replacing any unclaimed one.
    pub fn sender(&self, job_id: &JobId) -> ChannelEventSender {
        let (tx, rx) = mpsc::unbounded_channel();
        let closes = Arc::new(AtomicUsize::new(0));
        self.receivers.lock().insert(job_id.clone(), (rx, closes.clone()));
        ChannelEventSender { tx, closes }
    }
}

#[async_trait::async_trait]
impl EventSourceConnector for ChannelEventSource {
    async fn connect(&self, job_id: &JobId) -> Result<Box<dyn EventConnection>> {
        let Some((rx, closes)) = self.receivers.lock().remove(job_id) else {
            return Err(ImportClientError::SubscriptionTransport(format!("no event stream for job {job_id}")));
        };
        Ok(Box::new(ChannelEventConnection { rx, closes }))
    }
}

/// Producer side of one in-memory event stream.  Dropping every sender ends the stream.
#[derive(Clone)]
pub struct ChannelEventSender {
    tx: mpsc::UnboundedSender<ChannelMessage>,
    closes: Arc<AtomicUsize>,
}

impl ChannelEventSender {
    /// Pushes a named event; returns false if the connection is gone.
    pub fn send(&self, name: &str, data: impl Into<String>) -> bool {
        self.tx
            .send(ChannelMessage::Event(SseEvent {
                event_type: Some(name.to_owned()),
                data: data.into(),
                id: None,
            }))
            .is_ok()
    }

    /// Pushes a `progress` event.
    pub fn progress(&self, data: impl Into<String>) -> bool {
        self.send("progress", data)
    }

    /// Breaks the connection with a transport error.
    pub fn fail(&self, reason: impl Into<String>) -> bool {
        self.tx.send(ChannelMessage::Broken(reason.into())).is_ok()
    }

    /// How many times the consuming connection has been closed.
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

struct ChannelEventConnection {
    rx: mpsc::UnboundedReceiver<ChannelMessage>,
    closes: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl EventConnection for ChannelEventConnection {
    async fn next_event(&mut self) -> Result<Option<SseEvent>> {
        match self.rx.recv().await {
            Some(ChannelMessage::Event(event)) => Ok(Some(event)),
            Some(ChannelMessage::Broken(reason)) => Err(ImportClientError::SubscriptionTransport(reason)),
            None => Ok(None),
        }
    }

    fn close(mut self: Box<Self>) {
        self.rx.close();
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}
