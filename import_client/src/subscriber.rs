use std::sync::Arc;

use importer_config::ImporterConfig;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{ImportClientError, Result};
use crate::event_source::{EventConnection, EventSourceConnector, HttpEventSource};
use crate::interface::{ProgressCallbacks, ProgressSource};
use crate::sse_parser::SseEvent;
use crate::types::{JobId, Outcome, ProgressEvent};

const PROGRESS_EVENT: &str = "progress";
const ERROR_EVENT: &str = "error";

/// Handle to one running subscription.
///
/// Dropping the handle detaches the subscription; it still runs to its terminal event.
#[derive(Debug)]
pub struct SubscriptionHandle {
    job_id: JobId,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SubscriptionHandle {
    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    /// Closes the connection.  No callback is invoked after this returns, except one already
    /// running.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits until the subscription has closed its connection and delivered its last callback.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            warn!(job_id = %self.job_id, "subscription task ended abnormally: {e}");
        }
    }
}

enum Terminal {
    Success(Option<Value>),
    Failure(ImportClientError),
    Cancelled,
}

/// Subscribes to a job's progress stream and turns it into callback invocations.
pub struct ProgressSubscriber<C = HttpEventSource> {
    connector: Arc<C>,
}

impl ProgressSubscriber<HttpEventSource> {
    pub fn from_config(config: &ImporterConfig) -> Result<Self> {
        Ok(Self::new(HttpEventSource::from_config(config)?))
    }
}

impl<C: EventSourceConnector> ProgressSubscriber<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector: Arc::new(connector),
        }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }
}

impl<C: EventSourceConnector> ProgressSource for ProgressSubscriber<C> {
    fn subscribe(&self, job_id: &JobId, callbacks: Arc<dyn ProgressCallbacks>) -> SubscriptionHandle {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_subscription(self.connector.clone(), job_id.clone(), callbacks, cancel.clone()));
        SubscriptionHandle {
            job_id: job_id.clone(),
            cancel,
            task,
        }
    }
}

async fn run_subscription<C: EventSourceConnector>(
    connector: Arc<C>,
    job_id: JobId,
    callbacks: Arc<dyn ProgressCallbacks>,
    cancel: CancellationToken,
) {
    let connected = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!(%job_id, "subscription cancelled before connecting");
            return;
        },
        connected = connector.connect(&job_id) => connected,
    };

    let connection = match connected {
        Ok(connection) => connection,
        Err(e) => {
            warn!(%job_id, "failed to open progress stream: {e}");
            if !cancel.is_cancelled() {
                callbacks.on_failure(e);
            }
            return;
        },
    };

    let terminal = consume(connection, &job_id, callbacks.as_ref(), &cancel).await;

    match terminal {
        Terminal::Success(result) => {
            info!(%job_id, result = ?result, "import succeeded");
            callbacks.on_success(result);
        },
        Terminal::Failure(e) => {
            info!(%job_id, "import failed: {e}");
            callbacks.on_failure(e);
        },
        Terminal::Cancelled => info!(%job_id, "subscription cancelled"),
    }
}

/// Reads events until a terminal one, then closes the connection exactly once before
/// returning.  Non-terminal progress is delivered from here, in receipt order.
async fn consume(
    mut connection: Box<dyn EventConnection>,
    job_id: &JobId,
    callbacks: &dyn ProgressCallbacks,
    cancel: &CancellationToken,
) -> Terminal {
    let terminal = loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => break Terminal::Cancelled,
            next = connection.next_event() => next,
        };

        match next {
            Ok(Some(event)) => {
                if let Some(terminal) = dispatch(&event, job_id, callbacks) {
                    break terminal;
                }
            },
            Ok(None) => {
                break Terminal::Failure(ImportClientError::SubscriptionTransport(
                    "stream ended before the job finished".to_owned(),
                ))
            },
            Err(e) => break Terminal::Failure(e),
        }
    };

    connection.close();

    // A cancel that lands while the terminal event was being read wins; nothing is delivered.
    if cancel.is_cancelled() {
        Terminal::Cancelled
    } else {
        terminal
    }
}

fn dispatch(event: &SseEvent, job_id: &JobId, callbacks: &dyn ProgressCallbacks) -> Option<Terminal> {
    match event.name() {
        PROGRESS_EVENT => {
            let progress = match ProgressEvent::from_json(&event.data) {
                Ok(progress) => progress,
                Err(e) => return Some(Terminal::Failure(e)),
            };
            match progress.outcome() {
                Some(Outcome::Success) => Some(Terminal::Success(progress.result)),
                Some(Outcome::Failure) => Some(Terminal::Failure(ImportClientError::JobFailed {
                    cause: progress.failure_cause(),
                })),
                None => {
                    let snapshot = progress.snapshot();
                    debug!(%job_id, percent = snapshot.percent, status = %snapshot.status, "progress");
                    callbacks.on_progress(snapshot);
                    None
                },
            }
        },
        // The server reports its own failures while watching the job as a named event.
        ERROR_EVENT => match ProgressEvent::from_json(&event.data) {
            Ok(progress) => Some(Terminal::Failure(ImportClientError::JobFailed {
                cause: progress.failure_cause(),
            })),
            Err(e) => Some(Terminal::Failure(e)),
        },
        other => {
            warn!(%job_id, event = other, "ignoring unexpected progress stream event");
            None
        },
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use parking_lot::{Mutex, MutexGuard};
    use progress_tracking::ProcessingSnapshot;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::event_source::{ChannelEventSender, ChannelEventSource};

    #[derive(Debug, PartialEq)]
    enum Call {
        Progress(ProcessingSnapshot),
        Success(Option<Value>),
        Failure(ImportClientError),
    }

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<Call>>,
    }

    impl Recorder {
        fn calls(&self) -> MutexGuard<'_, Vec<Call>> {
            self.calls.lock()
        }
    }

    impl ProgressCallbacks for Recorder {
        fn on_progress(&self, snapshot: ProcessingSnapshot) {
            self.calls.lock().push(Call::Progress(snapshot));
        }

        fn on_success(&self, result: Option<Value>) {
            self.calls.lock().push(Call::Success(result));
        }

        fn on_failure(&self, error: ImportClientError) {
            self.calls.lock().push(Call::Failure(error));
        }
    }

    fn job(id: &str) -> JobId {
        JobId::new(id).unwrap()
    }

    fn setup(id: &str) -> (ProgressSubscriber<ChannelEventSource>, ChannelEventSender, Arc<Recorder>) {
        let subscriber = ProgressSubscriber::new(ChannelEventSource::new());
        let sender = subscriber.connector().sender(&job(id));
        (subscriber, sender, Arc::new(Recorder::default()))
    }

    #[tokio::test]
    async fn test_progress_then_success() {
        let (subscriber, sender, recorder) = setup("abc123");
        sender.progress(r#"{"percent":50,"status":"processing","current":5,"total":10}"#);
        sender.progress(r#"{"percent":100,"status":"processing","current":10,"total":10}"#);
        sender.progress(r#"{"state":"SUCCESS","result":{"processed":10,"total":10}}"#);
        // A double-sent terminal event must be ignored.
        sender.progress(r#"{"state":"SUCCESS"}"#);

        let handle = subscriber.subscribe(&job("abc123"), recorder.clone());
        handle.join().await;

        assert_eq!(
            *recorder.calls(),
            vec![
                Call::Progress(ProcessingSnapshot::new(50, "processing", 5, 10)),
                Call::Progress(ProcessingSnapshot::new(100, "processing", 10, 10)),
                Call::Success(Some(serde_json::json!({"processed": 10, "total": 10}))),
            ]
        );
        assert_eq!(sender.close_count(), 1);
    }

    #[tokio::test]
    async fn test_failure_event_uses_server_error() {
        let (subscriber, sender, recorder) = setup("job");
        sender.progress(r#"{"state":"PROGRESS","percent":10,"status":"Processing... 10%","current":1,"total":10}"#);
        sender.progress(r#"{"state":"FAILURE","status":"Import failed","error":"Missing required columns: ['sku']"}"#);

        subscriber.subscribe(&job("job"), recorder.clone()).join().await;

        let calls = recorder.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[1],
            Call::Failure(ImportClientError::JobFailed {
                cause: "Missing required columns: ['sku']".into()
            })
        );
        assert_eq!(sender.close_count(), 1);
    }

    #[tokio::test]
    async fn test_malformed_event_fails_once_and_closes() {
        let (subscriber, sender, recorder) = setup("xyz");
        sender.progress("this is not json");
        sender.progress(r#"{"state":"SUCCESS"}"#);

        subscriber.subscribe(&job("xyz"), recorder.clone()).join().await;

        let calls = recorder.calls();
        assert_eq!(calls.len(), 1);
        let Call::Failure(e) = &calls[0] else {
            panic!("expected failure, got {calls:?}");
        };
        assert!(matches!(e, ImportClientError::SubscriptionDecode(_)));
        assert!(e.cause().starts_with("failed to decode progress event"));
        assert_eq!(sender.close_count(), 1);
    }

    #[tokio::test]
    async fn test_named_error_event_is_terminal() {
        let (subscriber, sender, recorder) = setup("job");
        sender.send("error", r#"{"state":"FAILURE","status":"Error: broker unavailable","error":"broker unavailable"}"#);

        subscriber.subscribe(&job("job"), recorder.clone()).join().await;

        assert_eq!(
            *recorder.calls(),
            vec![Call::Failure(ImportClientError::JobFailed {
                cause: "broker unavailable".into()
            })]
        );
    }

    #[tokio::test]
    async fn test_unknown_events_are_ignored() {
        let (subscriber, sender, recorder) = setup("job");
        sender.send("heartbeat", "{}");
        sender.send("message", "hello");
        sender.progress(r#"{"state":"SUCCESS"}"#);

        subscriber.subscribe(&job("job"), recorder.clone()).join().await;
        assert_eq!(*recorder.calls(), vec![Call::Success(None)]);
    }

    #[tokio::test]
    async fn test_transport_error_fails_and_closes() {
        let (subscriber, sender, recorder) = setup("job");
        sender.fail("connection reset by peer");
        subscriber.subscribe(&job("job"), recorder.clone()).join().await;
        assert_eq!(
            *recorder.calls(),
            vec![Call::Failure(ImportClientError::SubscriptionTransport("connection reset by peer".into()))]
        );
        assert_eq!(sender.close_count(), 1);
    }

    #[tokio::test]
    async fn test_stream_end_before_terminal_is_failure() {
        let (subscriber, sender, recorder) = setup("job");
        sender.progress(r#"{"percent":10}"#);
        drop(sender);

        subscriber.subscribe(&job("job"), recorder.clone()).join().await;

        let calls = recorder.calls();
        assert_eq!(calls.len(), 2);
        assert!(matches!(calls[1], Call::Failure(ImportClientError::SubscriptionTransport(_))));
    }

    #[tokio::test]
    async fn test_unknown_job_fails_without_connection() {
        let subscriber = ProgressSubscriber::new(ChannelEventSource::new());
        let recorder = Arc::new(Recorder::default());
        subscriber.subscribe(&job("nope"), recorder.clone()).join().await;
        assert!(matches!(recorder.calls()[..], [Call::Failure(ImportClientError::SubscriptionTransport(_))]));
    }

    #[tokio::test]
    async fn test_cancel_closes_without_callback() {
        let (subscriber, sender, recorder) = setup("job");
        sender.progress(r#"{"percent":10,"status":"processing"}"#);

        let handle = subscriber.subscribe(&job("job"), recorder.clone());
        // Wait until the first event has been delivered.
        tokio::time::timeout(Duration::from_secs(5), async {
            while recorder.calls().is_empty() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        handle.cancel();
        handle.join().await;

        assert!(!sender.progress(r#"{"state":"SUCCESS"}"#));
        assert_eq!(recorder.calls().len(), 1);
        assert_eq!(sender.close_count(), 1);
    }

    #[tokio::test]
    async fn test_http_error_status_is_transport_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let subscriber = ProgressSubscriber::from_config(&ImporterConfig::default().with_endpoint(server.uri())).unwrap();
        let recorder = Arc::new(Recorder::default());
        subscriber.subscribe(&job("abc123"), recorder.clone()).join().await;

        let calls = recorder.calls();
        assert_eq!(calls.len(), 1);
        assert!(matches!(calls[0], Call::Failure(ImportClientError::SubscriptionTransport(_))));
    }

    #[tokio::test]
    async fn test_http_body_cut_short_is_transport_failure() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;

            let event = "event: progress\ndata: {\"percent\":40,\"status\":\"processing\",\"current\":4,\"total\":10}\n\n";
            // Promise more body than is sent, then hang up.
            let head = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\ncontent-length: {}\r\n\r\n",
                event.len() + 512
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(event.as_bytes()).await.unwrap();
            socket.flush().await.unwrap();
        });

        let config = ImporterConfig::default().with_endpoint(format!("http://{addr}"));
        let subscriber = ProgressSubscriber::from_config(&config).unwrap();
        let recorder = Arc::new(Recorder::default());
        subscriber.subscribe(&job("abc123"), recorder.clone()).join().await;

        let calls = recorder.calls();
        assert_eq!(calls.len(), 2, "{calls:?}");
        assert_eq!(calls[0], Call::Progress(ProcessingSnapshot::new(40, "processing", 4, 10)));
        assert!(matches!(calls[1], Call::Failure(ImportClientError::SubscriptionTransport(_))));
    }
}
