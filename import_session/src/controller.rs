use std::sync::{Arc, Weak};
use std::time::Duration;

use import_client::{
    build_http_client, ImportClientError, ImportFile, JobId, ProgressCallbacks, ProgressSource, ProgressSubscriber,
    SubscriptionHandle, TransferReporter, Uploader, ValidationError,
};
use importer_config::ImporterConfig;
use parking_lot::Mutex;
use progress_tracking::{PercentCallback, ProcessingSnapshot};
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use ulid::Ulid;

use crate::errors::{Result, SessionError};
use crate::session::{ImportSession, Phase};

/// Cause recorded when the caller cancels a running import.
pub const CANCELLED_CAUSE: &str = "import cancelled";

#[derive(Default)]
struct Control {
    subscription: Option<SubscriptionHandle>,
    auto_reset: Option<JoinHandle<()>>,
}

/// All shared state for a controller.
/// Lives behind `Arc<ImportSessionControllerInner>`; use [`ImportSessionController`].
#[doc(hidden)]
pub struct ImportSessionControllerInner {
    uploader: Arc<dyn Uploader>,
    progress_source: Arc<dyn ProgressSource>,
    reset_delay: Duration,
    state: watch::Sender<ImportSession>,
    // Lock order: `control`, then the watch channel's own lock.
    control: Mutex<Control>,
}

/// Drives one import at a time from upload through processing, and publishes every change as
/// a new [`ImportSession`] value.
///
/// # Cloning
///
/// Cloning is cheap; all clones drive the same session.
///
/// # Runtime
///
/// [`start`](Self::start) spawns the import onto the current tokio runtime, so it must be
/// called from within one.
#[derive(Clone)]
pub struct ImportSessionController {
    inner: Arc<ImportSessionControllerInner>,
}

impl std::ops::Deref for ImportSessionController {
    type Target = ImportSessionControllerInner;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl ImportSessionController {
    pub fn new(config: &ImporterConfig, uploader: Arc<dyn Uploader>, progress_source: Arc<dyn ProgressSource>) -> Self {
        let (state, _) = watch::channel(ImportSession::default());
        Self {
            inner: Arc::new(ImportSessionControllerInner {
                uploader,
                progress_source,
                reset_delay: config.session.success_reset_delay,
                state,
                control: Mutex::new(Control::default()),
            }),
        }
    }

    /// Builds the HTTP uploader and subscriber from `config`; both share one client.
    pub fn from_config(config: &ImporterConfig) -> Result<Self> {
        let client = build_http_client(config)?;
        let uploader = TransferReporter::new(client.clone(), config)?;
        let subscriber = ProgressSubscriber::new(import_client::HttpEventSource::new(client, config)?);
        Ok(Self::new(config, Arc::new(uploader), Arc::new(subscriber)))
    }

    /// The current session.
    pub fn status(&self) -> ImportSession {
        self.state.borrow().clone()
    }

    /// A receiver that sees every published session value.
    pub fn watch(&self) -> watch::Receiver<ImportSession> {
        self.state.subscribe()
    }

    /// Waits until the current session has succeeded or failed, and returns it.
    ///
    /// Never resolves while the controller stays idle.
    pub async fn wait_for_terminal(&self) -> ImportSession {
        let mut rx = self.watch();
        let terminal = rx.wait_for(|s| s.phase.is_terminal()).await.map(|s| s.clone());
        terminal.unwrap_or_else(|_| self.status())
    }

    /// Chooses the file for the next [`start`](Self::start).
    pub fn select_file(&self, file: ImportFile) -> Result<()> {
        let _control = self.control.lock();
        if self.state.borrow().phase.is_active() {
            return Err(SessionError::AlreadyActive);
        }
        debug!(file = %file.name, "file selected");
        self.state.send_modify(|s| s.file = Some(file));
        Ok(())
    }

    /// Starts an import of the selected file.
    pub fn start(&self) -> Result<Ulid> {
        self.start_inner(None)
    }

    /// Selects `file` and starts importing it.
    pub fn start_with(&self, file: ImportFile) -> Result<Ulid> {
        self.start_inner(Some(file))
    }

    fn start_inner(&self, file: Option<ImportFile>) -> Result<Ulid> {
        let mut control = self.control.lock();

        let (active, selected) = {
            let current = self.state.borrow();
            (current.phase.is_active(), current.file.clone())
        };
        if active {
            return Err(SessionError::AlreadyActive);
        }

        let file = file.or(selected).ok_or(ValidationError::NoFileSelected)?;
        self.uploader.policy().validate(&file)?;

        // Anything left from the previous session is superseded.
        if let Some(reset) = control.auto_reset.take() {
            reset.abort();
        }
        control.subscription = None;

        let session = ImportSession::uploading(file.clone());
        let id = session.id;
        self.state.send_replace(session);
        info!(session = %id, file = %file.name, bytes = file.len(), "import started");

        tokio::spawn(run_upload(self.inner.clone(), id, file));
        Ok(id)
    }

    /// Returns a finished session to idle right away.  A failed session keeps its file so it
    /// can be started again; a succeeded one is cleared the same way the automatic reset does.
    pub fn dismiss(&self) -> Result<()> {
        let mut control = self.control.lock();
        let current = self.status();
        match current.phase {
            Phase::Uploading | Phase::Processing => return Err(SessionError::AlreadyActive),
            Phase::Idle => return Ok(()),
            Phase::Failed => self.state.send_replace(ImportSession::idle(current.file)),
            Phase::Succeeded => self.state.send_replace(ImportSession::idle(None)),
        };
        if let Some(reset) = control.auto_reset.take() {
            reset.abort();
        }
        control.subscription = None;
        debug!(session = %current.id, "session dismissed");
        Ok(())
    }

    /// Stops watching a job that is being processed and fails the session.  Returns whether
    /// anything was cancelled; an upload in flight cannot be.
    pub fn cancel(&self) -> bool {
        let mut control = self.control.lock();
        if self.state.borrow().phase != Phase::Processing {
            return false;
        }
        let Some(subscription) = control.subscription.take() else {
            return false;
        };
        subscription.cancel();
        self.state.send_if_modified(|s| s.fail(CANCELLED_CAUSE));
        info!(job_id = %subscription.job_id(), "import cancelled");
        true
    }
}

impl ImportSessionControllerInner {
    /// Applies `f` to the session if it is still session `id`; returns whether it changed.
    fn update(&self, id: Ulid, f: impl FnOnce(&mut ImportSession) -> bool) -> bool {
        self.state.send_if_modified(|s| s.id == id && f(s))
    }

    fn begin_processing(self: &Arc<Self>, id: Ulid, job_id: JobId) {
        let mut control = self.control.lock();
        if !self.update(id, |s| s.enter_processing(job_id.clone())) {
            debug!(session = %id, %job_id, "upload finished for a superseded session");
            return;
        }
        info!(session = %id, %job_id, "upload accepted; watching progress");

        let callbacks = Arc::new(SessionCallbacks {
            controller: Arc::downgrade(self),
            session_id: id,
        });
        control.subscription = Some(self.progress_source.subscribe(&job_id, callbacks));
    }

    fn schedule_reset(self: &Arc<Self>, control: &mut Control, id: Ulid) {
        if let Some(reset) = control.auto_reset.take() {
            reset.abort();
        }
        let controller = Arc::downgrade(self);
        let delay = self.reset_delay;
        control.auto_reset = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(controller) = controller.upgrade() {
                controller.reset_after_success(id);
            }
        }));
    }

    fn reset_after_success(&self, id: Ulid) {
        let mut control = self.control.lock();
        let reset = self.state.send_if_modified(|s| {
            if s.id != id || s.phase != Phase::Succeeded {
                return false;
            }
            *s = ImportSession::idle(None);
            true
        });
        if reset {
            control.auto_reset = None;
            control.subscription = None;
            debug!(session = %id, "succeeded session reset to idle");
        }
    }
}

impl Drop for ImportSessionControllerInner {
    fn drop(&mut self) {
        let control = self.control.get_mut();
        if let Some(reset) = control.auto_reset.take() {
            reset.abort();
        }
        if let Some(subscription) = control.subscription.take() {
            subscription.cancel();
        }
    }
}

async fn run_upload(controller: Arc<ImportSessionControllerInner>, id: Ulid, file: ImportFile) {
    let on_percent: PercentCallback = {
        let controller = Arc::downgrade(&controller);
        Arc::new(move |percent| {
            if let Some(controller) = controller.upgrade() {
                controller.update(id, |s| s.record_upload_percent(percent));
            }
        })
    };

    match controller.uploader.upload(&file, on_percent).await {
        Ok(receipt) => controller.begin_processing(id, receipt.job_id),
        Err(e) => {
            warn!(session = %id, file = %file.name, "upload failed: {e}");
            controller.update(id, |s| s.fail(e.cause()));
        },
    }
}

/// Routes one subscription's events into the session that opened it.
struct SessionCallbacks {
    controller: Weak<ImportSessionControllerInner>,
    session_id: Ulid,
}

impl ProgressCallbacks for SessionCallbacks {
    fn on_progress(&self, snapshot: ProcessingSnapshot) {
        if let Some(controller) = self.controller.upgrade() {
            controller.update(self.session_id, |s| s.record_progress(snapshot));
        }
    }

    fn on_success(&self, result: Option<Value>) {
        let Some(controller) = self.controller.upgrade() else {
            return;
        };
        let summary = result.as_ref().map(Value::to_string).unwrap_or_default();
        let mut control = controller.control.lock();
        if controller.update(self.session_id, |s| s.succeed(result)) {
            info!(session = %self.session_id, result = %summary, "import succeeded");
            controller.schedule_reset(&mut control, self.session_id);
        }
    }

    fn on_failure(&self, error: ImportClientError) {
        if let Some(controller) = self.controller.upgrade() {
            if controller.update(self.session_id, |s| s.fail(error.cause())) {
                info!(session = %self.session_id, "import failed: {error}");
            }
        }
    }
}
