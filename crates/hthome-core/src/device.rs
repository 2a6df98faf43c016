// ── Device controller ──
//
// One controller per accepted device. Polls the device detail on a fixed
// interval, publishes the decoded state on a watch channel, and issues
// commands through the shared resilient client.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use hthome_api::{DeviceKind, DeviceRecord, HtClient};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::error::CoreError;

// ── DeviceState ──────────────────────────────────────────────────

/// Last observed state of one device.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceState<S> {
    /// Last value seen, kept across failed polls.
    pub value: Option<S>,
    /// `false` until the first successful poll and after any failed one.
    pub valid: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

impl<S> Default for DeviceState<S> {
    fn default() -> Self {
        Self {
            value: None,
            valid: false,
            updated_at: None,
        }
    }
}

impl<S> DeviceState<S> {
    /// The value, but only while it is known to be current.
    pub fn current(&self) -> Option<&S> {
        self.value.as_ref().filter(|_| self.valid)
    }
}

// ── ErrorSink ────────────────────────────────────────────────────

/// Receives failures from background polling.
pub trait ErrorSink: Send + Sync {
    fn report(&self, device: &DeviceRecord, error: &CoreError);
}

/// Default sink: logs at `error` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn report(&self, device: &DeviceRecord, error: &CoreError) {
        error!(device = %device.display_name, id = %device.id, "{error}");
    }
}

// ── DeviceController ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct ControllerOptions {
    pub poll_interval: Duration,
    /// Publish the commanded state after a successful command.
    pub optimistic: bool,
}

/// Polls and commands one device of kind `K`.
///
/// Cheaply cloneable. The background poll task runs from
/// [`spawn`](Self::spawn) until [`shutdown`](Self::shutdown).
pub struct DeviceController<K: DeviceKind> {
    inner: Arc<ControllerInner<K>>,
}

struct ControllerInner<K: DeviceKind> {
    record: DeviceRecord,
    client: Arc<HtClient>,
    options: ControllerOptions,
    state: watch::Sender<DeviceState<K::State>>,
    sink: Arc<dyn ErrorSink>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
    _kind: PhantomData<fn() -> K>,
}

impl<K: DeviceKind> Clone for DeviceController<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: DeviceKind> fmt::Debug for DeviceController<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceController")
            .field("device", &self.inner.record.id)
            .field("resource", &K::RESOURCE)
            .field("running", &!self.inner.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl<K: DeviceKind> DeviceController<K> {
    /// Create the controller and start its poll task.
    ///
    /// Must be called inside a tokio runtime. The first poll happens one
    /// interval after construction.
    pub fn spawn(
        record: DeviceRecord,
        client: Arc<HtClient>,
        options: ControllerOptions,
        sink: Arc<dyn ErrorSink>,
    ) -> Self {
        let (state, _) = watch::channel(DeviceState::default());
        let controller = Self {
            inner: Arc::new(ControllerInner {
                record,
                client,
                options,
                state,
                sink,
                cancel: CancellationToken::new(),
                task: Mutex::new(None),
                _kind: PhantomData,
            }),
        };

        let handle = tokio::spawn(poll_task(
            controller.clone(),
            options.poll_interval,
            controller.inner.cancel.clone(),
        ));
        if let Ok(mut slot) = controller.inner.task.try_lock() {
            *slot = Some(handle);
        }
        debug!(device = %controller.inner.record.display_name, "device controller started");
        controller
    }

    pub fn record(&self) -> &DeviceRecord {
        &self.inner.record
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> DeviceState<K::State> {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DeviceState<K::State>> {
        self.inner.state.subscribe()
    }

    pub fn is_running(&self) -> bool {
        !self.inner.cancel.is_cancelled()
    }

    // ── Operations ───────────────────────────────────────────────

    /// Fetch the device detail and decode its first status entry.
    ///
    /// Publishes the result: a fresh value on success, `valid = false` on
    /// failure (the previous value is kept for reference).
    pub async fn poll_state(&self) -> Result<K::State, CoreError> {
        match self.fetch_state().await {
            Ok(value) => {
                debug!(device = %self.inner.record.display_name, state = ?value, "polled state");
                self.publish(value.clone());
                Ok(value)
            }
            Err(e) => {
                self.inner.state.send_modify(|s| s.valid = false);
                Err(e)
            }
        }
    }

    /// Send `command` to the device.
    ///
    /// Success means the vendor accepted the request (2xx); nothing is read
    /// back. With optimistic updates on, the commanded state is published
    /// immediately.
    pub async fn send_command(&self, command: &K::Command) -> Result<(), CoreError> {
        debug!(device = %self.inner.record.display_name, ?command, "sending command");
        self.inner
            .client
            .send_commands(K::RESOURCE, &self.inner.record.id, &K::encode_command(command))
            .await?;

        if self.inner.options.optimistic {
            self.publish(K::state_after(command));
        }
        Ok(())
    }

    /// Stop the poll task and wait for it to finish.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let handle = self.inner.task.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        debug!(device = %self.inner.record.display_name, "device controller stopped");
    }

    async fn fetch_state(&self) -> Result<K::State, CoreError> {
        let detail = self
            .inner
            .client
            .device_detail(K::RESOURCE, &self.inner.record.id)
            .await?;
        Ok(K::decode_state(&detail)?)
    }

    fn publish(&self, value: K::State) {
        self.inner.state.send_replace(DeviceState {
            value: Some(value),
            valid: true,
            updated_at: Some(Utc::now()),
        });
    }
}

// ── Background task ──────────────────────────────────────────────

/// Poll on a fixed interval until cancelled. A failed tick is reported to
/// the sink; the next tick still fires. Cancellation also drops a poll that
/// is still waiting on the network.
async fn poll_task<K: DeviceKind>(
    controller: DeviceController<K>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                // An in-flight poll must not hold up shutdown.
                let result = tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    result = controller.poll_state() => result,
                };
                if let Err(e) = result {
                    controller.inner.sink.report(&controller.inner.record, &e);
                }
            }
        }
    }
}
