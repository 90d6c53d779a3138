//! Connection lifecycle and status aggregation for backend services.

use super::activity::ActivityLog;
use super::error::ServiceError;
use super::message::{OutboundMessage, ServiceMessage};
use super::transport::{self, Handshake, SocketEnd};
use super::types::{ConnectionState, ServiceDescriptor, ServiceId, ServiceStatus, StatusMap};
use crate::metrics;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Default bound on a single handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(5000);

const EVENT_CAPACITY: usize = 256;
const OUTBOUND_CAPACITY: usize = 32;

/// Published on every state transition and every decoded inbound frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ServiceEvent {
    Status(ServiceStatus),
    Message {
        service: ServiceId,
        message: ServiceMessage,
    },
}

impl ServiceEvent {
    pub fn service(&self) -> ServiceId {
        match self {
            ServiceEvent::Status(status) => status.service_id,
            ServiceEvent::Message { service, .. } => *service,
        }
    }
}

/// Receiver of one service's events. Dropping it unsubscribes.
pub struct ServiceSubscription {
    service: ServiceId,
    rx: broadcast::Receiver<ServiceEvent>,
}

impl ServiceSubscription {
    pub fn service(&self) -> ServiceId {
        self.service
    }

    /// Next event for this service; `None` once the manager is gone.
    pub async fn recv(&mut self) -> Option<ServiceEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.service() == self.service => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(service = %self.service, skipped, "subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Live socket owned by the manager.
struct LiveConnection {
    generation: u64,
    cancel: CancellationToken,
    outbound: mpsc::Sender<String>,
}

/// Open sockets plus a per-service epoch bumped by every disconnect.
///
/// A handshake only attaches if the epoch it started under is still current.
#[derive(Default)]
struct Connections {
    live: HashMap<ServiceId, LiveConnection>,
    epochs: HashMap<ServiceId, u64>,
}

impl Connections {
    fn epoch(&self, id: ServiceId) -> u64 {
        self.epochs.get(&id).copied().unwrap_or(0)
    }
}

struct Inner {
    descriptors: RwLock<BTreeMap<ServiceId, ServiceDescriptor>>,
    connections: Mutex<Connections>,
    generation: AtomicU64,
    initializing: AtomicBool,
    status: watch::Sender<StatusMap>,
    events: broadcast::Sender<ServiceEvent>,
    activity: ActivityLog,
    http: reqwest::Client,
    connect_timeout: Duration,
}

/// Owns every service's transport handle and publishes a status map.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct ServiceManager {
    inner: Arc<Inner>,
}

impl ServiceManager {
    /// Configure `descriptors`. No I/O happens until [`connect`](Self::connect)
    /// or [`initialize`](Self::initialize).
    pub fn new(descriptors: Vec<ServiceDescriptor>, connect_timeout: Duration) -> Self {
        Self::with_client(descriptors, connect_timeout, reqwest::Client::new())
    }

    pub fn with_client(
        descriptors: Vec<ServiceDescriptor>,
        connect_timeout: Duration,
        http: reqwest::Client,
    ) -> Self {
        let descriptors: BTreeMap<_, _> = descriptors.into_iter().map(|d| (d.id, d)).collect();
        let initial: StatusMap = descriptors
            .keys()
            .map(|id| (*id, ConnectionState::Disconnected))
            .collect();
        let (status, _) = watch::channel(initial);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            inner: Arc::new(Inner {
                descriptors: RwLock::new(descriptors),
                connections: Mutex::new(Connections::default()),
                generation: AtomicU64::new(0),
                initializing: AtomicBool::new(false),
                status,
                events,
                activity: ActivityLog::new(),
                http,
                connect_timeout,
            }),
        }
    }

    /// Replace (or add) a service's descriptor. Takes effect on the next
    /// connect; an open handle is left alone.
    pub fn configure(&self, descriptor: ServiceDescriptor) {
        let id = descriptor.id;
        self.inner
            .descriptors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, descriptor);
        self.inner.status.send_if_modified(|map| {
            if map.contains_key(&id) {
                false
            } else {
                map.insert(id, ConnectionState::Disconnected);
                true
            }
        });
    }

    pub fn descriptor(&self, id: ServiceId) -> Option<ServiceDescriptor> {
        self.inner
            .descriptors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    pub fn descriptors(&self) -> Vec<ServiceDescriptor> {
        self.inner
            .descriptors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    pub fn connect_timeout(&self) -> Duration {
        self.inner.connect_timeout
    }

    /// Current state of every configured service.
    pub fn status(&self) -> StatusMap {
        self.inner.status.borrow().clone()
    }

    pub fn state(&self, id: ServiceId) -> ConnectionState {
        self.inner
            .status
            .borrow()
            .get(&id)
            .copied()
            .unwrap_or_default()
    }

    /// Change notification for the status map.
    pub fn watch_status(&self) -> watch::Receiver<StatusMap> {
        self.inner.status.subscribe()
    }

    pub fn is_initializing(&self) -> bool {
        self.inner.initializing.load(Ordering::SeqCst)
    }

    pub fn subscribe(&self, id: ServiceId) -> ServiceSubscription {
        ServiceSubscription {
            service: id,
            rx: self.inner.events.subscribe(),
        }
    }

    /// Events from every service.
    pub fn subscribe_all(&self) -> broadcast::Receiver<ServiceEvent> {
        self.inner.events.subscribe()
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.inner.activity
    }

    /// Connect every configured service concurrently and wait for all
    /// attempts to settle. Never fails; failures show up in the status map.
    pub async fn initialize(&self) -> StatusMap {
        self.inner.initializing.store(true, Ordering::SeqCst);

        let attempts = self.descriptors().into_iter().map(|d| {
            let manager = self.clone();
            async move {
                if let Err(e) = manager.connect(d.id).await {
                    tracing::info!(service = %d.id, error = %e, "service unavailable");
                }
            }
        });
        futures::future::join_all(attempts).await;

        self.inner.initializing.store(false, Ordering::SeqCst);
        let status = self.status();
        let connected = status
            .values()
            .filter(|s| **s == ConnectionState::Connected)
            .count();
        tracing::info!(connected, total = status.len(), "service initialization settled");
        status
    }

    /// Handshake with `id`. Failure leaves it `disconnected`.
    ///
    /// Already-open sockets are kept as they are.
    pub async fn connect(&self, id: ServiceId) -> Result<(), ServiceError> {
        if self.has_live_connection(id) {
            return Ok(());
        }
        self.establish(id, ConnectionState::Disconnected).await
    }

    /// Drop any handle, then handshake again. Failure sets `error`.
    pub async fn reconnect_service(&self, id: ServiceId) -> Result<(), ServiceError> {
        if self.descriptor(id).is_none() {
            return Err(ServiceError::NotConfigured(id));
        }
        self.disconnect(id);
        tracing::info!(service = %id, "reconnecting");
        self.establish(id, ConnectionState::Error).await
    }

    /// Close the handle if present and mark `disconnected`. Idempotent.
    ///
    /// A handshake still in flight for `id` is discarded when it completes.
    pub fn disconnect(&self, id: ServiceId) {
        let mut connections = self.lock_connections();
        *connections.epochs.entry(id).or_insert(0) += 1;
        if let Some(live) = connections.live.remove(&id) {
            live.cancel.cancel();
            tracing::debug!(service = %id, "closed connection");
        }
        self.set_state(id, ConnectionState::Disconnected);
    }

    /// Disconnect every configured service.
    pub fn disconnect_all(&self) {
        for descriptor in self.descriptors() {
            self.disconnect(descriptor.id);
        }
    }

    /// Tear down on process exit.
    pub fn shutdown(&self) {
        self.disconnect_all();
        tracing::info!("services shut down");
    }

    /// Queue `{type, ...data}` on the service's socket.
    pub async fn send(&self, id: ServiceId, message: OutboundMessage) -> Result<(), ServiceError> {
        let sender = self
            .lock_connections()
            .live
            .get(&id)
            .map(|live| live.outbound.clone())
            .ok_or(ServiceError::NotConnected(id))?;

        sender
            .send(message.to_json())
            .await
            .map_err(|_| ServiceError::NotConnected(id))
    }

    fn has_live_connection(&self, id: ServiceId) -> bool {
        self.lock_connections().live.contains_key(&id)
    }

    fn lock_connections(&self) -> MutexGuard<'_, Connections> {
        self.inner
            .connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    async fn establish(
        &self,
        id: ServiceId,
        on_failure: ConnectionState,
    ) -> Result<(), ServiceError> {
        let descriptor = self.descriptor(id).ok_or(ServiceError::NotConfigured(id))?;
        let timeout = self.inner.connect_timeout;
        let epoch = self.lock_connections().epoch(id);

        let outcome = match tokio::time::timeout(
            timeout,
            transport::handshake(&self.inner.http, &descriptor),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ServiceError::ConnectionTimeout {
                service: id,
                timeout_ms: timeout.as_millis() as u64,
            }),
        };

        match outcome {
            Ok(Handshake::Socket(stream)) => self.attach(id, epoch, *stream),
            Ok(Handshake::Probed) => {
                let connections = self.lock_connections();
                if connections.epoch(id) != epoch {
                    return Err(self.discard(id));
                }
                self.set_state(id, ConnectionState::Connected);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    service = %id,
                    endpoint = %descriptor.endpoint,
                    error = %e,
                    "connection attempt failed"
                );
                let connections = self.lock_connections();
                if connections.epoch(id) == epoch {
                    self.set_state(id, on_failure);
                }
                Err(e)
            }
        }
    }

    fn discard(&self, id: ServiceId) -> ServiceError {
        tracing::debug!(service = %id, "disconnected during handshake, discarding");
        ServiceError::Cancelled(id)
    }

    /// Register a freshly opened socket and spawn the task that drives it.
    ///
    /// The stream is dropped if `id` was disconnected since `epoch`.
    fn attach(
        &self,
        id: ServiceId,
        epoch: u64,
        stream: transport::WsStream,
    ) -> Result<(), ServiceError> {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let cancel = CancellationToken::new();
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_CAPACITY);

        {
            let mut connections = self.lock_connections();
            if connections.epoch(id) != epoch {
                return Err(self.discard(id));
            }
            if let Some(previous) = connections.live.insert(
                id,
                LiveConnection {
                    generation,
                    cancel: cancel.clone(),
                    outbound: outbound_tx,
                },
            ) {
                previous.cancel.cancel();
            }
            self.set_state(id, ConnectionState::Connected);
        }

        let manager = self.clone();
        tokio::spawn(async move {
            let on_message = {
                let manager = manager.clone();
                move |message: ServiceMessage| manager.dispatch(id, message)
            };
            let end = transport::drive_socket(id, stream, outbound_rx, cancel, on_message).await;
            manager.connection_ended(id, generation, end);
        });
        Ok(())
    }

    fn dispatch(&self, id: ServiceId, message: ServiceMessage) {
        if let (ServiceId::Activity, ServiceMessage::Activity { event }) = (id, &message) {
            self.inner.activity.push(event.clone());
        }
        let _ = self.inner.events.send(ServiceEvent::Message {
            service: id,
            message,
        });
    }

    fn connection_ended(&self, id: ServiceId, generation: u64, end: SocketEnd) {
        let mut connections = self.lock_connections();
        let current = connections
            .live
            .get(&id)
            .is_some_and(|live| live.generation == generation);
        if !current {
            return;
        }
        connections.live.remove(&id);

        match end {
            SocketEnd::Failed(error) => {
                tracing::warn!(service = %id, error = %error, "connection error");
                self.set_state(id, ConnectionState::Error);
            }
            SocketEnd::Closed => {
                tracing::info!(service = %id, "connection closed by peer");
                self.set_state(id, ConnectionState::Disconnected);
            }
            SocketEnd::Cancelled => {}
        }
    }

    fn set_state(&self, id: ServiceId, state: ConnectionState) {
        let changed = self.inner.status.send_if_modified(|map| match map.get_mut(&id) {
            Some(current) if *current != state => {
                *current = state;
                true
            }
            _ => false,
        });
        if !changed {
            return;
        }

        metrics::record_transition(id.as_str(), state.as_str());
        tracing::info!(service = %id, state = %state, "service state changed");
        let _ = self.inner.events.send(ServiceEvent::Status(ServiceStatus {
            service_id: id,
            state,
        }));
    }
}

impl std::fmt::Debug for ServiceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceManager")
            .field("status", &self.status())
            .finish()
    }
}
