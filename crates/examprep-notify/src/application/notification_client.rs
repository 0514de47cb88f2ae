//! NotificationClient: a reconnecting, receive-only push-notification client.
//!
//! The client keeps one logical WebSocket connection to the server's push
//! endpoint, turns every inbound text frame into a typed entity, and hands
//! each entity to a single subscriber callback on the application's main
//! context.  When the connection fails or drops it reconnects with a linear
//! backoff (1 s, 2 s, … 5 s) and gives up silently after five consecutive
//! failures.
//!
//! # Architecture
//!
//! ```text
//!  NotificationClient (handle)             session task (one per connect)
//!  ──────────────────────────             ───────────────────────────────
//!  connect(url)  ── spawn ─────────────>  loop {
//!                                           Connector::open(url)
//!                                           read frames ── decode ── MainContext::post
//!                                           on drop/failure: RetryState::next_delay
//!                                           sleep(delay) or stop
//!                                         }
//!  disconnect()  ── flag + Shutdown ───>  close(1000, "App closed"), exit
//! ```
//!
//! The session task owns the socket, the retry counter, and the pending
//! retry timer, so none of them need a lock.  The only state shared with the
//! handle is the session's manual-disconnect flag (an atomic) and the
//! published [`ClientStatus`].
//!
//! # Teardown
//!
//! `disconnect()` is idempotent and is also called from `Drop`, so a client
//! owned by a screen is torn down when the screen drops it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use examprep_core::{decode_frame, LiveEvent, ReconnectPolicy, RetryState};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::application::main_context::MainContext;
use crate::application::transport::{
    Connector, FrameStream, Inbound, TransportError, CLOSE_NORMAL,
};

/// Close reason sent when the application disconnects on purpose.
pub const MANUAL_CLOSE_REASON: &str = "App closed";

/// Lifecycle of the connection as seen from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Constructed, never connected.
    Idle,
    /// A handshake is in flight.
    Connecting,
    /// Handshake succeeded; frames are being delivered.
    Open,
    /// Closing handshake in progress (either side).
    Closing,
    /// Socket released.  A retry may be pending.
    Closed,
    /// Retry budget used up; no further attempts until `connect` is called
    /// again.
    Exhausted,
}

/// Snapshot published on every state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientStatus {
    pub state: ConnectionState,
    /// Consecutive failures since the last successful open.
    pub retry_count: u32,
}

type Subscriber<E> = Arc<dyn Fn(E) + Send + Sync + 'static>;

enum Command {
    Shutdown,
}

/// Handle-side view of a running session task.
struct ActiveSession {
    manual_disconnect: Arc<AtomicBool>,
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl ActiveSession {
    /// Marks the session as manually disconnected, then asks the task to
    /// close.  The flag is set first so a close notification racing with
    /// this call never schedules a retry.
    fn stop(&self) {
        self.manual_disconnect.store(true, Ordering::SeqCst);
        if self.commands.send(Command::Shutdown).is_err() {
            debug!("session task already finished");
        }
    }
}

/// The running session, plus the task of the last stopped one.
///
/// A stopped task may still be sending its close frame; the next `connect`
/// waits for it before opening a new socket.
#[derive(Default)]
struct Sessions {
    active: Option<ActiveSession>,
    retired: Option<JoinHandle<()>>,
}

/// Reconnecting push-notification client for one entity type.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use examprep_core::Recipe;
/// use examprep_notify::application::main_context::main_queue;
/// use examprep_notify::application::notification_client::NotificationClient;
/// use examprep_notify::infrastructure::network::WsConnector;
///
/// # async fn example() {
/// let (main, mut main_loop) = main_queue();
/// let client = NotificationClient::new(
///     Arc::new(WsConnector::default()),
///     main,
///     |recipe: Recipe| println!("new recipe: {}", recipe.title),
/// );
/// client.connect("ws://127.0.0.1:2528");
/// main_loop.run().await;
/// # }
/// ```
pub struct NotificationClient<E: LiveEvent> {
    id: Uuid,
    policy: ReconnectPolicy,
    connector: Arc<dyn Connector>,
    main: Arc<dyn MainContext>,
    subscriber: Subscriber<E>,
    runtime: Handle,
    status: Arc<watch::Sender<ClientStatus>>,
    url: Mutex<Option<String>>,
    sessions: Mutex<Sessions>,
}

impl<E: LiveEvent> NotificationClient<E> {
    /// Creates an idle client with the default [`ReconnectPolicy`].
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime; use
    /// [`with_runtime`](Self::with_runtime) to construct from other threads.
    pub fn new<M, F>(connector: Arc<dyn Connector>, main: M, subscriber: F) -> Self
    where
        M: MainContext,
        F: Fn(E) + Send + Sync + 'static,
    {
        Self::with_runtime(Handle::current(), connector, main, subscriber)
    }

    /// Creates an idle client whose tasks run on `runtime`.
    pub fn with_runtime<M, F>(
        runtime: Handle,
        connector: Arc<dyn Connector>,
        main: M,
        subscriber: F,
    ) -> Self
    where
        M: MainContext,
        F: Fn(E) + Send + Sync + 'static,
    {
        let (status, _) = watch::channel(ClientStatus {
            state: ConnectionState::Idle,
            retry_count: 0,
        });
        Self {
            id: Uuid::new_v4(),
            policy: ReconnectPolicy::default(),
            connector,
            main: Arc::new(main),
            subscriber: Arc::new(subscriber),
            runtime,
            status: Arc::new(status),
            url: Mutex::new(None),
            sessions: Mutex::new(Sessions::default()),
        }
    }

    /// Replaces the reconnect policy used by subsequent `connect` calls.
    pub fn with_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Stores `url` and starts connecting in the background.
    ///
    /// Returns immediately; failures are logged and retried, never returned.
    /// A blank URL is logged and ignored.  If a session is already running it
    /// is shut down first.  Either way the new session does not open a socket
    /// until the previous one (running or already disconnected) has released
    /// its own.
    pub fn connect(&self, url: &str) {
        let url = url.trim();
        if url.is_empty() {
            error!(client = %self.id, "refusing to connect: endpoint URL is empty");
            return;
        }

        *lock(&self.url) = Some(url.to_string());

        let mut sessions = lock(&self.sessions);
        let previous = match sessions.active.take() {
            Some(old) => {
                old.stop();
                Some(old.task)
            }
            None => sessions.retired.take(),
        };

        let manual_disconnect = Arc::new(AtomicBool::new(false));
        let (commands, command_rx) = mpsc::unbounded_channel();
        let ctx = SessionContext {
            url: url.to_string(),
            policy: self.policy,
            connector: Arc::clone(&self.connector),
            main: Arc::clone(&self.main),
            subscriber: Arc::clone(&self.subscriber),
            status: Arc::clone(&self.status),
            manual_disconnect: Arc::clone(&manual_disconnect),
        };

        let span = info_span!("notification_client", client = %self.id, kind = E::KIND);
        let task = self
            .runtime
            .spawn(run_session(ctx, command_rx, previous).instrument(span));

        sessions.active = Some(ActiveSession {
            manual_disconnect,
            commands,
            task,
        });
    }

    /// Stops the client: suppresses retries, cancels a pending retry, and
    /// closes the socket with code 1000.
    ///
    /// Idempotent; safe before `connect` and after a previous `disconnect`.
    /// Deliveries already posted to the main context but not yet run are
    /// dropped when they run.
    pub fn disconnect(&self) {
        let mut sessions = lock(&self.sessions);
        match sessions.active.take() {
            Some(session) => {
                session.stop();
                sessions.retired = Some(session.task);
                info!(client = %self.id, "WebSocket disconnect requested");
            }
            None => debug!(client = %self.id, "disconnect: no active session"),
        }
    }

    /// Endpoint stored by the last `connect` call.
    pub fn url(&self) -> Option<String> {
        lock(&self.url).clone()
    }

    /// The policy in effect.
    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    /// Latest published status.
    pub fn status(&self) -> ClientStatus {
        *self.status.borrow()
    }

    /// Latest connection state.
    pub fn state(&self) -> ConnectionState {
        self.status().state
    }

    /// Consecutive failures since the last successful open.
    pub fn retry_count(&self) -> u32 {
        self.status().retry_count
    }

    /// Subscribes to status changes.
    pub fn status_changes(&self) -> watch::Receiver<ClientStatus> {
        self.status.subscribe()
    }
}

impl<E: LiveEvent> Drop for NotificationClient<E> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Session task ──────────────────────────────────────────────────────────────

/// Everything one session task needs, moved into the task at spawn time.
struct SessionContext<E> {
    url: String,
    policy: ReconnectPolicy,
    connector: Arc<dyn Connector>,
    main: Arc<dyn MainContext>,
    subscriber: Subscriber<E>,
    status: Arc<watch::Sender<ClientStatus>>,
    manual_disconnect: Arc<AtomicBool>,
}

/// Why an open connection stopped delivering frames.
enum SessionEnd {
    Shutdown,
    PeerClosed { code: u16, reason: String },
    Failed(TransportError),
}

impl<E: LiveEvent> SessionContext<E> {
    fn is_manual_disconnect(&self) -> bool {
        self.manual_disconnect.load(Ordering::SeqCst)
    }

    fn publish(&self, state: ConnectionState, retry_count: u32) {
        self.status.send_modify(|status| {
            status.state = state;
            status.retry_count = retry_count;
        });
    }

    /// Decodes one text frame and posts it to the main context.
    fn deliver(&self, text: &str) {
        debug!(frame = %text, "received text frame");
        match decode_frame::<E>(text) {
            Ok(event) => {
                debug!("parsed {}: {}", E::KIND, event.headline());
                let manual_disconnect = Arc::clone(&self.manual_disconnect);
                let subscriber = Arc::clone(&self.subscriber);
                self.main.post(Box::new(move || {
                    if manual_disconnect.load(Ordering::SeqCst) {
                        debug!("dropping {} delivery after disconnect", E::KIND);
                        return;
                    }
                    subscriber(event);
                }));
            }
            Err(e) => warn!("dropping malformed {} frame: {e}", E::KIND),
        }
    }
}

/// Drives one session: connect, pump frames, back off, repeat.
async fn run_session<E: LiveEvent>(
    ctx: SessionContext<E>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    previous: Option<JoinHandle<()>>,
) {
    // At most one socket per client: wait for the replaced session to release
    // its socket before opening ours.
    if let Some(previous) = previous {
        if let Err(e) = previous.await {
            warn!("previous session ended abnormally: {e}");
        }
    }

    let mut retry = RetryState::new(ctx.policy);

    loop {
        if ctx.is_manual_disconnect() {
            ctx.publish(ConnectionState::Closed, retry.count());
            return;
        }

        info!(url = %ctx.url, attempt = retry.count() + 1, "connecting to WebSocket");
        ctx.publish(ConnectionState::Connecting, retry.count());

        let opened = tokio::select! {
            biased;
            _ = commands.recv() => {
                debug!("shutdown requested while connecting");
                ctx.publish(ConnectionState::Closed, retry.count());
                return;
            }
            result = ctx.connector.open(&ctx.url) => result,
        };

        match opened {
            Ok(mut stream) => {
                retry.reset();
                info!(url = %ctx.url, "WebSocket connected");
                ctx.publish(ConnectionState::Open, 0);

                match pump(&ctx, &mut *stream, &mut commands).await {
                    SessionEnd::Shutdown => {
                        ctx.publish(ConnectionState::Closing, 0);
                        if let Err(e) = stream.close(CLOSE_NORMAL, MANUAL_CLOSE_REASON).await {
                            debug!("close frame not delivered: {e}");
                        }
                        drop(stream);
                        ctx.publish(ConnectionState::Closed, 0);
                        info!("WebSocket disconnected");
                        return;
                    }
                    SessionEnd::PeerClosed { code, reason } => {
                        info!(code, reason = %reason, "WebSocket closing by peer");
                        ctx.publish(ConnectionState::Closing, 0);
                        if let Err(e) = stream.close(CLOSE_NORMAL, "").await {
                            debug!("close reply not delivered: {e}");
                        }
                        drop(stream);
                        ctx.publish(ConnectionState::Closed, 0);
                    }
                    SessionEnd::Failed(e) => {
                        warn!("WebSocket connection lost: {e}");
                        drop(stream);
                        ctx.publish(ConnectionState::Closed, 0);
                    }
                }
            }
            Err(e) => {
                warn!(url = %ctx.url, "WebSocket connection failed: {e}");
                ctx.publish(ConnectionState::Closed, retry.count());
            }
        }

        if ctx.is_manual_disconnect() {
            return;
        }

        let Some(delay) = retry.next_delay() else {
            error!(
                max_retries = ctx.policy.max_retries,
                "max retries reached; giving up on live updates"
            );
            ctx.publish(ConnectionState::Exhausted, retry.count());
            return;
        };

        info!(
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            attempt = retry.count(),
            max_retries = ctx.policy.max_retries,
            "scheduling reconnect"
        );
        ctx.publish(ConnectionState::Closed, retry.count());

        tokio::select! {
            biased;
            _ = commands.recv() => {
                debug!("pending reconnect cancelled");
                return;
            }
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

/// Reads frames until the connection ends or a shutdown is requested.
async fn pump<E: LiveEvent>(
    ctx: &SessionContext<E>,
    stream: &mut dyn FrameStream,
    commands: &mut mpsc::UnboundedReceiver<Command>,
) -> SessionEnd {
    loop {
        tokio::select! {
            biased;
            _ = commands.recv() => return SessionEnd::Shutdown,
            frame = stream.next_frame() => match frame {
                Some(Ok(Inbound::Text(text))) => ctx.deliver(&text),
                Some(Ok(Inbound::Close { code, reason })) => {
                    return SessionEnd::PeerClosed { code, reason };
                }
                Some(Ok(Inbound::Ignored)) => {}
                Some(Err(e)) => return SessionEnd::Failed(e),
                None => {
                    return SessionEnd::Failed(TransportError::Io(
                        "connection ended without a close frame".to_string(),
                    ));
                }
            },
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
