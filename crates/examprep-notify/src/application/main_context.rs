//! Main-context dispatch: run subscriber callbacks where the application wants.
//!
//! # Why is this needed? (for beginners)
//!
//! Network events arrive on whichever tokio worker thread happens to be
//! polling the socket.  UI toolkits, on the other hand, usually insist that
//! all widget updates happen on one *main* thread.  Rather than letting the
//! subscriber callback run on a random worker, the client *posts* each
//! delivery to a [`MainContext`] and the embedding application decides where
//! posted tasks run.
//!
//! # The ready-made queue
//!
//! [`main_queue`] returns a connected pair:
//!
//! ```text
//! network task ──post()──> MainHandle ──(unbounded mpsc)──> MainLoop ──> task()
//!                                                           (runs on the thread
//!                                                            that drives it)
//! ```
//!
//! Tasks run strictly in the order they were posted, so frames reach the
//! subscriber in the order they arrived on the socket.

use tokio::sync::mpsc;
use tracing::debug;

/// A unit of work posted to the main context.
pub type MainTask = Box<dyn FnOnce() + Send + 'static>;

/// The execution context on which subscriber callbacks must run.
///
/// Implement this to bridge into a UI toolkit's own event loop; use
/// [`main_queue`] otherwise.
pub trait MainContext: Send + Sync + 'static {
    /// Schedules `task` to run later on the main context.
    ///
    /// Must not block and must preserve posting order.
    fn post(&self, task: MainTask);
}

/// Creates a connected [`MainHandle`] / [`MainLoop`] pair.
pub fn main_queue() -> (MainHandle, MainLoop) {
    let (tx, rx) = mpsc::unbounded_channel();
    (MainHandle { tx }, MainLoop { rx })
}

/// Sending side of the main queue.  Cheap to clone.
#[derive(Clone)]
pub struct MainHandle {
    tx: mpsc::UnboundedSender<MainTask>,
}

impl MainHandle {
    /// `true` once the [`MainLoop`] has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl MainContext for MainHandle {
    fn post(&self, task: MainTask) {
        if self.tx.send(task).is_err() {
            debug!("main loop is gone; dropping posted task");
        }
    }
}

/// Receiving side of the main queue; owned by the main thread.
pub struct MainLoop {
    rx: mpsc::UnboundedReceiver<MainTask>,
}

impl MainLoop {
    /// Waits for the next posted task without running it.
    ///
    /// Returns `None` once every [`MainHandle`] has been dropped and the
    /// queue is empty.
    pub async fn recv(&mut self) -> Option<MainTask> {
        self.rx.recv().await
    }

    /// Waits for the next task and runs it.  Returns `false` when the queue
    /// is closed.
    pub async fn run_once(&mut self) -> bool {
        match self.rx.recv().await {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Runs every task that is already queued, without waiting.
    ///
    /// Returns the number of tasks run.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.rx.try_recv() {
            task();
            ran += 1;
        }
        ran
    }

    /// Runs tasks until every [`MainHandle`] has been dropped.
    pub async fn run(&mut self) {
        while self.run_once().await {}
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
