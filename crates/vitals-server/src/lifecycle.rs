//! Monitoring server lifecycle.
//!
//! `Starting -> Running -> {Stopped, Crashed}`
//!
//! - The listener is bound on the calling thread. A bind failure is returned
//!   from `fork_*` as `ServerCrash` and leaves the store untouched, so the
//!   caller can retry on another port.
//! - The server then runs on a dedicated OS thread with its own tokio
//!   runtime, so embedders need no runtime of their own.
//! - [`ServerHandle::kill`] is the intentional shutdown: the serve loop is
//!   dropped immediately (no drain) and the exit is silent.
//! - Anything else that ends the thread (serve error, panic) is a crash:
//!   logged, kept in [`ServerState::Crashed`], and returned from
//!   [`ServerHandle::join`] as `ServerCrash`.

use std::future::{Future, IntoFuture};
use std::io;
use std::net::{self, SocketAddr};
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc as std_mpsc;
use std::thread::{self, JoinHandle, ThreadId};

use tokio::net::TcpListener;
use tokio::sync::watch;

use vitals_core::error::{Result, VitalsError};
use vitals_core::Store;

use crate::app_state::AppState;
use crate::obs::runtime;
use crate::router;

/// Reserved counter sampled from the wall clock on every read.
pub const SERVER_TIMESTAMP_METRIC: &str = "vitals.server_timestamp_ms";

const ALL_INTERFACES: &str = "0.0.0.0";

/// Observable server state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerState {
    Starting,
    Running,
    Stopped,
    Crashed(String),
}

/// How the server thread ended.
enum ServerExit {
    Killed,
    Crashed(String),
}

/// Handle to a running monitoring server.
///
/// Dropping the handle detaches the server; it keeps serving until the
/// process exits.
#[derive(Debug)]
pub struct ServerHandle {
    thread: JoinHandle<Result<()>>,
    store: Store,
    local_addr: SocketAddr,
    kill_tx: watch::Sender<bool>,
    state_rx: watch::Receiver<ServerState>,
}

impl ServerHandle {
    /// Id of the server thread.
    pub fn thread_id(&self) -> ThreadId {
        self.thread.thread().id()
    }

    /// The store being served. Register more metrics through it at any time.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Bound address (the real port when forked with port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn state(&self) -> ServerState {
        self.state_rx.borrow().clone()
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Send the intentional-termination signal. Idempotent.
    pub fn kill(&self) {
        self.kill_tx.send_replace(true);
    }

    /// Wait for the server thread to end.
    ///
    /// `Ok(())` after [`kill`](Self::kill); `Err(ServerCrash)` for any other exit.
    pub fn join(self) -> Result<()> {
        self.thread
            .join()
            .unwrap_or_else(|payload| Err(VitalsError::ServerCrash(panic_message(&*payload))))
    }
}

/// New store with the predefined `rts.*` metrics, served on `host:port`.
pub fn fork_server(host: &str, port: u16) -> Result<ServerHandle> {
    let store = Store::new();
    runtime::register(&store)?;
    spawn(store, Some(host), port)
}

/// New store with the predefined `rts.*` metrics, served on every interface.
pub fn fork_server_no_hostname(port: u16) -> Result<ServerHandle> {
    let store = Store::new();
    runtime::register(&store)?;
    spawn(store, None, port)
}

/// Serve a caller-owned store on `host:port`. No metrics are added besides
/// [`SERVER_TIMESTAMP_METRIC`].
pub fn fork_server_with(store: Store, host: &str, port: u16) -> Result<ServerHandle> {
    spawn(store, Some(host), port)
}

/// Serve a caller-owned store on every interface.
pub fn fork_server_no_hostname_with(store: Store, port: u16) -> Result<ServerHandle> {
    spawn(store, None, port)
}

fn spawn(store: Store, host: Option<&str>, port: u16) -> Result<ServerHandle> {
    if store.contains(SERVER_TIMESTAMP_METRIC) {
        return Err(VitalsError::DuplicateName(SERVER_TIMESTAMP_METRIC.to_string()));
    }

    let host = host.unwrap_or(ALL_INTERFACES);
    let listener = bind(host, port)?;
    let local_addr = listener
        .local_addr()
        .map_err(|e| VitalsError::ServerCrash(format!("read bound address failed: {e}")))?;

    // Claimed only once bound: a failed bind must not leave the name behind.
    store.register_counter_fn(SERVER_TIMESTAMP_METRIC, runtime::unix_millis)?;
    tracing::info!(host = %host, %local_addr, "vitals server listening");

    let app = router::build_router(AppState::new(store.clone()));
    supervise(store, local_addr, move || {
        let listener = TcpListener::from_std(listener)?;
        Ok(axum::serve(listener, app).into_future())
    })
}

fn bind(host: &str, port: u16) -> Result<net::TcpListener> {
    let crash = |e: io::Error| {
        tracing::error!(host = %host, port, error = %e, "vitals server bind failed");
        VitalsError::ServerCrash(format!("bind {host}:{port} failed: {e}"))
    };
    let listener = net::TcpListener::bind((host, port)).map_err(crash)?;
    listener.set_nonblocking(true).map_err(crash)?;
    Ok(listener)
}

/// Run `setup` and the future it returns on a dedicated server thread.
///
/// Returns once the thread is serving or has already failed.
fn supervise<S, F>(store: Store, local_addr: SocketAddr, setup: S) -> Result<ServerHandle>
where
    S: FnOnce() -> io::Result<F> + Send + 'static,
    F: Future<Output = io::Result<()>>,
{
    let (kill_tx, kill_rx) = watch::channel(false);
    let (state_tx, state_rx) = watch::channel(ServerState::Starting);
    let (ready_tx, ready_rx) = std_mpsc::channel();

    let thread = thread::Builder::new()
        .name("vitals-server".into())
        .spawn(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                serve_blocking(setup, kill_rx, &state_tx, &ready_tx)
            }))
            .unwrap_or_else(|payload| ServerExit::Crashed(panic_message(&*payload)));

            let res = match outcome {
                ServerExit::Killed => {
                    tracing::info!("vitals server stopped");
                    state_tx.send_replace(ServerState::Stopped);
                    Ok(())
                }
                ServerExit::Crashed(msg) => {
                    tracing::error!(error = %msg, "vitals server crashed");
                    state_tx.send_replace(ServerState::Crashed(msg.clone()));
                    Err(VitalsError::ServerCrash(msg))
                }
            };
            // Unblocks `supervise` if we never got as far as serving.
            let _ = ready_tx.send(());
            res
        })
        .map_err(|e| VitalsError::Internal(format!("spawn server thread failed: {e}")))?;

    let _ = ready_rx.recv();

    Ok(ServerHandle {
        thread,
        store,
        local_addr,
        kill_tx,
        state_rx,
    })
}

fn serve_blocking<S, F>(
    setup: S,
    mut kill_rx: watch::Receiver<bool>,
    state_tx: &watch::Sender<ServerState>,
    ready_tx: &std_mpsc::Sender<()>,
) -> ServerExit
where
    S: FnOnce() -> io::Result<F>,
    F: Future<Output = io::Result<()>>,
{
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => return ServerExit::Crashed(format!("build runtime failed: {e}")),
    };

    rt.block_on(async move {
        let serving = match setup() {
            Ok(f) => f,
            Err(e) => return ServerExit::Crashed(format!("start serving failed: {e}")),
        };
        state_tx.send_replace(ServerState::Running);
        let _ = ready_tx.send(());

        let killed = async {
            // A dropped handle detaches the server instead of stopping it.
            if kill_rx.wait_for(|k| *k).await.is_err() {
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            res = serving => match res {
                Ok(()) => ServerExit::Crashed("serve loop exited unexpectedly".into()),
                Err(e) => ServerExit::Crashed(format!("serve failed: {e}")),
            },
            _ = killed => {
                tracing::debug!("kill signal received");
                ServerExit::Killed
            }
        }
    })
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic".to_string()
    }
}
