//! TCP accept loop.
//!
//! Each accepted connection gets its own task and its own challenge; the
//! accept loop never waits on a handler. Stopping signals the loop through a
//! watch channel and waits for it to drop the socket.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::service::connection::ConnectionHandler;
use crate::service::context::ServerContext;
use crate::service::error::ListenerError;

/// Back-off after a failed `accept` while still running.
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Vote listener bound to one TCP address.
pub struct VoteListener {
    ctx: Arc<ServerContext>,
    local_addr: Option<SocketAddr>,
    shutdown_tx: Option<watch::Sender<bool>>,
    accept_task: Option<JoinHandle<()>>,
}

impl VoteListener {
    /// Create a stopped listener over `ctx`.
    pub fn new(ctx: ServerContext) -> Self {
        Self {
            ctx: Arc::new(ctx),
            local_addr: None,
            shutdown_tx: None,
            accept_task: None,
        }
    }

    /// Bind `host:port` and start accepting. Port 0 picks a free port.
    ///
    /// Returns the address actually bound.
    pub async fn start(&mut self, host: &str, port: u16) -> Result<SocketAddr, ListenerError> {
        if let Some(addr) = self.local_addr.filter(|_| self.is_running()) {
            return Err(ListenerError::AlreadyRunning(addr));
        }

        let addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ListenerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ListenerError::Bind { addr, source })?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handler = ConnectionHandler::new(Arc::clone(&self.ctx));
        let task = tokio::spawn(accept_loop(listener, handler, shutdown_rx));

        self.local_addr = Some(local_addr);
        self.shutdown_tx = Some(shutdown_tx);
        self.accept_task = Some(task);

        info!(
            addr = %local_addr,
            v2 = self.ctx.v2_enabled(),
            "Votifier listener started"
        );
        Ok(local_addr)
    }

    /// Stop accepting and release the socket. Safe to call more than once.
    ///
    /// Connections already handed to a task run to completion or deadline.
    pub async fn stop(&mut self) {
        let Some(shutdown_tx) = self.shutdown_tx.take() else {
            return;
        };
        let _ = shutdown_tx.send(true);

        if let Some(task) = self.accept_task.take() {
            if let Err(e) = task.await {
                error!(error = %e, "Accept loop terminated abnormally");
            }
        }

        if let Some(addr) = self.local_addr.take() {
            info!(%addr, "Votifier listener stopped");
        }
    }

    /// Bound address while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Whether the accept loop is live.
    pub fn is_running(&self) -> bool {
        self.accept_task
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Snapshot the listener was built with.
    pub fn context(&self) -> &ServerContext {
        &self.ctx
    }
}

impl Drop for VoteListener {
    fn drop(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(true);
        }
    }
}

impl std::fmt::Debug for VoteListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoteListener")
            .field("local_addr", &self.local_addr)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

async fn accept_loop(
    listener: TcpListener,
    handler: ConnectionHandler,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            biased;

            _ = shutdown_rx.changed() => {
                debug!("Accept loop received shutdown signal");
                break;
            }

            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        let handler = handler.clone();
                        tokio::spawn(async move {
                            match handler.handle(stream, peer).await {
                                Ok(vote) => debug!(
                                    %peer,
                                    service = %vote.service_name,
                                    protocol = %vote.source_protocol_version,
                                    "Vote accepted"
                                ),
                                Err(e) => warn!(
                                    %peer,
                                    kind = e.kind(),
                                    error = %e,
                                    "Vote rejected"
                                ),
                            }
                        });
                    }
                    Err(e) => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                        warn!(error = %e, "Failed to accept connection");
                        tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                    }
                }
            }
        }
    }
}
