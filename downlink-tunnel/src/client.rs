use crate::config::{TunnelConfig, TunnelKind};
use arc_swap::ArcSwapOption;
use backoff::backoff::Backoff;
use downlink_error::{RouteError, RouteResult};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpStream, UdpSocket};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;

/// Connectivity of a supervised tunnel, published on a watch channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TunnelState {
    Idle,
    Connecting,
    Connected,
    Reconnecting,
    Failed(String),
}

/// Established transport endpoint of a tunnel.
enum TunnelConn {
    Tcp(TcpStream),
    Udp(UdpSocket),
}

/// Long-lived TCP/UDP client tunnel with supervised reconnection.
///
/// A background task owns the connection lifecycle: it connects with
/// exponential backoff, swaps the live connection into place and waits
/// for either shutdown or a reconnect nudge (sent by `write` on I/O
/// failure). Writers never reconnect inline.
pub struct TunnelClient {
    config: Arc<TunnelConfig>,
    conn: ArcSwapOption<Mutex<TunnelConn>>,
    healthy: AtomicBool,
    cancel: CancellationToken,
    state_tx: watch::Sender<TunnelState>,
    state_rx: watch::Receiver<TunnelState>,
    reconnect_tx: mpsc::Sender<()>,
}

impl TunnelClient {
    pub(crate) fn new(config: TunnelConfig) -> (Arc<Self>, mpsc::Receiver<()>) {
        let (state_tx, state_rx) = watch::channel(TunnelState::Idle);
        let (reconnect_tx, reconnect_rx) = mpsc::channel(1);
        let client = Arc::new(Self {
            config: Arc::new(config),
            conn: ArcSwapOption::from(None),
            healthy: AtomicBool::new(false),
            cancel: CancellationToken::new(),
            state_tx,
            state_rx,
            reconnect_tx,
        });
        (client, reconnect_rx)
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    #[inline]
    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Acquire)
    }

    /// Watch receiver for connectivity transitions.
    pub fn state(&self) -> watch::Receiver<TunnelState> {
        self.state_rx.clone()
    }

    /// Wait until the tunnel is connected, bounded by `deadline`.
    pub async fn wait_connected(&self, deadline: Duration) -> bool {
        let mut rx = self.state();
        timeout(deadline, rx.wait_for(|s| *s == TunnelState::Connected))
            .await
            .map(|r| r.is_ok())
            .unwrap_or(false)
    }

    /// Write one framed message to the remote endpoint.
    ///
    /// `channel` tags the logical stream multiplexed over this tunnel
    /// and appears in trace output only. A failed write marks the
    /// tunnel unhealthy and nudges the supervisor to reconnect.
    pub async fn write(&self, channel: &str, payload: &[u8]) -> RouteResult<()> {
        let conn = self
            .conn
            .load_full()
            .ok_or_else(|| RouteError::TunnelNotConnected {
                name: self.config.name.clone(),
            })?;

        let result = timeout(self.config.write_timeout(), async {
            let mut guard = conn.lock().await;
            match &mut *guard {
                TunnelConn::Tcp(stream) => {
                    stream.write_all(payload).await?;
                    stream.flush().await
                }
                TunnelConn::Udp(socket) => socket.send(payload).await.map(|_| ()),
            }
        })
        .await;

        match result {
            Ok(Ok(())) => {
                tracing::trace!(
                    tunnel = %self.config.name,
                    channel,
                    bytes = payload.len(),
                    "tunnel write complete"
                );
                Ok(())
            }
            Ok(Err(e)) => {
                self.mark_broken(&e);
                Err(RouteError::Io(e))
            }
            Err(_) => {
                let e = io::Error::new(io::ErrorKind::TimedOut, "tunnel write timed out");
                self.mark_broken(&e);
                Err(RouteError::Io(e))
            }
        }
    }

    /// Stop supervision and drop the connection.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    fn mark_broken(&self, error: &io::Error) {
        tracing::warn!(tunnel = %self.config.name, %error, "tunnel write failed");
        self.healthy.store(false, Ordering::Release);
        let _ = self.reconnect_tx.try_send(());
    }

    async fn connect_once(config: &TunnelConfig) -> RouteResult<TunnelConn> {
        let endpoint = config.endpoint();
        match config.kind {
            TunnelKind::TcpClient => {
                let stream = timeout(config.connect_timeout(), TcpStream::connect(&endpoint))
                    .await
                    .map_err(|_| {
                        RouteError::Io(io::Error::new(
                            io::ErrorKind::TimedOut,
                            "tunnel connect timed out",
                        ))
                    })??;
                Ok(TunnelConn::Tcp(stream))
            }
            TunnelKind::UdpClient => {
                let socket = UdpSocket::bind("0.0.0.0:0").await?;
                socket.connect(&endpoint).await?;
                Ok(TunnelConn::Udp(socket))
            }
        }
    }

    /// Supervisor loop: keep a single live connection, reconnect with
    /// backoff on demand, exit on cancellation.
    pub(crate) async fn run(self: Arc<Self>, mut reconnect_rx: mpsc::Receiver<()>) {
        let cancel = self.cancel.clone();
        loop {
            let _ = self.state_tx.send(TunnelState::Connecting);

            let mut bo = self.config.backoff.build();
            let mut attempt: u32 = 0;
            let conn = loop {
                if cancel.is_cancelled() {
                    self.finish("cancelled");
                    return;
                }
                match Self::connect_once(&self.config).await {
                    Ok(conn) => break conn,
                    Err(e) => {
                        self.healthy.store(false, Ordering::Relaxed);
                        let _ = self.state_tx.send(TunnelState::Failed(e.to_string()));
                        attempt = attempt.saturating_add(1);
                        let delay = bo.next_backoff().unwrap_or_else(|| {
                            Duration::from_millis(self.config.backoff.max_interval_ms)
                        });
                        tracing::warn!(
                            tunnel = %self.config.name,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "tunnel connect retry"
                        );
                        tokio::select! {
                            _ = cancel.cancelled() => {
                                self.finish("cancelled");
                                return;
                            }
                            _ = sleep(delay) => {}
                        }
                    }
                }
            };

            self.conn.store(Some(Arc::new(Mutex::new(conn))));
            self.healthy.store(true, Ordering::Release);
            let _ = self.state_tx.send(TunnelState::Connected);
            tracing::info!(
                tunnel = %self.config.name,
                endpoint = %self.config.endpoint(),
                "tunnel connected"
            );

            // Drop stale nudges so a pre-connect failure does not
            // trigger an immediate redundant reconnect.
            while reconnect_rx.try_recv().is_ok() {}

            tokio::select! {
                _ = cancel.cancelled() => {
                    self.finish("cancelled");
                    return;
                }
                Some(()) = reconnect_rx.recv() => {
                    self.healthy.store(false, Ordering::Release);
                    self.conn.store(None);
                    let _ = self.state_tx.send(TunnelState::Reconnecting);
                    tracing::info!(tunnel = %self.config.name, "tunnel reconnecting");
                }
            }
        }
    }

    fn finish(&self, reason: &str) {
        self.healthy.store(false, Ordering::Release);
        self.conn.store(None);
        let _ = self.state_tx.send(TunnelState::Failed(reason.to_string()));
    }
}
