//! Console server lifecycle: bind, serve, log the overview, stop

use medinet_dashboard_core::RefreshScheduler;
use medinet_infra_common::ManagedTask;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_stream::StreamExt;
use tracing::{error, info};

use crate::api;
use crate::config::ConsoleConfig;
use crate::error::{ConsoleError, ConsoleResult};
use crate::state::ConsoleState;

pub struct ConsoleServer {
    state: ConsoleState,
    config: ConsoleConfig,
    http_task: Option<ManagedTask>,
    overview_task: Option<ManagedTask>,
    local_addr: Option<SocketAddr>,
}

impl ConsoleServer {
    /// Build the state described by `config`
    pub async fn new(config: ConsoleConfig) -> ConsoleResult<Self> {
        config.validate()?;
        let state = ConsoleState::from_config(&config).await?;
        Ok(Self::with_state(config, state))
    }

    pub fn with_state(config: ConsoleConfig, state: ConsoleState) -> Self {
        Self {
            state,
            config,
            http_task: None,
            overview_task: None,
            local_addr: None,
        }
    }

    pub fn state(&self) -> &ConsoleState {
        &self.state
    }

    /// Bound address once started; useful with port 0
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn is_running(&self) -> bool {
        self.http_task.as_ref().is_some_and(|t| !t.is_finished())
    }

    pub async fn start(&mut self) -> ConsoleResult<SocketAddr> {
        if let Some(addr) = self.local_addr.filter(|_| self.is_running()) {
            return Ok(addr);
        }

        let listener = TcpListener::bind(&self.config.server.bind_address).await?;
        let addr = listener.local_addr()?;
        let app = api::router(self.state.clone());

        self.http_task = Some(ManagedTask::spawn("console-http", move |cancel| async move {
            let shutdown = async move { cancel.cancelled().await };
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
            {
                error!("Console HTTP server failed: {}", e);
            }
        }));

        if self.config.server.log_overview {
            self.overview_task = Some(self.spawn_overview_logger());
        }

        self.local_addr = Some(addr);
        info!("Console API listening on {}", addr);
        Ok(addr)
    }

    pub async fn stop(&mut self) -> ConsoleResult<()> {
        let Some(http) = self.http_task.take() else {
            return Err(ConsoleError::NotRunning);
        };
        info!("Stopping console server");
        let timeout = Duration::from_secs(self.config.server.shutdown_timeout_secs);
        if let Some(overview) = self.overview_task.take() {
            overview.shutdown(timeout).await;
        }
        http.shutdown(timeout).await;
        self.local_addr = None;
        info!("Console server stopped");
        Ok(())
    }

    /// Start, wait for `signal`, then stop
    pub async fn run_until<F>(&mut self, signal: F) -> ConsoleResult<()>
    where
        F: std::future::Future<Output = ()>,
    {
        self.start().await?;
        signal.await;
        self.stop().await
    }

    fn spawn_overview_logger(&self) -> ManagedTask {
        let scheduler =
            RefreshScheduler::following(self.state.snapshot_source(), &self.state.dashboard);
        ManagedTask::spawn("overview-logger", move |cancel| async move {
            let mut snapshots = scheduler.subscribe();
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    next = snapshots.next() => match next {
                        Some(s) => info!(
                            "Overview: {} hospitals, {} ambulances, {} pending requests, {} active routes, {} open alerts",
                            s.hospitals,
                            s.total_ambulances(),
                            s.pending_requests,
                            s.active_routes,
                            s.open_alerts()
                        ),
                        None => break,
                    },
                }
            }
        })
    }
}
