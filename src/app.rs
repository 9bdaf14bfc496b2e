//! Process wiring: config to a serving gateway with its history worker.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::error::Result;
use crate::gateway::Gateway;
use crate::history::{HistoryRecorder, HistoryWorker, open_sink};
use crate::identity::IdentityResolver;
use crate::server::GatewayServer;

/// A serving gateway and the history worker behind it.
pub struct Running {
    server: GatewayServer,
    worker: HistoryWorker,
}

/// Build every component `config` describes and start serving.
///
/// `config` should already be validated; provider sections are validated
/// again as their clients are built.
///
/// # Errors
///
/// Configuration errors, an unopenable history store, or a failed bind.
pub async fn launch(config: &GatewayConfig) -> Result<Running> {
    let gateway = Gateway::from_config(config)?;
    let sink = open_sink(&config.history)?;
    tracing::info!(
        mode = %gateway.mode(),
        history = sink.name(),
        "gateway configured"
    );

    let (recorder, worker) = HistoryRecorder::spawn(sink, config.history.queue_capacity);
    let gateway = Arc::new(gateway.with_history(recorder));
    let identity = IdentityResolver::from_config(&config.identity);
    let server = GatewayServer::start(&config.server, gateway, identity).await?;

    Ok(Running { server, worker })
}

impl Running {
    /// Address the server is listening on.
    pub fn addr(&self) -> SocketAddr {
        self.server.addr()
    }

    /// Stop serving, then wait for queued history to be written.
    ///
    /// Returns the number of history records the worker processed.
    pub async fn shutdown(self) -> usize {
        let Self { server, worker } = self;
        server.shutdown();
        drop(server);
        worker.join().await
    }
}
