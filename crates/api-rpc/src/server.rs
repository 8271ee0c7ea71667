//! JSON-RPC Server
//!
//! Serves the sweep and lifecycle methods over HTTP on localhost.

use crate::handler::RpcHandler;
use crate::types::{
    AcceptOrderRequest, CommitWindowRequest, OrderRequest, ReconcileRequest, RegisterItemRequest,
    RequestPickupRequest,
};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::RpcModule;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: u16 = 9630;

/// RPC Server Configuration
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
        }
    }
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

impl RpcServer {
    pub fn new(config: RpcServerConfig, handler: Arc<RpcHandler>) -> Self {
        Self { config, handler }
    }

    /// Start the JSON-RPC server
    ///
    /// Returns the bound address, which differs from the configured one when
    /// port 0 is requested.
    pub async fn start(self) -> Result<(SocketAddr, ServerHandle), String> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        info!(
            host = %self.config.host,
            port = %self.config.port,
            "Starting JSON-RPC server"
        );

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| format!("Failed to build server on {}: {}", addr, e))?;
        let local_addr = server
            .local_addr()
            .map_err(|e| format!("Failed to read bound address: {}", e))?;

        let mut module = RpcModule::new(());

        // Sweeps
        let handler = self.handler.clone();
        module
            .register_async_method("sweep.pickup_timeout.v1", move |_, _, _| {
                let handler = handler.clone();
                async move { handler.sweep_pickup_timeout().await }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("sweep.window_start.v1", move |_, _, _| {
                let handler = handler.clone();
                async move { handler.sweep_window_start().await }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("sweep.window_end.v1", move |_, _, _| {
                let handler = handler.clone();
                async move { handler.sweep_window_end().await }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("sweep.reconcile.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    // Missing params is the same as a missing key
                    let req: Option<ReconcileRequest> = params.parse()?;
                    handler.sweep_reconcile(req.unwrap_or_default()).await
                }
            })
            .map_err(|e| e.to_string())?;

        // Lifecycle
        let handler = self.handler.clone();
        module
            .register_async_method("item.register.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: RegisterItemRequest = params.parse()?;
                    handler.register_item(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("item.commit_window.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: CommitWindowRequest = params.parse()?;
                    handler.commit_window(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("order.request.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: RequestPickupRequest = params.parse()?;
                    handler.request_pickup(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("order.accept.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: AcceptOrderRequest = params.parse()?;
                    handler.accept_order(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("order.start.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: OrderRequest = params.parse()?;
                    handler.start_order(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("order.complete.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: OrderRequest = params.parse()?;
                    handler.complete_order(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        // Admin
        let handler = self.handler.clone();
        module
            .register_async_method("admin.stats.v1", move |_, _, _| {
                let handler = handler.clone();
                async move { handler.stats().await }
            })
            .map_err(|e| e.to_string())?;

        info!(addr = %local_addr, "JSON-RPC server started successfully");

        let handle = server.start(module);
        Ok((local_addr, handle))
    }
}
