//! JSON-RPC Server
//!
//! Serves the job engine over JSON-RPC 2.0 on TCP.

use crate::handler::RpcHandler;
use crate::types::{StatusRequest, SubmitRequest, TailLogsRequest};
use centroid_core::application::{JobOrchestrator, StatusQueryService};
use centroid_core::port::VideoCatalog;
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::RpcModule;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: u16 = 3000;

/// RPC Server Configuration
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

/// Server startup errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to build server on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to register method {method}: {reason}")]
    Register { method: &'static str, reason: String },
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

impl RpcServer {
    pub fn new(
        config: RpcServerConfig,
        orchestrator: Arc<JobOrchestrator>,
        status: Arc<StatusQueryService>,
        videos: Arc<dyn VideoCatalog>,
    ) -> Self {
        Self {
            config,
            handler: Arc::new(RpcHandler::new(orchestrator, status, videos)),
        }
    }

    /// Build the method table
    fn module(&self) -> Result<RpcModule<()>, ServerError> {
        let mut module = RpcModule::new(());

        let handler = self.handler.clone();
        module
            .register_async_method("process.submit.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: SubmitRequest = params.parse()?;
                    handler.submit(req).await
                }
            })
            .map_err(|e| register_error("process.submit.v1", e))?;

        let handler = self.handler.clone();
        module
            .register_async_method("process.status.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: StatusRequest = params.parse()?;
                    handler.status(req).await
                }
            })
            .map_err(|e| register_error("process.status.v1", e))?;

        let handler = self.handler.clone();
        module
            .register_async_method("jobs.list.v1", move |_, _, _| {
                let handler = handler.clone();
                async move { handler.list_jobs().await }
            })
            .map_err(|e| register_error("jobs.list.v1", e))?;

        let handler = self.handler.clone();
        module
            .register_async_method("videos.list.v1", move |_, _, _| {
                let handler = handler.clone();
                async move { handler.list_videos().await }
            })
            .map_err(|e| register_error("videos.list.v1", e))?;

        let handler = self.handler.clone();
        module
            .register_async_method("logs.tail.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: TailLogsRequest = params.parse()?;
                    handler.tail_logs(req).await
                }
            })
            .map_err(|e| register_error("logs.tail.v1", e))?;

        Ok(module)
    }

    /// Start the JSON-RPC server
    ///
    /// Returns the bound address (useful with port 0) and the stop handle.
    pub async fn start(self) -> Result<(SocketAddr, ServerHandle), ServerError> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        info!(
            host = %self.config.host,
            port = %self.config.port,
            "Starting JSON-RPC server on TCP"
        );

        let module = self.module()?;

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local_addr = server.local_addr().map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;

        let handle = server.start(module);
        info!(addr = %local_addr, "JSON-RPC server started successfully");

        Ok((local_addr, handle))
    }
}

fn register_error(method: &'static str, e: impl std::fmt::Display) -> ServerError {
    ServerError::Register {
        method,
        reason: e.to_string(),
    }
}
