use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::Command;
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, error, info, warn};

use crate::config::{BridgeConfig, ModelConfig};
use crate::connection::RpcConnection;
use crate::error::BridgeError;
use crate::protocol;
use crate::tool_server::ToolServer;

struct Running {
    connection: Arc<RpcConnection>,
    /// Fires the kill branch of the exit watcher; `None` for in-memory transports
    kill: Option<oneshot::Sender<()>>,
}

/// How long the reader may keep draining stdout after the child exits
const EXIT_DRAIN: Duration = Duration::from_secs(2);

/// Bridge to an MCP tool server running as a child process
pub struct McpBridge {
    config: BridgeConfig,
    running: Mutex<Option<Running>>,
    /// Readiness of the current run. Each start installs a fresh flag so a
    /// previous run's exit watcher can only clear its own.
    ready: StdMutex<Arc<AtomicBool>>,
}

impl McpBridge {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            running: Mutex::new(None),
            ready: StdMutex::new(Arc::new(AtomicBool::new(false))),
        }
    }

    /// A bridge already attached to the given transport, with no child process
    pub fn over_transport<R, W>(config: BridgeConfig, reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let connection = RpcConnection::new(reader, writer, config.request_timeout);
        Self {
            config,
            running: Mutex::new(Some(Running {
                connection: Arc::new(connection),
                kill: None,
            })),
            ready: StdMutex::new(Arc::new(AtomicBool::new(true))),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Spawn the tool server and run the MCP handshake.
    ///
    /// A failed handshake is only logged: the bridge stays up and individual
    /// tool calls report their own errors.
    pub async fn start(&self) -> Result<(), BridgeError> {
        let mut running = self.running.lock().await;
        if let Some(existing) = running.as_ref() {
            if existing.connection.is_connected() {
                info!("MCP server already running");
                return Ok(());
            }
        }

        if self.config.api_key().is_none() {
            return Err(BridgeError::MissingCredential {
                name: "OPENROUTER_API_KEY".to_string(),
            });
        }

        let models = &self.config.models;
        info!(
            command = %self.config.command_line(),
            research = %models.research,
            prd = %models.prd,
            user_stories = %models.user_stories,
            task_list = %models.task_list,
            code_generation = %models.code_generation,
            "Starting MCP server"
        );

        let mut child = Command::new(&self.config.command)
            .args(&self.config.args)
            .envs(self.config.child_env())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| BridgeError::Spawn {
                command: self.config.command_line(),
                source,
            })?;

        let stdin = child.stdin.take().ok_or_else(|| {
            BridgeError::from(std::io::Error::other("MCP server stdin unavailable"))
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            BridgeError::from(std::io::Error::other("MCP server stdout unavailable"))
        })?;

        let connection = Arc::new(RpcConnection::new(
            stdout,
            stdin,
            self.config.request_timeout,
        ));
        let (kill_tx, kill_rx) = oneshot::channel::<()>();

        let ready = self.install_ready_flag();
        let watched = connection.clone();
        tokio::spawn(async move {
            tokio::select! {
                status = child.wait() => {
                    match status {
                        Ok(status) => warn!(code = ?status.code(), "MCP server exited"),
                        Err(e) => error!(error = %e, "Failed waiting on MCP server"),
                    }
                    ready.store(false, Ordering::SeqCst);
                    // Replies flushed just before exit are still in the pipe; the
                    // reader closes on EOF. A grandchild holding stdout open does not.
                    if tokio::time::timeout(EXIT_DRAIN, watched.closed()).await.is_err() {
                        watched.close().await;
                    }
                }
                _ = kill_rx => {
                    ready.store(false, Ordering::SeqCst);
                    if let Err(e) = child.kill().await {
                        warn!(error = %e, "Failed to kill MCP server");
                    }
                    debug!("MCP server stopped");
                }
            }
        });

        *running = Some(Running {
            connection: connection.clone(),
            kill: Some(kill_tx),
        });
        drop(running);
        info!("MCP server is ready");

        if let Err(e) = self.initialize().await {
            warn!(error = %e, "MCP initialization failed; tools may not work properly");
        }
        Ok(())
    }

    /// Fresh ready flag for a new run, set before its watcher exists
    fn install_ready_flag(&self) -> Arc<AtomicBool> {
        let flag = Arc::new(AtomicBool::new(true));
        let mut current = self.ready.lock().unwrap_or_else(|e| e.into_inner());
        *current = flag.clone();
        flag
    }

    fn current_ready_flag(&self) -> Arc<AtomicBool> {
        self.ready.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    async fn connection(&self) -> Result<Arc<RpcConnection>, BridgeError> {
        let running = self.running.lock().await;
        match running.as_ref() {
            Some(running) if running.connection.is_connected() => Ok(running.connection.clone()),
            _ => Err(BridgeError::NotConnected),
        }
    }

    pub async fn send_request(&self, method: &str, params: Value) -> Result<Value, BridgeError> {
        self.connection().await?.send_request(method, params).await
    }

    pub async fn send_notification(&self, method: &str, params: Value) -> Result<(), BridgeError> {
        self.connection()
            .await?
            .send_notification(method, params)
            .await
    }

    /// MCP handshake followed by a tool listing. Returns the advertised tool names.
    pub async fn initialize(&self) -> Result<Vec<String>, BridgeError> {
        let params = serde_json::to_value(protocol::initialize_params(&self.config))?;
        self.send_request("initialize", params).await?;
        debug!("MCP session initialized");

        self.send_notification("initialized", json!({})).await?;

        let listing = self.send_request("tools/list", json!({})).await?;
        let tools = protocol::tool_names(listing)?;

        info!(tools = %tools.join(", "), "MCP tools available");
        Ok(tools)
    }

    /// Close the connection and kill the child. Safe to call repeatedly.
    pub async fn stop(&self) {
        let taken = self.running.lock().await.take();
        self.current_ready_flag().store(false, Ordering::SeqCst);

        if let Some(mut running) = taken {
            running.connection.close().await;
            if let Some(kill) = running.kill.take() {
                let _ = kill.send(());
            }
            info!("MCP server stopped");
        }
    }

    pub fn is_ready(&self) -> bool {
        self.current_ready_flag().load(Ordering::SeqCst)
    }

    pub async fn is_connected(&self) -> bool {
        self.connection().await.is_ok()
    }
}

#[async_trait]
impl ToolServer for McpBridge {
    async fn execute_tool(&self, name: &str, arguments: Value) -> Result<Value, BridgeError> {
        info!(tool_name = name, "Calling MCP tool");
        let params = serde_json::to_value(protocol::call_tool_params(name, arguments)?)?;
        let result = self.send_request("tools/call", params).await;
        match &result {
            Ok(_) => info!(tool_name = name, "MCP tool completed"),
            Err(e) => error!(tool_name = name, error = %e, "MCP tool failed"),
        }
        result
    }

    fn is_ready(&self) -> bool {
        McpBridge::is_ready(self)
    }

    fn models(&self) -> Option<&ModelConfig> {
        Some(&self.config.models)
    }
}
