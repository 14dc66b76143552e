//! Request/response multiplexing over a pair of byte streams.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::BridgeError;
use crate::jsonrpc::{self, Incoming, Notification, Request, JSONRPC_VERSION};

type Reply = Result<Value, BridgeError>;
type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<Reply>>>>;
type Writer = Box<dyn AsyncWrite + Send + Unpin>;

/// One JSON-RPC session with a tool server.
///
/// Requests are matched to responses by id, so any number may be in flight.
/// When the read side ends every in-flight request fails with
/// [`BridgeError::ConnectionClosed`] and later calls fail with
/// [`BridgeError::NotConnected`].
pub struct RpcConnection {
    writer: Mutex<Writer>,
    pending: PendingMap,
    next_id: AtomicU64,
    connected: Arc<watch::Sender<bool>>,
    request_timeout: Duration,
    reader_task: JoinHandle<()>,
}

impl RpcConnection {
    /// Start reading `reader` in a background task. Must be called inside a Tokio runtime.
    pub fn new<R, W>(reader: R, writer: W, request_timeout: Duration) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let connected = Arc::new(watch::Sender::new(true));
        let reader_task = spawn_reader(reader, pending.clone(), connected.clone());

        Self {
            writer: Mutex::new(Box::new(writer)),
            pending,
            next_id: AtomicU64::new(1),
            connected,
            request_timeout,
            reader_task,
        }
    }

    pub fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }

    /// Resolves once the connection is closed, by EOF on the read side or by [`close`](Self::close)
    pub async fn closed(&self) {
        let mut state = self.connected.subscribe();
        // The sender lives as long as `self`, so this only returns on close
        let _ = state.wait_for(|connected| !*connected).await;
    }

    /// Number of requests still waiting for a response
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Send a request and wait for its response
    pub async fn send_request(&self, method: &str, params: Value) -> Result<Value, BridgeError> {
        if !self.is_connected() {
            return Err(BridgeError::NotConnected);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let line = jsonrpc::encode_line(&Request {
            jsonrpc: JSONRPC_VERSION,
            id,
            method,
            params: &params,
        })?;

        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        debug!(request_id = id, method, "Sending MCP request");
        if let Err(e) = self.write_line(&line).await {
            self.pending.lock().await.remove(&id);
            return Err(e);
        }

        match tokio::time::timeout(self.request_timeout, rx).await {
            Ok(Ok(reply)) => reply,
            // Sender dropped without a reply: the table was cleared on close
            Ok(Err(_)) => Err(BridgeError::ConnectionClosed),
            Err(_) => {
                self.pending.lock().await.remove(&id);
                warn!(
                    request_id = id,
                    method,
                    timeout_secs = self.request_timeout.as_secs(),
                    "MCP request timed out"
                );
                Err(BridgeError::timeout(method))
            }
        }
    }

    /// Send a message that expects no reply
    pub async fn send_notification(&self, method: &str, params: Value) -> Result<(), BridgeError> {
        if !self.is_connected() {
            return Err(BridgeError::NotConnected);
        }
        let line = jsonrpc::encode_line(&Notification {
            jsonrpc: JSONRPC_VERSION,
            method,
            params: &params,
        })?;
        debug!(method, "Sending MCP notification");
        self.write_line(&line).await
    }

    async fn write_line(&self, line: &str) -> Result<(), BridgeError> {
        let mut writer = self.writer.lock().await;
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Mark the connection closed and fail everything in flight. Idempotent.
    pub async fn close(&self) {
        self.reader_task.abort();
        mark_closed(&self.connected, &self.pending).await;
        let mut writer = self.writer.lock().await;
        let _ = writer.shutdown().await;
    }
}

impl Drop for RpcConnection {
    fn drop(&mut self) {
        self.reader_task.abort();
    }
}

async fn mark_closed(connected: &watch::Sender<bool>, pending: &PendingMap) {
    connected.send_replace(false);
    let drained: Vec<_> = pending.lock().await.drain().collect();
    if !drained.is_empty() {
        debug!(count = drained.len(), "Failing in-flight MCP requests");
    }
    for (_, tx) in drained {
        let _ = tx.send(Err(BridgeError::ConnectionClosed));
    }
}

fn spawn_reader<R>(
    reader: R,
    pending: PendingMap,
    connected: Arc<watch::Sender<bool>>,
) -> JoinHandle<()>
where
    R: AsyncRead + Send + Unpin + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    dispatch_line(&line, &pending).await;
                }
                Ok(None) => {
                    debug!("MCP server closed its output");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to read from MCP server");
                    break;
                }
            }
        }
        mark_closed(&connected, &pending).await;
    })
}

async fn dispatch_line(line: &str, pending: &PendingMap) {
    match jsonrpc::decode_line(line) {
        Ok(Incoming::Response { id, outcome }) => {
            let Some(tx) = pending.lock().await.remove(&id) else {
                debug!(response_id = id, "Dropping MCP response with unknown id");
                return;
            };
            let reply = outcome.map_err(|e| BridgeError::remote(e.code, e.message));
            let _ = tx.send(reply);
        }
        Ok(Incoming::Ignored(reason)) => {
            debug!(reason, "Ignoring MCP message");
        }
        Err(e) => {
            warn!(error = %e, "Failed to parse MCP output line");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{duplex, DuplexStream};

    /// Connection wired to an in-memory peer: (connection, peer reader, peer writer)
    fn connect(
        timeout: Duration,
    ) -> (
        RpcConnection,
        tokio::io::Lines<BufReader<DuplexStream>>,
        DuplexStream,
    ) {
        let (client_write, server_read) = duplex(64 * 1024);
        let (server_write, client_read) = duplex(64 * 1024);
        let connection = RpcConnection::new(client_read, client_write, timeout);
        (connection, BufReader::new(server_read).lines(), server_write)
    }

    async fn reply(peer: &mut DuplexStream, message: Value) {
        let mut line = message.to_string();
        line.push('\n');
        peer.write_all(line.as_bytes()).await.unwrap();
    }

    #[tokio::test]
    async fn test_request_resolves_with_result() {
        let (connection, mut requests, mut peer) = connect(Duration::from_secs(5));

        let server = tokio::spawn(async move {
            let line = requests.next_line().await.unwrap().unwrap();
            let request: Value = serde_json::from_str(&line).unwrap();
            assert_eq!(request["method"], "tools/list");
            reply(
                &mut peer,
                json!({"jsonrpc": "2.0", "id": request["id"], "result": {"tools": []}}),
            )
            .await;
            (requests, peer)
        });

        let result = connection
            .send_request("tools/list", json!({}))
            .await
            .unwrap();
        assert_eq!(result, json!({"tools": []}));
        assert_eq!(connection.pending_count().await, 0);
        let _ = server.await.unwrap();
    }

    #[tokio::test]
    async fn test_remote_error_is_surfaced() {
        let (connection, mut requests, mut peer) = connect(Duration::from_secs(5));

        let server = tokio::spawn(async move {
            let line = requests.next_line().await.unwrap().unwrap();
            let request: Value = serde_json::from_str(&line).unwrap();
            reply(
                &mut peer,
                json!({"jsonrpc": "2.0", "id": request["id"], "error": {"code": -32000, "message": "Tool exploded"}}),
            )
            .await;
            (requests, peer)
        });

        match connection.send_request("tools/call", json!({})).await {
            Err(BridgeError::Remote { code, message }) => {
                assert_eq!(code, -32000);
                assert_eq!(message, "Tool exploded");
            }
            other => panic!("unexpected: {:?}", other),
        }
        let _ = server.await.unwrap();
    }

    #[tokio::test]
    async fn test_responses_are_matched_by_id_out_of_order() {
        let (connection, mut requests, mut peer) = connect(Duration::from_secs(5));
        let connection = Arc::new(connection);

        let server = tokio::spawn(async move {
            let first: Value =
                serde_json::from_str(&requests.next_line().await.unwrap().unwrap()).unwrap();
            let second: Value =
                serde_json::from_str(&requests.next_line().await.unwrap().unwrap()).unwrap();
            // Answer in reverse order, with noise in between
            reply(
                &mut peer,
                json!({"jsonrpc": "2.0", "id": second["id"], "result": second["method"]}),
            )
            .await;
            peer.write_all(b"{garbage\n").await.unwrap();
            reply(&mut peer, json!({"jsonrpc": "2.0", "id": 9999, "result": "stray"})).await;
            reply(
                &mut peer,
                json!({"jsonrpc": "2.0", "id": first["id"], "result": first["method"]}),
            )
            .await;
            (requests, peer)
        });

        let a = {
            let connection = connection.clone();
            tokio::spawn(async move { connection.send_request("alpha", json!({})).await })
        };
        // Give the first request a head start so ids are allocated in order
        tokio::time::sleep(Duration::from_millis(20)).await;
        let b = {
            let connection = connection.clone();
            tokio::spawn(async move { connection.send_request("beta", json!({})).await })
        };

        assert_eq!(a.await.unwrap().unwrap(), json!("alpha"));
        assert_eq!(b.await.unwrap().unwrap(), json!("beta"));
        assert!(connection.is_connected());
        let _ = server.await.unwrap();
    }

    #[tokio::test]
    async fn test_unanswered_request_times_out_and_is_removed() {
        let (connection, _requests, _peer) = connect(Duration::from_millis(50));

        let result = connection.send_request("tools/call", json!({})).await;
        assert!(matches!(result, Err(BridgeError::Timeout { ref method }) if method == "tools/call"));
        assert_eq!(connection.pending_count().await, 0);
    }

    #[tokio::test]
    async fn test_peer_exit_fails_in_flight_requests() {
        let (connection, mut requests, peer) = connect(Duration::from_secs(5));

        let server = tokio::spawn(async move {
            let _ = requests.next_line().await;
            drop(peer);
        });

        let result = connection.send_request("tools/call", json!({})).await;
        assert!(matches!(result, Err(BridgeError::ConnectionClosed)));
        server.await.unwrap();

        assert!(!connection.is_connected());
        assert!(matches!(
            connection.send_request("tools/list", json!({})).await,
            Err(BridgeError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_reply_written_before_peer_exit_is_delivered() {
        let (connection, mut requests, mut peer) = connect(Duration::from_secs(5));

        let server = tokio::spawn(async move {
            let line = requests.next_line().await.unwrap().unwrap();
            let request: Value = serde_json::from_str(&line).unwrap();
            reply(&mut peer, json!({"jsonrpc": "2.0", "id": request["id"], "result": {"ok": true}})).await;
            drop(peer);
        });

        let result = connection.send_request("tools/call", json!({})).await.unwrap();
        assert_eq!(result, json!({"ok": true}));
        server.await.unwrap();

        tokio::time::timeout(Duration::from_secs(1), connection.closed())
            .await
            .expect("EOF should close the connection");
        assert!(!connection.is_connected());
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (connection, _requests, _peer) = connect(Duration::from_secs(5));
        connection.close().await;
        connection.close().await;
        assert!(!connection.is_connected());
        assert!(matches!(
            connection.send_notification("initialized", json!({})).await,
            Err(BridgeError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_notification_is_written_without_id() {
        let (connection, mut requests, _peer) = connect(Duration::from_secs(5));
        connection
            .send_notification("initialized", json!({}))
            .await
            .unwrap();
        let line = requests.next_line().await.unwrap().unwrap();
        let value: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["method"], "initialized");
        assert!(value.get("id").is_none());
    }
}
