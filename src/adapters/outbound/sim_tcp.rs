use std::sync::atomic::{AtomicU64, Ordering};

use crate::common::{ReplayError, ReplayResult};
use crate::domains::episode::{Pose, Vec3};
use crate::domains::replay::{MotionHandle, Rgba, SimulatorClient};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// SimulatorClient implementation over the simulator's line-delimited JSON
/// bridge: one request object per line, one response object per line, in
/// order. The single connection is shared across all agents; the scheduler
/// being the sole caller keeps per-agent command/poll sequences serial.
pub struct TcpSimulator {
    reader: Mutex<BufReader<OwnedReadHalf>>,
    writer: Mutex<OwnedWriteHalf>,
    next_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    ok: bool,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HandleReply {
    handle: u64,
}

/// Transport succeeded; the simulator either answered or rejected.
enum Reply {
    Ok(Value),
    Rejected(String),
}

impl TcpSimulator {
    /// Connects to the simulator bridge. Failure here is fatal for the whole
    /// run; no retry is attempted - a half-initialized simulator must not be
    /// commanded blindly.
    pub async fn connect(host: &str, port: u16) -> ReplayResult<Self> {
        let stream = TcpStream::connect((host, port)).await.map_err(|e| {
            ReplayError::Connection {
                reason: format!("{}:{}: {}", host, port, e),
            }
        })?;
        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            reader: Mutex::new(BufReader::new(read_half)),
            writer: Mutex::new(write_half),
            next_id: AtomicU64::new(1),
        })
    }

    async fn call(&self, method: &str, params: Value) -> ReplayResult<Reply> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut line = serde_json::to_string(&json!({
            "id": id,
            "method": method,
            "params": params,
        }))?;
        line.push('\n');

        {
            let mut writer = self.writer.lock().await;
            writer
                .write_all(line.as_bytes())
                .await
                .map_err(|e| ReplayError::Connection {
                    reason: format!("request write failed: {}", e),
                })?;
            writer.flush().await.map_err(|e| ReplayError::Connection {
                reason: format!("request flush failed: {}", e),
            })?;
        }

        let mut response_line = String::new();
        {
            let mut reader = self.reader.lock().await;
            let bytes = reader
                .read_line(&mut response_line)
                .await
                .map_err(|e| ReplayError::Connection {
                    reason: format!("response read failed: {}", e),
                })?;
            if bytes == 0 {
                return Err(ReplayError::Connection {
                    reason: "simulator closed the connection".to_string(),
                });
            }
        }

        let response: RpcResponse = serde_json::from_str(&response_line)?;
        if response.ok {
            Ok(Reply::Ok(response.result.unwrap_or(Value::Null)))
        } else {
            Ok(Reply::Rejected(
                response.error.unwrap_or_else(|| "unspecified error".to_string()),
            ))
        }
    }

    fn rejected(agent: &str, reason: String) -> ReplayError {
        ReplayError::AgentCommand {
            agent: agent.to_string(),
            reason,
        }
    }
}

#[async_trait]
impl SimulatorClient for TcpSimulator {
    async fn spawn_pose(&self, agent: &str) -> ReplayResult<Pose> {
        match self.call("spawn_pose", json!({ "agent": agent })).await? {
            Reply::Ok(value) => Ok(serde_json::from_value(value)?),
            Reply::Rejected(reason) => Err(Self::rejected(agent, reason)),
        }
    }

    async fn move_toward(
        &self,
        agent: &str,
        target: Vec3,
        velocity: f64,
    ) -> ReplayResult<MotionHandle> {
        let params = json!({ "agent": agent, "target": target, "velocity": velocity });
        match self.call("move_toward", params).await? {
            Reply::Ok(value) => {
                let reply: HandleReply = serde_json::from_value(value)?;
                Ok(MotionHandle {
                    agent: agent.to_string(),
                    id: reply.handle,
                })
            }
            Reply::Rejected(reason) => Err(Self::rejected(agent, reason)),
        }
    }

    async fn cancel(&self, handle: &MotionHandle) -> ReplayResult<()> {
        let params = json!({ "agent": handle.agent, "handle": handle.id });
        match self.call("cancel", params).await? {
            Reply::Ok(_) => Ok(()),
            Reply::Rejected(reason) => Err(Self::rejected(&handle.agent, reason)),
        }
    }

    async fn current_pose(&self, agent: &str) -> ReplayResult<Pose> {
        match self.call("get_pose", json!({ "agent": agent })).await? {
            Reply::Ok(value) => Ok(serde_json::from_value(value)?),
            Reply::Rejected(reason) => Err(Self::rejected(agent, reason)),
        }
    }

    async fn land_or_stop(&self, agent: &str) -> ReplayResult<MotionHandle> {
        match self.call("land_or_stop", json!({ "agent": agent })).await? {
            Reply::Ok(value) => {
                let reply: HandleReply = serde_json::from_value(value)?;
                Ok(MotionHandle {
                    agent: agent.to_string(),
                    id: reply.handle,
                })
            }
            Reply::Rejected(reason) => Err(Self::rejected(agent, reason)),
        }
    }

    async fn draw_points(
        &self,
        points: &[Vec3],
        color: Rgba,
        size: f32,
        duration_secs: f32,
    ) -> ReplayResult<()> {
        let params = json!({
            "points": points,
            "color": color,
            "size": size,
            "duration": duration_secs,
        });
        match self.call("draw_points", params).await? {
            Reply::Ok(_) => Ok(()),
            // Any rejection of a drawing primitive means this simulator
            // build cannot render it; the caller degrades, never aborts.
            Reply::Rejected(_) => Err(ReplayError::VisualizationUnsupported {
                primitive: "draw_points".to_string(),
            }),
        }
    }

    async fn draw_path(&self, points: &[Vec3], color: Rgba, thickness: f32) -> ReplayResult<()> {
        let params = json!({
            "points": points,
            "color": color,
            "thickness": thickness,
        });
        match self.call("draw_path", params).await? {
            Reply::Ok(_) => Ok(()),
            Reply::Rejected(_) => Err(ReplayError::VisualizationUnsupported {
                primitive: "draw_path".to_string(),
            }),
        }
    }
}
