use std::collections::{BTreeMap, BTreeSet};

use crate::common::{ReplayError, ReplayResult};
use crate::domains::episode::{Pose, Vec3};
use crate::domains::replay::{MotionHandle, Rgba, SimulatorClient};
use async_trait::async_trait;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
pub struct IssuedMove {
    pub agent: String,
    pub target: Vec3,
    pub velocity: f64,
    pub handle: u64,
}

#[derive(Debug, Default)]
struct StubAgent {
    pose: Pose,
    moves_seen: usize,
}

#[derive(Default)]
struct StubState {
    agents: BTreeMap<String, StubAgent>,
    next_handle: u64,
    moves: Vec<IssuedMove>,
    cancelled: Vec<MotionHandle>,
    landed: Vec<String>,
    /// Flat call trace ("move:Defender", "cancel:Defender", ...) for
    /// ordering assertions.
    events: Vec<String>,
    draw_calls: usize,
    /// agent -> zero-based move indices that get rejected.
    move_failures: BTreeMap<String, BTreeSet<usize>>,
    fail_spawn: BTreeSet<String>,
}

/// In-memory stand-in for the external simulator, backing tests and the CLI
/// dry-run mode. Agents teleport to each commanded target, so a pose poll
/// right after a move returns the intended waypoint. Unknown agents spawn at
/// the origin on first contact.
pub struct KinematicSimStub {
    state: Mutex<StubState>,
    drawing_supported: bool,
}

impl KinematicSimStub {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StubState::default()),
            drawing_supported: true,
        }
    }

    /// Variant whose drawing primitives report themselves unsupported.
    pub fn without_drawing() -> Self {
        Self {
            state: Mutex::new(StubState::default()),
            drawing_supported: false,
        }
    }

    /// Pins an agent's reported spawn pose instead of the origin default.
    pub async fn place_agent(&self, name: &str, pose: Pose) {
        let mut state = self.state.lock().await;
        state.agents.insert(
            name.to_string(),
            StubAgent {
                pose,
                moves_seen: 0,
            },
        );
    }

    /// Scripts a rejection of the agent's n-th move command (zero-based).
    pub async fn fail_move(&self, agent: &str, nth: usize) {
        let mut state = self.state.lock().await;
        state
            .move_failures
            .entry(agent.to_string())
            .or_default()
            .insert(nth);
    }

    /// Makes spawn queries for this agent fail as a connection-level error.
    pub async fn fail_spawn_query(&self, agent: &str) {
        let mut state = self.state.lock().await;
        state.fail_spawn.insert(agent.to_string());
    }

    pub async fn moves(&self) -> Vec<IssuedMove> {
        self.state.lock().await.moves.clone()
    }

    pub async fn moves_for(&self, agent: &str) -> Vec<IssuedMove> {
        self.state
            .lock()
            .await
            .moves
            .iter()
            .filter(|m| m.agent == agent)
            .cloned()
            .collect()
    }

    pub async fn cancelled(&self) -> Vec<MotionHandle> {
        self.state.lock().await.cancelled.clone()
    }

    pub async fn landed(&self) -> Vec<String> {
        self.state.lock().await.landed.clone()
    }

    pub async fn draw_calls(&self) -> usize {
        self.state.lock().await.draw_calls
    }

    pub async fn events(&self) -> Vec<String> {
        self.state.lock().await.events.clone()
    }
}

impl Default for KinematicSimStub {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SimulatorClient for KinematicSimStub {
    async fn spawn_pose(&self, agent: &str) -> ReplayResult<Pose> {
        let mut state = self.state.lock().await;
        if state.fail_spawn.contains(agent) {
            return Err(ReplayError::Connection {
                reason: format!("simulator reports no vehicle named {}", agent),
            });
        }
        let entry = state.agents.entry(agent.to_string()).or_default();
        Ok(entry.pose)
    }

    async fn move_toward(
        &self,
        agent: &str,
        target: Vec3,
        velocity: f64,
    ) -> ReplayResult<MotionHandle> {
        let mut state = self.state.lock().await;
        state.events.push(format!("move:{}", agent));

        let nth = state.agents.get(agent).map(|a| a.moves_seen).unwrap_or(0);
        let rejected = state
            .move_failures
            .get(agent)
            .map(|set| set.contains(&nth))
            .unwrap_or(false);

        let entry = state.agents.entry(agent.to_string()).or_default();
        entry.moves_seen += 1;
        if rejected {
            return Err(ReplayError::AgentCommand {
                agent: agent.to_string(),
                reason: "scripted rejection".to_string(),
            });
        }
        entry.pose.position = target;

        state.next_handle += 1;
        let handle = MotionHandle {
            agent: agent.to_string(),
            id: state.next_handle,
        };
        state.moves.push(IssuedMove {
            agent: agent.to_string(),
            target,
            velocity,
            handle: handle.id,
        });
        Ok(handle)
    }

    async fn cancel(&self, handle: &MotionHandle) -> ReplayResult<()> {
        let mut state = self.state.lock().await;
        state.events.push(format!("cancel:{}", handle.agent));
        state.cancelled.push(handle.clone());
        Ok(())
    }

    async fn current_pose(&self, agent: &str) -> ReplayResult<Pose> {
        let mut state = self.state.lock().await;
        let entry = state.agents.entry(agent.to_string()).or_default();
        Ok(entry.pose)
    }

    async fn land_or_stop(&self, agent: &str) -> ReplayResult<MotionHandle> {
        let mut state = self.state.lock().await;
        state.events.push(format!("land:{}", agent));
        state.landed.push(agent.to_string());
        state.next_handle += 1;
        Ok(MotionHandle {
            agent: agent.to_string(),
            id: state.next_handle,
        })
    }

    async fn draw_points(
        &self,
        _points: &[Vec3],
        _color: Rgba,
        _size: f32,
        _duration_secs: f32,
    ) -> ReplayResult<()> {
        if !self.drawing_supported {
            return Err(ReplayError::VisualizationUnsupported {
                primitive: "draw_points".to_string(),
            });
        }
        self.state.lock().await.draw_calls += 1;
        Ok(())
    }

    async fn draw_path(&self, _points: &[Vec3], _color: Rgba, _thickness: f32) -> ReplayResult<()> {
        if !self.drawing_supported {
            return Err(ReplayError::VisualizationUnsupported {
                primitive: "draw_path".to_string(),
            });
        }
        self.state.lock().await.draw_calls += 1;
        Ok(())
    }
}
