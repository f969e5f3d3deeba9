//! The application session: one of everything, wired together.

use tokio::sync::mpsc::{self, UnboundedReceiver};

use std::sync::Arc;

use skyshell_render::{build_frame, CameraState, RenderFrame};
use skyshell_shared::{epoch_seconds, Mat4, ShellDefinition, Vec3};
use skyshell_sim::{BurstEffect, SimConfig, SimStats, SimulationEngine};
use skyshell_sync::{SessionState, SyncCommand, SyncError, SyncEvent, SyncSession};

use crate::input::launch_position;

/// Session tuning.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Simulation engine settings.
    pub sim: SimConfig,
    /// How far ahead of the camera a tap places its launch, metres.
    pub launch_distance: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sim: SimConfig::default(),
            launch_distance: 2.0,
        }
    }
}

/// One running firework show.
///
/// Owned by the render-tick thread, which is the only caller of
/// [`on_render_tick`](Self::on_render_tick) and therefore the only
/// particle writer. The camera handle from
/// [`camera_state`](Self::camera_state) may be published to from any
/// thread; sync events are fed in by whichever task drives the
/// transport.
pub struct FireworkSession {
    engine: SimulationEngine,
    sync: SyncSession,
    camera: CameraState,
    launch_distance: f32,
}

impl FireworkSession {
    /// Creates a session.
    ///
    /// The returned receiver is the transport's command feed; hand it to
    /// [`skyshell_sync::run_transport`], or drain it yourself for a
    /// network-free session.
    #[must_use]
    pub fn new(config: &SessionConfig) -> (Self, UnboundedReceiver<SyncCommand>) {
        let engine = SimulationEngine::new(&config.sim);
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let sync = SyncSession::new(command_tx, engine.launch_sender());
        let session = Self {
            engine,
            sync,
            camera: CameraState::new(),
            launch_distance: config.launch_distance,
        };
        (session, command_rx)
    }

    /// A cloneable handle for the camera-pose producer thread.
    #[must_use]
    pub fn camera_state(&self) -> CameraState {
        self.camera.clone()
    }

    /// Publishes a new camera pose. Callable from any thread through the
    /// handle as well; this is a convenience for single-threaded hosts.
    pub fn on_camera_update(&self, view: Mat4, projection: Mat4) {
        self.camera.publish(view, projection);
    }

    /// Hosts a launch group under `name`.
    ///
    /// # Errors
    ///
    /// [`SyncError::ChannelClosed`] if the transport is gone.
    pub fn create_group(&mut self, name: &str) -> Result<(), SyncError> {
        self.sync.create_group(name)
    }

    /// Joins the launch group named `name`, giving up after the join
    /// timeout.
    ///
    /// # Errors
    ///
    /// [`SyncError::ChannelClosed`] if the transport is gone.
    pub fn join_group(&mut self, name: &str) -> Result<(), SyncError> {
        self.sync.join_group(name, epoch_seconds())
    }

    /// Leaves the current launch group. Shells already in flight still
    /// burst.
    pub fn leave_group(&mut self) {
        self.sync.leave_group();
    }

    /// Current sync state.
    #[must_use]
    pub fn sync_state(&self) -> SessionState {
        self.sync.state()
    }

    /// Records the group's shared world-space origin.
    ///
    /// Launch positions sent to peers are relative to this point, so all
    /// members see a burst at the same physical spot. Dropped when the
    /// group is left.
    pub fn set_group_origin(&mut self, origin: Vec3) {
        self.sync.set_group_origin(origin);
    }

    /// Launches a firework from a tap: a short distance ahead of the
    /// current camera pose, fired after the shared lead time, broadcast
    /// to the group. With a group origin set, the world position is
    /// converted to group-relative coordinates first.
    ///
    /// # Errors
    ///
    /// See [`SyncSession::send_launch`]; the local launch survives a
    /// broadcast failure.
    pub fn launch(&mut self, shell: Option<Arc<ShellDefinition>>) -> Result<(), SyncError> {
        let view = self.camera.snapshot().view;
        let world = launch_position(&view, self.launch_distance);
        let origin = match self.sync.group_origin() {
            Some(group_origin) => world - group_origin,
            None => world,
        };
        self.launch_at(shell, origin, epoch_seconds())
    }

    /// [`launch`](Self::launch) with explicit origin and clock, for hosts
    /// that place launches themselves.
    ///
    /// # Errors
    ///
    /// See [`SyncSession::send_launch`].
    pub fn launch_at(
        &mut self,
        shell: Option<Arc<ShellDefinition>>,
        origin: Vec3,
        now: f64,
    ) -> Result<(), SyncError> {
        self.sync.send_launch(shell, origin, now)
    }

    /// Feeds one transport event into the sync state machine.
    pub fn on_sync_event(&mut self, event: SyncEvent) {
        self.sync.handle_event(event);
    }

    /// Advances the simulation and prepares the next frame.
    ///
    /// `dt` is the frame delta in seconds, `now` the wall clock in epoch
    /// seconds. The returned frame's `redraw_needed` chains the next
    /// redraw: true while anything is live or scheduled, false once the
    /// sky is empty so the host can stop ticking.
    pub fn on_render_tick(&mut self, dt: f32, now: f64) -> RenderFrame {
        self.engine.step_frame(dt, now);
        if !self.engine.is_active() {
            return RenderFrame::idle();
        }
        let camera = self.camera.snapshot();
        let mut frame = build_frame(self.engine.particles(), &camera);
        // A scheduled launch with nothing on screen yet must keep the
        // redraw chain alive.
        frame.redraw_needed = true;
        frame
    }

    /// Takes all pending platform burst-emitter requests.
    pub fn drain_effects(&mut self) -> Vec<BurstEffect> {
        self.engine.drain_effects()
    }

    /// Simulation counters.
    #[must_use]
    pub fn sim_stats(&self) -> SimStats {
        self.engine.stats()
    }
}
