//! Dedicated simulation thread
//!
//! Runs a [`PhysicsSystem`] on its own named thread and hands consistent
//! state back to observers. Commands (body creation, forces, stepping
//! control) arrive over an mpsc channel and are applied only at step
//! boundaries, so a fixed command order reproduces the same simulation;
//! after every complete step the worker publishes a fresh
//! [`WorldSnapshot`] into a shared slot. Readers therefore never observe
//! a partially-integrated body set.
//!
//! Body handles are minted on the caller's thread and travel with the
//! command, so `add_body` can report configuration errors synchronously
//! without a reply channel.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};

use glam::Vec3;
use static_assertions::assert_impl_all;

use crate::error::ConfigError;
use crate::physics::body::{BodyHandle, BodyOptions};
use crate::physics::snapshot::WorldSnapshot;
use crate::physics::system::{PhysicsSystem, SimulationStopCondition};

/// Commands applied by the worker at step boundaries.
pub enum SimCommand {
    /// Insert a pre-validated body under a pre-minted handle
    AddBody {
        /// Handle minted on the caller's thread
        handle: BodyHandle,
        /// Validated creation options
        options: BodyOptions,
    },
    /// Remove a body
    RemoveBody(BodyHandle),
    /// Add to a body's transient force accumulator
    ApplyForce {
        /// Target body
        handle: BodyHandle,
        /// Force to add this step
        force: Vec3,
    },
    /// Set a named persistent force on a body
    SetForce {
        /// Target body
        handle: BodyHandle,
        /// Force slot name
        name: String,
        /// New value
        force: Vec3,
    },
    /// Remove a named persistent force
    ClearForce {
        /// Target body
        handle: BodyHandle,
        /// Force slot name
        name: String,
    },
    /// Replace global gravity
    SetGravity(Vec3),
    /// Advance the simulation one step
    Step {
        /// Timestep in seconds
        dt: f32,
    },
    /// Step continuously until the stop condition is satisfied
    Run {
        /// Timestep in seconds
        dt: f32,
        /// Halting predicate, evaluated before every step
        stop: SimulationStopCondition,
    },
    /// Halt stepping at the next step boundary
    Pause,
    /// Resume stepping after a pause
    Resume,
    /// Enable or disable per-step frame recording
    SetRecording(bool),
    /// Stop the worker thread
    Shutdown,
}

/// Events reported back from the worker thread.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    /// A `Run` command finished because its stop condition was satisfied
    RunStopped {
        /// Simulation time when the run halted
        time: f64,
        /// Total completed steps when the run halted
        steps: u64,
    },
    /// A body was frozen after producing non-finite state
    Diagnostic(String),
}

/// Handle to the simulation thread.
///
/// Dropping the worker sends `Shutdown` and joins the thread.
pub struct SimulationWorker {
    tx_cmd: Sender<SimCommand>,
    rx_evt: Receiver<SimEvent>,
    snapshot: Arc<RwLock<WorldSnapshot>>,
    next_handle: AtomicU64,
    thread: Option<JoinHandle<()>>,
}

assert_impl_all!(SimulationWorker: Send);
assert_impl_all!(WorldSnapshot: Send, Sync);
assert_impl_all!(SimCommand: Send);

impl SimulationWorker {
    /// Takes ownership of a system and starts stepping it on a dedicated
    /// thread. The thread is pinned to a secondary core when one exists.
    pub fn spawn(system: PhysicsSystem) -> Self {
        let (tx_cmd, rx_cmd) = mpsc::channel::<SimCommand>();
        let (tx_evt, rx_evt) = mpsc::channel::<SimEvent>();

        let next_handle = AtomicU64::new(system.next_handle_value());
        let snapshot = Arc::new(RwLock::new(system.snapshot_world()));
        let slot = Arc::clone(&snapshot);

        let thread = thread::Builder::new()
            .name("physics-sim-worker".to_string())
            .spawn(move || worker_loop(system, rx_cmd, tx_evt, slot))
            .expect("failed to spawn simulation worker");

        Self {
            tx_cmd,
            rx_evt,
            snapshot,
            next_handle,
            thread: Some(thread),
        }
    }

    /// Validates options, mints a handle, and queues the insert.
    ///
    /// Validation runs here on the caller's thread, so a rejected
    /// configuration never reaches the simulation and no handle is minted
    /// for it.
    pub fn add_body(&self, options: BodyOptions) -> Result<BodyHandle, ConfigError> {
        options.validate()?;
        let handle = BodyHandle::new(self.next_handle.fetch_add(1, Ordering::Relaxed));
        let _ = self.tx_cmd.send(SimCommand::AddBody { handle, options });
        Ok(handle)
    }

    /// Queues a body removal.
    pub fn remove_body(&self, handle: BodyHandle) {
        let _ = self.tx_cmd.send(SimCommand::RemoveBody(handle));
    }

    /// Sends a command to the worker. Returns false if the thread is gone.
    pub fn send(&self, cmd: SimCommand) -> bool {
        self.tx_cmd.send(cmd).is_ok()
    }

    /// Queues a single step.
    pub fn step(&self, dt: f32) {
        let _ = self.tx_cmd.send(SimCommand::Step { dt });
    }

    /// Queues a continuous run until the stop condition is satisfied.
    pub fn run_until(&self, dt: f32, stop: SimulationStopCondition) {
        let _ = self.tx_cmd.send(SimCommand::Run { dt, stop });
    }

    /// Requests a pause at the next step boundary.
    pub fn pause(&self) {
        let _ = self.tx_cmd.send(SimCommand::Pause);
    }

    /// Resumes stepping after a pause.
    pub fn resume(&self) {
        let _ = self.tx_cmd.send(SimCommand::Resume);
    }

    /// Latest published snapshot: state as of the most recent complete
    /// step. Cheap to call from any thread.
    pub fn snapshot(&self) -> WorldSnapshot {
        self.snapshot
            .read()
            .expect("snapshot slot poisoned")
            .clone()
    }

    /// Non-blocking poll for worker events.
    pub fn try_recv(&self) -> Option<SimEvent> {
        self.rx_evt.try_recv().ok()
    }

    /// Blocks until the worker reports an event or shuts down.
    pub fn recv(&self) -> Option<SimEvent> {
        self.rx_evt.recv().ok()
    }
}

impl Drop for SimulationWorker {
    fn drop(&mut self) {
        let _ = self.tx_cmd.send(SimCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn worker_loop(
    mut system: PhysicsSystem,
    rx_cmd: Receiver<SimCommand>,
    tx_evt: Sender<SimEvent>,
    slot: Arc<RwLock<WorldSnapshot>>,
) {
    if let Some(cores) = core_affinity::get_core_ids()
        && cores.len() > 1
    {
        let _ = core_affinity::set_for_current(cores[1]);
    }

    let mut reported_diagnostics = 0;
    publish(&system, &slot);

    while let Ok(cmd) = rx_cmd.recv() {
        match cmd {
            SimCommand::Step { dt } => {
                system.step(dt);
                publish(&system, &slot);
                forward_diagnostics(&system, &tx_evt, &mut reported_diagnostics);
            }
            SimCommand::Run { dt, stop } => {
                if run(
                    &mut system,
                    dt,
                    stop,
                    &rx_cmd,
                    &tx_evt,
                    &slot,
                    &mut reported_diagnostics,
                ) {
                    return;
                }
            }
            SimCommand::Shutdown => return,
            other => {
                apply_mutation(&mut system, other);
                publish(&system, &slot);
            }
        }
    }
}

/// Steps until the stop condition holds, draining queued commands at every
/// step boundary. Returns true when a shutdown arrived mid-run.
fn run(
    system: &mut PhysicsSystem,
    dt: f32,
    stop: SimulationStopCondition,
    rx_cmd: &Receiver<SimCommand>,
    tx_evt: &Sender<SimEvent>,
    slot: &Arc<RwLock<WorldSnapshot>>,
    reported: &mut usize,
) -> bool {
    loop {
        if stop.satisfied(system) {
            let _ = tx_evt.send(SimEvent::RunStopped {
                time: system.time(),
                steps: system.steps(),
            });
            return false;
        }
        if system.is_paused() {
            // Paused mid-run: fall back to the outer command loop; a later
            // Run command restarts continuous stepping.
            return false;
        }

        system.step(dt);
        publish(system, slot);
        forward_diagnostics(system, tx_evt, reported);

        // External mutation is serialized here, at the step boundary.
        while let Ok(cmd) = rx_cmd.try_recv() {
            match cmd {
                SimCommand::Shutdown => return true,
                SimCommand::Step { .. } | SimCommand::Run { .. } => {
                    // Already running; redundant stepping requests are
                    // dropped rather than nested.
                }
                other => apply_mutation(system, other),
            }
        }
    }
}

fn apply_mutation(system: &mut PhysicsSystem, cmd: SimCommand) {
    match cmd {
        SimCommand::AddBody { handle, options } => system.insert_validated(handle, &options),
        SimCommand::RemoveBody(handle) => {
            system.remove_body(handle);
        }
        SimCommand::ApplyForce { handle, force } => {
            system.apply_force(handle, force);
        }
        SimCommand::SetForce {
            handle,
            name,
            force,
        } => {
            system.set_force(handle, &name, force);
        }
        SimCommand::ClearForce { handle, name } => {
            system.clear_force(handle, &name);
        }
        SimCommand::SetGravity(gravity) => system.set_gravity(gravity),
        SimCommand::Pause => system.pause(),
        SimCommand::Resume => system.resume(),
        SimCommand::SetRecording(recording) => system.set_recording(recording),
        SimCommand::Step { .. } | SimCommand::Run { .. } | SimCommand::Shutdown => {
            unreachable!("control commands are handled by the worker loop")
        }
    }
}

fn publish(system: &PhysicsSystem, slot: &Arc<RwLock<WorldSnapshot>>) {
    let snapshot = system.snapshot_world();
    if let Ok(mut guard) = slot.write() {
        *guard = snapshot;
    }
}

fn forward_diagnostics(
    system: &PhysicsSystem,
    tx_evt: &Sender<SimEvent>,
    reported: &mut usize,
) {
    let diagnostics = system.diagnostics();
    for message in &diagnostics[*reported..] {
        eprintln!("[physics-sim-worker] {message}");
        let _ = tx_evt.send(SimEvent::Diagnostic(message.clone()));
    }
    *reported = diagnostics.len();
}
