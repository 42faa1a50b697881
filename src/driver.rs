//! Real-time pacing wrapper around a pure "advance state by dt" function.
//!
//! One worker thread owns the state. Every request travels over an mpsc
//! queue and is answered through its own single-value [`Completion`], so
//! the state is only ever touched by the worker.

use biotope_core::{EngineError, Result, SimulationEngine, SimulationStatus};
use biotope_data::StatusSnapshot;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// A state-transition function the driver can pace.
pub trait Simulator: Send + 'static {
    type State: Send + 'static;
    type Observation: Send + 'static;

    /// Advances `state` by up to `dt` simulated time units and returns the
    /// new state with the simulated time actually consumed.
    fn advance(&mut self, state: Self::State, dt: f64) -> Result<(Self::State, f64)>;

    /// Read-only view handed to the observer.
    fn observe(&self, state: &Self::State) -> Result<Self::Observation>;

    /// Checks a pushed seed before it replaces the current state.
    fn accept(&self, _state: &Self::State) -> Result<()> {
        Ok(())
    }
}

/// Pacing parameters, read from the `[driver]` table of a config file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DriverConfig {
    /// Minimum wall time between two observer events.
    pub emit_interval_ms: u64,
    /// Simulated time per wall-clock second.
    pub speed: f64,
    /// Wall time the worker waits for requests between two advances.
    pub min_wall_step_ms: u64,
    /// Longest wall interval a single advance may account for.
    pub max_wall_step_ms: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            emit_interval_ms: 200,
            speed: 1.0,
            min_wall_step_ms: 10,
            max_wall_step_ms: 250,
        }
    }
}

#[derive(Deserialize)]
struct DriverFile {
    #[serde(default)]
    driver: DriverConfig,
}

impl DriverConfig {
    /// Reads the `[driver]` table, ignoring every other table.
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: DriverFile = toml::from_str(content)?;
        file.driver.validate()?;
        Ok(file.driver)
    }

    pub fn validate(&self) -> Result<()> {
        check_speed(self.speed)?;
        if self.min_wall_step_ms == 0 || self.max_wall_step_ms < self.min_wall_step_ms {
            return Err(EngineError::config(
                "wall steps need 0 < min_wall_step_ms <= max_wall_step_ms",
            ));
        }
        Ok(())
    }
}

fn check_speed(speed: f64) -> Result<()> {
    if !speed.is_finite() || speed < 0.0 {
        return Err(EngineError::config(format!(
            "speed must be finite and non-negative, got {speed}"
        )));
    }
    Ok(())
}

/// What the worker reports to its observer.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverEvent<O> {
    /// Latest state, with simulated time per wall time since the last event.
    Advanced { observation: O, speed: f64 },
    /// The simulator failed; the loop has stopped and the state is gone.
    Failed(EngineError),
}

enum Command<S> {
    PushSeed {
        state: S,
        reply_tx: Sender<Result<()>>,
    },
    SetSpeed {
        speed: f64,
        reply_tx: Sender<Result<()>>,
    },
    Start {
        reply_tx: Sender<Result<()>>,
    },
    Stop {
        reply_tx: Sender<Result<()>>,
    },
    Shutdown {
        reply_tx: Sender<Result<()>>,
    },
}

/// Single-value handle for the outcome of one request.
#[derive(Debug)]
pub struct Completion<T> {
    rx: Receiver<Result<T>>,
}

impl<T> Completion<T> {
    /// Blocks until the worker has handled the request.
    pub fn wait(self) -> Result<T> {
        self.rx
            .recv()
            .map_err(|_| EngineError::driver("worker stopped before replying"))?
    }

    pub fn wait_timeout(self, timeout: Duration) -> Result<T> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(EngineError::driver("request timed out")),
            Err(RecvTimeoutError::Disconnected) => {
                Err(EngineError::driver("worker stopped before replying"))
            }
        }
    }
}

/// Cloneable request side of a [`Driver`]; usable from any thread.
pub struct DriverHandle<S> {
    sender: Sender<Command<S>>,
}

impl<S> Clone for DriverHandle<S> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<S: Send + 'static> DriverHandle<S> {
    fn request(&self, build: impl FnOnce(Sender<Result<()>>) -> Command<S>) -> Completion<()> {
        let (reply_tx, rx) = mpsc::channel();
        // A closed queue drops the reply sender, which `wait` reports.
        let _ = self.sender.send(build(reply_tx));
        Completion { rx }
    }

    /// Replaces the current state.
    pub fn push_seed(&self, state: S) -> Completion<()> {
        self.request(|reply_tx| Command::PushSeed { state, reply_tx })
    }

    pub fn set_speed(&self, speed: f64) -> Completion<()> {
        self.request(|reply_tx| Command::SetSpeed { speed, reply_tx })
    }

    /// Starts advancing. Fails if no seed has been pushed.
    pub fn start(&self) -> Completion<()> {
        self.request(|reply_tx| Command::Start { reply_tx })
    }

    /// Stops scheduling advances; one already in flight completes first.
    pub fn stop(&self) -> Completion<()> {
        self.request(|reply_tx| Command::Stop { reply_tx })
    }
}

/// Owns the worker thread.
pub struct Driver<S: Simulator> {
    handle: DriverHandle<S::State>,
    worker: Option<JoinHandle<Option<S::State>>>,
}

impl<S: Simulator> Driver<S> {
    /// Spawns the worker. It idles until a seed is pushed and started.
    pub fn spawn<F>(simulator: S, config: DriverConfig, observer: F) -> Result<Self>
    where
        F: FnMut(DriverEvent<S::Observation>) + Send + 'static,
    {
        config.validate()?;
        let (sender, rx) = mpsc::channel();
        let worker = thread::Builder::new()
            .name("biotope-driver".into())
            .spawn(move || Worker::new(simulator, config, observer).run(rx))
            .map_err(|e| EngineError::driver(format!("failed to spawn worker: {e}")))?;
        Ok(Self {
            handle: DriverHandle { sender },
            worker: Some(worker),
        })
    }

    #[must_use]
    pub fn handle(&self) -> DriverHandle<S::State> {
        self.handle.clone()
    }

    pub fn push_seed(&self, state: S::State) -> Completion<()> {
        self.handle.push_seed(state)
    }

    pub fn set_speed(&self, speed: f64) -> Completion<()> {
        self.handle.set_speed(speed)
    }

    pub fn start(&self) -> Completion<()> {
        self.handle.start()
    }

    pub fn stop(&self) -> Completion<()> {
        self.handle.stop()
    }

    /// Stops the worker and returns the last state it held.
    pub fn shutdown(mut self) -> Result<Option<S::State>> {
        self.handle
            .request(|reply_tx| Command::Shutdown { reply_tx })
            .wait()?;
        match self.worker.take() {
            Some(worker) => worker
                .join()
                .map_err(|_| EngineError::driver("worker panicked")),
            None => Ok(None),
        }
    }
}

impl<S: Simulator> Drop for Driver<S> {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = self
                .handle
                .request(|reply_tx| Command::Shutdown { reply_tx })
                .wait();
            let _ = worker.join();
        }
    }
}

struct Worker<S: Simulator, F> {
    simulator: S,
    config: DriverConfig,
    observer: F,
    state: Option<S::State>,
    running: bool,
    speed: f64,
    last_advance: Instant,
    last_emit: Option<Instant>,
    simulated_since_emit: f64,
    wall_since_emit: Duration,
}

impl<S, F> Worker<S, F>
where
    S: Simulator,
    F: FnMut(DriverEvent<S::Observation>),
{
    fn new(simulator: S, config: DriverConfig, observer: F) -> Self {
        Self {
            simulator,
            speed: config.speed,
            config,
            observer,
            state: None,
            running: false,
            last_advance: Instant::now(),
            last_emit: None,
            simulated_since_emit: 0.0,
            wall_since_emit: Duration::ZERO,
        }
    }

    fn run(mut self, rx: Receiver<Command<S::State>>) -> Option<S::State> {
        let min_step = Duration::from_millis(self.config.min_wall_step_ms);
        loop {
            let command = if self.running {
                let wait = min_step.saturating_sub(self.last_advance.elapsed());
                match rx.recv_timeout(wait) {
                    Ok(command) => Some(command),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            } else {
                match rx.recv() {
                    Ok(command) => Some(command),
                    Err(_) => break,
                }
            };

            match command {
                Some(Command::Shutdown { reply_tx }) => {
                    let _ = reply_tx.send(Ok(()));
                    break;
                }
                Some(command) => self.handle(command),
                None => self.advance(),
            }
        }
        tracing::debug!("driver worker exiting");
        self.state
    }

    fn handle(&mut self, command: Command<S::State>) {
        match command {
            Command::PushSeed { state, reply_tx } => {
                let result = self.simulator.accept(&state);
                if result.is_ok() {
                    self.state = Some(state);
                    self.reset_pacing();
                    self.emit(true);
                }
                let _ = reply_tx.send(result);
            }
            Command::SetSpeed { speed, reply_tx } => {
                let result = check_speed(speed).map(|()| self.speed = speed);
                let _ = reply_tx.send(result);
            }
            Command::Start { reply_tx } => {
                let result = if self.state.is_some() {
                    if !self.running {
                        self.running = true;
                        self.reset_pacing();
                    }
                    Ok(())
                } else {
                    Err(EngineError::driver("no seed to run"))
                };
                let _ = reply_tx.send(result);
            }
            Command::Stop { reply_tx } => {
                if self.running {
                    self.running = false;
                    self.emit(true);
                }
                let _ = reply_tx.send(Ok(()));
            }
            // handled by the loop
            Command::Shutdown { reply_tx } => {
                let _ = reply_tx.send(Ok(()));
            }
        }
    }

    fn reset_pacing(&mut self) {
        self.last_advance = Instant::now();
        self.simulated_since_emit = 0.0;
        self.wall_since_emit = Duration::ZERO;
    }

    fn advance(&mut self) {
        let Some(state) = self.state.take() else {
            self.running = false;
            return;
        };
        let now = Instant::now();
        let wall = now
            .duration_since(self.last_advance)
            .min(Duration::from_millis(self.config.max_wall_step_ms));
        self.last_advance = now;

        match self.simulator.advance(state, wall.as_secs_f64() * self.speed) {
            Ok((state, consumed)) => {
                self.state = Some(state);
                self.simulated_since_emit += consumed;
                self.wall_since_emit += wall;
                self.emit(false);
            }
            Err(e) => {
                tracing::error!(error = %e, "simulation advance failed, stopping");
                self.running = false;
                (self.observer)(DriverEvent::Failed(e));
            }
        }
    }

    /// Emits the current state if forced or the emit interval has passed.
    fn emit(&mut self, force: bool) {
        let interval = Duration::from_millis(self.config.emit_interval_ms);
        let due = self.last_emit.map_or(true, |t| t.elapsed() >= interval);
        if !(force || due) {
            return;
        }
        let Some(state) = self.state.as_ref() else {
            return;
        };
        let wall = self.wall_since_emit.as_secs_f64();
        let speed = if wall > 0.0 {
            self.simulated_since_emit / wall
        } else {
            0.0
        };
        match self.simulator.observe(state) {
            Ok(observation) => (self.observer)(DriverEvent::Advanced { observation, speed }),
            Err(e) => {
                tracing::error!(error = %e, "failed to observe state, stopping");
                self.running = false;
                (self.observer)(DriverEvent::Failed(e));
            }
        }
        self.last_emit = Some(Instant::now());
        self.simulated_since_emit = 0.0;
        self.wall_since_emit = Duration::ZERO;
    }
}

/// Paces a [`SimulationEngine`] with an owned deterministic RNG.
pub struct EngineSimulator {
    engine: SimulationEngine,
    rng: ChaCha8Rng,
}

impl EngineSimulator {
    #[must_use]
    pub fn new(engine: SimulationEngine, rng: ChaCha8Rng) -> Self {
        Self { engine, rng }
    }

    #[must_use]
    pub fn engine(&self) -> &SimulationEngine {
        &self.engine
    }
}

impl Simulator for EngineSimulator {
    type State = SimulationStatus;
    type Observation = StatusSnapshot;

    fn advance(&mut self, state: SimulationStatus, dt: f64) -> Result<(SimulationStatus, f64)> {
        let start = state.time;
        let next = self.engine.next(state, start + dt, &mut self.rng)?;
        let consumed = next.time - start;
        Ok((next, consumed))
    }

    fn observe(&self, state: &SimulationStatus) -> Result<StatusSnapshot> {
        self.engine.snapshot(state)
    }

    fn accept(&self, state: &SimulationStatus) -> Result<()> {
        self.engine.check_status(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Counts time; fails once the clock passes `fail_after`.
    struct Clock {
        fail_after: f64,
    }

    impl Simulator for Clock {
        type State = f64;
        type Observation = f64;

        fn advance(&mut self, state: f64, dt: f64) -> Result<(f64, f64)> {
            if state > self.fail_after {
                return Err(EngineError::driver("clock broke"));
            }
            Ok((state + dt, dt))
        }

        fn observe(&self, state: &f64) -> Result<f64> {
            Ok(*state)
        }

        fn accept(&self, state: &f64) -> Result<()> {
            if *state < 0.0 {
                return Err(EngineError::config("negative seed"));
            }
            Ok(())
        }
    }

    fn fast_config() -> DriverConfig {
        DriverConfig {
            emit_interval_ms: 1,
            speed: 100.0,
            min_wall_step_ms: 1,
            max_wall_step_ms: 20,
        }
    }

    type Events = Arc<Mutex<Vec<DriverEvent<f64>>>>;

    fn spawn(fail_after: f64) -> (Driver<Clock>, Events) {
        let events: Events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let driver = Driver::spawn(Clock { fail_after }, fast_config(), move |e| {
            sink.lock().unwrap().push(e);
        })
        .unwrap();
        (driver, events)
    }

    #[test]
    fn test_config_from_toml() {
        let config = DriverConfig::from_toml("[engine]\nseed = 1\n\n[driver]\nspeed = 4.0\n").unwrap();
        assert_eq!(config.speed, 4.0);
        assert_eq!(config.emit_interval_ms, DriverConfig::default().emit_interval_ms);
        assert_eq!(DriverConfig::from_toml("").unwrap(), DriverConfig::default());
        assert!(DriverConfig::from_toml("[driver]\nmin_wall_step_ms = 0\n").is_err());
    }

    #[test]
    fn test_start_without_seed_fails() {
        let (driver, _) = spawn(f64::INFINITY);
        assert!(driver.start().wait().is_err());
        assert!(driver.shutdown().unwrap().is_none());
    }

    #[test]
    fn test_rejected_seed_and_speed() {
        let (driver, _) = spawn(f64::INFINITY);
        assert!(driver.push_seed(-1.0).wait().is_err());
        assert!(driver.set_speed(f64::NAN).wait().is_err());
        assert!(driver.set_speed(2.0).wait().is_ok());
    }

    #[test]
    fn test_runs_and_stops() {
        let (driver, events) = spawn(f64::INFINITY);
        driver.push_seed(0.0).wait().unwrap();
        driver.start().wait().unwrap();
        thread::sleep(Duration::from_millis(50));
        driver.stop().wait().unwrap();
        let state = driver.shutdown().unwrap().unwrap();
        assert!(state > 0.0);

        let events = events.lock().unwrap();
        assert!(events.len() >= 2);
        assert!(matches!(events[0], DriverEvent::Advanced { observation, .. } if observation == 0.0));
        assert!(events
            .iter()
            .all(|e| matches!(e, DriverEvent::Advanced { .. })));
    }

    #[test]
    fn test_failure_reaches_observer_and_stops_loop() {
        let (driver, events) = spawn(0.5);
        driver.push_seed(1.0).wait().unwrap();
        driver.start().wait().unwrap();
        thread::sleep(Duration::from_millis(30));
        // the state was lost with the failure
        assert!(driver.start().wait().is_err());
        assert!(events
            .lock()
            .unwrap()
            .iter()
            .any(|e| matches!(e, DriverEvent::Failed(_))));
        assert!(driver.shutdown().unwrap().is_none());
    }

    #[test]
    fn test_handle_works_across_threads() {
        let (driver, _) = spawn(f64::INFINITY);
        let handle = driver.handle();
        thread::spawn(move || handle.push_seed(3.0).wait())
            .join()
            .unwrap()
            .unwrap();
        assert_eq!(driver.shutdown().unwrap(), Some(3.0));
    }
}
