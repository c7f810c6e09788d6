//! Tracking session controller.
//!
//! [`GazeTracker`] owns the sensor and a single worker thread per running
//! session. The worker is the only consumer of the sensor's event channel and
//! the only producer into the [`GazeSink`].
//!
//! The session state lives behind a mutex that the worker also holds while it
//! processes an event. `start` keeps the lock until the session is fully set
//! up and `stop` flips the state under the same lock, so no frame is processed
//! before `start` returns or after `stop` returns.

use crate::{
    config::{Config, DisplayConfig},
    constants::{DEFAULT_MAX_FPS, SENSOR_CHANNEL_CAPACITY},
    frame::GazeFrame,
    frame_gate::{epoch_millis, FrameGate},
    gaze::{GazeEstimator, ScreenGeometry},
    pipeline::{DisplayState, FramePipeline},
    projection::{CameraProjector, Orientation, PinholeProjector, Viewport},
    sensor::{FaceSensor, RunOptions, SensorEvent},
    Error, Result,
};
use crossbeam_channel::{bounded, select, Receiver, Sender};
use log::{debug, info, warn};
use parking_lot::{Mutex, MutexGuard, RwLock};
use std::{sync::Arc, thread};

/// Receives gaze frames from the session worker.
///
/// Called on the worker thread; implementations must hand the frame off
/// without blocking.
pub trait GazeSink: Send + Sync {
    /// Deliver one frame
    fn on_frame(&self, frame: GazeFrame);
}

impl GazeSink for Sender<GazeFrame> {
    fn on_frame(&self, frame: GazeFrame) {
        if self.try_send(frame).is_err() {
            debug!("Gaze frame dropped, consumer unavailable");
        }
    }
}

/// Lifecycle state of the tracking session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No session
    #[default]
    Stopped,
    /// Sensor is delivering frames
    Running,
}

/// Commands accepted on the command channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start a tracking session
    Start,
    /// Stop the running session
    Stop,
}

impl std::str::FromStr for Command {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            other => Err(Error::NotImplemented(other.to_string())),
        }
    }
}

struct Worker {
    stop_tx: Sender<()>,
    handle: thread::JoinHandle<()>,
}

/// Gaze tracking session controller
pub struct GazeTracker {
    sensor: Box<dyn FaceSensor>,
    sink: Arc<dyn GazeSink>,
    projector: Arc<dyn CameraProjector>,
    estimator: GazeEstimator,
    max_fps: f64,
    display: Arc<RwLock<DisplayState>>,
    state: Arc<Mutex<SessionState>>,
    worker: Option<Worker>,
}

impl GazeTracker {
    /// Create a stopped tracker with default settings
    #[must_use]
    pub fn new(sensor: Box<dyn FaceSensor>, sink: Arc<dyn GazeSink>) -> Self {
        Self {
            sensor,
            sink,
            projector: Arc::new(PinholeProjector::new()),
            estimator: GazeEstimator::default(),
            max_fps: DEFAULT_MAX_FPS,
            display: Arc::new(RwLock::new(DisplayConfig::default().display_state())),
            state: Arc::new(Mutex::new(SessionState::Stopped)),
            worker: None,
        }
    }

    /// Create a stopped tracker from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid
    pub fn from_config(config: &Config, sensor: Box<dyn FaceSensor>, sink: Arc<dyn GazeSink>) -> Result<Self> {
        config.validate()?;

        let tracker = Self::new(sensor, sink)
            .with_max_fps(config.gate.max_fps)
            .with_screen_geometry(config.screen)
            .with_projector(Arc::new(config.display.projector()));
        *tracker.display.write() = config.display.display_state();

        Ok(tracker)
    }

    /// Use a different camera projector
    #[must_use]
    pub fn with_projector(mut self, projector: Arc<dyn CameraProjector>) -> Self {
        self.projector = projector;
        self
    }

    /// Use a different screen model for the eye-ray method
    #[must_use]
    pub fn with_screen_geometry(mut self, screen: ScreenGeometry) -> Self {
        self.estimator = GazeEstimator::new(screen);
        self
    }

    /// Change the frame rate ceiling (takes effect on the next `start`)
    #[must_use]
    pub fn with_max_fps(mut self, max_fps: f64) -> Self {
        self.max_fps = max_fps;
        self
    }

    /// Update the orientation and viewport used for projection
    pub fn set_display(&self, orientation: Orientation, viewport: Viewport) {
        debug!("Display updated: {} {}x{}", orientation, viewport.width, viewport.height);
        *self.display.write() = DisplayState::new(orientation, viewport);
    }

    /// Current display state
    #[must_use]
    pub fn display(&self) -> DisplayState {
        *self.display.read()
    }

    /// Current session state
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    /// Whether a session is running
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state() == SessionState::Running
    }

    /// Whether the running session's sensor closed its event stream and every
    /// delivered event has been processed
    ///
    /// Always false while stopped. A replayed trace ends this way; the session
    /// stays `Running` until `stop` is called.
    #[must_use]
    pub fn stream_ended(&self) -> bool {
        self.worker.as_ref().is_some_and(|worker| worker.handle.is_finished())
    }

    /// Start a tracking session
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyRunning`] if a session is active
    /// - [`Error::Unsupported`] if the sensor cannot track faces
    /// - any error from starting the sensor or the worker thread
    pub fn start(&mut self) -> Result<()> {
        let mut state = self.state.lock();

        if *state == SessionState::Running {
            warn!("Start requested while tracking is active");
            return Err(Error::AlreadyRunning);
        }
        if !self.sensor.is_supported() {
            warn!("Face tracking is not supported on this device");
            return Err(Error::Unsupported);
        }

        let pipeline = FramePipeline::new(
            FrameGate::new(self.max_fps)?,
            self.estimator.clone(),
            Arc::clone(&self.projector),
        );

        let (event_tx, event_rx) = bounded(SENSOR_CHANNEL_CAPACITY);
        let (stop_tx, stop_rx) = bounded(1);

        self.sensor.run(event_tx, RunOptions::default())?;

        let worker_state = Arc::clone(&self.state);
        let display = Arc::clone(&self.display);
        let sink = Arc::clone(&self.sink);

        let spawned = thread::Builder::new()
            .name("gaze-pipeline".to_string())
            .spawn(move || run_worker(pipeline, &event_rx, &stop_rx, &worker_state, &display, sink.as_ref()));

        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                self.sensor.pause();
                return Err(e.into());
            }
        };

        self.worker = Some(Worker { stop_tx, handle });
        *state = SessionState::Running;
        info!("Gaze tracking started");

        Ok(())
    }

    /// Stop the running session
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotRunning`] if no session is active
    pub fn stop(&mut self) -> Result<()> {
        {
            let mut state = self.state.lock();
            if *state == SessionState::Stopped {
                warn!("Stop requested while tracking is inactive");
                return Err(Error::NotRunning);
            }
            *state = SessionState::Stopped;
        }

        if let Some(worker) = self.worker.take() {
            // Worker may already have exited; a closed channel is fine
            let _ = worker.stop_tx.send(());
            if worker.handle.join().is_err() {
                warn!("Gaze pipeline worker panicked");
            }
        }
        self.sensor.pause();

        info!("Gaze tracking stopped");
        Ok(())
    }

    /// Dispatch a command by name
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotImplemented`] for unknown names, otherwise the
    /// result of the command
    pub fn handle_command(&mut self, name: &str) -> Result<()> {
        match name.parse::<Command>()? {
            Command::Start => self.start(),
            Command::Stop => self.stop(),
        }
    }
}

impl Drop for GazeTracker {
    fn drop(&mut self) {
        if self.is_running() {
            let _ = self.stop();
        }
    }
}

fn run_worker(
    mut pipeline: FramePipeline,
    events: &Receiver<SensorEvent>,
    stop: &Receiver<()>,
    state: &Mutex<SessionState>,
    display: &RwLock<DisplayState>,
    sink: &dyn GazeSink,
) {
    debug!("Gaze pipeline worker started");

    loop {
        let event = select! {
            recv(stop) -> _ => None,
            recv(events) -> event => event.ok(),
        };
        let Some(event) = event else {
            break;
        };

        let guard = state.lock();
        if *guard != SessionState::Running {
            break;
        }

        let frame = match event {
            SensorEvent::Frame(frame) => {
                let display = *display.read();
                pipeline.process(&frame, display)
            }
            SensorEvent::Failed(message) => {
                warn!("{}", Error::SessionFault(message));
                Some(pipeline.fault(epoch_millis()))
            }
            SensorEvent::Interrupted => {
                warn!("{}", Error::SessionFault("sensor interrupted".to_string()));
                Some(pipeline.fault(epoch_millis()))
            }
        };

        if let Some(frame) = frame {
            sink.on_frame(frame);
        }
        // Hand the lock straight to a waiting `stop` so queued events are dropped
        MutexGuard::unlock_fair(guard);
    }

    debug!("Gaze pipeline worker finished");
}
