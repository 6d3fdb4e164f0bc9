use anyhow::{anyhow, Result};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard,
};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::settings::CameraConfig;

use super::{Frame, FrameSource};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

const GRAB_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Device-level capture primitive driven by [`ThreadedFrameSource`].
pub trait FrameGrabber: Send + 'static {
    fn open(&mut self, device: u32) -> Result<()>;

    fn set_resolution(&mut self, resolution: (u32, u32));

    /// `Ok(None)` when no frame is ready yet.
    fn grab(&mut self) -> Result<Option<Frame>>;

    fn close(&mut self) {}
}

type FrameSlot = Arc<Mutex<Option<Frame>>>;

fn lock_slot(slot: &FrameSlot) -> MutexGuard<'_, Option<Frame>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Runs a grabber on a background thread; the newest frame overwrites older ones.
pub struct ThreadedFrameSource<G: FrameGrabber> {
    config: CameraConfig,
    grabber: Option<G>,
    handle: Option<JoinHandle<G>>,
    slot: FrameSlot,
    running: Arc<AtomicBool>,
    idle: Arc<AtomicBool>,
}

impl<G: FrameGrabber> ThreadedFrameSource<G> {
    pub fn new(config: CameraConfig, grabber: G) -> Self {
        Self {
            config,
            grabber: Some(grabber),
            handle: None,
            slot: Arc::new(Mutex::new(None)),
            running: Arc::new(AtomicBool::new(false)),
            idle: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl<G: FrameGrabber> FrameSource for ThreadedFrameSource<G> {
    fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Ok(());
        }

        let mut grabber = self
            .grabber
            .take()
            .ok_or_else(|| anyhow!("capture grabber unavailable"))?;

        log_info!("Opening camera index {}", self.config.index);
        if let Err(err) = grabber.open(self.config.index) {
            self.grabber = Some(grabber);
            return Err(err.context(format!("unable to open camera index {}", self.config.index)));
        }
        grabber.set_resolution(self.config.resolution);

        for _ in 0..self.config.warmup_frames {
            let _ = grabber.grab();
        }

        self.idle.store(false, Ordering::SeqCst);
        self.running.store(true, Ordering::SeqCst);

        let config = self.config.clone();
        let slot = Arc::clone(&self.slot);
        let running = Arc::clone(&self.running);
        let idle = Arc::clone(&self.idle);

        let spawned = thread::Builder::new()
            .name("frame-capture".to_string())
            .spawn(move || capture_loop(grabber, config, slot, running, idle));

        match spawned {
            Ok(handle) => {
                self.handle = Some(handle);
                Ok(())
            }
            Err(err) => {
                self.running.store(false, Ordering::SeqCst);
                Err(anyhow!("failed to spawn capture thread: {err}"))
            }
        }
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);

        if let Some(handle) = self.handle.take() {
            match handle.join() {
                Ok(grabber) => self.grabber = Some(grabber),
                Err(_) => log_warn!("capture thread panicked; camera cannot be restarted"),
            }
        }

        lock_slot(&self.slot).take();
    }

    fn latest(&mut self) -> Option<Frame> {
        lock_slot(&self.slot).take()
    }

    fn set_idle(&mut self, idle: bool) {
        let previous = self.idle.swap(idle, Ordering::SeqCst);
        if previous != idle {
            if idle {
                log_debug!("Entering idle camera mode");
            } else {
                log_debug!("Leaving idle camera mode");
            }
        }
    }
}

impl<G: FrameGrabber> Drop for ThreadedFrameSource<G> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn capture_loop<G: FrameGrabber>(
    mut grabber: G,
    config: CameraConfig,
    slot: FrameSlot,
    running: Arc<AtomicBool>,
    idle: Arc<AtomicBool>,
) -> G {
    let frame_interval = Duration::from_secs_f64(1.0 / config.fps.max(1) as f64);
    let mut applied_idle = false;
    let mut idle_skip: u32 = 0;

    while running.load(Ordering::SeqCst) {
        let idle_now = idle.load(Ordering::SeqCst);
        if idle_now != applied_idle {
            let resolution = if idle_now {
                config.idle_resolution
            } else {
                config.resolution
            };
            grabber.set_resolution(resolution);
            applied_idle = idle_now;
            idle_skip = 0;
        }

        let frame = match grabber.grab() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                thread::sleep(GRAB_RETRY_DELAY);
                continue;
            }
            Err(err) => {
                log_warn!("Failed to read frame from camera: {err:#}");
                thread::sleep(GRAB_RETRY_DELAY);
                continue;
            }
        };

        if idle_now && config.idle_frame_skip > 0 {
            idle_skip = (idle_skip + 1) % (config.idle_frame_skip + 1);
            if idle_skip != 0 {
                thread::sleep(frame_interval);
                continue;
            }
        }

        let frame = if config.mirror {
            image::imageops::flip_horizontal(&frame)
        } else {
            frame
        };
        *lock_slot(&slot) = Some(frame);

        thread::sleep(frame_interval);
    }

    grabber.close();
    grabber
}
