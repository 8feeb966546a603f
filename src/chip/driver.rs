//! Runs a [`Chip`] at a fixed rate on a background thread.
//!
//! The chip is moved into the emulation thread on [`Driver::start`] and handed back on
//! [`Driver::stop`], so its state is never shared between threads. What crosses the thread
//! boundary are small copies: the packed RGB frame ([`FrameHandle`]) and the key states
//! ([`KeypadHandle`]), each behind a lock that is only held for the duration of the copy.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, MutexGuard,
};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use log::{error, info, warn};

use crate::chip::{
    chip8::Chip8,
    framebuffer::{ChannelScales, Framebuffer},
    Chip, ExecutionError, Keypad, LoadProgramError,
};

/// Invoked on the emulation thread whenever a cycle changed the display.
pub type FrameCallback = Box<dyn FnMut(&Framebuffer) + Send>;

/// Invoked on the emulation thread to pull fresh key states into the chip.
pub type KeypadCallback = Box<dyn FnMut(&mut Keypad) + Send>;

/// Invoked on the emulation thread when the sound timer runs out.
pub type SoundCallback = Box<dyn FnMut() + Send>;

/// Configuration of the execution driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Target number of cycles per second.
    pub cycles_per_second: u32,

    /// How often per second the keypad is refreshed.
    pub keypad_refresh_hz: u32,

    /// Channel scales used for the packed RGB frame snapshot.
    pub color: ChannelScales,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            cycles_per_second: 480,
            keypad_refresh_hz: 60,
            color: ChannelScales::default(),
        }
    }
}

impl Options {
    fn cycles_per_second(&self) -> u32 {
        self.cycles_per_second.max(1)
    }

    fn cycle_interval(&self) -> Duration {
        Duration::from_secs(1) / self.cycles_per_second()
    }

    /// Number of cycles between two keypad refreshes.
    fn keypad_refresh_every(&self) -> u64 {
        (self.cycles_per_second() / self.keypad_refresh_hz.max(1)).max(1) as u64
    }
}

/// Errors reported by the `Driver`.
#[derive(Debug)]
pub enum DriverError {
    /// `start` was called while the emulation is running.
    AlreadyRunning,

    /// `stop` was called while the emulation is not running.
    NotRunning,

    /// The chip was lost because the emulation thread panicked.
    ChipUnavailable,

    /// The ROM could not be loaded.
    LoadProgram(LoadProgramError),

    /// The emulation stopped because of an unrecoverable error.
    Execution(ExecutionError),

    /// The emulation thread panicked, most likely inside a callback.
    Panicked,
}

/// Summary of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    /// Number of executed cycles.
    pub cycles: u64,

    /// Number of one-second batches that took longer than a second.
    pub overruns: u64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Shared, pull-based snapshot of the most recent frame as packed RGB bytes.
#[derive(Clone, Debug, Default)]
pub struct FrameHandle {
    pixels: Arc<Mutex<Vec<u8>>>,
}

impl FrameHandle {
    /// Returns a copy of the most recent frame (`width * height * 3` bytes, `RGBRGB...`).
    pub fn snapshot(&self) -> Vec<u8> {
        lock(&self.pixels).clone()
    }

    fn update(&self, frame: &Framebuffer, scales: ChannelScales) {
        let mut pixels = lock(&self.pixels);
        pixels.resize(frame.packed_color_len(), 0);
        if let Err(e) = frame.to_packed_color(&mut pixels, scales) {
            warn!("Could not update frame snapshot: {}", e);
        }
    }
}

/// Shared key states, written by the presentation side and read by the emulation thread.
#[derive(Clone, Debug, Default)]
pub struct KeypadHandle {
    keys: Arc<Mutex<Keypad>>,
}

impl KeypadHandle {
    /// Marks `key` (only the lower nibble counts) as pressed.
    pub fn press(&self, key: u8) {
        lock(&self.keys)[(key & 0xF) as usize] = true;
    }

    pub fn release(&self, key: u8) {
        lock(&self.keys)[(key & 0xF) as usize] = false;
    }

    pub fn release_all(&self) {
        *lock(&self.keys) = [false; 16];
    }

    pub fn state(&self) -> Keypad {
        *lock(&self.keys)
    }
}

/// Everything owned by the emulation thread while running.
struct Emulation<C> {
    chip: C,
    on_frame: Option<FrameCallback>,
    on_keypad: Option<KeypadCallback>,
    on_sound: Option<SoundCallback>,
}

/// Handles into the driver, cloned into the emulation thread.
struct Context {
    options: Options,
    stop: Receiver<()>,
    frame: FrameHandle,
    keypad: KeypadHandle,
    overruns: Arc<AtomicU64>,
}

/// How a run ended.
struct RunEnd {
    cycles: u64,
    error: Option<ExecutionError>,
}

struct Worker<C> {
    stop: Sender<()>,
    handle: JoinHandle<(Emulation<C>, RunEnd)>,
}

/// Runs a chip at a fixed rate on a background thread. `start` and `stop`
/// must be called from the same thread.
pub struct Driver<C = Chip8>
where
    C: Chip + Send + 'static,
{
    rom: Vec<u8>,
    options: Options,
    idle: Option<Emulation<C>>,
    worker: Option<Worker<C>>,
    frame: FrameHandle,
    keypad: KeypadHandle,
    overruns: Arc<AtomicU64>,
}

impl<C> Driver<C>
where
    C: Chip + Send + 'static,
{
    /// Creates a driver that runs `rom` on `chip`. Nothing is executed before `start`.
    pub fn new(chip: C, rom: Vec<u8>, options: Options) -> Self {
        Driver {
            rom,
            options,
            idle: Some(Emulation {
                chip,
                on_frame: None,
                on_keypad: None,
                on_sound: None,
            }),
            worker: None,
            frame: FrameHandle::default(),
            keypad: KeypadHandle::default(),
            overruns: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Sets the callback invoked with the display whenever a cycle changed it.
    pub fn on_frame<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&Framebuffer) + Send + 'static,
    {
        if let Some(emulation) = self.idle.as_mut() {
            emulation.on_frame = Some(Box::new(callback));
        }
        self
    }

    /// Sets the callback filling in the key states. Without one, the key
    /// states are copied from the `KeypadHandle`.
    pub fn on_keypad<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&mut Keypad) + Send + 'static,
    {
        if let Some(emulation) = self.idle.as_mut() {
            emulation.on_keypad = Some(Box::new(callback));
        }
        self
    }

    /// Sets the callback invoked whenever the sound timer reaches zero. Making
    /// an audible alert is up to the callback.
    pub fn on_sound<F>(mut self, callback: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        if let Some(emulation) = self.idle.as_mut() {
            emulation.on_sound = Some(Box::new(callback));
        }
        self
    }

    /// Resets the chip, loads the ROM and spawns the emulation thread.
    pub fn start(&mut self) -> Result<(), DriverError> {
        if self.worker.is_some() {
            return Err(DriverError::AlreadyRunning);
        }
        let mut emulation = self.idle.take().ok_or(DriverError::ChipUnavailable)?;

        emulation.chip.reset();
        if let Err(e) = emulation.chip.load_program(&self.rom) {
            self.idle = Some(emulation);
            return Err(DriverError::LoadProgram(e));
        }
        self.frame
            .update(emulation.chip.frame(), self.options.color);
        self.overruns.store(0, Ordering::SeqCst);

        let (stop_sender, stop_receiver) = bounded::<()>(1);
        let context = Context {
            options: self.options.clone(),
            stop: stop_receiver,
            frame: self.frame.clone(),
            keypad: self.keypad.clone(),
            overruns: Arc::clone(&self.overruns),
        };

        let handle = thread::spawn(move || {
            let end = event_loop(&mut emulation, &context);
            (emulation, end)
        });

        info!(
            "Started emulation at {} cycles per second",
            self.options.cycles_per_second()
        );
        self.worker = Some(Worker {
            stop: stop_sender,
            handle,
        });
        Ok(())
    }

    /// Signals the emulation thread to stop, waits for it and takes the chip back.
    /// Returns the error that ended the run early, if any.
    pub fn stop(&mut self) -> Result<RunReport, DriverError> {
        let worker = self.worker.take().ok_or(DriverError::NotRunning)?;

        // fails if the loop already ended on its own
        let _ = worker.stop.try_send(());

        let (emulation, end) = worker.handle.join().map_err(|_| {
            error!("Emulation thread panicked");
            DriverError::Panicked
        })?;
        self.idle = Some(emulation);

        let report = RunReport {
            cycles: end.cycles,
            overruns: self.overruns.load(Ordering::SeqCst),
        };
        info!(
            "Stopped emulation after {} cycles ({} overruns)",
            report.cycles, report.overruns
        );

        match end.error {
            Some(e) => Err(DriverError::Execution(e)),
            None => Ok(report),
        }
    }

    /// Returns true while the emulation thread is alive. Turns false on its
    /// own if the run ends because of an error; `stop` must still be called.
    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .map_or(false, |worker| !worker.handle.is_finished())
    }

    /// The chip, while the emulation is not running.
    pub fn chip(&self) -> Option<&C> {
        self.idle.as_ref().map(|emulation| &emulation.chip)
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// A copy of the most recent frame as packed RGB bytes.
    pub fn snapshot(&self) -> Vec<u8> {
        self.frame.snapshot()
    }

    pub fn frame_handle(&self) -> FrameHandle {
        self.frame.clone()
    }

    pub fn keypad_handle(&self) -> KeypadHandle {
        self.keypad.clone()
    }

    /// Number of overruns of the current or last run.
    pub fn overruns(&self) -> u64 {
        self.overruns.load(Ordering::SeqCst)
    }
}

impl<C> Drop for Driver<C>
where
    C: Chip + Send + 'static,
{
    fn drop(&mut self) {
        if self.worker.is_some() {
            warn!("Driver dropped while running, stopping emulation");
            if let Err(e) = self.stop() {
                error!("{}", e);
            }
        }
    }
}

/// The emulation loop. Cycles the chip until a stop is requested or a cycle
/// fails. Cycles are scheduled against deadlines; the wait for the next
/// deadline doubles as the wait for the stop signal.
fn event_loop<C: Chip>(emulation: &mut Emulation<C>, context: &Context) -> RunEnd {
    let interval = context.options.cycle_interval();
    let refresh_every = context.options.keypad_refresh_every();
    let batch_len = context.options.cycles_per_second() as u64;

    let mut cycles: u64 = 0;
    let mut batch_start = Instant::now();
    let mut next_cycle = batch_start;

    loop {
        if cycles % refresh_every == 0 {
            let keys = emulation.chip.input_pins_mut();
            match emulation.on_keypad.as_mut() {
                Some(callback) => callback(keys),
                None => *keys = context.keypad.state(),
            }
        }

        let outcome = match emulation.chip.cycle() {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Emulation stopped: {}", e);
                return RunEnd {
                    cycles,
                    error: Some(e),
                };
            }
        };
        cycles += 1;

        if outcome.frame_changed {
            let frame = emulation.chip.frame();
            context.frame.update(frame, context.options.color);
            if let Some(callback) = emulation.on_frame.as_mut() {
                callback(frame);
            }
        }

        if outcome.sound_expired {
            if let Some(callback) = emulation.on_sound.as_mut() {
                callback();
            }
        }

        next_cycle += interval;
        if cycles % batch_len == 0 {
            let elapsed = batch_start.elapsed();
            if elapsed > Duration::from_secs(1) {
                let overruns = context.overruns.fetch_add(1, Ordering::SeqCst) + 1;
                warn!(
                    "Emulation overrun: {} cycles took {:?} (overrun #{})",
                    batch_len, elapsed, overruns
                );
                // do not try to catch up
                next_cycle = Instant::now();
            }
            batch_start = Instant::now();
        }

        let timeout = next_cycle.saturating_duration_since(Instant::now());
        match context.stop.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                return RunEnd {
                    cycles,
                    error: None,
                }
            }
        }
    }
}

impl std::fmt::Display for DriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            DriverError::AlreadyRunning => write!(f, "The emulation is already running."),
            DriverError::NotRunning => write!(f, "The emulation is not running."),
            DriverError::ChipUnavailable => write!(f, "The chip was lost in a previous run."),
            DriverError::LoadProgram(e) => write!(f, "{}", e),
            DriverError::Execution(e) => write!(f, "{}", e),
            DriverError::Panicked => write!(f, "The emulation thread panicked."),
        }
    }
}

impl std::error::Error for DriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DriverError::LoadProgram(e) => Some(e),
            DriverError::Execution(e) => Some(e),
            _ => None,
        }
    }
}
