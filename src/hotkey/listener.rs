//! Global key event listener using macOS CGEventTap
//!
//! Monitors system-wide key-down, key-up and modifier-flag events.
//! Runs on a dedicated thread with its own CFRunLoop and forwards
//! every observed transition, in order, into a single-consumer channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use tokio::sync::mpsc;
use tracing::{error, info};

/// Kind of physical transition a key event reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEventKind {
    /// A non-modifier key went down (includes auto-repeat)
    KeyDown,
    /// A non-modifier key went up
    KeyUp,
    /// A modifier key changed pressed state
    FlagsChanged,
}

/// A single observed key transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub kind: KeyEventKind,
    /// macOS virtual key code
    pub key_code: u16,
    /// Raw CGEventFlags bitmask at the time of the event
    pub flags: u64,
}

impl KeyEvent {
    pub fn key_down(key_code: u16, flags: u64) -> Self {
        Self { kind: KeyEventKind::KeyDown, key_code, flags }
    }

    #[cfg(test)]
    pub fn key_up(key_code: u16, flags: u64) -> Self {
        Self { kind: KeyEventKind::KeyUp, key_code, flags }
    }

    pub fn flags_changed(key_code: u16, flags: u64) -> Self {
        Self { kind: KeyEventKind::FlagsChanged, key_code, flags }
    }
}

/// Events sent from the listener to the gesture classifier
#[derive(Debug, Clone)]
pub enum HotkeyEvent {
    /// A key transition was observed
    Key(KeyEvent),
    /// Event tap was disabled by macOS and has been re-enabled;
    /// transitions in between may have been missed
    TapDisabled,
}

/// Global listener that captures key events system-wide
pub struct HotkeyListener {
    event_tx: mpsc::Sender<HotkeyEvent>,
    running: Arc<AtomicBool>,
}

impl HotkeyListener {
    /// Create a new listener feeding `event_tx`
    pub fn new(event_tx: mpsc::Sender<HotkeyEvent>) -> Self {
        Self {
            event_tx,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start the listener
    ///
    /// This spawns a dedicated thread that runs a CFRunLoop to receive
    /// CGEventTap callbacks. The listener runs until `stop()` is called
    /// or the program exits.
    pub fn start(&self) -> Result<(), HotkeyError> {
        if !cfg!(target_os = "macos") {
            return Err(HotkeyError::Unsupported);
        }

        if self.running.swap(true, Ordering::SeqCst) {
            return Err(HotkeyError::AlreadyRunning);
        }

        let event_tx = self.event_tx.clone();
        let running = Arc::clone(&self.running);

        thread::Builder::new()
            .name("hotkey-listener".to_string())
            .spawn(move || {
                info!("hotkey listener thread started");

                if let Err(e) = run_event_loop(event_tx, running.clone()) {
                    error!(?e, "hotkey listener error");
                }

                running.store(false, Ordering::SeqCst);
                info!("hotkey listener thread stopped");
            })
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                HotkeyError::ThreadSpawn(e.to_string())
            })?;

        Ok(())
    }

    /// Stop the listener; the run loop exits on its next poll
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Check if the listener is currently running
    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Errors that can occur in the hotkey listener
#[derive(Debug, thiserror::Error)]
pub enum HotkeyError {
    #[error("hotkey listener is already running")]
    AlreadyRunning,

    #[cfg(target_os = "macos")]
    #[error("failed to create event tap - check Accessibility permissions")]
    EventTapCreation,

    #[cfg(target_os = "macos")]
    #[error("failed to attach event tap to the run loop")]
    RunLoopSource,

    #[error("failed to spawn listener thread: {0}")]
    ThreadSpawn(String),

    #[error("global key event capture is only supported on macOS")]
    Unsupported,
}

#[cfg(target_os = "macos")]
fn run_event_loop(
    event_tx: mpsc::Sender<HotkeyEvent>,
    running: Arc<AtomicBool>,
) -> Result<(), HotkeyError> {
    use core_foundation::runloop::{kCFRunLoopCommonModes, kCFRunLoopDefaultMode, CFRunLoop};
    use core_graphics::event::{
        CGEvent, CGEventTap, CGEventTapLocation, CGEventTapOptions, CGEventTapPlacement,
        CGEventTapProxy, CGEventType, EventField,
    };
    use tracing::{trace, warn};

    // Callback -> run loop thread; never blocks the OS input pipeline
    let (callback_tx, callback_rx) = std::sync::mpsc::channel::<HotkeyEvent>();

    let callback = move |_proxy: CGEventTapProxy,
                         event_type: CGEventType,
                         event: &CGEvent|
          -> Option<CGEvent> {
        let kind = match event_type {
            CGEventType::KeyDown => Some(KeyEventKind::KeyDown),
            CGEventType::KeyUp => Some(KeyEventKind::KeyUp),
            CGEventType::FlagsChanged => Some(KeyEventKind::FlagsChanged),
            CGEventType::TapDisabledByTimeout | CGEventType::TapDisabledByUserInput => {
                let _ = callback_tx.send(HotkeyEvent::TapDisabled);
                None
            }
            _ => None,
        };

        if let Some(kind) = kind {
            let key_code =
                event.get_integer_value_field(EventField::KEYBOARD_EVENT_KEYCODE) as u16;
            let flags = event.get_flags().bits();
            let _ = callback_tx.send(HotkeyEvent::Key(KeyEvent { kind, key_code, flags }));
        }

        Some(event.clone())
    };

    let tap = CGEventTap::new(
        CGEventTapLocation::Session,
        CGEventTapPlacement::HeadInsertEventTap,
        CGEventTapOptions::ListenOnly,
        vec![
            CGEventType::KeyDown,
            CGEventType::KeyUp,
            CGEventType::FlagsChanged,
        ],
        callback,
    )
    .map_err(|_| {
        error!("failed to create event tap - is Accessibility permission granted?");
        HotkeyError::EventTapCreation
    })?;

    tap.enable();

    let run_loop_source = tap
        .mach_port
        .create_runloop_source(0)
        .map_err(|_| HotkeyError::RunLoopSource)?;
    let run_loop = CFRunLoop::get_current();

    unsafe {
        run_loop.add_source(&run_loop_source, kCFRunLoopCommonModes);
    }

    info!("event tap created and enabled");

    while running.load(Ordering::SeqCst) {
        unsafe {
            CFRunLoop::run_in_mode(
                kCFRunLoopDefaultMode,
                std::time::Duration::from_millis(100),
                true,
            );
        }

        while let Ok(event) = callback_rx.try_recv() {
            match &event {
                HotkeyEvent::Key(key) => {
                    trace!(
                        kind = ?key.kind,
                        key_code = %format!("0x{:x}", key.key_code),
                        flags = %format!("0x{:x}", key.flags),
                        "key event"
                    );
                }
                HotkeyEvent::TapDisabled => {
                    warn!("event tap disabled by macOS, re-enabling");
                    tap.enable();
                }
            }

            match event_tx.try_send(event) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!("classifier lagging, dropping key event");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    warn!("key event channel closed, stopping listener");
                    return Ok(());
                }
            }
        }
    }

    Ok(())
}

#[cfg(not(target_os = "macos"))]
fn run_event_loop(
    _event_tx: mpsc::Sender<HotkeyEvent>,
    _running: Arc<AtomicBool>,
) -> Result<(), HotkeyError> {
    Err(HotkeyError::Unsupported)
}
