//! Background mode: watch the keyboard and switch input methods
//!
//! HotkeyListener -> GestureClassifier -> Dispatcher, connected by channels.
//! Each switch runs on the blocking pool so a slow external command never
//! holds up classification of the events behind it.

use std::future::Future;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::events::Intent;
use crate::gesture::GestureClassifier;
use crate::hotkey::HotkeyListener;
use crate::input_method::{InputMethodPort, Macism};
use crate::lifecycle::ShutdownSignal;

/// Buffered key events between the tap thread and the classifier
const KEY_EVENT_BUFFER: usize = 256;

pub async fn run(config: Config, tool: Macism) -> Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        primary = %config.primary_im,
        secondary = %config.secondary_im,
        "mac-vim-switch daemon starting"
    );

    if !tool.is_installed() {
        bail!(
            "macism is not installed. Please install it first:\n\
             brew tap laishulu/macism\n\
             brew install macism"
        );
    }

    check_secondary(&tool, &config);

    let shutdown = ShutdownSignal::new();

    // Listener -> classifier
    let (hotkey_tx, hotkey_rx) = mpsc::channel(KEY_EVENT_BUFFER);
    // Classifier -> dispatcher
    let (intent_tx, intent_rx) = mpsc::unbounded_channel();

    let mut classifier = GestureClassifier::new(intent_tx);
    let dispatcher = Dispatcher::new(Arc::new(tool), config);

    let listener = HotkeyListener::new(hotkey_tx);
    listener
        .start()
        .context("failed to start key event listener")?;

    info!("daemon is running");

    let outcome = supervise(
        classifier.run(hotkey_rx),
        run_dispatch_loop(dispatcher, intent_rx),
        shutdown.wait(),
    )
    .await;

    info!("shutting down...");
    listener.stop();
    outcome?;
    info!("mac-vim-switch daemon stopped");

    Ok(())
}

/// Best-effort look for the secondary id among the tool's output.
///
/// `macism` without arguments only reports the active method, so a miss
/// is expected whenever the secondary is not active and is not an error.
fn check_secondary(port: &dyn InputMethodPort, config: &Config) -> bool {
    match port.exists(&config.secondary_im) {
        Ok(true) => true,
        Ok(false) => {
            debug!(
                secondary = %config.secondary_im,
                "secondary input method not reported by macism (best-effort check, \
                 see 'mac-vim-switch list')"
            );
            false
        }
        Err(e) => {
            warn!(error = %e, "could not verify secondary input method");
            false
        }
    }
}

/// Run until any part of the pipeline ends or a shutdown signal arrives
async fn supervise(
    classifier: impl Future<Output = ()>,
    dispatch: impl Future<Output = ()>,
    shutdown: impl Future<Output = std::io::Result<()>>,
) -> Result<()> {
    tokio::select! {
        _ = classifier => {
            info!("gesture classifier exited");
        }

        _ = dispatch => {
            info!("dispatch loop exited");
        }

        result = shutdown => {
            result.context("failed to listen for shutdown signals")?;
            info!("shutdown signal received");
        }
    }

    Ok(())
}

/// Dispatch every intent on the blocking pool without waiting for the
/// previous switch to finish. Failures are logged and absorbed.
async fn run_dispatch_loop(dispatcher: Dispatcher, mut intent_rx: mpsc::UnboundedReceiver<Intent>) {
    let mut in_flight = JoinSet::new();

    while let Some(intent) = intent_rx.recv().await {
        let dispatcher = dispatcher.clone();
        in_flight.spawn_blocking(move || {
            if let Err(e) = dispatcher.dispatch(intent) {
                error!(%intent, error = %e, "failed to switch input method");
            }
        });

        // Reap finished switches so the set does not grow
        while in_flight.try_join_next().is_some() {}
    }

    while in_flight.join_next().await.is_some() {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input_method::fake::FakePort;

    const PRIMARY: &str = "com.apple.keylayout.ABC";
    const SECONDARY: &str = "com.apple.inputmethod.SCIM.ITABC";

    fn config() -> Config {
        Config {
            primary_im: PRIMARY.to_string(),
            secondary_im: SECONDARY.to_string(),
        }
    }

    #[tokio::test]
    async fn test_dispatch_loop_switches_per_intent() {
        let port = Arc::new(FakePort::new(&[PRIMARY, SECONDARY], PRIMARY));
        let (tx, rx) = mpsc::unbounded_channel();

        tx.send(Intent::SwitchToPrimary).unwrap();
        drop(tx);
        run_dispatch_loop(Dispatcher::new(port.clone(), config()), rx).await;

        assert_eq!(port.switches(), vec![PRIMARY]);
    }

    #[tokio::test]
    async fn test_dispatch_loop_survives_failures() {
        let port = Arc::new(FakePort::new(&[PRIMARY, SECONDARY], PRIMARY).failing());
        let (tx, rx) = mpsc::unbounded_channel();

        tx.send(Intent::SwitchToPrimary).unwrap();
        tx.send(Intent::ToggleInputMethod).unwrap();
        drop(tx);
        run_dispatch_loop(Dispatcher::new(port.clone(), config()), rx).await;

        assert_eq!(port.switches().len(), 2);
    }

    #[test]
    fn test_secondary_check_never_switches() {
        let port = FakePort::new(&[PRIMARY], PRIMARY);
        assert!(!check_secondary(&port, &config()));

        let port = FakePort::new(&[PRIMARY, SECONDARY], PRIMARY);
        assert!(check_secondary(&port, &config()));
        assert!(port.switches().is_empty());
    }

    #[tokio::test]
    async fn test_signal_registration_failure_is_an_error() {
        let result = supervise(
            std::future::pending(),
            std::future::pending(),
            async { Err::<(), _>(std::io::Error::new(std::io::ErrorKind::Other, "no signal support")) },
        )
        .await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("failed to listen for shutdown signals"));
    }

    #[tokio::test]
    async fn test_shutdown_signal_is_clean_exit() {
        let result = supervise(
            std::future::pending(),
            std::future::pending(),
            async { Ok::<(), std::io::Error>(()) },
        )
        .await;
        assert!(result.is_ok());
    }

    #[test]
    fn test_quick_shift_tap_switches_to_secondary() {
        use crate::hotkey::keys::{codes, flags};
        use crate::hotkey::{HotkeyEvent, KeyEvent};

        let port = Arc::new(FakePort::new(&[PRIMARY, SECONDARY], PRIMARY));
        let (key_tx, key_rx) = mpsc::channel(8);
        let (intent_tx, intent_rx) = mpsc::unbounded_channel();
        let mut classifier = GestureClassifier::new(intent_tx);

        key_tx
            .try_send(HotkeyEvent::Key(KeyEvent::flags_changed(codes::LEFT_SHIFT, flags::SHIFT)))
            .unwrap();
        key_tx
            .try_send(HotkeyEvent::Key(KeyEvent::flags_changed(codes::LEFT_SHIFT, 0)))
            .unwrap();
        drop(key_tx);

        let dispatcher = Dispatcher::new(port.clone(), config());
        tokio_test::block_on(async move {
            classifier.run(key_rx).await;
            drop(classifier);
            run_dispatch_loop(dispatcher, intent_rx).await;
        });

        assert_eq!(port.switches(), vec![SECONDARY]);
    }
}
