//! Turns intents into input method switches

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::Config;
use crate::events::Intent;
use crate::input_method::{InputMethodError, InputMethodPort};

/// Maps each intent to a call on the input method port
#[derive(Clone)]
pub struct Dispatcher {
    port: Arc<dyn InputMethodPort>,
    config: Config,
}

impl Dispatcher {
    pub fn new(port: Arc<dyn InputMethodPort>, config: Config) -> Self {
        Self { port, config }
    }

    /// Perform the switch for `intent`, returning the id switched to.
    ///
    /// Blocks on the external tool. Failures are returned, never retried.
    pub fn dispatch(&self, intent: Intent) -> Result<String, InputMethodError> {
        let target = match intent {
            Intent::SwitchToPrimary => self.config.primary_im.clone(),
            Intent::ToggleInputMethod => {
                let current = self.port.current()?;
                debug!(%current, "current input method");
                if current == self.config.secondary_im {
                    self.config.primary_im.clone()
                } else {
                    self.config.secondary_im.clone()
                }
            }
        };

        self.port.switch_to(&target)?;
        info!(%intent, %target, "switched input method");
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input_method::fake::FakePort;

    const PRIMARY: &str = "com.apple.keylayout.ABC";
    const SECONDARY: &str = "com.apple.inputmethod.SCIM.ITABC";

    fn dispatcher(active: &str) -> (Dispatcher, Arc<FakePort>) {
        let port = Arc::new(FakePort::new(&[PRIMARY, SECONDARY], active));
        let config = Config {
            primary_im: PRIMARY.to_string(),
            secondary_im: SECONDARY.to_string(),
        };
        (Dispatcher::new(port.clone(), config), port)
    }

    #[test]
    fn test_switch_to_primary() {
        let (dispatcher, port) = dispatcher(SECONDARY);
        assert_eq!(dispatcher.dispatch(Intent::SwitchToPrimary).unwrap(), PRIMARY);
        assert_eq!(port.switches(), vec![PRIMARY]);
    }

    #[test]
    fn test_toggle_from_secondary_goes_primary() {
        let (dispatcher, port) = dispatcher(SECONDARY);
        dispatcher.dispatch(Intent::ToggleInputMethod).unwrap();
        assert_eq!(port.switches(), vec![PRIMARY]);
    }

    #[test]
    fn test_toggle_from_primary_goes_secondary() {
        let (dispatcher, port) = dispatcher(PRIMARY);
        dispatcher.dispatch(Intent::ToggleInputMethod).unwrap();
        assert_eq!(port.switches(), vec![SECONDARY]);
    }

    #[test]
    fn test_toggle_from_other_goes_secondary() {
        let (dispatcher, port) = dispatcher("com.apple.keylayout.German");
        dispatcher.dispatch(Intent::ToggleInputMethod).unwrap();
        assert_eq!(port.switches(), vec![SECONDARY]);
    }

    #[test]
    fn test_failure_is_returned_once() {
        let port = Arc::new(FakePort::new(&[PRIMARY, SECONDARY], PRIMARY).failing());
        let config = Config {
            primary_im: PRIMARY.to_string(),
            secondary_im: SECONDARY.to_string(),
        };
        let dispatcher = Dispatcher::new(port.clone(), config);

        assert!(dispatcher.dispatch(Intent::SwitchToPrimary).is_err());
        assert_eq!(port.switches().len(), 1);
    }
}
