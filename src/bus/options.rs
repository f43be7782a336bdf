//! Bus configuration.

use std::fmt;
use std::rc::Rc;

use crate::error::HandlerError;
use crate::types::EventKey;

/// Called with the failure, the event key and the payload when a handler
/// panics during dispatch.
pub type ErrorHook<P> = Rc<dyn Fn(&HandlerError, &EventKey, &P)>;

/// Options accepted by [`Bus::with_options`](super::Bus::with_options).
///
/// Construct with struct literal syntax or the builder methods:
/// ```ignore
/// let bus = Bus::with_options(
///     BusOptions::default()
///         .max_listeners(32)
///         .on_error(|err, key, _payload| eprintln!("{key}: {err}")),
/// );
/// ```
pub struct BusOptions<P: 'static> {
    /// Per-key listener count above which a warning is logged.
    /// Registration still succeeds. `None` disables the check.
    pub max_listeners: Option<usize>,
    /// Catch handler panics and report them here instead of unwinding.
    pub on_error: Option<ErrorHook<P>>,
}

impl<P: 'static> BusOptions<P> {
    pub fn max_listeners(mut self, max: usize) -> Self {
        self.max_listeners = Some(max);
        self
    }

    pub fn on_error(mut self, hook: impl Fn(&HandlerError, &EventKey, &P) + 'static) -> Self {
        self.on_error = Some(Rc::new(hook));
        self
    }
}

impl<P: 'static> Default for BusOptions<P> {
    fn default() -> Self {
        Self {
            max_listeners: None,
            on_error: None,
        }
    }
}

impl<P: 'static> Clone for BusOptions<P> {
    fn clone(&self) -> Self {
        Self {
            max_listeners: self.max_listeners,
            on_error: self.on_error.clone(),
        }
    }
}

impl<P: 'static> fmt::Debug for BusOptions<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusOptions")
            .field("max_listeners", &self.max_listeners)
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}
