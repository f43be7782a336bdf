//! Error types.

use thiserror::Error;

/// Usage-contract violations of the binding layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    /// The ambient accessor was called with no `bus_provider` above it.
    #[error("no bus provider for payload type `{payload}` in the enclosing component tree")]
    MissingProvider { payload: &'static str },
}

/// A handler failure caught during dispatch.
///
/// Only produced when the bus has an error hook configured, otherwise the
/// panic keeps unwinding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    #[error("handler for `{event}` panicked: {message}")]
    Panicked { event: String, message: String },
}

impl HandlerError {
    /// Build from a caught panic payload.
    pub(crate) fn from_panic(event: String, payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::Panicked { event, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_provider_message() {
        let err = BindingError::MissingProvider { payload: "u32" };
        assert_eq!(
            err.to_string(),
            "no bus provider for payload type `u32` in the enclosing component tree"
        );
    }

    #[test]
    fn test_from_panic_payloads() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("boom");
        let err = HandlerError::from_panic("click".into(), boxed.as_ref());
        assert_eq!(err.to_string(), "handler for `click` panicked: boom");

        let boxed: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        let err = HandlerError::from_panic("click".into(), boxed.as_ref());
        assert_eq!(
            err,
            HandlerError::Panicked {
                event: "click".into(),
                message: "owned".into()
            }
        );
    }
}
