#![forbid(unsafe_code)]

//! Scoped recovery from inappropriate-device conditions.
//!
//! A process launched under a pipe, a redirection, or an IDE console has
//! standard streams that are not terminals; every driver query then fails
//! with the inappropriate-device error. [`DeviceErrorGuard`] runs a body
//! and dispatches that error class to a dedicated handler, separately
//! from every other failure, so callers can degrade gracefully instead of
//! special-casing error codes at each call site.
//!
//! ```
//! use vtmode::guard::DeviceErrorGuard;
//! use vtmode::error::ModeError;
//!
//! let mode = DeviceErrorGuard::new()
//!     .on_inappropriate_device(|_| Ok("plain"))
//!     .run(|| {
//!         // query or mutate terminal state here
//!         Err::<&str, _>(ModeError::NotATerminal { code: 25 })
//!     });
//! assert_eq!(mode.unwrap(), "plain");
//! ```

use crate::error::ModeError;

type Handler<'h, T> = Box<dyn FnOnce(ModeError) -> Result<T, ModeError> + 'h>;

/// Scoped dispatcher for errors escaping a body of terminal operations.
///
/// Both handlers default to re-raising. The guard's result is whatever
/// the selected handler returns.
pub struct DeviceErrorGuard<'h, T> {
    on_inappropriate_device: Handler<'h, T>,
    on_other: Handler<'h, T>,
}

impl<'h, T: 'h> DeviceErrorGuard<'h, T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            on_inappropriate_device: Box::new(Err),
            on_other: Box::new(Err),
        }
    }

    /// Handle the inappropriate-device class (the stream is not a
    /// terminal: errno 25 on POSIX, Win32 error 6).
    #[must_use]
    pub fn on_inappropriate_device(
        mut self,
        handler: impl FnOnce(ModeError) -> Result<T, ModeError> + 'h,
    ) -> Self {
        self.on_inappropriate_device = Box::new(handler);
        self
    }

    /// Handle every other error escaping the body.
    #[must_use]
    pub fn on_other(
        mut self,
        handler: impl FnOnce(ModeError) -> Result<T, ModeError> + 'h,
    ) -> Self {
        self.on_other = Box::new(handler);
        self
    }

    /// Run the body and dispatch whatever error escapes it.
    pub fn run(self, body: impl FnOnce() -> Result<T, ModeError>) -> Result<T, ModeError> {
        match body() {
            Ok(value) => Ok(value),
            Err(err) if err.is_inappropriate_device() => (self.on_inappropriate_device)(err),
            Err(err) => (self.on_other)(err),
        }
    }
}

impl<'a, T: 'a> Default for DeviceErrorGuard<'a, T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_body_passes_through() {
        let out = DeviceErrorGuard::new()
            .on_inappropriate_device(|_| Ok(0))
            .run(|| Ok(7));
        assert_eq!(out.unwrap(), 7);
    }

    #[test]
    fn device_error_selects_the_device_handler() {
        let out = DeviceErrorGuard::new()
            .on_inappropriate_device(|_| Ok("handled"))
            .on_other(|_| Ok("other"))
            .run(|| Err(ModeError::NotATerminal { code: 25 }));
        assert_eq!(out.unwrap(), "handled");
    }

    #[test]
    fn other_errors_select_the_other_handler() {
        let out = DeviceErrorGuard::new()
            .on_inappropriate_device(|_| Ok("handled"))
            .on_other(|_| Ok("other"))
            .run(|| {
                Err(ModeError::ApplyFailed {
                    code: 5,
                    what: "tcsetattr",
                })
            });
        assert_eq!(out.unwrap(), "other");
    }

    #[test]
    fn default_handlers_reraise() {
        let out: Result<(), _> =
            DeviceErrorGuard::new().run(|| Err(ModeError::NotATerminal { code: 25 }));
        assert!(matches!(out, Err(ModeError::NotATerminal { code: 25 })));
    }
}
