//! Process-wide libusb context
//!
//! One context backs every enumeration and open in the process. It is
//! created by [`init`] and torn down by [`shutdown`]; both are idempotent and
//! serialized by a mutex. Handles opened before `shutdown` keep their own
//! reference to the context and stay usable until closed.

use crate::error::{HidError, Result};
use rusb::Context;
use std::sync::Mutex;
use tracing::debug;

static CONTEXT: Mutex<Option<Context>> = Mutex::new(None);

/// Initialize the USB backend
///
/// Calling this again while initialized is a no-op.
pub fn init() -> Result<()> {
    let mut context = CONTEXT.lock().unwrap_or_else(|e| e.into_inner());
    if context.is_none() {
        *context = Some(Context::new()?);
        debug!("USB backend initialized");
    }
    Ok(())
}

/// Tear down the USB backend
///
/// Safe to call when already shut down.
pub fn shutdown() {
    let mut context = CONTEXT.lock().unwrap_or_else(|e| e.into_inner());
    if context.take().is_some() {
        debug!("USB backend shut down");
    }
}

/// Whether [`init`] has run without a later [`shutdown`]
pub fn is_initialized() -> bool {
    CONTEXT.lock().unwrap_or_else(|e| e.into_inner()).is_some()
}

/// Get the current context
pub(crate) fn context() -> Result<Context> {
    CONTEXT
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .clone()
        .ok_or(HidError::NotInitialized)
}
