#![forbid(unsafe_code)]

//! Process-wide bookkeeping: baseline snapshots, the ordered modification
//! registry, and the coordinator that owns both.
//!
//! # Lifecycle Guarantees
//!
//! 1. **Baselines are write-once** - the first touch of a stream records
//!    its driver state; the entry is never overwritten and is the ground
//!    truth for every later rollback.
//!
//! 2. **Identity is unique** - duplicate detection and insertion happen
//!    atomically under one mutex, so two items with the same
//!    (stream, value, axis) triple can never coexist.
//!
//! 3. **Rollback is LIFO** - both the on-demand purge and the exit-time
//!    walk revert items in reverse insertion order, and each item rolls
//!    back at most once regardless of how the walks interleave with
//!    manual purges.
//!
//! The coordinator is an ordinary value over any [`DriverBackend`], so
//! tests drive an isolated instance against an in-memory backend; the
//! process-global instance over the platform backend is initialized on
//! first use and wired to the exit hooks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use crate::axis::{Axis, FlagOp, ModValue};
use crate::backend::{platform_backend, DriverBackend, DriverFamily};
use crate::error::ModeError;
use crate::item::{ItemCore, ModItem, ModKey, ModOptions};
use crate::selector::{StreamId, StreamSelector};
use crate::state::DriverState;

pub(crate) struct LedgerInner {
    pub(crate) snapshots: HashMap<StreamId, DriverState>,
    pub(crate) items: Vec<Arc<ItemCore>>,
    pub(crate) index: HashMap<ModKey, Arc<ItemCore>>,
}

pub(crate) struct LedgerShared {
    pub(crate) backend: Arc<dyn DriverBackend>,
    pub(crate) inner: Mutex<LedgerInner>,
}

/// Coordinator over one backend: snapshot registry, modification
/// registry, and the entry points that construct modifications.
#[derive(Clone)]
pub struct ModeController {
    shared: Arc<LedgerShared>,
}

impl ModeController {
    /// A coordinator over an explicit backend.
    #[must_use]
    pub fn new(backend: Arc<dyn DriverBackend>) -> Self {
        Self {
            shared: Arc::new(LedgerShared {
                backend,
                inner: Mutex::new(LedgerInner {
                    snapshots: HashMap::new(),
                    items: Vec::new(),
                    index: HashMap::new(),
                }),
            }),
        }
    }

    /// The driver model the backend speaks.
    #[must_use]
    pub fn family(&self) -> DriverFamily {
        self.shared.backend.family()
    }

    /// Resolve a symbolic selector into a stream id.
    pub fn handle(&self, selector: StreamSelector) -> Result<StreamId, ModeError> {
        self.shared.backend.handle(selector)
    }

    /// Verify the host meets a feature's minimum console build.
    pub fn check_build(&self, required: u32) -> Result<(), ModeError> {
        self.shared.backend.check_build(required)
    }

    /// Set `value` on `axis` of a stream and register the modification.
    ///
    /// # Errors
    ///
    /// [`ModeError::Duplicate`] when the identity triple is already
    /// registered; backend errors propagate unchanged and register
    /// nothing.
    pub fn add_flag(
        &self,
        selector: StreamSelector,
        value: ModValue,
        axis: Axis,
        opts: ModOptions,
    ) -> Result<ModItem, ModeError> {
        ModItem::create(&self.shared, FlagOp::Set, selector, value, axis, opts)
    }

    /// Clear `value` on `axis` of a stream and register the modification.
    ///
    /// # Errors
    ///
    /// As [`ModeController::add_flag`].
    pub fn sub_flag(
        &self,
        selector: StreamSelector,
        value: ModValue,
        axis: Axis,
        opts: ModOptions,
    ) -> Result<ModItem, ModeError> {
        ModItem::create(&self.shared, FlagOp::Clear, selector, value, axis, opts)
    }

    /// Deduplication-friendly construction: an identity collision yields
    /// the already-registered item instead of an error, and nothing is
    /// re-applied to the driver.
    pub fn instance(
        &self,
        op: FlagOp,
        selector: StreamSelector,
        value: ModValue,
        axis: Axis,
        opts: ModOptions,
    ) -> Result<ModItem, ModeError> {
        match ModItem::create(&self.shared, op, selector, value, axis, opts) {
            Err(ModeError::Duplicate(existing)) => Ok(existing),
            other => other,
        }
    }

    /// Ask the driver whether `value` is presently set on `axis`.
    pub fn request(
        &self,
        selector: StreamSelector,
        value: ModValue,
        axis: Axis,
    ) -> Result<bool, ModeError> {
        let norm = value.normalize(axis)?;
        let stream = self.shared.backend.handle(selector)?;
        let state = self.shared.backend.state(stream)?;
        state.contains(norm, axis)
    }

    /// Handles to every live modification, in insertion order.
    #[must_use]
    pub fn items(&self) -> Vec<ModItem> {
        let inner = self.shared.inner.lock().unwrap();
        inner
            .items
            .iter()
            .map(|core| ModItem::from_core(core.clone(), self.shared.clone()))
            .collect()
    }

    /// The baseline snapshot of a stream, if it has been touched.
    #[must_use]
    pub fn baseline(&self, stream: StreamId) -> Option<DriverState> {
        self.shared.inner.lock().unwrap().snapshots.get(&stream).cloned()
    }

    /// Purge every live modification, newest first.
    pub fn cache_purge(&self) {
        self.rollback(false);
    }

    /// Exit-path rollback: like [`ModeController::cache_purge`], but
    /// items registered with `reset_atexit = false` are left untouched.
    pub fn exit_rollback(&self) {
        self.rollback(true);
    }

    fn rollback(&self, only_atexit: bool) {
        for item in self.items().into_iter().rev() {
            if only_atexit && !item.resets_at_exit() {
                continue;
            }
            // One failed reset must not skip the remaining items.
            if let Err(_err) = item.purge() {
                #[cfg(feature = "tracing")]
                tracing::warn!(item = ?item, error = %_err, "rollback of modification failed");
            }
        }
    }
}

static CONTROLLER: OnceLock<ModeController> = OnceLock::new();

/// The process-global coordinator over the platform backend.
///
/// First use installs the exit hooks (panic hook and, on Unix, the
/// termination-signal listener) so registered modifications roll back on
/// unhandled-error paths.
pub fn controller() -> &'static ModeController {
    CONTROLLER.get_or_init(|| {
        crate::exit::install_exit_hooks();
        ModeController::new(platform_backend())
    })
}

/// The global coordinator, if it has been initialized.
pub(crate) fn installed_controller() -> Option<&'static ModeController> {
    CONTROLLER.get()
}

/// Set `value` on `axis` of a stream via the global coordinator.
pub fn add_flag(
    selector: StreamSelector,
    value: ModValue,
    axis: Axis,
    opts: ModOptions,
) -> Result<ModItem, ModeError> {
    controller().add_flag(selector, value, axis, opts)
}

/// Clear `value` on `axis` of a stream via the global coordinator.
pub fn sub_flag(
    selector: StreamSelector,
    value: ModValue,
    axis: Axis,
    opts: ModOptions,
) -> Result<ModItem, ModeError> {
    controller().sub_flag(selector, value, axis, opts)
}

/// Ask the driver whether `value` is presently set on `axis`.
pub fn request(selector: StreamSelector, value: ModValue, axis: Axis) -> Result<bool, ModeError> {
    controller().request(selector, value, axis)
}

/// Resolve a symbolic selector via the global coordinator.
pub fn handle(selector: StreamSelector) -> Result<StreamId, ModeError> {
    controller().handle(selector)
}

/// Verify the host console build via the global coordinator.
pub fn check_build(required: u32) -> Result<(), ModeError> {
    controller().check_build(required)
}

/// Purge every live modification of the global coordinator, newest
/// first.
pub fn cache_purge() {
    controller().cache_purge();
}
