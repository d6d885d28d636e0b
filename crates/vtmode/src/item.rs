#![forbid(unsafe_code)]

//! The unit of terminal mutation.
//!
//! A [`ModItem`] reifies one revertible change to driver state: a flag
//! set or cleared on one axis of one stream, or a control-character slot
//! rebound. Identity is the (stream, value, axis) triple; the process-wide
//! ledger refuses to hold two items with the same triple, which is what
//! makes every entry point duplicate-safe.
//!
//! # Construction contract
//!
//! 1. The value is normalized for its axis.
//! 2. Duplicate detection runs atomically with insertion, under the
//!    ledger mutex.
//! 3. The stream's baseline state is snapshotted on first touch only.
//! 4. `origin` is captured from the state read in step 3; it describes
//!    the baseline, never the current state.
//! 5. The post state is computed and written. A write failure constructs
//!    nothing: the ledger is left exactly as it was.
//!
//! # Rollback contract
//!
//! `reset` restores this item's contribution to the baseline. `purge`
//! runs the pre-reset hooks in LIFO order, resets, and unlinks the item;
//! it runs at most once no matter how many exit paths race it.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::axis::{Axis, FlagOp, ModValue, NormValue, SetWhen, CC_DISABLED};
use crate::error::ModeError;
use crate::ledger::LedgerShared;
use crate::selector::{StreamId, StreamSelector};
use crate::state::DriverState;

/// Optional construction parameters for a modification.
#[derive(Debug, Clone)]
pub struct ModOptions {
    /// POSIX timing code for the write. Ignored off-POSIX.
    pub when: SetWhen,
    /// Roll this modification back when the process exits.
    pub reset_atexit: bool,
    /// Free-form label carried for diagnostics.
    pub note: Option<&'static str>,
}

impl Default for ModOptions {
    fn default() -> Self {
        Self {
            when: SetWhen::Now,
            reset_atexit: true,
            note: None,
        }
    }
}

/// Identity triple of a modification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ModKey {
    pub(crate) stream: StreamId,
    pub(crate) value: NormValue,
    pub(crate) axis: Axis,
}

pub(crate) struct ItemCore {
    pub(crate) key: ModKey,
    when: SetWhen,
    reset_atexit: bool,
    note: Option<&'static str>,
    /// Baseline observation: for flags, whether every bit was already
    /// set; for cc slots, whether the slot held a live binding.
    origin: bool,
    /// Baseline byte of the slot, for cc items. `sub_flag` and `reset`
    /// write this back.
    origin_cc: Option<u8>,
    active: AtomicBool,
    purged: AtomicBool,
    hooks: Mutex<Vec<Box<dyn FnOnce() + Send>>>,
}

/// Handle to one live terminal modification.
///
/// Handles are cheap to clone and compare equal when they share the
/// identity triple. All driver writes go through the owning ledger's
/// mutex so read-modify-write cannot interleave with other mutations.
#[derive(Clone)]
pub struct ModItem {
    core: Arc<ItemCore>,
    ledger: Arc<LedgerShared>,
}

fn compute_next(
    current: &DriverState,
    value: NormValue,
    axis: Axis,
    op: FlagOp,
    origin_cc: Option<u8>,
) -> Result<DriverState, ModeError> {
    match (value, axis) {
        (NormValue::Cc(byte), Axis::CtrlChar(slot)) => match op {
            FlagOp::Set => current.with_cc(slot, byte),
            FlagOp::Clear => current.with_cc(slot, origin_cc.unwrap_or(CC_DISABLED)),
        },
        (NormValue::Bits(bits), axis) => {
            let Some(flag) = axis.flag() else {
                return Err(ModeError::InvalidInput(format!(
                    "flag bits on control-character axis {axis}"
                )));
            };
            Ok(current.with_flag(flag, bits, op))
        }
        (value, axis) => Err(ModeError::InvalidInput(format!(
            "value {value:?} does not fit axis {axis}"
        ))),
    }
}

impl ModItem {
    /// Construct, apply, and register a modification.
    ///
    /// On an identity collision the existing item rides back inside
    /// [`ModeError::Duplicate`]; nothing is re-applied.
    pub(crate) fn create(
        ledger: &Arc<LedgerShared>,
        op: FlagOp,
        selector: StreamSelector,
        value: ModValue,
        axis: Axis,
        opts: ModOptions,
    ) -> Result<Self, ModeError> {
        let norm = value.normalize(axis)?;
        let stream = ledger.backend.handle(selector)?;
        let key = ModKey {
            stream,
            value: norm,
            axis,
        };

        let mut inner = ledger.inner.lock().unwrap();
        if let Some(existing) = inner.index.get(&key) {
            return Err(ModeError::Duplicate(Self {
                core: existing.clone(),
                ledger: ledger.clone(),
            }));
        }

        let current = ledger.backend.state(stream)?;
        let (origin, origin_cc) = match axis {
            Axis::CtrlChar(slot) => {
                let byte = current.cc(slot)?;
                (byte != CC_DISABLED, Some(byte))
            }
            _ => (current.contains(norm, axis)?, None),
        };

        let next = compute_next(&current, norm, axis, op, origin_cc)?;
        ledger.backend.apply(stream, &next, opts.when)?;

        // First touch only: `current` was read before this item's write,
        // so it is the stream's pristine baseline.
        inner
            .snapshots
            .entry(stream)
            .or_insert_with(|| current.clone());

        let core = Arc::new(ItemCore {
            key,
            when: opts.when,
            reset_atexit: opts.reset_atexit,
            note: opts.note,
            origin,
            origin_cc,
            active: AtomicBool::new(true),
            purged: AtomicBool::new(false),
            hooks: Mutex::new(Vec::new()),
        });
        inner.items.push(core.clone());
        inner.index.insert(key, core.clone());
        drop(inner);

        let item = Self {
            core,
            ledger: ledger.clone(),
        };
        #[cfg(feature = "tracing")]
        tracing::debug!(item = ?item, "terminal modification applied");
        Ok(item)
    }

    /// Read-modify-write of the target stream, serialized with every
    /// other mutation on the ledger.
    fn write(&self, op: FlagOp) -> Result<(), ModeError> {
        let _guard = self.ledger.inner.lock().unwrap();
        let current = self.ledger.backend.state(self.core.key.stream)?;
        let next = compute_next(
            &current,
            self.core.key.value,
            self.core.key.axis,
            op,
            self.core.origin_cc,
        )?;
        self.ledger
            .backend
            .apply(self.core.key.stream, &next, self.core.when)
    }

    /// Apply the modification. Idempotent with respect to driver state,
    /// but always goes through the backend.
    pub fn add_flag(&self) -> Result<(), ModeError> {
        self.write(FlagOp::Set)?;
        self.core.active.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Withdraw the modification: clear the flag bits, or restore the
    /// baseline control-character byte.
    pub fn sub_flag(&self) -> Result<(), ModeError> {
        self.write(FlagOp::Clear)?;
        self.core.active.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Ask the driver whether the value is presently set. No caching.
    pub fn request(&self) -> Result<bool, ModeError> {
        let state = self.ledger.backend.state(self.core.key.stream)?;
        state.contains(self.core.key.value, self.core.key.axis)
    }

    /// The baseline observation captured at construction.
    #[must_use]
    pub fn origin(&self) -> bool {
        self.core.origin
    }

    /// Restore this item's contribution to the baseline: re-set the flag
    /// if the baseline had it, clear it otherwise; for a cc slot, write
    /// the baseline byte back regardless.
    pub fn reset(&self) -> Result<(), ModeError> {
        match self.core.key.axis {
            Axis::CtrlChar(_) => {
                self.write(FlagOp::Clear)?;
                let still_applied = matches!(
                    (self.core.origin_cc, self.core.key.value),
                    (Some(byte), NormValue::Cc(value)) if byte == value
                );
                self.core.active.store(still_applied, Ordering::SeqCst);
                Ok(())
            }
            _ => {
                if self.core.origin {
                    self.add_flag()
                } else {
                    self.sub_flag()
                }
            }
        }
    }

    /// Run the pre-reset hooks (LIFO), reset, and unlink from the
    /// ledger. At most one purge ever executes; later calls are no-ops.
    pub fn purge(&self) -> Result<(), ModeError> {
        if self.core.purged.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(item = ?self, "purging terminal modification");
        self.run_hooks();
        let result = self.reset();
        self.unlink();
        result
    }

    /// Push a hook to run before the exit-time (or purge-time) reset.
    /// Hooks run in reverse push order.
    pub fn add_before_reset_atexit(&self, hook: impl FnOnce() + Send + 'static) {
        self.core.hooks.lock().unwrap().push(Box::new(hook));
    }

    /// Whether the modification is currently applied as last directed
    /// through this item.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.core.active.load(Ordering::SeqCst)
    }

    /// Whether exit-time rollback will reset this item.
    #[must_use]
    pub fn resets_at_exit(&self) -> bool {
        self.core.reset_atexit
    }

    /// The diagnostics label, if any.
    #[must_use]
    pub fn note(&self) -> Option<&'static str> {
        self.core.note
    }

    /// The stream this item targets.
    #[must_use]
    pub fn stream(&self) -> StreamId {
        self.core.key.stream
    }

    /// The axis this item targets.
    #[must_use]
    pub fn axis(&self) -> Axis {
        self.core.key.axis
    }

    /// Whether two handles refer to the same registered item (not merely
    /// the same identity triple).
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.core, &other.core)
    }

    fn run_hooks(&self) {
        let hooks: Vec<_> = {
            let mut hooks = self.core.hooks.lock().unwrap();
            hooks.drain(..).collect()
        };
        for hook in hooks.into_iter().rev() {
            hook();
        }
    }

    fn unlink(&self) {
        let mut inner = self.ledger.inner.lock().unwrap();
        inner.index.remove(&self.core.key);
        inner.items.retain(|core| !Arc::ptr_eq(core, &self.core));
    }

    pub(crate) fn from_core(core: Arc<ItemCore>, ledger: Arc<LedgerShared>) -> Self {
        Self { core, ledger }
    }
}

impl PartialEq for ModItem {
    fn eq(&self, other: &Self) -> bool {
        self.core.key == other.core.key
    }
}

impl Eq for ModItem {}

impl std::hash::Hash for ModItem {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.core.key.hash(state);
    }
}

// The hooks vector is not Debug; render the identity and bookkeeping.
impl fmt::Debug for ModItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModItem")
            .field("note", &self.core.note)
            .field("stream", &self.core.key.stream)
            .field("value", &self.core.key.value)
            .field("axis", &self.core.key.axis)
            .field("origin", &self.core.origin)
            .field("active", &self.is_active())
            .finish()
    }
}
