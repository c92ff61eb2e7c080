//! Interrupt-to-main-loop concurrency substrate
//!
//! Interrupt handlers are plain event producers: each one either raises a
//! single-producer/single-consumer flag or bumps the saturating transfer
//! counter. The main loop is the only consumer. Nothing else is shared
//! across contexts, so no further locking exists anywhere in the firmware.

use portable_atomic::{AtomicBool, AtomicU8, Ordering};

/// One-bit mailbox: set from interrupt context, drained by the main loop.
#[derive(Debug, Default)]
pub struct EventFlag(AtomicBool);

impl EventFlag {
    /// A cleared flag.
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Raise the flag. Safe from interrupt context.
    pub fn set(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Consume the flag, returning whether it was set.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }

    /// Peek without consuming.
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Endpoint-completion events since the last watermark tick.
///
/// Incremented by the completion interrupt, saturating at `u8::MAX`; taken
/// with an atomic swap-to-zero so a completion landing between read and
/// clear is never lost or double-counted.
#[derive(Debug, Default)]
pub struct TransferCounter(AtomicU8);

impl TransferCounter {
    /// A zeroed counter.
    pub const fn new() -> Self {
        Self(AtomicU8::new(0))
    }

    /// Count one completion event. Safe from interrupt context.
    pub fn record(&self) {
        // checked_add returns None at the ceiling, which leaves the value
        // untouched: the counter saturates instead of wrapping.
        let _ = self
            .0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| v.checked_add(1));
    }

    /// Read and clear in one atomic step.
    pub fn take(&self) -> u8 {
        self.0.swap(0, Ordering::AcqRel)
    }
}

/// The full set of pending-event mailboxes.
#[derive(Debug, Default)]
pub struct PendingEvents {
    /// A SETUP packet is waiting to be dispatched.
    pub control_request: EventFlag,
    /// A control data-stage packet has arrived.
    pub ep0_out: EventFlag,
    /// The host signalled suspend.
    pub suspend: EventFlag,
    /// The watermark timer fired.
    pub timer_tick: EventFlag,
}

impl PendingEvents {
    /// All flags cleared.
    pub const fn new() -> Self {
        Self {
            control_request: EventFlag::new(),
            ep0_out: EventFlag::new(),
            suspend: EventFlag::new(),
            timer_tick: EventFlag::new(),
        }
    }
}
