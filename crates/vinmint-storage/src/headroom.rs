use tracing::warn;
use vinmint_core::{BackendKind, Prefix, MAX_SEQUENCE};

/// Counters at or above this value trigger a rotation warning.
pub const SOFT_LIMIT_THRESHOLD: u64 = 990_000;

/// Emits a warning when a freshly allocated value is close to, or past, the
/// six-digit serial limit.
///
/// Never fails: running out of serial space is an operator concern, and the
/// allocated value has already been persisted.
pub(crate) fn check_headroom(backend: BackendKind, prefix: &Prefix, value: u64) {
    if value > MAX_SEQUENCE {
        warn!(
            %backend,
            prefix = %prefix,
            sequence = value,
            max_sequence = MAX_SEQUENCE,
            "sequence exceeds the six-digit serial range, rotate to a new prefix"
        );
    } else if value >= SOFT_LIMIT_THRESHOLD {
        warn!(
            %backend,
            prefix = %prefix,
            sequence = value,
            remaining = MAX_SEQUENCE - value,
            "sequence approaching the six-digit serial limit"
        );
    }
}

/// Records a counter reset. Resets can re-issue codes already in the field.
pub(crate) fn audit_reset(backend: BackendKind, prefix: &Prefix, previous: u64, value: u64) {
    warn!(
        audit = true,
        %backend,
        prefix = %prefix,
        previous,
        value,
        "sequence counter reset; codes above the new value may be issued twice"
    );
}
