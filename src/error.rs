//! Shared error categories (spec.md §7, Design Notes).
//!
//! Two layers, matching the source's panic discipline re-architected as
//! typed errors:
//!
//! - [`SchemaError`] — witness-time errors: reflective/derived conversion
//!   hit an unsupported shape, old/new lists of unequal length, a capacity
//!   overrun, or an invalid key. These are fatal and abort proof generation
//!   before a single constraint is emitted.
//! - [`CsError`] — constraint-time errors: an `AssertEqual` (or a narrower
//!   assertion built on it) disagreed while evaluating the [`crate::cs`]
//!   facade. In a real backend this would instead manifest as an
//!   unsatisfiable R1CS instance; [`crate::cs::NativeCs`] catches it eagerly
//!   and reports the first violation.
//!
//! Neither layer retries, logs, or recovers (spec.md §7). Nothing below this
//! module reaches for `tracing`; the exceptions are `schema::phd::edit_check`/
//! `schema::phd::validate` and their `schema::covid` counterparts, each
//! wrapping circuit construction in a span purely for operator observability
//! of *which* schema/edit is being built, not for recovery.

#![forbid(unsafe_code)]

/// Witness-time (prover-side) invariant violations.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// A reflective/derived conversion encountered a `Value` variant the
    /// encoder does not know how to serialize.
    #[error("invariant violated at {where_}: unsupported value shape")]
    InvariantViolated {
        /// Static description of the call site (module/field), not a
        /// user-facing message.
        where_: &'static str,
    },
    /// An append-only comparison was given old/new lists of different length.
    #[error("append-only check requires equal-length lists (old={old}, new={new})")]
    LengthMismatch {
        /// Length of the old list.
        old: usize,
        /// Length of the new list.
        new: usize,
    },
    /// A string exceeded the declared fixed capacity of its container.
    #[error("string of length {len} exceeds declared capacity {capacity}")]
    CapacityExceeded {
        /// Actual payload length.
        len: usize,
        /// Declared maximum capacity.
        capacity: usize,
    },
    /// A key buffer was longer than the 32-byte commitment block.
    #[error("key of {len} bytes exceeds the 32-byte commitment block")]
    KeyTooLong {
        /// Actual key length in bytes.
        len: usize,
    },
}

/// Constraint-time (solve-time) violations surfaced by [`crate::cs::NativeCs`].
#[derive(Debug, thiserror::Error)]
pub enum CsError {
    /// `AssertEqual(a, b)` failed.
    #[error("assertion failed: {lhs} != {rhs} ({context})")]
    AssertionFailed {
        /// Debug rendering of the left-hand side.
        lhs: String,
        /// Debug rendering of the right-hand side.
        rhs: String,
        /// Static description of which gadget raised the assertion.
        context: &'static str,
    },
    /// A value was asserted boolean but was neither `0` nor `1`.
    #[error("value is not boolean ({context})")]
    NotBoolean {
        /// Static description of which gadget raised the assertion.
        context: &'static str,
    },
    /// A hint was invoked with the wrong input or output arity.
    #[error("hint {hint:?} arity mismatch: expected {expected} {what}, got {got}")]
    HintArity {
        /// Which hint was invoked.
        hint: crate::hints::HintId,
        /// What was being counted (`"inputs"` or `"outputs"`).
        what: &'static str,
        /// Expected count.
        expected: usize,
        /// Actual count.
        got: usize,
    },
    /// A hint input was outside the domain the hint is defined for.
    #[error("hint {hint:?} input out of range: {reason}")]
    HintInputOutOfRange {
        /// Which hint was invoked.
        hint: crate::hints::HintId,
        /// Human-readable reason, fixed at the call site (not user data).
        reason: &'static str,
    },
    /// A value did not decompose into the requested number of bits.
    #[error("value does not fit in {n} bits")]
    OutOfRange {
        /// Requested bit width.
        n: usize,
    },
}
