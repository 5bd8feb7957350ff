//! Zero-knowledge circuit core for privacy-preserving record policy proofs.
//!
//! This crate proves that an edit to a sensitive record (a PhD profile, a
//! COVID medical record) obeys a declared policy — without revealing the
//! record's contents to the verifier. The record is canonically encoded,
//! symmetrically encrypted under a key only the prover knows, and the
//! verifier only ever sees: the ciphertext, a commitment to the key, and the
//! circuit's accept/reject bit.
//!
//! ## Layering
//!
//! - [`cs`] — the backend-agnostic constraint-system facade every gadget
//!   below is built against, plus [`cs::NativeCs`], the one concrete
//!   eager-evaluation backend this crate ships.
//! - [`hints`] — prover-side witness helpers ([`hints::HintId`]) invoked
//!   through [`cs::ConstraintSystem::hint`]: decimal digit splitting,
//!   integer division, bit decomposition, and the two merge-argument
//!   multiset permutations.
//! - [`mimc`] — the MiMC-Feistel cipher/hash both other layers build on:
//!   round constants, [`mimc::encrypt`]/[`mimc::Hasher`] over concrete field
//!   elements, and [`mimc::CircuitMimc`] over any [`cs::ConstraintSystem`].
//! - [`gadgets`] — small arithmetic building blocks (ordering, selection,
//!   bit range checks, the dummy-sentinel predicates, a lookup multiplexer)
//!   used throughout the rest of the crate.
//! - [`varstring`] — the fixed-capacity `[len, payload…]` string encoding
//!   and the randomized merge argument that proves one `VarString` is the
//!   ordered concatenation of others.
//! - [`value`] — the typed [`value::Value`] tree and [`value::Encodable`]
//!   trait schema types implement instead of relying on reflection.
//! - [`encoder`] — turns a [`value::Value`] tree into one canonical
//!   `VarString`, the plaintext [`cipher::encrypt_record`] seals.
//! - [`cipher`] — symmetric record encryption and key commitment.
//! - [`policy`] — append-only history, range, set-membership, time-window,
//!   and character-format gadgets shared by every concrete schema.
//! - [`schema`] — the two reference circuits (`phd`, `covid`) wiring the
//!   layers above into `EditCheckPhd`/`Validate`-shaped proofs.
//! - [`transcript`] — an out-of-circuit Fiat–Shamir transcript for
//!   integrators layering an outer protocol session on top; not used by
//!   [`schema`] itself, whose merge challenges are derived in-circuit.
//! - [`error`] — the two error layers: witness-time [`error::SchemaError`]
//!   and constraint-time [`error::CsError`].
//!
//! ## Invariants
//!
//! - **Field.** All arithmetic is over [`F`] (`ark_bn254::Fr`). This crate
//!   forbids unsafe code throughout.
//! - **Dummy sentinel.** Every fixed-capacity list (a `VarString`'s unused
//!   tail, an unused publication/vaccine-dose/set-membership slot) pads with
//!   [`DUMMY`], never `0` — `0` is a legitimate byte value, so padding with
//!   it would make a real all-zero entry indistinguishable from an unused
//!   slot.
//! - **No retries, no recovery.** A failed assertion aborts proof
//!   construction with a typed error (spec.md §7); nothing in this crate
//!   retries or silently degrades.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

/// Field & constraint-system facade, plus the native eager-evaluation backend.
pub mod cs;
/// Prover-side deterministic witness helpers.
pub mod hints;
/// MiMC-Feistel cipher/hash, native and in-circuit.
pub mod mimc;
/// Small arithmetic gadgets shared across the rest of the crate.
pub mod gadgets;
/// Fixed-capacity string encoding and the randomized merge argument.
pub mod varstring;
/// Typed value tree and the `Encodable` trait.
pub mod value;
/// Canonical encoder from a `Value` tree to one `VarString`.
pub mod encoder;
/// Symmetric record encryption and key commitment.
pub mod cipher;
/// Append-only / range / set-membership / time-window / format gadgets.
pub mod policy;
/// Reference PhD-profile and COVID-record edit/validate circuits.
pub mod schema;
/// Out-of-circuit Fiat–Shamir transcript for outer protocol sessions.
pub mod transcript;
/// Shared witness-time and constraint-time error types.
pub mod error;
/// Tiny field-arithmetic helpers (`2^k`, `10^k`) shared by a few gadgets.
mod util;

/// Scalar field used across the crate (BN254).
pub type F = ark_bn254::Fr;

/// Sentinel value padding every fixed-capacity list past its real content
/// (`original_source/circuit/utils.go`'s `DUMMY` constant). Never a
/// reachable byte or digit value, so a padded slot can always be told apart
/// from real content.
pub const DUMMY: u64 = 10_000;
