//! Out-of-circuit Fiat–Shamir transcript (domain-separated, BLAKE3-based).
//!
//! Everything in [`crate::varstring`]'s merge argument derives its challenge
//! `r` *inside* the circuit, via [`crate::varstring::simple_hash`] folding
//! the very values being compared (spec.md §9's first Open Question) — so a
//! verifier never needs to see an external transcript to check a merge. This
//! module exists for the other side of that tradeoff: a caller who wants to
//! bind several already-proven records together into one outer protocol
//! session (e.g. deriving a single challenge that ties a key commitment to a
//! particular ciphertext before handing both to a verifier) has a genuine
//! external transcript, and should use this rather than inventing an ad hoc
//! hash. Nothing in [`crate::schema`] calls into this module; it is provided
//! for integrators layering a session protocol on top of the core gadgets.
//!
//! Labels are **stable**: changing a label changes every challenge derived
//! under it. Adding a new [`FsLabel`] variant is backward compatible;
//! reordering or renaming an existing one is not.
//!
//! ```
//! use zk_record_policy::transcript::{Transcript, FsLabel};
//!
//! let mut t1 = Transcript::new("example");
//! t1.absorb_bytes_l(FsLabel::KeyCommitment, b"commitment bytes");
//! let a = t1.challenge_f_l(FsLabel::MergeChallenge);
//!
//! let mut t2 = Transcript::new("example");
//! t2.absorb_bytes_l(FsLabel::RecordCiphertext, b"commitment bytes");
//! let b = t2.challenge_f_l(FsLabel::MergeChallenge);
//!
//! assert_ne!(a, b);
//! ```

#![forbid(unsafe_code)]

use std::io::Read;

use ark_ff::PrimeField;
use ark_serialize::CanonicalSerialize;
use blake3::Hasher;

use crate::F;

/// Canonical labels to avoid typos across prover/verifier call sites.
#[derive(Clone, Copy, Debug)]
pub enum FsLabel {
    /// A key commitment, as produced by [`crate::cipher::commit_key`].
    KeyCommitment,
    /// A record's ciphertext blocks, as produced by
    /// [`crate::cipher::encrypt_record_native`].
    RecordCiphertext,
    /// A schema identifier (e.g. which edit/validate circuit is in play).
    SchemaTag,
    /// The outer merge/session challenge derived from everything absorbed
    /// so far.
    MergeChallenge,
}

impl FsLabel {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            FsLabel::KeyCommitment => "key_commitment",
            FsLabel::RecordCiphertext => "record_ciphertext",
            FsLabel::SchemaTag => "schema_tag",
            FsLabel::MergeChallenge => "merge_challenge",
        }
    }
}

/// Fiat–Shamir transcript with domain separation (BLAKE3-based).
pub struct Transcript {
    /// Domain-separation label for this transcript instance.
    label: &'static str,
    /// Running hash state (BLAKE3).
    hasher: Hasher,
    /// Monotone counter for challenge derivations.
    ctr: u64,
}

impl Transcript {
    /// Create a new transcript with a domain-separation `label`.
    ///
    /// The label distinguishes independent FS domains (e.g., different
    /// protocol sessions using this crate concurrently).
    pub fn new(label: &'static str) -> Self {
        let mut hasher = Hasher::new();
        hasher.update(b"zk-record-policy.transcript.v1");
        hasher.update(label.as_bytes());
        Self { label, hasher, ctr: 0 }
    }

    /// Absorb an arbitrary byte slice with a label (enum).
    #[inline]
    pub fn absorb_bytes_l(&mut self, label: FsLabel, bytes: &[u8]) {
        self.absorb_bytes(label.as_str(), bytes)
    }

    /// Absorb an arbitrary byte slice with a label (length-delimited, so
    /// concatenating two absorbs can never be confused with one longer one).
    pub fn absorb_bytes(&mut self, label: &'static str, bytes: &[u8]) {
        self.hasher.update(b"item:");
        self.hasher.update(label.as_bytes());
        self.hasher.update(b":len:");
        self.hasher.update(&(bytes.len() as u64).to_be_bytes());
        self.hasher.update(b":data:");
        self.hasher.update(bytes);
    }

    /// Absorb a field element using compressed canonical serialization.
    #[inline]
    pub fn absorb_scalar_l(&mut self, label: FsLabel, f: &F) {
        let mut bytes = Vec::new();
        f.serialize_compressed(&mut bytes).expect("serialize field");
        self.absorb_bytes_l(label, &bytes);
    }

    /// Absorb a sequence of field elements as one length-delimited item —
    /// the shape of [`crate::cipher::encrypt_record_native`]'s ciphertext
    /// blocks or a [`crate::varstring::VarString`]'s byte buffer.
    pub fn absorb_scalars_l(&mut self, label: FsLabel, fs: &[F]) {
        let mut buf = Vec::with_capacity(fs.len() * 32);
        for f in fs {
            f.serialize_compressed(&mut buf).expect("serialize field");
        }
        self.absorb_bytes_l(label, &buf);
    }

    /// Derive a single field challenge (enum label).
    ///
    /// Internally this clones the running state and applies an XOF, so
    /// challenge derivation does not mutate the absorb state — only the
    /// derivation counter advances.
    #[inline]
    pub fn challenge_f_l(&mut self, label: FsLabel) -> F {
        self.challenge_f(label.as_str())
    }

    /// Derive a single field challenge (legacy string label).
    pub fn challenge_f(&mut self, label: &'static str) -> F {
        let out = hash_to_field(&self.hasher, self.label, label, self.ctr, 1);
        self.ctr = self.ctr.wrapping_add(1);
        out[0]
    }

    /// Derive `k` field challenges at once.
    pub fn challenge_points_l(&mut self, label: FsLabel, k: usize) -> Vec<F> {
        let out = hash_to_field(&self.hasher, self.label, label.as_str(), self.ctr, k);
        self.ctr = self.ctr.wrapping_add(1);
        out
    }
}

/// Derive `k` field elements from (a clone of) `base` using a fixed DST.
/// Cloning leaves the in-flight transcript state untouched, so challenge
/// derivation is a pure function of the absorb schedule and `(label, ctr)`.
fn hash_to_field(base: &Hasher, tlabel: &'static str, label: &'static str, ctr: u64, k: usize) -> Vec<F> {
    let mut h = base.clone();
    h.update(b"challenge:");
    h.update(b"zk-record-policy.v1");
    h.update(b":tlabel:");
    h.update(tlabel.as_bytes());
    h.update(b":label:");
    h.update(label.as_bytes());
    h.update(b":ctr:");
    h.update(&ctr.to_be_bytes());

    let mut xof = h.finalize_xof();
    let mut out = Vec::with_capacity(k);
    let mut buf = [0u8; 64];
    for _ in 0..k {
        let _ = xof.read(&mut buf);
        out.push(F::from_le_bytes_mod_order(&buf));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_absorbs_give_same_challenge() {
        let mut t1 = Transcript::new("session");
        t1.absorb_scalar_l(FsLabel::KeyCommitment, &F::from(7u64));
        let a = t1.challenge_f_l(FsLabel::MergeChallenge);

        let mut t2 = Transcript::new("session");
        t2.absorb_scalar_l(FsLabel::KeyCommitment, &F::from(7u64));
        let b = t2.challenge_f_l(FsLabel::MergeChallenge);

        assert_eq!(a, b);
    }

    #[test]
    fn different_labels_diverge() {
        let mut t1 = Transcript::new("session");
        t1.absorb_bytes_l(FsLabel::KeyCommitment, b"same bytes");
        let a = t1.challenge_f_l(FsLabel::MergeChallenge);

        let mut t2 = Transcript::new("session");
        t2.absorb_bytes_l(FsLabel::RecordCiphertext, b"same bytes");
        let b = t2.challenge_f_l(FsLabel::MergeChallenge);

        assert_ne!(a, b);
    }

    #[test]
    fn repeated_challenges_from_the_same_transcript_differ() {
        let mut t = Transcript::new("session");
        t.absorb_bytes_l(FsLabel::SchemaTag, b"phd-edit");
        let a = t.challenge_f_l(FsLabel::MergeChallenge);
        let b = t.challenge_f_l(FsLabel::MergeChallenge);
        assert_ne!(a, b);
    }
}
