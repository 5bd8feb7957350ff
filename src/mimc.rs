//! MiMC-Feistel primitive (spec.md §4.2 / C2).
//!
//! Round constants are derived once, process-wide, from the ASCII seed
//! `"seed"` by iterated legacy Keccak-256 (`sha3::Keccak256`, matching
//! `golang.org/x/crypto/sha3.NewLegacyKeccak256` in
//! `original_source/circuit/bigIntMiMC.go`) — *not* the teacher's BLAKE3,
//! because the round constants must land inside the scalar field the same
//! way on both the native and in-circuit sides (spec.md §4.2's bridge
//! invariant), and the original fixes Keccak-256 for that derivation.
//!
//! The block function and the Miyaguchi–Preneel hash mode are implemented
//! twice: once over concrete `F` values ([`encrypt`], [`Hasher`]) for
//! [`crate::cipher::compress`]/[`commit_key`](crate::cipher::commit_key),
//! and once generically over any [`ConstraintSystem`] ([`CircuitMimc`]) for
//! in-circuit use. Both share the same constants table and the same
//! algebra, which is exactly what makes them provably equal (spec.md §8's
//! MiMC native/circuit parity property).

#![forbid(unsafe_code)]

use std::sync::OnceLock;

use ark_ff::PrimeField;
use sha3::{Digest, Keccak256};

use crate::cs::ConstraintSystem;
use crate::F;

/// Number of MiMC-Feistel rounds.
pub const ROUNDS: usize = 91;
/// Block size (bytes) consumed by one Miyaguchi–Preneel update, equal to
/// the byte width of a canonical `F` encoding.
pub const BLOCK_SIZE: usize = 32;

const SEED: &[u8] = b"seed";

fn round_constants() -> &'static [F; ROUNDS] {
    static CONSTANTS: OnceLock<[F; ROUNDS]> = OnceLock::new();
    CONSTANTS.get_or_init(|| {
        let mut out = [F::from(0u64); ROUNDS];
        let mut rnd: [u8; 32] = {
            let mut h = Keccak256::new();
            h.update(SEED);
            h.finalize().into()
        };
        for slot in out.iter_mut() {
            let mut h = Keccak256::new();
            h.update(rnd);
            rnd = h.finalize().into();
            *slot = F::from_be_bytes_mod_order(&rnd);
        }
        out
    })
}

/// Native block cipher: `x := m`; for each round constant `c_i`, `x := (x +
/// k + c_i)^5`; return `x + k`.
pub fn encrypt(key: F, msg: F) -> F {
    let mut x = msg;
    for c in round_constants() {
        let t = x + key + c;
        x = t * t * t * t * t;
    }
    x + key
}

/// Native Miyaguchi–Preneel hash over a byte buffer (spec.md §4.2).
///
/// Padding rule for a buffer of length `len` not a multiple of
/// [`BLOCK_SIZE`]: the quotient part is zero-padded up to the next multiple
/// of [`BLOCK_SIZE`] and the remainder bytes are appended after that padding
/// (so the tail bytes stay at the end of their block). An empty input is
/// treated as 32 zero bytes.
pub fn hash(data: &[u8]) -> F {
    let padded = pad_to_block(data);
    let mut h = F::from(0u64);
    for chunk in padded.chunks(BLOCK_SIZE) {
        let x = F::from_be_bytes_mod_order(chunk);
        let r = encrypt(h, x);
        h = r + h + x;
    }
    h
}

fn pad_to_block(data: &[u8]) -> Vec<u8> {
    if data.is_empty() {
        return vec![0u8; BLOCK_SIZE];
    }
    if data.len() % BLOCK_SIZE == 0 {
        return data.to_vec();
    }
    let q = data.len() / BLOCK_SIZE;
    let r = data.len() % BLOCK_SIZE;
    let mut out = Vec::with_capacity((q + 1) * BLOCK_SIZE);
    out.extend_from_slice(&data[..q * BLOCK_SIZE]);
    out.extend(std::iter::repeat(0u8).take(BLOCK_SIZE - r));
    out.extend_from_slice(&data[q * BLOCK_SIZE..]);
    out
}

/// In-circuit MiMC hash/encryption, generic over any [`ConstraintSystem`].
///
/// Mirrors [`encrypt`]/[`hash`] gate-for-gate so that a native ciphertext
/// computed by the prover satisfies the in-circuit equality check
/// (spec.md §4.2's rationale).
pub struct CircuitMimc<'c, C: ConstraintSystem> {
    cs: &'c mut C,
    key: C::Var,
    data: Vec<C::Var>,
}

impl<'c, C: ConstraintSystem> CircuitMimc<'c, C> {
    /// Create a hasher with running key `0` (the Miyaguchi–Preneel IV).
    pub fn new(cs: &'c mut C) -> Self {
        let key = cs.zero();
        Self { cs, key, data: Vec::new() }
    }

    /// Reset the running key to `0` and drop any buffered writes.
    pub fn reset(&mut self) {
        self.key = self.cs.zero();
        self.data.clear();
    }

    /// Buffer additional field elements to be absorbed by [`Self::sum`].
    pub fn write(&mut self, vars: impl IntoIterator<Item = C::Var>) {
        self.data.extend(vars);
    }

    /// One MiMC block encryption of `msg` under `key` (round constants
    /// shared with the native side).
    pub fn encrypt_block(cs: &mut C, key: &C::Var, msg: &C::Var) -> C::Var {
        let mut x = msg.clone();
        for c in round_constants() {
            let cc = cs.constant(*c);
            let sum = cs.add(&x, key);
            let t = cs.add(&sum, &cc);
            let t2 = cs.mul(&t, &t);
            let t4 = cs.mul(&t2, &t2);
            x = cs.mul(&t4, &t);
        }
        cs.add(&x, key)
    }

    /// Absorb every buffered element via Miyaguchi–Preneel and return the
    /// running digest, flushing the buffer (mirrors the teacher's
    /// transcript-style `Write`/`Sum` split).
    pub fn sum(&mut self) -> C::Var {
        for item in self.data.drain(..) {
            let r = Self::encrypt_block(self.cs, &self.key, &item);
            let t = self.cs.add(&r, &self.key);
            self.key = self.cs.add(&t, &item);
        }
        self.key.clone()
    }
}

/// Commit to a key: MiMC hash of the key bytes, left-zero-padded to 32 bytes
/// (the single-block case of [`hash`], matching `CommitMiMC` in
/// `original_source/circuit/utils.go`).
///
/// Keys longer than 32 bytes are rejected by the caller
/// ([`crate::cipher::commit_key`]) before this is reached.
pub fn commit_key_bytes(key_be: &[u8]) -> F {
    debug_assert!(key_be.len() <= BLOCK_SIZE);
    let mut buf = vec![0u8; BLOCK_SIZE - key_be.len()];
    buf.extend_from_slice(key_be);
    hash(&buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cs::NativeCs;

    /// Scenario 1 (spec.md §8): key = 1111, msg = 2222, native and in-circuit
    /// encryptions agree.
    #[test]
    fn native_and_circuit_encryption_agree() {
        let key = F::from(1111u64);
        let msg = F::from(2222u64);
        let native = encrypt(key, msg);

        let mut cs = NativeCs;
        let ck = cs.constant(key);
        let cm = cs.constant(msg);
        let circuit = CircuitMimc::encrypt_block(&mut cs, &ck, &cm);
        assert_eq!(native, circuit);
    }

    #[test]
    fn hash_matches_circuit_sum_over_multiple_blocks() {
        let mut cs = NativeCs;
        let msgs = [F::from(10u64), F::from(20u64), F::from(30u64)];

        let mut native_h = F::from(0u64);
        for m in msgs {
            let r = encrypt(native_h, m);
            native_h = r + native_h + m;
        }

        let mut circuit = CircuitMimc::new(&mut cs);
        circuit.write(msgs.iter().map(|m| *m));
        let circuit_h = circuit.sum();
        assert_eq!(native_h, circuit_h);
    }

    #[test]
    fn empty_input_hashes_as_32_zero_bytes() {
        assert_eq!(hash(&[]), hash(&[0u8; 32]));
    }

    #[test]
    fn padding_keeps_tail_bytes_at_block_end() {
        let mut data = vec![0xAFu8, 0x80];
        let direct = pad_to_block(&data);
        assert_eq!(direct.len(), 32);
        assert_eq!(&direct[30..], &[0xAF, 0x80]);
        data.clear();
    }
}
