//! Symmetric record encryption and key commitment (spec.md §4.8 / C8).
//!
//! A record's canonical byte encoding ([`crate::encoder::encode_value`]) is
//! packed into [`MERGE_LEN`]-byte blocks, **little-endian**, and each block
//! is run through the MiMC permutation keyed by the record's symmetric key
//! (`encyption.go`'s `compress` + `encrypt` in `original_source`). This is a
//! one-byte-narrower, opposite-endian convention from
//! [`crate::mimc`]'s own 32-byte big-endian hash blocks — the two must not
//! be confused, which is exactly why this module keeps its own `compress`
//! rather than reusing [`crate::mimc::hash`]'s padding.
//!
//! The key itself never appears in the clear anywhere a verifier can see:
//! only its MiMC commitment ([`commit_key`]) is ever exposed, so proving a
//! record was encrypted under "the same key as the commitment" is exactly
//! proving the in-circuit [`encrypt_record`] used the same key variable that
//! [`commit_key`]'s output was built from.

#![forbid(unsafe_code)]

use ark_ff::PrimeField;

use crate::cs::ConstraintSystem;
use crate::error::SchemaError;
use crate::gadgets::is_not_dummy;
use crate::mimc::{self, CircuitMimc};
use crate::util::pow2_f;
use crate::varstring::VarString;
use crate::F;

/// Plaintext bytes packed per field element (one byte of headroom below the
/// BN254 scalar field's 32-byte width, matching `MergeLen` in
/// `original_source/circuit/encyption.go`).
pub const MERGE_LEN: usize = 31;

/// Native little-endian block packing: `sum_i block[i] * 256^i`.
pub fn compress_native(block: &[u8]) -> F {
    debug_assert!(block.len() <= MERGE_LEN);
    let mut buf = block.to_vec();
    buf.resize(MERGE_LEN, 0);
    F::from_le_bytes_mod_order(&buf)
}

/// Native record encryption: chunk `plaintext` into [`MERGE_LEN`]-byte
/// blocks (the final block zero-padded) and run each through
/// [`mimc::encrypt`] under `key`.
pub fn encrypt_record_native(key: F, plaintext: &[u8]) -> Vec<F> {
    plaintext.chunks(MERGE_LEN).map(|chunk| mimc::encrypt(key, compress_native(chunk))).collect()
}

/// Lift a raw key (at most [`mimc::BLOCK_SIZE`] bytes, left-zero-padded like
/// [`mimc::commit_key_bytes`]) into the field element used as the MiMC key
/// on both the encryption and commitment sides — the two *must* agree for
/// [`commit_key`]'s output to authenticate [`encrypt_record`]'s key.
pub fn key_field(key: &[u8]) -> Result<F, SchemaError> {
    if key.len() > mimc::BLOCK_SIZE {
        return Err(SchemaError::KeyTooLong { len: key.len() });
    }
    let mut buf = vec![0u8; mimc::BLOCK_SIZE - key.len()];
    buf.extend_from_slice(key);
    Ok(F::from_be_bytes_mod_order(&buf))
}

/// Commit to a raw key: `MiMC(left-zero-padded key)`, matching `CommitMiMC`
/// in `original_source/circuit/utils.go`. Rejects keys that don't fit in one
/// 32-byte block.
pub fn commit_key(key: &[u8]) -> Result<F, SchemaError> {
    if key.len() > mimc::BLOCK_SIZE {
        return Err(SchemaError::KeyTooLong { len: key.len() });
    }
    Ok(mimc::commit_key_bytes(key))
}

/// In-circuit little-endian block packing, generic over any
/// [`ConstraintSystem`]. Skips `msg[0]` — the `VarString`'s declared length
/// — and walks `msg[1..]` in [`MERGE_LEN`]-byte windows (`compress` in
/// `original_source/circuit/encyption.go`, whose own comment reads
/// "Message[0] is the length of the whole message"). Each window's packed
/// value masks dummy-sentinel bytes to `0` on the fly (`2^(8j) * byte *
/// isNotDummy(byte)`), and the window's `is_dummy_block` flag is `1` iff
/// every byte in it was dummy — the signal [`encrypt_record`] uses to force
/// that block's ciphertext to `0` regardless of key.
pub fn compress<C: ConstraintSystem>(cs: &mut C, msg: &VarString<C::Var>) -> Vec<(C::Var, C::Var)> {
    let payload = &msg[1..];
    let mut out = Vec::with_capacity(payload.len().div_ceil(MERGE_LEN).max(1));
    for chunk in payload.chunks(MERGE_LEN) {
        let mut acc = cs.zero();
        let mut total_not_dummy = cs.zero();
        for (j, b) in chunk.iter().enumerate() {
            let nd = is_not_dummy(cs, b);
            total_not_dummy = cs.add(&total_not_dummy, &nd);
            let coeff = cs.constant(pow2_f(8 * j));
            let weighted = cs.mul(&coeff, b);
            let term = cs.mul(&weighted, &nd);
            acc = cs.add(&acc, &term);
        }
        let is_dummy_block = cs.is_zero(&total_not_dummy);
        out.push((acc, is_dummy_block));
    }
    out
}

/// Encrypt a canonically-encoded record (a `VarString`: `[len, payload…]`,
/// as returned by [`crate::encoder::encode_value`]) under `key`. Blocks
/// whose bytes are entirely [`crate::DUMMY`] padding are forced to
/// ciphertext `0` independent of `key` (spec.md §8's dummy-masking
/// property), matching `encrypt`'s `Select(isDummy[i], 0, …)` in
/// `original_source/circuit/encyption.go`.
pub fn encrypt_record<C: ConstraintSystem>(cs: &mut C, key: &C::Var, encoded: &VarString<C::Var>) -> Vec<C::Var> {
    compress(cs, encoded)
        .into_iter()
        .map(|(msg, is_dummy_block)| {
            let enc = CircuitMimc::encrypt_block(cs, key, &msg);
            let zero = cs.zero();
            cs.select(&is_dummy_block, &zero, &enc)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cs::NativeCs;

    #[test]
    fn compress_native_and_circuit_agree() {
        let mut cs = NativeCs;
        let block: Vec<u8> = (0..31u8).collect();
        let native = compress_native(&block);
        let mut msg = vec![cs.constant(F::from(31u64))];
        msg.extend(block.iter().map(|b| cs.constant(F::from(*b as u64))));
        let circuit = compress(&mut cs, &msg);
        assert_eq!(circuit.len(), 1);
        assert_eq!(native, circuit[0].0);
        assert_eq!(circuit[0].1, F::from(0u64));
    }

    #[test]
    fn key_field_rejects_oversized_keys() {
        let key = vec![0u8; 33];
        assert!(key_field(&key).is_err());
        assert!(commit_key(&key).is_err());
    }

    #[test]
    fn commit_key_is_deterministic_and_key_dependent() {
        let a = commit_key(b"my-secret-key").unwrap();
        let b = commit_key(b"my-secret-key").unwrap();
        let c = commit_key(b"another-key").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn native_and_circuit_record_encryption_agree() {
        let mut cs = NativeCs;
        let key_bytes = b"abc";
        let key = key_field(key_bytes).unwrap();
        let plaintext = b"hello, world! this spans more than one block of ciphertext.";

        let native_blocks = encrypt_record_native(key, plaintext);

        let key_var = cs.constant(key);
        let mut encoded = vec![cs.constant(F::from(plaintext.len() as u64))];
        encoded.extend(plaintext.iter().map(|b| cs.constant(F::from(*b as u64))));
        let circuit_blocks = encrypt_record(&mut cs, &key_var, &encoded);
        assert_eq!(native_blocks, circuit_blocks);
    }

    /// Scenario 6 (spec.md §8): a record whose payload is shorter than the
    /// reserved capacity produces ciphertext `0` in every trailing block,
    /// independent of the key.
    #[test]
    fn trailing_dummy_blocks_encrypt_to_zero_independent_of_key() {
        let mut cs = NativeCs;
        let real = b"short";
        let capacity = MERGE_LEN * 3; // reserve room for 3 blocks, use < 1.
        let mut encoded = vec![cs.constant(F::from(real.len() as u64))];
        encoded.extend(real.iter().map(|b| cs.constant(F::from(*b as u64))));
        for _ in real.len()..capacity {
            encoded.push(cs.constant(F::from(crate::DUMMY)));
        }

        for key_bytes in [&b"key-one"[..], &b"an entirely different key"[..]] {
            let key = key_field(key_bytes).unwrap();
            let key_var = cs.constant(key);
            let blocks = encrypt_record(&mut cs, &key_var, &encoded);
            assert_eq!(blocks.len(), 3);
            assert_ne!(blocks[0], F::from(0u64));
            assert_eq!(blocks[1], F::from(0u64));
            assert_eq!(blocks[2], F::from(0u64));
        }
    }
}
