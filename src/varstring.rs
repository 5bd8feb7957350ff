//! Variable-length string representation and the merge argument (spec.md
//! §4.5 / C5).
//!
//! A `VarString` of capacity `N` is `N + 1` circuit values: `[len, payload_1,
//! …, payload_N]`, where `payload_1..=len` holds the string's bytes and every
//! slot past `len` holds the [`DUMMY`] sentinel (`original_source/circuit/
//! utils.go`'s convention, also used for every other fixed-capacity list in
//! this crate — publications, vaccine doses, set-membership candidates).
//! [`legitimacy_check`] pins down that there is exactly one payload/dummy
//! boundary and it sits at `len`, so the encoding can't be gamed by a
//! dishonest prover scattering dummies through the payload.
//!
//! [`merge`] and [`batch_merge`] prove that one `VarString` is the ordered
//! concatenation of two (or more) others using a randomized multiset
//! argument: weight each byte by its claimed position, fold the weighted
//! terms through a random field element `r`, and check that the product over
//! the inputs equals the product over the claimed concatenation. `r` itself
//! is derived in-circuit via [`simple_hash`] over the very values being
//! compared, so the argument is self-contained — neither prover nor verifier
//! needs an external source of randomness (spec.md §9's first Open
//! Question: keep `r` in-circuit rather than reaching for
//! [`crate::transcript`]'s Fiat–Shamir transcript, which this crate reserves
//! for contexts with a genuine external protocol transcript to bind into).

#![forbid(unsafe_code)]

use crate::cs::ConstraintSystem;
use crate::error::CsError;
use crate::gadgets::{is_dummy, is_not_dummy};
use crate::hints::HintId;
use crate::util::pow2_f;
use crate::{DUMMY, F};

/// A `VarString` is just `N + 1` circuit values; callers pass `&[C::Var]`
/// directly rather than going through a wrapper, since every gadget here
/// only ever needs a slice view. This alias documents the shape.
pub type VarString<V> = Vec<V>;

/// Build a `VarString` of the given `capacity` from an ASCII `s` (used by
/// [`crate::schema`] to turn native strings — keys, statuses, vaccine names —
/// into witness values).
pub fn to_varstring<C: ConstraintSystem>(
    cs: &mut C,
    s: &str,
    capacity: usize,
) -> Result<VarString<C::Var>, crate::error::SchemaError> {
    use crate::error::SchemaError;
    if !s.is_ascii() {
        return Err(SchemaError::InvariantViolated { where_: "to_varstring: non-ASCII input" });
    }
    if s.len() > capacity {
        return Err(SchemaError::CapacityExceeded { len: s.len(), capacity });
    }
    let mut out = Vec::with_capacity(capacity + 1);
    out.push(cs.constant(F::from(s.len() as u64)));
    for b in s.bytes() {
        out.push(cs.constant(F::from(b as u64)));
    }
    for _ in s.len()..capacity {
        out.push(cs.constant(F::from(DUMMY)));
    }
    Ok(out)
}

/// `legitimacyCheck`: assert `s` has exactly one payload/dummy boundary and
/// it sits at `s[0]` (the declared length).
///
/// For each payload slot `i` (1-indexed), define `c_i := isDummy(s[i]) ?
/// (i - len) : (len - i)`. Reading `c` left to right, every step before the
/// boundary must decrease by `1` and every step from the boundary onward
/// must increase by `1` — which is only possible if the dummy run is a
/// single contiguous suffix starting exactly at `len`.
pub fn legitimacy_check<C: ConstraintSystem>(cs: &mut C, s: &[C::Var]) -> Result<(), CsError> {
    let len = s[0].clone();
    let max_len = s.len() - 1;
    let mut reach_end = cs.zero();
    let mut has_zero = cs.zero();
    let mut all_valid = cs.zero();
    let mut c: Vec<C::Var> = Vec::with_capacity(max_len);

    for i in 0..max_len {
        let is_d = is_dummy(cs, &s[i + 1]);
        reach_end = cs.or(&reach_end, &is_d);
        let ip1 = cs.constant(F::from((i + 1) as u64));
        let forward = cs.sub(&ip1, &len);
        let backward = cs.sub(&len, &ip1);
        let ci = cs.select(&is_d, &forward, &backward);
        let iz = cs.is_zero(&ci);
        has_zero = cs.add(&has_zero, &iz);
        if i > 0 {
            let one = cs.one();
            let plus_one = cs.add(&c[i - 1], &one);
            let minus_one = cs.sub(&c[i - 1], &one);
            use crate::gadgets::is_equal;
            let eq_plus = is_equal(cs, &ci, &plus_one);
            let eq_minus = is_equal(cs, &ci, &minus_one);
            let valid = cs.select(&reach_end, &eq_plus, &eq_minus);
            all_valid = cs.add(&all_valid, &valid);
        }
        c.push(ci);
    }

    let expect = cs.constant(F::from(max_len.saturating_sub(1) as u64));
    cs.assert_eq(&all_valid, &expect, "legitimacy_check: adjacency pattern")?;

    let len_is_zero = cs.is_zero(&len);
    let one = cs.one();
    let zero = cs.zero();
    let has_or_empty = cs.or(&has_zero, &len_is_zero);
    cs.assert_eq(&has_or_empty, &one, "legitimacy_check: exactly one boundary, or the string is empty")?;
    let has_and_empty = cs.and(&has_zero, &len_is_zero);
    cs.assert_eq(&has_and_empty, &zero, "legitimacy_check: boundary and emptiness are exclusive")
}

/// `rangeCheckString`: every payload byte is either an actual byte (`< 256`)
/// or the dummy sentinel.
pub fn range_check_string<C: ConstraintSystem>(cs: &mut C, s: &[C::Var]) -> Result<(), CsError> {
    use crate::gadgets::within_binary;
    let max_len = s.len() - 1;
    let mut all_valid = cs.zero();
    for byte in &s[1..] {
        let in_range = within_binary(cs, byte, 8)?;
        let dummy = is_dummy(cs, byte);
        let ok = cs.add(&in_range, &dummy);
        all_valid = cs.add(&all_valid, &ok);
    }
    let expect = cs.constant(F::from(max_len as u64));
    cs.assert_eq(&all_valid, &expect, "range_check_string: byte out of range")
}

/// Balanced binary product tree; `batch_mul(&[])` is `1` (the empty
/// product), matching the identity the multiset argument relies on when one
/// side of a merge has zero capacity.
pub fn batch_mul<C: ConstraintSystem>(cs: &mut C, items: &[C::Var]) -> C::Var {
    if items.is_empty() {
        return cs.one();
    }
    let mut cur = items.to_vec();
    while cur.len() > 1 {
        let next_len = cur.len().div_ceil(2);
        let mut next = Vec::with_capacity(next_len);
        let mut it = cur.chunks(2);
        while let Some(pair) = it.next() {
            if pair.len() == 2 {
                next.push(cs.mul(&pair[0], &pair[1]));
            } else {
                next.push(pair[0].clone());
            }
        }
        cur = next;
    }
    cur.into_iter().next().expect("non-empty after loop")
}

/// Pack `items` into field elements at `item_bit` bits per slot (masking
/// dummies to `0` first so padding never perturbs the packed value), then
/// fold the packed elements through [`mimc_binary_tree`]. This is the
/// `simpleHash` of `original_source/circuit/utils.go`: a cheap, circuit-only
/// commitment to an ordered list, used solely to derive the merge argument's
/// challenge `r`.
pub fn simple_hash<C: ConstraintSystem>(cs: &mut C, items: &[C::Var], item_bit: usize) -> C::Var {
    let packed = merge_items(cs, items, item_bit);
    mimc_binary_tree(cs, &packed)
}

/// Pack `items` at `item_bit` bits per slot, `rate = 253 / item_bit` items
/// per output element (253 rather than the field's full bit width, leaving
/// headroom below the BN254 scalar modulus so the packed value never wraps).
pub fn merge_items<C: ConstraintSystem>(cs: &mut C, items: &[C::Var], item_bit: usize) -> Vec<C::Var> {
    let rate = (253 / item_bit).max(1);
    let chunks = items.len().div_ceil(rate).max(1);
    let mut out = Vec::with_capacity(chunks);
    for chunk_idx in 0..chunks {
        let mut acc = cs.zero();
        for j in 0..rate {
            let k = chunk_idx * rate + j;
            if k >= items.len() {
                break;
            }
            let d = is_dummy(cs, &items[k]);
            let zero = cs.zero();
            let masked = cs.select(&d, &zero, &items[k]);
            let coeff = cs.constant(pow2_f(j * item_bit));
            let term = cs.mul(&masked, &coeff);
            acc = cs.add(&acc, &term);
        }
        out.push(acc);
    }
    out
}

/// Fold a list of field elements through [`crate::mimc::CircuitMimc`] as a
/// binary tree of two-to-one compressions, so the result depends on every
/// input regardless of list length.
pub fn mimc_binary_tree<C: ConstraintSystem>(cs: &mut C, items: &[C::Var]) -> C::Var {
    if items.is_empty() {
        return cs.zero();
    }
    let mut cur = items.to_vec();
    while cur.len() > 1 {
        let next_len = cur.len().div_ceil(2);
        let mut next = Vec::with_capacity(next_len);
        let mut i = 0;
        while i < cur.len() {
            if i + 1 < cur.len() {
                let h = crate::mimc::CircuitMimc::encrypt_block(cs, &cur[i], &cur[i + 1]);
                let combined = cs.add(&h, &cur[i]);
                next.push(combined);
                i += 2;
            } else {
                next.push(cur[i].clone());
                i += 1;
            }
        }
        cur = next;
    }
    cur.into_iter().next().expect("non-empty after loop")
}

fn weighted_mul_terms<C: ConstraintSystem>(
    cs: &mut C,
    payload: &[C::Var],
    start_offset: &C::Var,
    r: &C::Var,
) -> Vec<C::Var> {
    let mut out = Vec::with_capacity(payload.len());
    for (j, byte) in payload.iter().enumerate() {
        let off = cs.constant(F::from((j + 1) as u64));
        let pos = cs.add(start_offset, &off);
        let base = cs.constant(F::from(256u64));
        let idx = cs.mul(&base, &pos);
        let weighted = cs.add(&idx, byte);
        let nd = is_not_dummy(cs, byte);
        let term = cs.mul(&weighted, &nd);
        out.push(cs.sub(r, &term));
    }
    out
}

/// `merge(a, b) -> c`: prove `c` is the concatenation `a ++ b` of two
/// `VarString`s.
///
/// Checks, in order: (1) `c`'s declared length is `a`'s plus `b`'s; (2)
/// every `c` byte is range-valid; (3) the multiset `{(pos, byte) : byte in
/// a} ∪ {(pos, byte) : byte in b}` equals `{(pos, byte) : byte in c}`, where
/// `pos` is counted from `1` within `a`/`b` and offset by `a.len` within
/// `c`'s second half — proven by folding `r - (256*pos + byte)` (dummies
/// masked to the multiplicative identity) through [`batch_mul`] on both
/// sides and asserting the products agree.
pub fn merge<C: ConstraintSystem>(cs: &mut C, a: &[C::Var], b: &[C::Var]) -> Result<Vec<C::Var>, CsError> {
    let n1 = a.len() - 1;
    let n2 = b.len() - 1;
    let n1f = cs.constant(F::from(n1 as u64));
    let n2f = cs.constant(F::from(n2 as u64));
    let mut hint_inputs = vec![n1f, n2f];
    hint_inputs.extend(a.iter().cloned());
    hint_inputs.extend(b.iter().cloned());
    let c = cs.hint(HintId::Merge, &hint_inputs)?;

    let sum_len = cs.add(&a[0], &b[0]);
    cs.assert_eq(&c[0], &sum_len, "merge: concatenated length")?;
    range_check_string(cs, &c)?;

    let mut absorb = c.clone();
    absorb.extend(a.iter().cloned());
    absorb.extend(b.iter().cloned());
    let r = simple_hash(cs, &absorb, 8);

    let zero = cs.zero();
    let a_terms = weighted_mul_terms(cs, &a[1..], &zero, &r);
    let b_terms = weighted_mul_terms(cs, &b[1..], &a[0], &r);
    let c_terms = weighted_mul_terms(cs, &c[1..], &zero, &r);

    let lhs_a = batch_mul(cs, &a_terms);
    let lhs_b = batch_mul(cs, &b_terms);
    let lhs = cs.mul(&lhs_a, &lhs_b);
    let rhs = batch_mul(cs, &c_terms);
    cs.assert_eq(&lhs, &rhs, "merge: multiset argument")?;
    Ok(c)
}

/// `batchMerge(strings) -> c`: the `k`-way generalization of [`merge`],
/// concatenating every `VarString` in `strings` in order.
pub fn batch_merge<C: ConstraintSystem>(cs: &mut C, strings: &[Vec<C::Var>]) -> Result<Vec<C::Var>, CsError> {
    let k = strings.len();
    let mut hint_inputs = vec![cs.constant(F::from(k as u64))];
    for s in strings {
        hint_inputs.push(cs.constant(F::from((s.len() - 1) as u64)));
    }
    for s in strings {
        hint_inputs.extend(s.iter().cloned());
    }
    let c = cs.hint(HintId::BatchMerge, &hint_inputs)?;

    let mut sum_len = cs.zero();
    for s in strings {
        sum_len = cs.add(&sum_len, &s[0]);
    }
    cs.assert_eq(&c[0], &sum_len, "batch_merge: concatenated length")?;
    range_check_string(cs, &c)?;

    let mut absorb = Vec::new();
    for s in strings {
        absorb.extend(s.iter().cloned());
    }
    absorb.extend(c.iter().cloned());
    let r = simple_hash(cs, &absorb, 8);

    let mut input_terms = Vec::new();
    let mut cum_len = cs.zero();
    for s in strings {
        input_terms.extend(weighted_mul_terms(cs, &s[1..], &cum_len, &r));
        cum_len = cs.add(&cum_len, &s[0]);
    }
    let zero = cs.zero();
    let c_terms = weighted_mul_terms(cs, &c[1..], &zero, &r);

    let lhs = batch_mul(cs, &input_terms);
    let rhs = batch_mul(cs, &c_terms);
    cs.assert_eq(&lhs, &rhs, "batch_merge: multiset argument")?;
    Ok(c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cs::NativeCs;

    fn vs(cs: &mut NativeCs, s: &str, capacity: usize) -> VarString<F> {
        to_varstring(cs, s, capacity).unwrap()
    }

    #[test]
    fn legitimacy_check_accepts_well_formed_string() {
        let mut cs = NativeCs;
        let s = vs(&mut cs, "ab", 5);
        legitimacy_check(&mut cs, &s).unwrap();
    }

    #[test]
    fn legitimacy_check_accepts_empty_string() {
        let mut cs = NativeCs;
        let s = vs(&mut cs, "", 4);
        legitimacy_check(&mut cs, &s).unwrap();
    }

    #[test]
    fn legitimacy_check_accepts_full_string() {
        let mut cs = NativeCs;
        let s = vs(&mut cs, "abcd", 4);
        legitimacy_check(&mut cs, &s).unwrap();
    }

    #[test]
    fn legitimacy_check_rejects_scattered_dummy() {
        let mut cs = NativeCs;
        let mut s = vs(&mut cs, "abc", 5);
        // Poke a dummy into the middle of the payload, breaking contiguity.
        s[2] = cs.constant(F::from(DUMMY));
        assert!(legitimacy_check(&mut cs, &s).is_err());
    }

    #[test]
    fn range_check_string_rejects_out_of_range_byte() {
        let mut cs = NativeCs;
        let mut s = vs(&mut cs, "ab", 4);
        s[1] = cs.constant(F::from(300u64));
        assert!(range_check_string(&mut cs, &s).is_err());
    }

    #[test]
    fn batch_mul_matches_plain_product() {
        let mut cs = NativeCs;
        let items: Vec<F> = [2u64, 3, 5, 7, 11].iter().map(|x| cs.constant(F::from(*x))).collect();
        let expect = F::from(2u64 * 3 * 5 * 7 * 11);
        assert_eq!(batch_mul(&mut cs, &items), expect);
        assert_eq!(batch_mul(&mut cs, &[]), F::from(1u64));
    }

    #[test]
    fn merge_concatenates_and_verifies() {
        let mut cs = NativeCs;
        let a = vs(&mut cs, "ab", 4);
        let b = vs(&mut cs, "cd", 3);
        let c = merge(&mut cs, &a, &b).unwrap();
        assert_eq!(c[0], F::from(4u64));
        assert_eq!(c[1], F::from(b'a' as u64));
        assert_eq!(c[2], F::from(b'b' as u64));
        assert_eq!(c[3], F::from(b'c' as u64));
        assert_eq!(c[4], F::from(b'd' as u64));
        legitimacy_check(&mut cs, &c).unwrap();
    }

    #[test]
    fn merge_handles_empty_left_operand() {
        let mut cs = NativeCs;
        let a = vs(&mut cs, "", 0);
        let b = vs(&mut cs, "xy", 2);
        let c = merge(&mut cs, &a, &b).unwrap();
        assert_eq!(c[0], F::from(2u64));
        assert_eq!(c[1], F::from(b'x' as u64));
        assert_eq!(c[2], F::from(b'y' as u64));
    }

    #[test]
    fn batch_merge_concatenates_three_strings_in_order() {
        let mut cs = NativeCs;
        let s1 = vs(&mut cs, "a", 2);
        let s2 = vs(&mut cs, "", 1);
        let s3 = vs(&mut cs, "bc", 2);
        let c = batch_merge(&mut cs, &[s1, s2, s3]).unwrap();
        assert_eq!(c[0], F::from(3u64));
        assert_eq!(c[1], F::from(b'a' as u64));
        assert_eq!(c[2], F::from(b'b' as u64));
        assert_eq!(c[3], F::from(b'c' as u64));
    }
}
