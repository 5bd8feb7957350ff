//! Low-level gadgets (spec.md §4.4 / C4).
//!
//! Everything here is generic over [`ConstraintSystem`] and built purely
//! from the facade's primitives plus [`crate::hints`] — no gadget owns or
//! inspects concrete field values directly, so the same code path exercises
//! [`crate::cs::NativeCs`] today and any future symbolic backend later.

#![forbid(unsafe_code)]

use crate::cs::ConstraintSystem;
use crate::error::CsError;
use crate::hints::HintId;
use crate::{DUMMY, F};

/// `isEqual(a,b) := isZero(a-b)`.
pub fn is_equal<C: ConstraintSystem>(cs: &mut C, a: &C::Var, b: &C::Var) -> C::Var {
    let d = cs.sub(a, b);
    cs.is_zero(&d)
}

/// `1` iff `a < b` (by integer representative, via [`ConstraintSystem::cmp`]).
pub fn is_less<C: ConstraintSystem>(cs: &mut C, a: &C::Var, b: &C::Var) -> C::Var {
    let c = cs.cmp(a, b);
    let neg_one = cs.constant(-F::from(1u64));
    is_equal(cs, &c, &neg_one)
}

/// `1` iff `a > b`.
pub fn is_greater<C: ConstraintSystem>(cs: &mut C, a: &C::Var, b: &C::Var) -> C::Var {
    let c = cs.cmp(a, b);
    let one = cs.one();
    is_equal(cs, &c, &one)
}

/// `1` iff `a <= b`.
pub fn is_less_or_equal<C: ConstraintSystem>(cs: &mut C, a: &C::Var, b: &C::Var) -> C::Var {
    let gt = is_greater(cs, a, b);
    bool_neg(cs, &gt)
}

/// Boolean negation: `1 - x`.
pub fn bool_neg<C: ConstraintSystem>(cs: &mut C, x: &C::Var) -> C::Var {
    let one = cs.one();
    cs.sub(&one, x)
}

/// `1` iff `x` equals the [`DUMMY`] sentinel.
pub fn is_dummy<C: ConstraintSystem>(cs: &mut C, x: &C::Var) -> C::Var {
    let dummy = cs.constant(F::from(DUMMY));
    is_equal(cs, x, &dummy)
}

/// `1` iff `x` does not equal the [`DUMMY`] sentinel.
pub fn is_not_dummy<C: ConstraintSystem>(cs: &mut C, x: &C::Var) -> C::Var {
    let d = is_dummy(cs, x);
    bool_neg(cs, &d)
}

/// `withinBinary(v, n)`: request an `n`-bit decomposition via the
/// [`HintId::Bits`] hint, assert every returned bit is boolean (a hard
/// constraint), and return the *soft* predicate "the weighted sum
/// reconstructs `v`" (i.e. `v < 2^n`). Unlike [`ConstraintSystem::to_bits`],
/// a mismatch here does not abort — callers fold the result into a larger
/// arithmetic conjunction (see [`crate::encoder::encode_number`]).
pub fn within_binary<C: ConstraintSystem>(cs: &mut C, v: &C::Var, n: usize) -> Result<C::Var, CsError> {
    let nf = cs.constant(F::from(n as u64));
    let bits = cs.hint(HintId::Bits, &[nf, v.clone()])?;
    let mut sum = cs.zero();
    let mut coeff = F::from(1u64);
    for b in &bits {
        cs.assert_boolean(b, "within_binary: hinted bit must be boolean")?;
        let cvar = cs.constant(coeff);
        let term = cs.mul(b, &cvar);
        sum = cs.add(&sum, &term);
        coeff *= F::from(2u64);
    }
    Ok(is_equal(cs, &sum, v))
}

/// `iDivModBit(a, b)`: hint-divide `a` by `2^b`, hard-range-check the
/// remainder to `b` bits, and assert the reconstruction `q*2^b + r = a`.
pub fn i_div_mod_bit<C: ConstraintSystem>(cs: &mut C, a: &C::Var, b: usize) -> Result<(C::Var, C::Var), CsError> {
    debug_assert!(b < 128, "i_div_mod_bit: divisor exponent too large");
    let modulus = cs.constant(F::from(1u128 << b));
    let rets = cs.hint(HintId::IDiv, &[a.clone(), modulus.clone()])?;
    if rets.len() != 2 {
        return Err(CsError::HintArity { hint: HintId::IDiv, what: "outputs", expected: 2, got: rets.len() });
    }
    let (q, r) = (rets[0].clone(), rets[1].clone());
    let _ = cs.to_bits(&r, b)?;
    let qm = cs.mul(&modulus, &q);
    let recon = cs.add(&qm, &r);
    cs.assert_eq(&recon, a, "i_div_mod_bit: reconstruction")?;
    Ok((q, r))
}

/// `multiplexer(inputs, index)`: pad `inputs` to the next power-of-two
/// length `2^L`, reduce `index` modulo `2^L` (to stay in range regardless of
/// how `index` was derived), and walk a balanced `Select` tree keyed by the
/// low-`L` bits of the reduced index.
pub fn multiplexer<C: ConstraintSystem>(cs: &mut C, inputs: &[C::Var], index: &C::Var) -> Result<C::Var, CsError> {
    let len = inputs.len().max(1);
    let mut l = 0usize;
    while (1usize << l) < len {
        l += 1;
    }
    let size = 1usize << l;

    let mut res: Vec<C::Var> = inputs.to_vec();
    let zero = cs.zero();
    res.resize(size, zero);

    let (_, idx_mod) = i_div_mod_bit(cs, index, l)?;
    let idx_bits = cs.to_bits(&idx_mod, l)?;

    for bit in idx_bits.iter().take(l) {
        let half = res.len() / 2;
        let mut next = Vec::with_capacity(half);
        for j in 0..half {
            next.push(cs.select(bit, &res[2 * j + 1], &res[2 * j]));
        }
        res = next;
    }
    Ok(res.into_iter().next().expect("size >= 1"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cs::NativeCs;

    #[test]
    fn ordering_gadgets_agree_with_integers() {
        let mut cs = NativeCs;
        let (a, b) = (cs.constant(F::from(3u64)), cs.constant(F::from(5u64)));
        assert_eq!(is_less(&mut cs, &a, &b), F::from(1u64));
        assert_eq!(is_greater(&mut cs, &a, &b), F::from(0u64));
        assert_eq!(is_less_or_equal(&mut cs, &a, &b), F::from(1u64));
        assert_eq!(is_less_or_equal(&mut cs, &b, &a), F::from(0u64));
        assert_eq!(is_less_or_equal(&mut cs, &a, &a), F::from(1u64));
    }

    #[test]
    fn dummy_predicates() {
        let mut cs = NativeCs;
        let d = cs.constant(F::from(DUMMY));
        let v = cs.constant(F::from(42u64));
        assert_eq!(is_dummy(&mut cs, &d), F::from(1u64));
        assert_eq!(is_dummy(&mut cs, &v), F::from(0u64));
        assert_eq!(is_not_dummy(&mut cs, &v), F::from(1u64));
    }

    #[test]
    fn within_binary_accepts_and_rejects() {
        let mut cs = NativeCs;
        let v = cs.constant(F::from(7u64));
        assert_eq!(within_binary(&mut cs, &v, 3).unwrap(), F::from(1u64));
        assert_eq!(within_binary(&mut cs, &v, 2).unwrap(), F::from(0u64));
    }

    #[test]
    fn i_div_mod_bit_reconstructs() {
        let mut cs = NativeCs;
        let a = cs.constant(F::from(13u64));
        let (q, r) = i_div_mod_bit(&mut cs, &a, 2).unwrap();
        assert_eq!(q, F::from(3u64));
        assert_eq!(r, F::from(1u64));
    }

    #[test]
    fn multiplexer_selects_by_index() {
        let mut cs = NativeCs;
        let inputs: Vec<F> = (0..5).map(|i| cs.constant(F::from(100 + i))).collect();
        for i in 0..5u64 {
            let idx = cs.constant(F::from(i));
            assert_eq!(multiplexer(&mut cs, &inputs, &idx).unwrap(), F::from(100 + i));
        }
    }
}
