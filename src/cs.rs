//! Field & constraint-system facade (spec.md §4.1 / C1).
//!
//! A narrow, backend-agnostic contract the rest of the core is built
//! against: arithmetic, equality/ordering, boolean select, bit
//! decomposition, an indexed 2-bit lookup, and the [`hints`](crate::hints)
//! escape hatch for prover-side witness helpers. Nothing in `gadgets.rs`,
//! `varstring.rs`, `encoder.rs`, `cipher.rs`, or `policy.rs` reaches past
//! this trait into a concrete representation — any type implementing
//! [`ConstraintSystem`] can evaluate them.
//!
//! The crate ships one implementation, [`NativeCs`]: an eager
//! witness-checking evaluator over concrete `F` values. Every gate computes
//! immediately and every assertion is checked on the spot, surfacing the
//! first disagreement as a [`CsError`] instead of silently emitting an
//! unsatisfiable constraint row. A real R1CS/Plonkish-emitting backend
//! (trusted setup, witness solving, Groth16 prover/verifier — out of scope
//! per spec.md §1) would implement the same trait over symbolic wires; it
//! must agree with `NativeCs` on every assertion for a satisfying witness.

#![forbid(unsafe_code)]

use std::cmp::Ordering;

use num_bigint::BigUint;
use num_traits::ToPrimitive;

use crate::error::CsError;
use crate::hints::{self, HintId};
use crate::F;

/// Backend-agnostic constraint-system facade (spec.md §4.1).
pub trait ConstraintSystem {
    /// The backend's representation of an in-circuit value.
    type Var: Clone + std::fmt::Debug;

    /// Lift a concrete field element into a circuit value.
    fn constant(&mut self, v: F) -> Self::Var;

    /// `0` as a circuit value.
    #[inline]
    fn zero(&mut self) -> Self::Var {
        self.constant(F::from(0u64))
    }

    /// `1` as a circuit value.
    #[inline]
    fn one(&mut self) -> Self::Var {
        self.constant(F::from(1u64))
    }

    /// `a + b`.
    fn add(&mut self, a: &Self::Var, b: &Self::Var) -> Self::Var;
    /// `a - b`.
    fn sub(&mut self, a: &Self::Var, b: &Self::Var) -> Self::Var;
    /// `a * b`.
    fn mul(&mut self, a: &Self::Var, b: &Self::Var) -> Self::Var;

    /// `-a`.
    #[inline]
    fn neg(&mut self, a: &Self::Var) -> Self::Var {
        let z = self.zero();
        self.sub(&z, a)
    }

    /// `cond ? a : b`. Callers are responsible for `cond` being boolean;
    /// like gnark's `api.Select`, this is an arithmetic identity
    /// (`b + cond*(a-b)`), not an assertion.
    fn select(&mut self, cond: &Self::Var, a: &Self::Var, b: &Self::Var) -> Self::Var {
        let diff = self.sub(a, b);
        let scaled = self.mul(cond, &diff);
        self.add(b, &scaled)
    }

    /// `1` if `a == 0` else `0`.
    fn is_zero(&mut self, a: &Self::Var) -> Self::Var;

    /// Boolean AND (assumes both operands are boolean).
    #[inline]
    fn and(&mut self, a: &Self::Var, b: &Self::Var) -> Self::Var {
        self.mul(a, b)
    }

    /// Boolean OR (assumes both operands are boolean).
    #[inline]
    fn or(&mut self, a: &Self::Var, b: &Self::Var) -> Self::Var {
        let ab = self.mul(a, b);
        let s = self.add(a, b);
        self.sub(&s, &ab)
    }

    /// Assert `a == b`, tagging the failure with a static, non-user-facing
    /// `context` describing which gadget raised it.
    fn assert_eq(&mut self, a: &Self::Var, b: &Self::Var, context: &'static str) -> Result<(), CsError>;

    /// Assert `a` is `0` or `1`.
    fn assert_boolean(&mut self, a: &Self::Var, context: &'static str) -> Result<(), CsError>;

    /// Hard bit decomposition: returns the `n`-bit little-endian
    /// decomposition of `a` and asserts that it reconstructs `a` exactly
    /// (i.e. `a < 2^n`). Unlike [`hints::bits`] alone, this is a forced
    /// guarantee (gnark's `api.ToBinary`), not a soft predicate — compare
    /// [`crate::gadgets::within_binary`], which wraps the same hint without
    /// asserting reconstruction.
    fn to_bits(&mut self, a: &Self::Var, n: usize) -> Result<Vec<Self::Var>, CsError>;

    /// `-1`, `0`, or `1` according to the canonical integer representatives
    /// of `a` and `b` (not field-wraparound order).
    fn cmp(&mut self, a: &Self::Var, b: &Self::Var) -> Self::Var;

    /// 2-bit indexed lookup: `i0` if `(b0,b1)=(0,0)`, `i1` if `(1,0)`, `i2`
    /// if `(0,1)`, `i3` if `(1,1)`.
    fn lookup2(
        &mut self,
        b0: &Self::Var,
        b1: &Self::Var,
        i0: &Self::Var,
        i1: &Self::Var,
        i2: &Self::Var,
        i3: &Self::Var,
    ) -> Self::Var {
        // Multilinear extension over the two selector bits.
        let d01 = self.sub(i1, i0);
        let d01b0 = self.mul(b0, &d01);
        let t0 = self.add(i0, &d01b0);

        let d23 = self.sub(i3, i2);
        let d23b0 = self.mul(b0, &d23);
        let t1 = self.add(i2, &d23b0);

        let dt = self.sub(&t1, &t0);
        let dtb1 = self.mul(b1, &dt);
        self.add(&t0, &dtb1)
    }

    /// Invoke a registered deterministic hint (spec.md §4.3). Packing
    /// conventions for each [`HintId`] are documented on the corresponding
    /// function in [`crate::hints`].
    fn hint(&mut self, id: HintId, inputs: &[Self::Var]) -> Result<Vec<Self::Var>, CsError>;
}

/// Eager witness-checking evaluator over concrete `F` values (see module docs).
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeCs;

#[inline]
fn f_to_biguint(v: F) -> BigUint {
    use ark_ff::PrimeField;
    BigUint::from_bytes_le(&v.into_bigint().to_bytes_le())
}

#[inline]
fn biguint_to_f(v: &BigUint) -> F {
    use ark_ff::PrimeField;
    F::from_le_bytes_mod_order(&v.to_bytes_le())
}

impl ConstraintSystem for NativeCs {
    type Var = F;

    #[inline]
    fn constant(&mut self, v: F) -> F {
        v
    }

    #[inline]
    fn add(&mut self, a: &F, b: &F) -> F {
        *a + *b
    }

    #[inline]
    fn sub(&mut self, a: &F, b: &F) -> F {
        *a - *b
    }

    #[inline]
    fn mul(&mut self, a: &F, b: &F) -> F {
        *a * *b
    }

    #[inline]
    fn is_zero(&mut self, a: &F) -> F {
        use ark_ff::Zero;
        if a.is_zero() {
            F::from(1u64)
        } else {
            F::from(0u64)
        }
    }

    fn assert_eq(&mut self, a: &F, b: &F, context: &'static str) -> Result<(), CsError> {
        if a == b {
            Ok(())
        } else {
            Err(CsError::AssertionFailed { lhs: format!("{a:?}"), rhs: format!("{b:?}"), context })
        }
    }

    fn assert_boolean(&mut self, a: &F, context: &'static str) -> Result<(), CsError> {
        if *a == F::from(0u64) || *a == F::from(1u64) {
            Ok(())
        } else {
            Err(CsError::NotBoolean { context })
        }
    }

    fn to_bits(&mut self, a: &F, n: usize) -> Result<Vec<F>, CsError> {
        let bu = f_to_biguint(*a);
        let raw = hints::bits(n, &bu);
        let mut acc = BigUint::from(0u8);
        for (i, bit) in raw.iter().enumerate() {
            if *bit == 1 {
                acc += BigUint::from(1u8) << i;
            }
        }
        if acc != bu {
            return Err(CsError::OutOfRange { n });
        }
        Ok(raw.into_iter().map(|b| F::from(b as u64)).collect())
    }

    fn cmp(&mut self, a: &F, b: &F) -> F {
        let (ab, bb) = (f_to_biguint(*a), f_to_biguint(*b));
        match ab.cmp(&bb) {
            Ordering::Less => -F::from(1u64),
            Ordering::Equal => F::from(0u64),
            Ordering::Greater => F::from(1u64),
        }
    }

    fn hint(&mut self, id: HintId, inputs: &[F]) -> Result<Vec<F>, CsError> {
        let bu = |f: &F| f_to_biguint(*f);
        let to_usize = |f: &F, what: &'static str| -> Result<usize, CsError> {
            f_to_biguint(*f).to_usize().ok_or(CsError::HintInputOutOfRange { hint: id, reason: what })
        };
        match id {
            HintId::Decimal => {
                if inputs.len() != 2 {
                    return Err(CsError::HintArity { hint: id, what: "inputs", expected: 2, got: inputs.len() });
                }
                let max_digit = to_usize(&inputs[0], "max_digit must fit usize")?;
                let out = hints::decimal(max_digit, &bu(&inputs[1]))
                    .map_err(|_| CsError::HintInputOutOfRange { hint: id, reason: "value needs more digits than max_digit" })?;
                Ok(out.iter().map(biguint_to_f).collect())
            }
            HintId::IDiv => {
                if inputs.len() != 2 {
                    return Err(CsError::HintArity { hint: id, what: "inputs", expected: 2, got: inputs.len() });
                }
                let (q, r) = hints::idiv(&bu(&inputs[0]), &bu(&inputs[1]));
                Ok(vec![biguint_to_f(&q), biguint_to_f(&r)])
            }
            HintId::Bits => {
                if inputs.len() != 2 {
                    return Err(CsError::HintArity { hint: id, what: "inputs", expected: 2, got: inputs.len() });
                }
                let n = to_usize(&inputs[0], "n must fit usize")?;
                let raw = hints::bits(n, &bu(&inputs[1]));
                Ok(raw.into_iter().map(|b| F::from(b as u64)).collect())
            }
            HintId::Merge => {
                if inputs.len() < 2 {
                    return Err(CsError::HintArity { hint: id, what: "inputs", expected: 2, got: inputs.len() });
                }
                let n1 = to_usize(&inputs[0], "N1 must fit usize")?;
                let n2 = to_usize(&inputs[1], "N2 must fit usize")?;
                let expected = 2 + (n1 + 1) + (n2 + 1);
                if inputs.len() != expected {
                    return Err(CsError::HintArity { hint: id, what: "inputs", expected, got: inputs.len() });
                }
                let a: Vec<BigUint> = inputs[2..2 + n1 + 1].iter().map(bu).collect();
                let b: Vec<BigUint> = inputs[2 + n1 + 1..].iter().map(bu).collect();
                let out = hints::merge(&a, &b);
                Ok(out.iter().map(biguint_to_f).collect())
            }
            HintId::BatchMerge => {
                if inputs.is_empty() {
                    return Err(CsError::HintArity { hint: id, what: "inputs", expected: 1, got: 0 });
                }
                let k = to_usize(&inputs[0], "k must fit usize")?;
                if inputs.len() < 1 + k {
                    return Err(CsError::HintArity { hint: id, what: "inputs", expected: 1 + k, got: inputs.len() });
                }
                let caps: Vec<usize> = inputs[1..1 + k]
                    .iter()
                    .map(|f| to_usize(f, "capacity must fit usize"))
                    .collect::<Result<_, _>>()?;
                let mut idx = 1 + k;
                let mut strings = Vec::with_capacity(k);
                for cap in &caps {
                    let end = idx + cap + 1;
                    if end > inputs.len() {
                        return Err(CsError::HintArity { hint: id, what: "inputs", expected: end, got: inputs.len() });
                    }
                    strings.push(inputs[idx..end].iter().map(bu).collect::<Vec<_>>());
                    idx = end;
                }
                let out = hints::batch_merge(&strings);
                Ok(out.iter().map(biguint_to_f).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_picks_branch() {
        let mut cs = NativeCs;
        let (one, zero) = (cs.one(), cs.zero());
        let a = cs.constant(F::from(7u64));
        let b = cs.constant(F::from(9u64));
        assert_eq!(cs.select(&one, &a, &b), F::from(7u64));
        assert_eq!(cs.select(&zero, &a, &b), F::from(9u64));
    }

    #[test]
    fn cmp_orders_by_integer_representative() {
        let mut cs = NativeCs;
        let a = cs.constant(F::from(3u64));
        let b = cs.constant(F::from(5u64));
        assert_eq!(cs.cmp(&a, &b), -F::from(1u64));
        assert_eq!(cs.cmp(&b, &a), F::from(1u64));
        assert_eq!(cs.cmp(&a, &a), F::from(0u64));
    }

    #[test]
    fn to_bits_round_trips_and_rejects_overflow() {
        let mut cs = NativeCs;
        let v = cs.constant(F::from(0b1011u64));
        let bits = cs.to_bits(&v, 4).unwrap();
        assert_eq!(bits, vec![F::from(1u64), F::from(1u64), F::from(0u64), F::from(1u64)]);
        assert!(cs.to_bits(&v, 2).is_err());
    }

    #[test]
    fn lookup2_selects_by_two_bits() {
        let mut cs = NativeCs;
        let (z, o) = (cs.zero(), cs.one());
        let (i0, i1, i2, i3) =
            (cs.constant(F::from(10u64)), cs.constant(F::from(11u64)), cs.constant(F::from(12u64)), cs.constant(F::from(13u64)));
        assert_eq!(cs.lookup2(&z, &z, &i0, &i1, &i2, &i3), F::from(10u64));
        assert_eq!(cs.lookup2(&o, &z, &i0, &i1, &i2, &i3), F::from(11u64));
        assert_eq!(cs.lookup2(&z, &o, &i0, &i1, &i2, &i3), F::from(12u64));
        assert_eq!(cs.lookup2(&o, &o, &i0, &i1, &i2, &i3), F::from(13u64));
    }

    #[test]
    fn hint_merge_matches_pure_function() {
        let mut cs = NativeCs;
        let a: Vec<F> = [2u64, 65, 66, crate::DUMMY].iter().map(|x| F::from(*x)).collect();
        let b: Vec<F> = [1u64, 67, crate::DUMMY].iter().map(|x| F::from(*x)).collect();
        let mut inputs = vec![F::from(2u64), F::from(1u64)];
        inputs.extend(a);
        inputs.extend(b);
        let out = cs.hint(HintId::Merge, &inputs).unwrap();
        assert_eq!(out, vec![F::from(3u64), F::from(65u64), F::from(66u64), F::from(67u64), F::from(crate::DUMMY)]);
    }
}
