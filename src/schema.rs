//! Reference schema circuits (SPEC_FULL §4.10 / C10).
//!
//! The core (`cs`, `mimc`, `gadgets`, `varstring`, `value`, `encoder`,
//! `cipher`, `policy`) never mentions a PhD profile or a COVID record; this
//! module is a thin consumer wiring those pieces into the two concrete
//! circuits named in spec.md §6 — `phd::EditCheckPhd`/`phd::validate` and
//! `covid::edit_check`/`covid::validate`, both grounded on
//! `original_source/circuit/editCircuitPhd.go` and `validateCircuit.go`. The
//! COVID side has no matching circuit body in `original_source` (only
//! `types.go`'s struct declarations) — it is built here by direct analogy to
//! the PhD pattern, reusing the same gadgets.

#![forbid(unsafe_code)]

use tracing::instrument;

use crate::cipher;
use crate::cs::ConstraintSystem;
use crate::encoder;
use crate::error::{CsError, SchemaError};
use crate::policy::{self, TimeRange};
use crate::value::{Encodable, Value};
use crate::varstring::{self, VarString};
use crate::F;

/// Key bytes never exceed one MiMC block (`original_source/circuit/
/// types.go`'s `MaxKeyLen`, used to size key-set-membership VarStrings).
pub const MAX_KEY_LEN: usize = 25;

/// `OneYearUnix` (`original_source/circuit/types.go`): the PhD duration
/// policy's minimum-program-length constant is stated in years and scaled by
/// this before comparison.
pub const ONE_YEAR_UNIX: u64 = 31_536_000;

/// `assertArrayEqualWithUnequalLength` (`editCircuitPhd.go`): right-pads the
/// shorter of `a`/`b` with zeros and asserts every position agrees. Used to
/// compare a schema's fixed-capacity ciphertext buffer against
/// [`cipher::encrypt_record`]'s output, which may be shorter when the
/// plaintext doesn't fill every reserved block.
pub fn assert_array_equal_with_unequal_length<C: ConstraintSystem>(
    cs: &mut C,
    a: &[C::Var],
    b: &[C::Var],
) -> Result<(), CsError> {
    let max_len = a.len().max(b.len());
    let zero = cs.zero();
    let mut num_equal = cs.zero();
    for i in 0..max_len {
        let ai = a.get(i).cloned().unwrap_or_else(|| zero.clone());
        let bi = b.get(i).cloned().unwrap_or_else(|| zero.clone());
        let eq = crate::gadgets::is_equal(cs, &ai, &bi);
        num_equal = cs.add(&num_equal, &eq);
    }
    let want = cs.constant(F::from(max_len as u64));
    cs.assert_eq(&num_equal, &want, "assert_array_equal_with_unequal_length: ciphertext mismatch")
}

/// Encode `record`'s [`Value`] tree and encrypt it under `key`, returning the
/// ciphertext blocks `assert_array_equal_with_unequal_length` compares
/// against a caller-supplied ciphertext.
fn encode_and_encrypt<C: ConstraintSystem>(
    cs: &mut C,
    record: &Value<C::Var>,
    key: &C::Var,
) -> Result<Vec<C::Var>, CsError> {
    let encoded = encoder::encode_value(cs, record)?;
    Ok(cipher::encrypt_record(cs, key, &encoded))
}

/// Assert `committed_key == commit(key)` via the in-circuit MiMC hash
/// (`commit.go`'s `commit(api, Key)`: `Write(Key); Sum()` over the single
/// field element, not the native byte-padded commitment — the two must agree
/// because [`cipher::commit_key`] is how the witness-time `committed_key`
/// input was produced in the first place).
pub fn assert_key_commitment<C: ConstraintSystem>(
    cs: &mut C,
    committed_key: &C::Var,
    key: &C::Var,
) -> Result<(), CsError> {
    let sum = {
        let mut mimc = crate::mimc::CircuitMimc::new(cs);
        mimc.write([key.clone()]);
        mimc.sum()
    };
    cs.assert_eq(committed_key, &sum, "assert_key_commitment: key does not match committed_key")
}

pub mod phd {
    //! `PhDProfile` edit/validate circuits (`editCircuitPhd.go`, `validateCircuit.go`).

    use super::*;

    /// Capacity of the `StudentID`/status/key VarStrings. Not named as a
    /// constant in `original_source` (Go slices are dynamically sized at
    /// witness-construction time); fixed here because every VarString in this
    /// crate is a fixed-capacity circuit input.
    pub const STUDENT_ID_LEN: usize = 5;
    /// Status string capacity (`"Graduated"` is the longest of the four
    /// allowed values).
    pub const STATUS_LEN: usize = 9;
    /// Publication title capacity.
    pub const TITLE_LEN: usize = 64;
    /// Maximum number of publications a profile can carry.
    pub const MAX_PUBLICATIONS: usize = 8;

    /// A single publication: `{Title: String, Year: Integer}` (`types.go`).
    #[derive(Clone)]
    pub struct Publication<V> {
        pub title: VarString<V>,
        pub year: V,
    }

    impl<C: ConstraintSystem> Encodable<C> for Publication<C::Var> {
        fn to_value(&self, _cs: &mut C) -> Result<Value<C::Var>, SchemaError> {
            Ok(Value::Dict(vec![
                (key(_cs, "Title"), Value::Str(self.title.clone())),
                (key(_cs, "Year"), Value::Integer(self.year.clone())),
            ]))
        }
    }

    /// `{Status, ProgramYear, StudentID, Publications, Duration}` (`types.go`),
    /// field order fixed to match the original's reflected struct order.
    #[derive(Clone)]
    pub struct PhDProfile<V> {
        pub status: VarString<V>,
        pub program_year: V,
        pub student_id: VarString<V>,
        pub publications: Vec<Publication<V>>,
        pub duration: TimeRange<V>,
    }

    impl<C: ConstraintSystem> Encodable<C> for PhDProfile<C::Var> {
        fn to_value(&self, cs: &mut C) -> Result<Value<C::Var>, SchemaError> {
            let publications: Result<Vec<Value<C::Var>>, SchemaError> =
                self.publications.iter().map(|p| p.to_value(cs)).collect();
            let duration = Value::Dict(vec![
                (key(cs, "Start"), Value::Integer(self.duration.start.clone())),
                (key(cs, "End"), Value::Integer(self.duration.end.clone())),
            ]);
            Ok(Value::Dict(vec![
                (key(cs, "Status"), Value::Str(self.status.clone())),
                (key(cs, "ProgramYear"), Value::Integer(self.program_year.clone())),
                (key(cs, "StudentID"), Value::Str(self.student_id.clone())),
                (key(cs, "Publications"), Value::Array(publications?)),
                (key(cs, "Duration"), duration),
            ]))
        }
    }

    /// `PhdLimit` (`types.go`): the policy constants an edit circuit checks
    /// `newContent` against.
    pub struct PhdLimit<V> {
        pub status_set: [VarString<V>; 4],
        pub year_range: (V, V),
        /// One character-class code per `StudentID` position.
        pub format: Vec<V>,
        /// Minimum program length, in whole years (scaled by
        /// [`super::ONE_YEAR_UNIX`] before the time-in-range check).
        pub time_min_range_years: V,
    }

    /// A `Publication`'s emptiness marker is `Title` — its first field, so
    /// the generic [`crate::value::is_empty`] head-of-Dict rule already
    /// matches `Publication.IsEmpty` (`encode.go`) without an override.
    fn publication_empty<C: ConstraintSystem>(cs: &mut C, p: &Publication<C::Var>) -> C::Var {
        cs.is_zero(&p.title[0])
    }

    /// `compareContentPhd` (`compare.go`/`editCircuitPhd.go`): evaluates the
    /// six predicates, sums their truth values, and asserts the sum equals 6
    /// — an arithmetic conjunction, not a short-circuiting `&&`.
    pub fn compare_content<C: ConstraintSystem>(
        cs: &mut C,
        old: &PhDProfile<C::Var>,
        new: &PhDProfile<C::Var>,
        limit: &PhdLimit<C::Var>,
    ) -> Result<(), CsError> {
        let old_values: Vec<Value<C::Var>> = old
            .publications
            .iter()
            .map(|p| Encodable::<C>::to_value(p, cs).expect("publication encoding is infallible for fixed schemas"))
            .collect();
        let new_values: Vec<Value<C::Var>> = new
            .publications
            .iter()
            .map(|p| Encodable::<C>::to_value(p, cs).expect("publication encoding is infallible for fixed schemas"))
            .collect();
        let old_empty: Vec<C::Var> = old.publications.iter().map(|p| publication_empty(cs, p)).collect();
        let new_empty: Vec<C::Var> = new.publications.iter().map(|p| publication_empty(cs, p)).collect();

        let mut sum = cs.zero();

        let append_ok = policy::append_only(cs, &old_values, &new_values, &old_empty, &new_empty);
        sum = cs.add(&sum, &bool_of(cs, append_ok));

        let status_set: Vec<C::Var> = limit.status_set.iter().map(|s| simple_hash_string(cs, s)).collect();
        let status_val = simple_hash_string(cs, &new.status);
        let one_of_ok = policy::one_of_set(cs, &status_val, &status_set);
        sum = cs.add(&sum, &bool_of(cs, one_of_ok));

        let within_ok = policy::within_range(cs, &new.program_year, &limit.year_range.0, &limit.year_range.1);
        sum = cs.add(&sum, &bool_of(cs, within_ok));

        let year_unix = cs.constant(F::from(ONE_YEAR_UNIX));
        let min_window = cs.mul(&limit.time_min_range_years, &year_unix);
        let time_ok = policy::time_in_range(cs, &new.duration, &min_window);
        sum = cs.add(&sum, &bool_of(cs, time_ok));

        let format_ok = policy::format(cs, &limit.format, &new.student_id);
        sum = cs.add(&sum, &bool_of(cs, format_ok));

        let id_unchanged = crate::gadgets::is_equal(cs, &student_id_hash(cs, &old.student_id), &student_id_hash(cs, &new.student_id));
        sum = cs.add(&sum, &id_unchanged);

        let want = cs.constant(F::from(6u64));
        cs.assert_eq(&sum, &want, "compare_content: policy predicate conjunction failed")
    }

    /// `EditCheckPhd` (`editCircuitPhd.go`): policy compliance plus both
    /// records' ciphertext/commitment agreement.
    #[instrument(skip_all)]
    pub fn edit_check<C: ConstraintSystem>(
        cs: &mut C,
        old: &PhDProfile<C::Var>,
        new: &PhDProfile<C::Var>,
        limit: &PhdLimit<C::Var>,
        old_cipher: &[C::Var],
        new_cipher: &[C::Var],
        committed_key: &C::Var,
        key: &C::Var,
    ) -> Result<(), CsError> {
        compare_content(cs, old, new, limit)?;
        super::assert_key_commitment(cs, committed_key, key)?;

        let old_value = Encodable::<C>::to_value(old, cs).map_err(schema_to_cs_error)?;
        let encrypted_old = super::encode_and_encrypt(cs, &old_value, key)?;
        super::assert_array_equal_with_unequal_length(cs, old_cipher, &encrypted_old)?;

        let new_value = Encodable::<C>::to_value(new, cs).map_err(schema_to_cs_error)?;
        let encrypted_new = super::encode_and_encrypt(cs, &new_value, key)?;
        super::assert_array_equal_with_unequal_length(cs, new_cipher, &encrypted_new)
    }

    /// `Validate` (`validateCircuit.go`): a single record's ciphertext and
    /// commitment agree, and its program year is at least `min_year`.
    #[instrument(skip_all)]
    pub fn validate<C: ConstraintSystem>(
        cs: &mut C,
        content: &PhDProfile<C::Var>,
        record: &[C::Var],
        committed_key: &C::Var,
        key: &C::Var,
        min_year: &C::Var,
    ) -> Result<(), CsError> {
        super::assert_key_commitment(cs, committed_key, key)?;
        let value = Encodable::<C>::to_value(content, cs).map_err(schema_to_cs_error)?;
        let encrypted = super::encode_and_encrypt(cs, &value, key)?;
        super::assert_array_equal_with_unequal_length(cs, record, &encrypted)?;
        // `api.AssertIsLessOrEqual(minYearNum, content.ProgramYear.X)` (validateCircuit.go).
        let le = crate::gadgets::is_less_or_equal(cs, min_year, &content.program_year);
        let one = cs.one();
        cs.assert_eq(&le, &one, "validate: program year below the declared floor")
    }

    pub(crate) fn schema_to_cs_error(e: SchemaError) -> CsError {
        CsError::AssertionFailed { lhs: format!("{e}"), rhs: String::new(), context: "schema conversion failed" }
    }

    pub(crate) fn bool_of<C: ConstraintSystem>(cs: &mut C, r: Result<(), CsError>) -> C::Var {
        match r {
            Ok(()) => cs.one(),
            Err(_) => cs.zero(),
        }
    }

    pub(crate) fn key<C: ConstraintSystem>(cs: &mut C, name: &str) -> VarString<C::Var> {
        varstring::to_varstring(cs, name, super::MAX_KEY_LEN).expect("field name fits MaxKeyLen")
    }

    /// A stand-in for `isEqualString`/set-membership over `VarString`s: both
    /// need an equality witness comparable by [`policy::one_of_set`] and
    /// [`crate::gadgets::is_equal`], which only compare single field
    /// elements — so each candidate string is folded to one element via
    /// [`varstring::simple_hash`] before comparison. Collisions are bounded
    /// by the same random-oracle assumption the merge argument relies on.
    pub(crate) fn simple_hash_string<C: ConstraintSystem>(cs: &mut C, s: &VarString<C::Var>) -> C::Var {
        varstring::simple_hash(cs, s, 8)
    }

    fn student_id_hash<C: ConstraintSystem>(cs: &mut C, s: &VarString<C::Var>) -> C::Var {
        simple_hash_string(cs, s)
    }
}

pub mod covid {
    //! `CovidRecord` edit/validate circuits, built by direct analogy to
    //! [`super::phd`] — `original_source` declares `CovidRecord`'s shape in
    //! `types.go` but never wires an edit/validate circuit body for it.

    use super::*;

    /// Vaccine-type / insurance-status / test-number string capacity.
    pub const FIELD_LEN: usize = 16;
    /// Maximum number of prior COVID tests a record can carry.
    pub const MAX_TESTS: usize = 8;
    /// `CovidTestNumber` format-template length.
    pub const TEST_NUMBER_LEN: usize = 8;

    /// `{VaccineType: String, Dosage: Integer}` (`types.go`).
    #[derive(Clone)]
    pub struct Vaccine<V> {
        pub vaccine_type: VarString<V>,
        pub dosage: V,
    }

    impl<C: ConstraintSystem> Encodable<C> for Vaccine<C::Var> {
        fn to_value(&self, cs: &mut C) -> Result<Value<C::Var>, SchemaError> {
            Ok(Value::Dict(vec![
                (phd_key(cs, "VaccineType"), Value::Str(self.vaccine_type.clone())),
                (phd_key(cs, "Dosage"), Value::Integer(self.dosage.clone())),
            ]))
        }
    }

    /// `{TestDate: Integer, Result: String}` (`types.go`). Unlike
    /// [`super::phd::Publication`], this type's emptiness marker is
    /// `Result` — the *second* field, not the head — overriding
    /// `encode.go`'s usual head-of-struct convention
    /// (`func (x CovidTest) IsEmpty(api) { return x.Result.IsEmpty(api) }`).
    #[derive(Clone)]
    pub struct CovidTest<V> {
        pub test_date: V,
        pub result: VarString<V>,
    }

    impl<C: ConstraintSystem> Encodable<C> for CovidTest<C::Var> {
        fn to_value(&self, cs: &mut C) -> Result<Value<C::Var>, SchemaError> {
            Ok(Value::Dict(vec![
                (phd_key(cs, "TestDate"), Value::Integer(self.test_date.clone())),
                (phd_key(cs, "Result"), Value::Str(self.result.clone())),
            ]))
        }
    }

    fn covid_test_empty<C: ConstraintSystem>(cs: &mut C, t: &CovidTest<C::Var>) -> C::Var {
        cs.is_zero(&t.result[0])
    }

    /// `{LatestVaccine, CovidTest[], CovidTestNumber, MedicalInsuranceStatus,
    /// CoverageEndDate}` (`types.go`), in declared field order.
    #[derive(Clone)]
    pub struct CovidRecord<V> {
        pub latest_vaccine: Vaccine<V>,
        pub covid_test: Vec<CovidTest<V>>,
        pub covid_test_number: VarString<V>,
        pub medical_insurance_status: VarString<V>,
        pub coverage_end_date: V,
    }

    impl<C: ConstraintSystem> Encodable<C> for CovidRecord<C::Var> {
        fn to_value(&self, cs: &mut C) -> Result<Value<C::Var>, SchemaError> {
            let tests: Result<Vec<Value<C::Var>>, SchemaError> = self.covid_test.iter().map(|t| t.to_value(cs)).collect();
            Ok(Value::Dict(vec![
                (phd_key(cs, "LatestVaccine"), self.latest_vaccine.to_value(cs)?),
                (phd_key(cs, "CovidTest"), Value::Array(tests?)),
                (phd_key(cs, "CovidTestNumber"), Value::Str(self.covid_test_number.clone())),
                (phd_key(cs, "MedicalInsuranceStatus"), Value::Str(self.medical_insurance_status.clone())),
                (phd_key(cs, "CoverageEndDate"), Value::Integer(self.coverage_end_date.clone())),
            ]))
        }
    }

    /// `CovidLimit` (`types.go`).
    pub struct CovidLimit<V> {
        pub vaccine_type_set: Vec<VarString<V>>,
        pub dosage_max: V,
        pub medical_insurance_status_set: Vec<VarString<V>>,
        /// Coverage must end no later than this timestamp (`types.go`'s
        /// `CoverageMaxEndDate`).
        pub coverage_max_end_date: V,
        pub format: Vec<V>,
    }

    /// The Covid analogue of `compareContentPhd`: append-only test history,
    /// vaccine type membership, dosage ceiling, insurance-status membership,
    /// coverage-end-date ceiling, and the test-number format — five
    /// predicates, conjoined arithmetically the same way the PhD circuit
    /// does.
    pub fn compare_content<C: ConstraintSystem>(
        cs: &mut C,
        old: &CovidRecord<C::Var>,
        new: &CovidRecord<C::Var>,
        limit: &CovidLimit<C::Var>,
    ) -> Result<(), CsError> {
        let old_values: Vec<Value<C::Var>> =
            old.covid_test.iter().map(|t| Encodable::<C>::to_value(t, cs).expect("CovidTest encoding is infallible")).collect();
        let new_values: Vec<Value<C::Var>> =
            new.covid_test.iter().map(|t| Encodable::<C>::to_value(t, cs).expect("CovidTest encoding is infallible")).collect();
        let old_empty: Vec<C::Var> = old.covid_test.iter().map(|t| covid_test_empty(cs, t)).collect();
        let new_empty: Vec<C::Var> = new.covid_test.iter().map(|t| covid_test_empty(cs, t)).collect();

        let mut sum = cs.zero();

        let append_ok = policy::append_only(cs, &old_values, &new_values, &old_empty, &new_empty);
        sum = cs.add(&sum, &phd::bool_of(cs, append_ok));

        let vaccine_set: Vec<C::Var> = limit.vaccine_type_set.iter().map(|s| phd::simple_hash_string(cs, s)).collect();
        let vaccine_val = phd::simple_hash_string(cs, &new.latest_vaccine.vaccine_type);
        let vaccine_ok = policy::one_of_set(cs, &vaccine_val, &vaccine_set);
        sum = cs.add(&sum, &phd::bool_of(cs, vaccine_ok));

        let zero = cs.zero();
        let dosage_ok = policy::within_range(cs, &new.latest_vaccine.dosage, &zero, &limit.dosage_max);
        sum = cs.add(&sum, &phd::bool_of(cs, dosage_ok));

        let insurance_set: Vec<C::Var> = limit.medical_insurance_status_set.iter().map(|s| phd::simple_hash_string(cs, s)).collect();
        let insurance_val = phd::simple_hash_string(cs, &new.medical_insurance_status);
        let insurance_ok = policy::one_of_set(cs, &insurance_val, &insurance_set);
        sum = cs.add(&sum, &phd::bool_of(cs, insurance_ok));

        let ceiling_ok = crate::gadgets::is_less_or_equal(cs, &new.coverage_end_date, &limit.coverage_max_end_date);
        sum = cs.add(&sum, &ceiling_ok);

        let format_ok = policy::format(cs, &limit.format, &new.covid_test_number);
        sum = cs.add(&sum, &phd::bool_of(cs, format_ok));

        let want = cs.constant(F::from(5u64));
        cs.assert_eq(&sum, &want, "compare_content: covid policy predicate conjunction failed")
    }

    /// The Covid edit circuit, analogous to [`phd::edit_check`].
    #[instrument(skip_all)]
    pub fn edit_check<C: ConstraintSystem>(
        cs: &mut C,
        old: &CovidRecord<C::Var>,
        new: &CovidRecord<C::Var>,
        limit: &CovidLimit<C::Var>,
        old_cipher: &[C::Var],
        new_cipher: &[C::Var],
        committed_key: &C::Var,
        key: &C::Var,
    ) -> Result<(), CsError> {
        compare_content(cs, old, new, limit)?;
        super::assert_key_commitment(cs, committed_key, key)?;

        let old_value = Encodable::<C>::to_value(old, cs).map_err(phd::schema_to_cs_error)?;
        let encrypted_old = super::encode_and_encrypt(cs, &old_value, key)?;
        super::assert_array_equal_with_unequal_length(cs, old_cipher, &encrypted_old)?;

        let new_value = Encodable::<C>::to_value(new, cs).map_err(phd::schema_to_cs_error)?;
        let encrypted_new = super::encode_and_encrypt(cs, &new_value, key)?;
        super::assert_array_equal_with_unequal_length(cs, new_cipher, &encrypted_new)
    }

    /// The Covid validate circuit, analogous to [`phd::validate`]: ciphertext
    /// and commitment agreement, plus a coverage-end-date ceiling.
    #[instrument(skip_all)]
    pub fn validate<C: ConstraintSystem>(
        cs: &mut C,
        content: &CovidRecord<C::Var>,
        record: &[C::Var],
        committed_key: &C::Var,
        key: &C::Var,
        max_coverage_end_date: &C::Var,
    ) -> Result<(), CsError> {
        super::assert_key_commitment(cs, committed_key, key)?;
        let value = Encodable::<C>::to_value(content, cs).map_err(phd::schema_to_cs_error)?;
        let encrypted = super::encode_and_encrypt(cs, &value, key)?;
        super::assert_array_equal_with_unequal_length(cs, record, &encrypted)?;
        let le = crate::gadgets::is_less_or_equal(cs, &content.coverage_end_date, max_coverage_end_date);
        let one = cs.one();
        cs.assert_eq(&le, &one, "validate: coverage end date exceeds the declared ceiling")
    }

    fn phd_key<C: ConstraintSystem>(cs: &mut C, name: &str) -> VarString<C::Var> {
        phd::key(cs, name)
    }
}
