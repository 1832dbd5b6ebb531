//! Record Invariant Tests
//!
//! - Absent nullable fields are omitted from the PODS
//! - Explicit null in a PODS is the same as a missing key
//! - Missing or null required fields fail FIELD_NOT_NULLABLE
//! - Checks observe the coerced value
//! - Equal field values give equal records with equal hashes
//! - Constructed records cannot be changed
//! - Extending types carry their parents' fields and conform to the parents

use serde_json::json;
use strictrecord::field::shortcuts;
use strictrecord::{
    define_record, define_record_extending, Coercion, ErrorKind, FieldSpec, RecordType, Value,
    ValueType,
};

// =============================================================================
// Helper Functions
// =============================================================================

fn point(name: &str) -> RecordType {
    define_record(
        name,
        [
            ("x", FieldSpec::new(ValueType::Int)),
            ("y", FieldSpec::new(ValueType::Int).nullable()),
        ],
    )
    .unwrap()
}

// =============================================================================
// Absence Tests
// =============================================================================

/// A nullable field left absent is omitted, not written as null.
#[test]
fn test_absent_field_is_omitted() {
    let rt = point("OmitPoint");
    let p = rt.new_positional([1i64]).unwrap();
    let pods = p.to_pods().unwrap();

    assert_eq!(pods, json!({"x": 1}));
    assert!(pods.as_object().unwrap().get("y").is_none());
}

/// Explicit null and a missing key load the same instance.
#[test]
fn test_explicit_null_equivalence() {
    let rt = point("NullPoint");
    let a = rt.from_pods(&json!({"x": 1})).unwrap();
    let b = rt.from_pods(&json!({"x": 1, "y": null})).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.hash_code(), b.hash_code());
}

/// A required field that is missing or null fails.
#[test]
fn test_non_nullable_rejection() {
    let rt = point("RequiredPoint");

    let err = rt.from_pods(&json!({"y": 2})).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FieldNotNullable);
    assert_eq!(err.message(), "RequiredPoint.x cannot be null");

    let err = rt.from_pods(&json!({"x": null, "y": 2})).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FieldNotNullable);
    assert!(err.kind().is_value_error());
    assert!(err.is_field_error());
}

/// Defaults fill absent nullable fields, and round-trip as present values.
#[test]
fn test_default_round_trip() {
    let rt = define_record(
        "Defaulted",
        [
            ("name", FieldSpec::new(ValueType::Str)),
            ("level", FieldSpec::new(ValueType::Int).nullable().with_default(3i64)),
        ],
    )
    .unwrap();
    let r = rt.new_named([("name", "a")]).unwrap();
    assert_eq!(r.get("level"), Some(&Value::Int(3)));

    let pods = r.to_pods().unwrap();
    assert_eq!(pods, json!({"name": "a", "level": 3}));
    assert_eq!(rt.from_pods(&pods).unwrap(), r);
}

// =============================================================================
// Validation Order Tests
// =============================================================================

/// The check sees the upper-cased value, not the raw input.
#[test]
fn test_check_observes_coerced_value() {
    let upper = Coercion::custom(|v| match v {
        Value::Str(s) => Ok(Value::Str(s.to_uppercase())),
        other => Ok(other),
    });
    let code = shortcuts::uppercase_letters(Some(3))
        .unwrap()
        .with_coerce(upper);
    let rt = define_record("Airport", [("code", code)]).unwrap();

    let r = rt.new_positional(["sfo"]).unwrap();
    assert_eq!(r.get("code"), Some(&Value::from("SFO")));

    let err = rt.new_positional(["sfox"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FieldValueError);
    assert_eq!(err.message(), "Airport.code: \"SFOX\" is not a valid value");
}

/// Built-in conversions run before the type check.
#[test]
fn test_builtin_conversion_before_type_check() {
    let rt = define_record(
        "Converted",
        [("n", FieldSpec::new(ValueType::Int).with_coerce(Coercion::ToInt))],
    )
    .unwrap();
    assert_eq!(
        rt.new_positional(["41"]).unwrap().get("n"),
        Some(&Value::Int(41))
    );
    assert_eq!(
        rt.new_positional([Value::Null]).unwrap_err().kind(),
        ErrorKind::FieldNotNullable
    );
}

/// Type errors name the field, the expected type and the offending value.
#[test]
fn test_type_error_is_path_annotated() {
    let rt = point("TypedPoint");
    let err = rt.new_named([("x", Value::from("one"))]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FieldTypeError);
    assert_eq!(
        err.message(),
        "TypedPoint.x should be of type int, not str (\"one\")"
    );
}

/// A failure anywhere aborts the whole construction.
#[test]
fn test_construction_is_all_or_nothing() {
    let rt = point("AtomicPoint");
    assert!(rt
        .new_named([("x", Value::Int(1)), ("y", Value::from("bad"))])
        .is_err());
}

// =============================================================================
// Nested Record Tests
// =============================================================================

/// Errors inside a nested record carry the inner path.
#[test]
fn test_nested_record_paths() {
    let inner = point("InnerPoint");
    let outer = define_record("Segment", [("start", inner.clone())]).unwrap();

    let err = outer.from_pods(&json!({"start": {"x": "bad"}})).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FieldTypeError);
    assert!(err.message().contains("InnerPoint.x"));

    let s = outer
        .new_positional([inner.new_positional([1i64, 2]).unwrap()])
        .unwrap();
    assert_eq!(s.to_pods().unwrap(), json!({"start": {"x": 1, "y": 2}}));
    assert_eq!(outer.from_pods(&s.to_pods().unwrap()).unwrap(), s);
}

// =============================================================================
// Equality and Hash Tests
// =============================================================================

/// Equal values give equal records; any change breaks both.
#[test]
fn test_hash_equality_consistency() {
    let rt = point("HashPoint");
    let a = rt.new_positional([1i64, 2]).unwrap();
    let b = rt.new_named([("y", 2i64), ("x", 1i64)]).unwrap();
    let c = rt.new_positional([1i64, 3]).unwrap();

    assert_eq!(a, b);
    assert_eq!(a.hash_code(), b.hash_code());
    assert_ne!(a, c);
    assert_ne!(a.hash_code(), c.hash_code());
}

/// Records of different types never compare equal.
#[test]
fn test_types_are_distinct() {
    let a = point("DistinctA").new_positional([1i64]).unwrap();
    let b = point("DistinctB").new_positional([1i64]).unwrap();
    assert_ne!(a, b);
}

// =============================================================================
// Immutability Tests
// =============================================================================

/// Rebinding a field fails and leaves the record as it was.
#[test]
fn test_immutability() {
    let rt = point("FrozenPoint");
    let p = rt.new_positional([1i64, 2]).unwrap();
    let before = p.clone();

    let err = p.set("x", 5i64).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RecordsAreImmutable);
    assert_eq!(err.to_string(), "RECORDS_ARE_IMMUTABLE: FrozenPoint objects are immutable");
    assert_eq!(p.remove("y").unwrap_err().kind(), ErrorKind::RecordsAreImmutable);
    assert_eq!(p, before);
    assert_eq!(p.get("x"), Some(&Value::Int(1)));
}

/// Deriving builds a new instance and validates it.
#[test]
fn test_derive_builds_new_instance() {
    let rt = point("DerivedPoint");
    let p = rt.new_positional([1i64, 2]).unwrap();
    let q = p.derive([("y", Value::Null)]).unwrap();
    assert_eq!(q.get("y"), Some(&Value::Null));
    assert_eq!(p.get("y"), Some(&Value::Int(2)));
    assert_eq!(
        p.derive([("x", Value::Null)]).unwrap_err().kind(),
        ErrorKind::FieldNotNullable
    );
}

// =============================================================================
// Registry Tests
// =============================================================================

/// Reusing a type name is an error.
#[test]
fn test_redefinition_rejected() {
    point("OnlyOnce");
    let err = define_record("OnlyOnce", [("z", ValueType::Str)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeRedefined);
}

// =============================================================================
// Extension Tests
// =============================================================================

/// A child record holds the fields of its parent and its own, and works
/// wherever the parent type is expected.
#[test]
fn test_extending_record() {
    let animal = define_record("Animal", [("name", ValueType::Str)]).unwrap();
    let dog = define_record_extending(
        "Dog",
        std::slice::from_ref(&animal),
        [("good", FieldSpec::new(ValueType::Bool).nullable())],
    )
    .unwrap();
    let kennel = define_record("Kennel", [("resident", ValueType::Record(animal.clone()))]).unwrap();

    let rex = dog.new_positional([Value::from("Rex"), Value::Bool(true)]).unwrap();
    assert_eq!(rex.to_pods().unwrap(), json!({"name": "Rex", "good": true}));
    assert_eq!(rex.to_string(), "Dog(name=\"Rex\", good=true)");

    let renamed = rex.derive([("name", Value::from("Max"))]).unwrap();
    assert_eq!(renamed, dog.new_positional([Value::from("Max"), Value::Bool(true)]).unwrap());
    assert_ne!(renamed.hash_code(), rex.hash_code());

    let k = kennel.new_positional([Value::Record(rex.clone())]).unwrap();
    assert_eq!(k.get("resident"), Some(&Value::Record(rex)));

    let cat = define_record("Cat", [("name", ValueType::Str)]).unwrap();
    let err = kennel
        .new_positional([Value::Record(cat.new_positional(["Tom"]).unwrap())])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FieldTypeError);
}

/// Parent fields cannot be redeclared or inherited twice.
#[test]
fn test_extending_conflicts() {
    let left = define_record("Left", [("x", ValueType::Int)]).unwrap();
    let right = define_record("Right", [("x", ValueType::Int)]).unwrap();

    let err = define_record_extending("Both", &[left.clone(), right], [("y", ValueType::Int)])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArguments);
    assert_eq!(err.message(), "multiple parent types have a field called 'x'");

    let err = define_record_extending("Shadow", &[left], [("x", ValueType::Float)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArguments);
    assert_eq!(err.message(), "can't override field 'x' of parent type Left");
}
