//! PODS Round-Trip Properties
//!
//! For any validly constructed record, loading its PODS gives back an equal
//! record, and equal inputs always give equal hashes.

use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime};
use proptest::prelude::*;
use strictrecord::{define_record, seq_of, set_of, FieldSpec, RecordType, Value, ValueType};
use uuid::Uuid;

// =============================================================================
// Fixtures
// =============================================================================

fn everything() -> &'static RecordType {
    static TYPE: OnceLock<RecordType> = OnceLock::new();
    TYPE.get_or_init(|| {
        define_record(
            "Everything",
            [
                ("count", FieldSpec::new(ValueType::Int)),
                ("ratio", FieldSpec::new(ValueType::Float).nullable()),
                ("label", FieldSpec::new(ValueType::Str)),
                ("flag", FieldSpec::new(ValueType::Bool).nullable()),
                ("at", FieldSpec::new(ValueType::DateTime).nullable()),
                ("day", FieldSpec::new(ValueType::Date).nullable()),
                ("id", FieldSpec::new(ValueType::Uuid).nullable()),
                ("tags", seq_of(ValueType::Str)),
                ("codes", set_of(ValueType::Int).nullable()),
            ],
        )
        .unwrap()
    })
}

fn datetime() -> impl Strategy<Value = NaiveDateTime> {
    (1900i32..2100, 1u32..=12, 1u32..=28, 0u32..24, 0u32..60, 0u32..60).prop_map(
        |(y, mo, d, h, mi, s)| {
            NaiveDate::from_ymd_opt(y, mo, d)
                .unwrap()
                .and_hms_opt(h, mi, s)
                .unwrap()
        },
    )
}

fn arb_values() -> impl Strategy<Value = Vec<(&'static str, Value)>> {
    (
        any::<i64>(),
        proptest::option::of(-1.0e12f64..1.0e12),
        "[a-zA-Z0-9 ]{0,16}",
        proptest::option::of(any::<bool>()),
        proptest::option::of(datetime()),
        proptest::option::of(datetime().prop_map(|dt| dt.date())),
        proptest::option::of(any::<u128>().prop_map(Uuid::from_u128)),
        proptest::collection::vec("[a-z]{1,6}", 0..5),
        proptest::option::of(proptest::collection::vec(any::<i64>(), 0..6)),
    )
        .prop_map(|(count, ratio, label, flag, at, day, id, tags, codes)| {
            vec![
                ("count", Value::Int(count)),
                ("ratio", Value::from(ratio)),
                ("label", Value::Str(label)),
                ("flag", Value::from(flag)),
                ("at", Value::from(at)),
                ("day", Value::from(day)),
                ("id", Value::from(id)),
                ("tags", Value::from(tags)),
                ("codes", Value::from(codes)),
            ]
        })
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn property_pods_round_trip(values in arb_values()) {
        let rt = everything();
        let record = rt.new_named(values).unwrap();
        let pods = record.to_pods().unwrap();

        // absence is omission, never null
        for (_, v) in pods.as_object().unwrap() {
            prop_assert!(!v.is_null());
        }

        let loaded = rt.from_pods(&pods).unwrap();
        prop_assert_eq!(&loaded, &record);
        prop_assert_eq!(loaded.hash_code(), record.hash_code());
    }

    #[test]
    fn property_pods_survive_json_text(values in arb_values()) {
        let rt = everything();
        let record = rt.new_named(values).unwrap();
        let text = serde_json::to_string(&record.to_pods().unwrap()).unwrap();
        let pods: serde_json::Value = serde_json::from_str(&text).unwrap();
        let loaded = rt.from_pods(&pods).unwrap();
        prop_assert_eq!(loaded.get("count"), record.get("count"));
        prop_assert_eq!(loaded.get("tags"), record.get("tags"));
        prop_assert_eq!(loaded.get("at"), record.get("at"));
    }

    #[test]
    fn property_equal_inputs_hash_equal(values in arb_values()) {
        let rt = everything();
        let a = rt.new_named(values.clone()).unwrap();
        let b = rt.new_named(values).unwrap();
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(a.hash_code(), b.hash_code());
    }

    #[test]
    fn property_changed_field_breaks_equality(values in arb_values(), bump in 1i64..1000) {
        let rt = everything();
        let a = rt.new_named(values).unwrap();
        let count = a.get("count").and_then(Value::as_int).unwrap();
        let b = a.derive([("count", Value::Int(count.wrapping_add(bump)))]).unwrap();
        prop_assert_ne!(&a, &b);
        prop_assert_ne!(a.hash_code(), b.hash_code());
    }
}
