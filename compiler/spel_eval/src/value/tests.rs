use pretty_assertions::assert_eq;
use serde_json::json;

use super::*;
use crate::support::StandardTypeConverter;
use crate::types::{Primitive, TypeBuilder};

#[test]
fn display_matches_expression_output() {
    assert_eq!(Value::Null.to_string(), "null");
    assert_eq!(Value::Double(2.0).to_string(), "2.0");
    assert_eq!(Value::Float(0.5).to_string(), "0.5");
    assert_eq!(
        Value::list(vec![Value::Int(1), Value::string("a")]).to_string(),
        "[1, a]"
    );
    assert_eq!(
        Value::map(vec![(Value::string("k"), Value::Bool(true))]).to_string(),
        "{k=true}"
    );
}

#[test]
fn objects_render_through_their_formatter() {
    struct Celsius(f64);
    let info = TypeBuilder::new("demo.Celsius")
        .display(|v| {
            v.downcast_ref::<Celsius>()
                .map(|c| format!("{}C", c.0))
                .unwrap_or_default()
        })
        .build();
    assert_eq!(Value::object(&info, Celsius(21.5)).to_string(), "21.5C");

    let plain = TypeBuilder::new("demo.Plain").build();
    assert!(Value::object(&plain, ()).to_string().starts_with("demo.Plain@"));
}

#[test]
fn descriptors_box_primitives() {
    assert_eq!(Value::Int(1).descriptor(), TypeDescriptor::Boxed(Primitive::Int));
    assert_eq!(Value::Int(1).type_name(), "Integer");
    assert_eq!(Value::Null.type_name(), "null");
    assert_eq!(Value::string("").type_name(), "String");
}

#[test]
fn equality_is_structural_for_collections() {
    let a = Value::list(vec![Value::Int(1)]);
    let b = Value::list(vec![Value::Int(1)]);
    assert_eq!(a, b);
    assert!(!a.same_instance(&b));
    assert!(a.same_instance(&a.clone()));

    let m1 = Value::map(vec![(Value::Int(1), Value::Int(2)), (Value::Int(3), Value::Int(4))]);
    let m2 = Value::map(vec![(Value::Int(3), Value::Int(4)), (Value::Int(1), Value::Int(2))]);
    assert_eq!(m1, m2);
    assert_ne!(Value::Int(1), Value::Long(1));
}

#[test]
fn lists_are_shared_and_frozen_lists_reject_writes() {
    let list = ListRef::new(vec![Value::Int(1)]);
    let alias = list.clone();
    assert!(alias.push(Value::Int(2)).is_ok());
    assert_eq!(list.len(), 2);
    assert_eq!(list.set(0, Value::Int(9)), Ok(Value::Int(1)));
    assert!(list.set(5, Value::Null).is_err());
    assert_eq!(list.index_of(&Value::Int(2)), Some(1));

    let frozen = ListRef::frozen(vec![]);
    let Err(err) = frozen.push(Value::Null) else {
        panic!("frozen list accepted a push");
    };
    assert!(err.is_system());
}

#[test]
fn maps_keep_insertion_order_and_last_duplicate() {
    let map = MapRef::new(vec![
        (Value::string("a"), Value::Int(1)),
        (Value::string("b"), Value::Int(2)),
        (Value::string("a"), Value::Int(3)),
    ]);
    assert_eq!(map.keys(), vec![Value::string("a"), Value::string("b")]);
    assert_eq!(map.get(&Value::string("a")), Some(Value::Int(3)));
    assert_eq!(map.insert(Value::string("c"), Value::Null), Ok(None));
    assert_eq!(map.insert(Value::string("b"), Value::Int(7)), Ok(Some(Value::Int(2))));
    assert_eq!(map.len(), 3);
    assert!(MapRef::frozen(vec![]).insert(Value::Null, Value::Null).is_err());
}

#[test]
fn functions_check_nothing_until_called() {
    let add = FunctionRef::new("add", vec![TypeDescriptor::INT, TypeDescriptor::INT], |args| {
        let sum: i64 = args.iter().filter_map(Value::as_i64).sum();
        Ok(Value::Long(sum))
    });
    assert_eq!(add.name(), "add");
    assert_eq!(add.params().map(<[TypeDescriptor]>::len), Some(2));
    assert_eq!(add.call(&[Value::Int(2), Value::Int(3)]), Ok(Value::Long(5)));

    let any = FunctionRef::variadic("count", |args| Ok(Value::Int(args.len() as i32)));
    assert_eq!(any.params(), None);
}

#[test]
fn json_round_trip() {
    let json = json!({"name": "Ada", "tags": ["x", 1], "big": 10_000_000_000_i64, "ratio": 0.5});
    let value = Value::from_json(&json);
    let Some(map) = value.as_map() else {
        panic!("object should become a map");
    };
    assert_eq!(map.get(&Value::string("big")), Some(Value::Long(10_000_000_000)));
    assert_eq!(map.get(&Value::string("ratio")), Some(Value::Double(0.5)));
    assert_eq!(value.to_json(), json);
    assert_eq!(Value::Double(f64::NAN).to_json(), serde_json::Value::Null);
}

#[test]
fn from_value_converts() {
    let converter = StandardTypeConverter;
    assert_eq!(i64::from_value(Value::Int(3), &converter).ok(), Some(3));
    assert_eq!(
        String::from_value(Value::Int(3), &converter).ok(),
        Some("3".to_owned())
    );
    assert_eq!(Option::<i32>::from_value(Value::Null, &converter).ok(), Some(None));
    assert!(bool::from_value(Value::string("maybe"), &converter).is_err());
}
