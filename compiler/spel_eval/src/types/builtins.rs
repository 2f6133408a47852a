//! Builtin types.
//!
//! Every value kind has a registered type so the reflective resolvers treat
//! `'abc'.length()`, `{1,2}.size()` and `T(Math).max(1, 2)` exactly like
//! calls on host types. Hierarchy: everything extends `Object`; the numeric
//! types extend `Number`.

use std::sync::{Arc, OnceLock};

use regex::Regex;

use super::{Primitive, TypeBuilder, TypeDescriptor as D, TypeInfo};
use crate::error::UserError;
use crate::Value;

/// All builtin types, in registration order.
pub fn all() -> Vec<Arc<TypeInfo>> {
    vec![
        object_type(),
        type_type(),
        string_type(),
        number_type(),
        integer_type(),
        long_type(),
        float_type(),
        double_type(),
        boolean_type(),
        character_type(),
        list_type(),
        map_type(),
        map_entry_type(),
        function_type(),
        math_type(),
    ]
}

fn len_i32(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

fn wrong_target(expected: &str, target: &Value) -> UserError {
    UserError::system(format!(
        "ClassCastException: {} cannot be cast to {expected}",
        target.type_name()
    ))
}

fn this_str(target: &Value) -> Result<&str, UserError> {
    target.as_str().ok_or_else(|| wrong_target("String", target))
}

fn arg(args: &[Value], index: usize) -> Result<&Value, UserError> {
    args.get(index).ok_or_else(|| {
        UserError::system(format!("IllegalArgumentException: missing argument {index}"))
    })
}

fn arg_str(args: &[Value], index: usize) -> Result<&str, UserError> {
    let value = arg(args, index)?;
    value.as_str().ok_or_else(|| wrong_target("String", value))
}

fn arg_i32(args: &[Value], index: usize) -> Result<i32, UserError> {
    match arg(args, index)? {
        Value::Int(n) => Ok(*n),
        other => Err(wrong_target("Integer", other)),
    }
}

fn arg_i64(args: &[Value], index: usize) -> Result<i64, UserError> {
    match arg(args, index)? {
        Value::Long(n) => Ok(*n),
        Value::Int(n) => Ok(i64::from(*n)),
        other => Err(wrong_target("Long", other)),
    }
}

fn arg_f64(args: &[Value], index: usize) -> Result<f64, UserError> {
    let value = arg(args, index)?;
    value.as_f64().ok_or_else(|| wrong_target("Double", value))
}

fn arg_char(args: &[Value], index: usize) -> Result<char, UserError> {
    match arg(args, index)? {
        Value::Char(c) => Ok(*c),
        other => Err(wrong_target("Character", other)),
    }
}

fn this_list(target: &Value) -> Result<&crate::value::ListRef, UserError> {
    target.as_list().ok_or_else(|| wrong_target("List", target))
}

fn this_map(target: &Value) -> Result<&crate::value::MapRef, UserError> {
    target.as_map().ok_or_else(|| wrong_target("Map", target))
}

fn char_range(s: &str, begin: i32, end: i32) -> Result<String, UserError> {
    let length = s.chars().count();
    let (Ok(b), Ok(e)) = (usize::try_from(begin), usize::try_from(end)) else {
        return Err(out_of_range(begin, end, length));
    };
    if b > e || e > length {
        return Err(out_of_range(begin, end, length));
    }
    Ok(s.chars().skip(b).take(e - b).collect())
}

fn out_of_range(begin: i32, end: i32, length: usize) -> UserError {
    UserError::system(format!(
        "StringIndexOutOfBoundsException: begin {begin}, end {end}, length {length}"
    ))
}

fn builtin(name: &str, descriptor: D) -> TypeBuilder {
    TypeBuilder::with_descriptor(Arc::from(name), descriptor)
}

fn object_type() -> Arc<TypeInfo> {
    builtin("Object", D::Any)
        .method("toString", vec![], D::Str, |this, _| {
            Ok(Value::string(this.to_string()))
        })
        .method("equals", vec![D::Any], D::BOOLEAN, |this, args| {
            Ok(Value::Bool(this == arg(args, 0)?))
        })
        .build()
}

fn type_type() -> Arc<TypeInfo> {
    fn info(this: &Value) -> Result<&Arc<TypeInfo>, UserError> {
        match this {
            Value::Type(info) => Ok(info),
            other => Err(wrong_target("Type", other)),
        }
    }
    builtin("Type", D::Type)
        .property("name", D::Str, |this| Ok(Value::string(info(this)?.name())))
        .property("simpleName", D::Str, |this| {
            Ok(Value::string(info(this)?.simple_name()))
        })
        .method("getName", vec![], D::Str, |this, _| {
            Ok(Value::string(info(this)?.name()))
        })
        .build()
}

fn string_type() -> Arc<TypeInfo> {
    builtin("String", D::Str)
        .method("length", vec![], D::INT, |this, _| {
            Ok(Value::Int(len_i32(this_str(this)?.chars().count())))
        })
        .method("isEmpty", vec![], D::BOOLEAN, |this, _| {
            Ok(Value::Bool(this_str(this)?.is_empty()))
        })
        .method("toUpperCase", vec![], D::Str, |this, _| {
            Ok(Value::string(this_str(this)?.to_uppercase()))
        })
        .method("toLowerCase", vec![], D::Str, |this, _| {
            Ok(Value::string(this_str(this)?.to_lowercase()))
        })
        .method("trim", vec![], D::Str, |this, _| {
            Ok(Value::string(this_str(this)?.trim()))
        })
        .method("charAt", vec![D::INT], D::CHAR, |this, args| {
            let s = this_str(this)?;
            let index = arg_i32(args, 0)?;
            usize::try_from(index)
                .ok()
                .and_then(|i| s.chars().nth(i))
                .map(Value::Char)
                .ok_or_else(|| {
                    UserError::system(format!(
                        "StringIndexOutOfBoundsException: index {index}, length {}",
                        s.chars().count()
                    ))
                })
        })
        .method("substring", vec![D::INT], D::Str, |this, args| {
            let s = this_str(this)?;
            let end = len_i32(s.chars().count());
            char_range(s, arg_i32(args, 0)?, end).map(Value::from)
        })
        .method("substring", vec![D::INT, D::INT], D::Str, |this, args| {
            char_range(this_str(this)?, arg_i32(args, 0)?, arg_i32(args, 1)?).map(Value::from)
        })
        .method("indexOf", vec![D::Str], D::INT, |this, args| {
            let s = this_str(this)?;
            let needle = arg_str(args, 0)?;
            let index = s
                .find(needle)
                .map_or(-1, |byte| len_i32(s[..byte].chars().count()));
            Ok(Value::Int(index))
        })
        .method("contains", vec![D::Str], D::BOOLEAN, |this, args| {
            Ok(Value::Bool(this_str(this)?.contains(arg_str(args, 0)?)))
        })
        .method("startsWith", vec![D::Str], D::BOOLEAN, |this, args| {
            Ok(Value::Bool(this_str(this)?.starts_with(arg_str(args, 0)?)))
        })
        .method("endsWith", vec![D::Str], D::BOOLEAN, |this, args| {
            Ok(Value::Bool(this_str(this)?.ends_with(arg_str(args, 0)?)))
        })
        .method("concat", vec![D::Str], D::Str, |this, args| {
            Ok(Value::string(format!(
                "{}{}",
                this_str(this)?,
                arg_str(args, 0)?
            )))
        })
        .method("replace", vec![D::Str, D::Str], D::Str, |this, args| {
            Ok(Value::string(
                this_str(this)?.replace(arg_str(args, 0)?, arg_str(args, 1)?),
            ))
        })
        .method("split", vec![D::Str], D::List, |this, args| {
            let pattern = Regex::new(arg_str(args, 0)?).map_err(|e| {
                UserError::system(format!("PatternSyntaxException: {e}"))
            })?;
            let mut parts: Vec<Value> = pattern
                .split(this_str(this)?)
                .map(Value::string)
                .collect();
            while parts.len() > 1 && parts.last().and_then(Value::as_str) == Some("") {
                parts.pop();
            }
            Ok(Value::list(parts))
        })
        .static_method("valueOf", vec![D::Any], D::Str, |args| {
            Ok(Value::string(arg(args, 0)?.to_string()))
        })
        .build()
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "narrowing follows two's-complement semantics"
)]
fn number_type() -> Arc<TypeInfo> {
    fn to_i64(this: &Value) -> Result<i64, UserError> {
        match this {
            Value::Int(n) => Ok(i64::from(*n)),
            Value::Long(n) => Ok(*n),
            Value::Float(n) => Ok(*n as i64),
            Value::Double(n) => Ok(*n as i64),
            other => Err(wrong_target("Number", other)),
        }
    }
    fn to_f64(this: &Value) -> Result<f64, UserError> {
        this.as_f64().ok_or_else(|| wrong_target("Number", this))
    }
    builtin("Number", D::object("Number"))
        .method("intValue", vec![], D::INT, |this, _| {
            Ok(Value::Int(to_i64(this)? as i32))
        })
        .method("longValue", vec![], D::LONG, |this, _| {
            Ok(Value::Long(to_i64(this)?))
        })
        .method("doubleValue", vec![], D::DOUBLE, |this, _| {
            Ok(Value::Double(to_f64(this)?))
        })
        .method("floatValue", vec![], D::FLOAT, |this, _| {
            Ok(Value::Float(to_f64(this)? as f32))
        })
        .build()
}

fn parse_failure(text: &str) -> UserError {
    UserError::system(format!(
        "NumberFormatException: For input string: \"{text}\""
    ))
}

fn integer_type() -> Arc<TypeInfo> {
    builtin("Integer", D::Boxed(Primitive::Int))
        .supertype("Number")
        .value_type()
        .static_property("MAX_VALUE", D::INT, || Ok(Value::Int(i32::MAX)))
        .static_property("MIN_VALUE", D::INT, || Ok(Value::Int(i32::MIN)))
        .static_method("parseInt", vec![D::Str], D::INT, |args| {
            let text = arg_str(args, 0)?;
            text.parse::<i32>()
                .map(Value::Int)
                .map_err(|_| parse_failure(text))
        })
        .static_method("valueOf", vec![D::INT], D::Boxed(Primitive::Int), |args| {
            Ok(Value::Int(arg_i32(args, 0)?))
        })
        .build()
}

fn long_type() -> Arc<TypeInfo> {
    builtin("Long", D::Boxed(Primitive::Long))
        .supertype("Number")
        .value_type()
        .static_property("MAX_VALUE", D::LONG, || Ok(Value::Long(i64::MAX)))
        .static_property("MIN_VALUE", D::LONG, || Ok(Value::Long(i64::MIN)))
        .static_method("parseLong", vec![D::Str], D::LONG, |args| {
            let text = arg_str(args, 0)?;
            text.parse::<i64>()
                .map(Value::Long)
                .map_err(|_| parse_failure(text))
        })
        .build()
}

fn float_type() -> Arc<TypeInfo> {
    builtin("Float", D::Boxed(Primitive::Float))
        .supertype("Number")
        .value_type()
        .static_method("parseFloat", vec![D::Str], D::FLOAT, |args| {
            let text = arg_str(args, 0)?;
            text.trim()
                .parse::<f32>()
                .map(Value::Float)
                .map_err(|_| parse_failure(text))
        })
        .build()
}

fn double_type() -> Arc<TypeInfo> {
    builtin("Double", D::Boxed(Primitive::Double))
        .supertype("Number")
        .value_type()
        .static_property("MAX_VALUE", D::DOUBLE, || Ok(Value::Double(f64::MAX)))
        .static_property("MIN_VALUE", D::DOUBLE, || {
            Ok(Value::Double(f64::from_bits(1)))
        })
        .static_method("parseDouble", vec![D::Str], D::DOUBLE, |args| {
            let text = arg_str(args, 0)?;
            text.trim()
                .parse::<f64>()
                .map(Value::Double)
                .map_err(|_| parse_failure(text))
        })
        .method("isNaN", vec![], D::BOOLEAN, |this, _| {
            Ok(Value::Bool(this.as_f64().is_some_and(f64::is_nan)))
        })
        .build()
}

fn boolean_type() -> Arc<TypeInfo> {
    builtin("Boolean", D::Boxed(Primitive::Bool))
        .value_type()
        .static_property("TRUE", D::Boxed(Primitive::Bool), || Ok(Value::Bool(true)))
        .static_property("FALSE", D::Boxed(Primitive::Bool), || {
            Ok(Value::Bool(false))
        })
        .static_method("parseBoolean", vec![D::Str], D::BOOLEAN, |args| {
            Ok(Value::Bool(arg_str(args, 0)?.eq_ignore_ascii_case("true")))
        })
        .method("booleanValue", vec![], D::BOOLEAN, |this, _| {
            this.as_bool()
                .map(Value::Bool)
                .ok_or_else(|| wrong_target("Boolean", this))
        })
        .build()
}

fn character_type() -> Arc<TypeInfo> {
    builtin("Character", D::Boxed(Primitive::Char))
        .value_type()
        .static_method("isDigit", vec![D::CHAR], D::BOOLEAN, |args| {
            Ok(Value::Bool(arg_char(args, 0)?.is_ascii_digit()))
        })
        .static_method("isLetter", vec![D::CHAR], D::BOOLEAN, |args| {
            Ok(Value::Bool(arg_char(args, 0)?.is_alphabetic()))
        })
        .static_method("isWhitespace", vec![D::CHAR], D::BOOLEAN, |args| {
            Ok(Value::Bool(arg_char(args, 0)?.is_whitespace()))
        })
        .build()
}

fn list_type() -> Arc<TypeInfo> {
    builtin("List", D::List)
        .method("size", vec![], D::INT, |this, _| {
            Ok(Value::Int(len_i32(this_list(this)?.len())))
        })
        .method("isEmpty", vec![], D::BOOLEAN, |this, _| {
            Ok(Value::Bool(this_list(this)?.is_empty()))
        })
        .method("get", vec![D::INT], D::Any, |this, args| {
            let list = this_list(this)?;
            let index = arg_i32(args, 0)?;
            usize::try_from(index)
                .ok()
                .and_then(|i| list.get(i))
                .ok_or_else(|| {
                    UserError::system(format!(
                        "IndexOutOfBoundsException: Index {index} out of bounds for length {}",
                        list.len()
                    ))
                })
        })
        .method("contains", vec![D::Any], D::BOOLEAN, |this, args| {
            Ok(Value::Bool(this_list(this)?.contains(arg(args, 0)?)))
        })
        .method("indexOf", vec![D::Any], D::INT, |this, args| {
            let index = this_list(this)?.index_of(arg(args, 0)?);
            Ok(Value::Int(index.map_or(-1, len_i32)))
        })
        .method("add", vec![D::Any], D::BOOLEAN, |this, args| {
            this_list(this)?.push(arg(args, 0)?.clone())?;
            Ok(Value::Bool(true))
        })
        .build()
}

fn map_type() -> Arc<TypeInfo> {
    builtin("Map", D::Map)
        .method("size", vec![], D::INT, |this, _| {
            Ok(Value::Int(len_i32(this_map(this)?.len())))
        })
        .method("isEmpty", vec![], D::BOOLEAN, |this, _| {
            Ok(Value::Bool(this_map(this)?.is_empty()))
        })
        .method("get", vec![D::Any], D::Any, |this, args| {
            Ok(this_map(this)?.get(arg(args, 0)?).unwrap_or(Value::Null))
        })
        .method("containsKey", vec![D::Any], D::BOOLEAN, |this, args| {
            Ok(Value::Bool(this_map(this)?.contains_key(arg(args, 0)?)))
        })
        .method("keySet", vec![], D::List, |this, _| {
            Ok(Value::list(this_map(this)?.keys()))
        })
        .method("values", vec![], D::List, |this, _| {
            Ok(Value::list(this_map(this)?.values()))
        })
        .method("put", vec![D::Any, D::Any], D::Any, |this, args| {
            let previous = this_map(this)?.insert(arg(args, 0)?.clone(), arg(args, 1)?.clone())?;
            Ok(previous.unwrap_or(Value::Null))
        })
        .build()
}

/// One key/value pair of a map, as seen by selection and projection.
#[derive(Debug)]
pub struct MapEntry {
    pub key: Value,
    pub value: Value,
}

fn entry(this: &Value) -> Result<&MapEntry, UserError> {
    this.downcast_ref::<MapEntry>()
        .ok_or_else(|| wrong_target("Map.Entry", this))
}

/// The shared `Map.Entry` type.
pub fn map_entry_type() -> Arc<TypeInfo> {
    static ENTRY: OnceLock<Arc<TypeInfo>> = OnceLock::new();
    ENTRY
        .get_or_init(|| {
            builtin("Map.Entry", D::object("Map.Entry"))
                .property("key", D::Any, |this| Ok(entry(this)?.key.clone()))
                .property("value", D::Any, |this| Ok(entry(this)?.value.clone()))
                .method("getKey", vec![], D::Any, |this, _| Ok(entry(this)?.key.clone()))
                .method("getValue", vec![], D::Any, |this, _| {
                    Ok(entry(this)?.value.clone())
                })
                .display(|this| {
                    entry(this).map_or_else(|_| String::new(), |e| format!("{}={}", e.key, e.value))
                })
                .build()
        })
        .clone()
}

/// Wrap a map entry as a value.
pub fn map_entry(key: Value, value: Value) -> Value {
    Value::object(&map_entry_type(), MapEntry { key, value })
}

fn function_type() -> Arc<TypeInfo> {
    builtin("Function", D::Function).build()
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "Math.round returns the nearest long, saturating"
)]
fn math_type() -> Arc<TypeInfo> {
    builtin("Math", D::object("Math"))
        .static_property("PI", D::DOUBLE, || Ok(Value::Double(std::f64::consts::PI)))
        .static_property("E", D::DOUBLE, || Ok(Value::Double(std::f64::consts::E)))
        .static_method("max", vec![D::INT, D::INT], D::INT, |args| {
            Ok(Value::Int(arg_i32(args, 0)?.max(arg_i32(args, 1)?)))
        })
        .static_method("max", vec![D::LONG, D::LONG], D::LONG, |args| {
            Ok(Value::Long(arg_i64(args, 0)?.max(arg_i64(args, 1)?)))
        })
        .static_method("max", vec![D::DOUBLE, D::DOUBLE], D::DOUBLE, |args| {
            Ok(Value::Double(arg_f64(args, 0)?.max(arg_f64(args, 1)?)))
        })
        .static_method("min", vec![D::INT, D::INT], D::INT, |args| {
            Ok(Value::Int(arg_i32(args, 0)?.min(arg_i32(args, 1)?)))
        })
        .static_method("min", vec![D::LONG, D::LONG], D::LONG, |args| {
            Ok(Value::Long(arg_i64(args, 0)?.min(arg_i64(args, 1)?)))
        })
        .static_method("min", vec![D::DOUBLE, D::DOUBLE], D::DOUBLE, |args| {
            Ok(Value::Double(arg_f64(args, 0)?.min(arg_f64(args, 1)?)))
        })
        .static_method("abs", vec![D::INT], D::INT, |args| {
            Ok(Value::Int(arg_i32(args, 0)?.wrapping_abs()))
        })
        .static_method("abs", vec![D::LONG], D::LONG, |args| {
            Ok(Value::Long(arg_i64(args, 0)?.wrapping_abs()))
        })
        .static_method("abs", vec![D::DOUBLE], D::DOUBLE, |args| {
            Ok(Value::Double(arg_f64(args, 0)?.abs()))
        })
        .static_method("sqrt", vec![D::DOUBLE], D::DOUBLE, |args| {
            Ok(Value::Double(arg_f64(args, 0)?.sqrt()))
        })
        .static_method("pow", vec![D::DOUBLE, D::DOUBLE], D::DOUBLE, |args| {
            Ok(Value::Double(arg_f64(args, 0)?.powf(arg_f64(args, 1)?)))
        })
        .static_method("floor", vec![D::DOUBLE], D::DOUBLE, |args| {
            Ok(Value::Double(arg_f64(args, 0)?.floor()))
        })
        .static_method("ceil", vec![D::DOUBLE], D::DOUBLE, |args| {
            Ok(Value::Double(arg_f64(args, 0)?.ceil()))
        })
        .static_method("round", vec![D::DOUBLE], D::LONG, |args| {
            Ok(Value::Long((arg_f64(args, 0)? + 0.5).floor() as i64))
        })
        .build()
}
