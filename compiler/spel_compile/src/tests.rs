use std::sync::Arc;

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use spel_diagnostic::SpelMessage;
use spel_eval::{
    EvalError, EvaluationContext, ExpressionState, SpelNode, StandardEvaluationContext,
    TypeBuilder, TypeDescriptor, TypeInfo, TypeRegistry, Value,
};
use spel_parse::{parse_expression, DEFAULT_MAX_EXPRESSION_LENGTH};

use crate::{CompilationState, CompileError, CompiledExpression, Instr, SpelCompiler};

fn node(source: &str) -> SpelNode {
    match parse_expression(source, DEFAULT_MAX_EXPRESSION_LENGTH) {
        Ok(expr) => SpelNode::lower(&expr),
        Err(err) => panic!("failed to parse {source:?}: {err}"),
    }
}

fn interpret(ctx: &dyn EvaluationContext, node: &SpelNode) -> Value {
    let mut state = ExpressionState::new(ctx);
    match node.get_value(&mut state) {
        Ok(value) => value.into_value(),
        Err(err) => panic!("interpretation failed: {err}"),
    }
}

fn compile(node: &SpelNode) -> CompiledExpression {
    match SpelCompiler::new().compile(node) {
        Ok(compiled) => compiled,
        Err(err) => panic!("compilation failed: {err}"),
    }
}

fn run(ctx: &dyn EvaluationContext, compiled: &CompiledExpression) -> Result<Value, EvalError> {
    compiled
        .get_value(ctx, &ctx.root_object())
        .map(spel_eval::TypedValue::into_value)
}

fn run_ok(ctx: &dyn EvaluationContext, compiled: &CompiledExpression) -> Value {
    match run(ctx, compiled) {
        Ok(value) => value,
        Err(err) => panic!("compiled run failed: {err}"),
    }
}

/// Interpret once, compile, and check both paths agree.
fn both_ways(ctx: &dyn EvaluationContext, source: &str) -> Value {
    let node = node(source);
    let interpreted = interpret(ctx, &node);
    let compiled = compile(&node);
    assert_eq!(run_ok(ctx, &compiled), interpreted, "{source}");
    interpreted
}

struct Animal {
    name: Mutex<String>,
    legs: i32,
}

fn animal(this: &Value) -> Result<&Animal, spel_eval::UserError> {
    this.downcast_ref::<Animal>()
        .ok_or_else(|| spel_eval::UserError::system("not an animal"))
}

fn animal_types() -> (Arc<TypeInfo>, Arc<TypeInfo>) {
    let base = TypeBuilder::new("zoo.Animal")
        .property("name", TypeDescriptor::Str, |this| {
            Ok(Value::string(&*animal(this)?.name.lock()))
        })
        .property("legs", TypeDescriptor::INT, |this| {
            Ok(Value::Int(animal(this)?.legs))
        })
        .method("sound", vec![], TypeDescriptor::Str, |_, _| {
            Ok(Value::string("..."))
        })
        .method("describe", vec![TypeDescriptor::Str], TypeDescriptor::Str, |this, args| {
            let prefix = args.first().map(ToString::to_string).unwrap_or_default();
            Ok(Value::string(format!("{prefix}{}", animal(this)?.name.lock())))
        })
        .build();
    let dog = TypeBuilder::new("zoo.Dog")
        .supertype("zoo.Animal")
        .method("sound", vec![], TypeDescriptor::Str, |_, _| Ok(Value::string("woof")))
        .build();
    (base, dog)
}

fn zoo_context() -> (StandardEvaluationContext, Arc<TypeInfo>, Arc<TypeInfo>) {
    let (base, dog) = animal_types();
    let mut registry = TypeRegistry::with_builtins();
    registry.register(base.clone());
    registry.register(dog.clone());
    let mut ctx = StandardEvaluationContext::new().with_types(registry);
    ctx.set_root_object(make(&base, "Rex", 4));
    (ctx, base, dog)
}

fn make(info: &Arc<TypeInfo>, name: &str, legs: i32) -> Value {
    Value::object(
        info,
        Animal {
            name: Mutex::new(name.to_owned()),
            legs,
        },
    )
}

#[test]
fn literals_and_arithmetic() {
    let ctx = StandardEvaluationContext::new();
    assert_eq!(both_ways(&ctx, "1 + 2 * 3"), Value::Int(7));
    assert_eq!(both_ways(&ctx, "7 % 3 - 1L"), Value::Long(0));
    assert_eq!(both_ways(&ctx, "1.5 + 1"), Value::Double(2.5));
    assert_eq!(both_ways(&ctx, "2147483647 + 1"), Value::Int(i32::MIN));
    assert_eq!(both_ways(&ctx, "-(3) * 2"), Value::Int(-6));
    assert_eq!(both_ways(&ctx, "'a' + 1"), Value::string("a1"));
}

#[test]
fn logic_and_comparison() {
    let ctx = StandardEvaluationContext::new();
    assert_eq!(both_ways(&ctx, "1 < 2L and !(2 == 3)"), Value::Bool(true));
    assert_eq!(both_ways(&ctx, "1 == 1.0"), Value::Bool(true));
    assert_eq!(both_ways(&ctx, "'a' != 'b' or false"), Value::Bool(true));
}

#[test]
fn skipped_literal_operands_do_not_block_compilation() {
    let ctx = StandardEvaluationContext::new();
    for (source, expected) in [("true or false", true), ("false and true", false)] {
        let node = node(source);
        assert_eq!(interpret(&ctx, &node), Value::Bool(expected), "{source}");
        assert_eq!(
            CompilationState::of(&node, true),
            CompilationState::Compilable,
            "{source}"
        );
        assert_eq!(run_ok(&ctx, &compile(&node)), Value::Bool(expected), "{source}");
    }
}

#[test]
fn string_methods_compile() {
    let ctx = StandardEvaluationContext::new();
    assert_eq!(both_ways(&ctx, "'hello'.length() + 1L"), Value::Long(6));
    assert_eq!(both_ways(&ctx, "'hello'.toUpperCase()"), Value::string("HELLO"));
    assert_eq!(both_ways(&ctx, "'hello'.substring(1, 3)"), Value::string("el"));
}

#[test]
fn static_calls_on_type_references() {
    let ctx = StandardEvaluationContext::new();
    assert_eq!(both_ways(&ctx, "T(Math).max(3, 7)"), Value::Int(7));
    assert_eq!(both_ways(&ctx, "T(Integer).parseInt('42') + 1"), Value::Int(43));
}

#[test]
fn properties_and_methods_on_the_root() {
    let (ctx, ..) = zoo_context();
    assert_eq!(both_ways(&ctx, "name"), Value::string("Rex"));
    assert_eq!(both_ways(&ctx, "legs * 2"), Value::Int(8));
    assert_eq!(both_ways(&ctx, "name.length()"), Value::Int(3));
    assert_eq!(both_ways(&ctx, "describe('a dog named ')"), Value::string("a dog named Rex"));
}

#[test]
fn compiled_code_follows_new_values() {
    let ctx = StandardEvaluationContext::new();
    ctx.set_variable("n", Value::Int(5));
    let node = node("#n * 2 + 1L");
    assert_eq!(interpret(&ctx, &node), Value::Long(11));
    let compiled = compile(&node);
    ctx.set_variable("n", Value::Int(20));
    assert_eq!(run_ok(&ctx, &compiled), Value::Long(41));
}

#[test]
fn overridden_methods_dispatch_on_the_runtime_type() {
    let (mut ctx, _, dog) = zoo_context();
    let node = node("sound()");
    assert_eq!(interpret(&ctx, &node), Value::string("..."));
    let compiled = compile(&node);

    ctx.set_root_object(make(&dog, "Fido", 4));
    assert_eq!(run_ok(&ctx, &compiled), Value::string("woof"));
    assert_eq!(interpret(&ctx, &node), Value::string("woof"));
}

#[test]
fn null_safe_navigation() {
    let ctx = StandardEvaluationContext::new();
    ctx.set_variable("s", Value::string("abc"));
    let node = node("#s?.length()");
    assert_eq!(interpret(&ctx, &node), Value::Int(3));
    assert_eq!(
        node.exit_descriptor(),
        Some(TypeDescriptor::INT.to_boxed())
    );
    let compiled = compile(&node);
    assert_eq!(run_ok(&ctx, &compiled), Value::Int(3));

    ctx.set_variable("s", Value::Null);
    assert_eq!(run_ok(&ctx, &compiled), Value::Null);
    assert_eq!(interpret(&ctx, &node), Value::Null);
}

#[test]
fn null_safe_call_on_a_null_receiver() {
    let (mut ctx, base, _) = zoo_context();
    ctx.set_variable("a", make(&base, "Tom", 4));
    let node = node("#a?.describe('cat ')");
    assert_eq!(interpret(&ctx, &node), Value::string("cat Tom"));
    let compiled = compile(&node);
    ctx.set_variable("a", Value::Null);
    assert_eq!(run_ok(&ctx, &compiled), Value::Null);
    ctx.set_root_object(Value::Null);
    assert_eq!(run_ok(&ctx, &compiled), Value::Null);
}

#[test]
fn null_safe_step_ends_the_compiled_chain() {
    let (ctx, base, _) = zoo_context();
    ctx.set_variable("a", make(&base, "Tom", 4));
    let node = node("#a?.name.toUpperCase()");
    assert_eq!(interpret(&ctx, &node), Value::string("TOM"));
    let compiled = compile(&node);
    assert_eq!(run_ok(&ctx, &compiled), Value::string("TOM"));

    ctx.set_variable("a", Value::Null);
    assert_eq!(run_ok(&ctx, &compiled), Value::Null);
    assert_eq!(interpret(&ctx, &node), Value::Null);
    ctx.set_variable("a", make(&base, "Max", 4));
    assert_eq!(run_ok(&ctx, &compiled), Value::string("MAX"));

    // Null cannot stand in for a primitive result.
    let counted = self::node("#a?.name.length()");
    assert_eq!(interpret(&ctx, &counted), Value::Int(3));
    assert_eq!(
        CompilationState::of(&counted, true),
        CompilationState::NotCompilable
    );
}

#[test]
fn ternary_and_elvis_need_both_branches() {
    let ctx = StandardEvaluationContext::new();
    let ternary = node("#n > 3 ? 'big' : 'small'");
    ctx.set_variable("n", Value::Int(5));
    assert_eq!(interpret(&ctx, &ternary), Value::string("big"));
    assert_eq!(
        CompilationState::of(&ternary, true),
        CompilationState::Interpreted
    );
    ctx.set_variable("n", Value::Int(1));
    assert_eq!(interpret(&ctx, &ternary), Value::string("small"));
    assert_eq!(
        CompilationState::of(&ternary, true),
        CompilationState::Compilable
    );
    let compiled = compile(&ternary);
    ctx.set_variable("n", Value::Int(9));
    assert_eq!(run_ok(&ctx, &compiled), Value::string("big"));

    let elvis = node("#s ?: 'none'");
    ctx.set_variable("s", Value::string(""));
    assert_eq!(interpret(&ctx, &elvis), Value::string("none"));
    let compiled = compile(&elvis);
    ctx.set_variable("s", Value::string("x"));
    assert_eq!(run_ok(&ctx, &compiled), Value::string("x"));
    ctx.set_variable("s", Value::Null);
    assert_eq!(run_ok(&ctx, &compiled), Value::string("none"));
}

#[test]
fn list_indexing() {
    let ctx = StandardEvaluationContext::new();
    ctx.set_variable(
        "list",
        Value::list(vec![Value::Int(10), Value::Int(20), Value::Int(30)]),
    );
    let node = node("#list[1]");
    assert_eq!(interpret(&ctx, &node), Value::Int(20));
    let compiled = compile(&node);
    assert_eq!(compiled.program().code().last(), Some(&Instr::Return));
    assert_eq!(run_ok(&ctx, &compiled), Value::Int(20));

    ctx.set_variable("list", Value::list(vec![Value::Int(1)]));
    let err = run(&ctx, &compiled).err();
    assert_eq!(
        err.and_then(|e| e.message()),
        Some(SpelMessage::CollectionIndexOutOfBounds)
    );
}

#[test]
fn compiled_failures_match_the_interpreter() {
    let ctx = StandardEvaluationContext::new();
    ctx.set_variable("n", Value::Int(4));
    ctx.set_variable("d", Value::Int(2));
    let node = node("#n / #d");
    assert_eq!(interpret(&ctx, &node), Value::Int(2));
    let compiled = compile(&node);

    ctx.set_variable("d", Value::Int(0));
    assert_eq!(
        run(&ctx, &compiled).err().and_then(|e| e.message()),
        Some(SpelMessage::DivisionByZero)
    );

    ctx.set_variable("d", Value::string("two"));
    assert_eq!(
        run(&ctx, &compiled).err().and_then(|e| e.message()),
        Some(SpelMessage::TypeConversionError)
    );
}

#[test]
fn compilation_state_tracks_evaluation() {
    let ctx = StandardEvaluationContext::new();

    let fresh = node("1 + 2");
    assert_eq!(CompilationState::of(&fresh, false), CompilationState::Uninitialized);
    assert!(matches!(
        SpelCompiler::new().compile(&fresh),
        Err(CompileError::NotCompilable { .. })
    ));

    let short = node("true or 1 / 0 == 1");
    interpret(&ctx, &short);
    assert_eq!(CompilationState::of(&short, true), CompilationState::Interpreted);

    let regex = node("'abc' matches 'a.*'");
    interpret(&ctx, &regex);
    assert_eq!(CompilationState::of(&regex, true), CompilationState::NotCompilable);

    let selection = node("{1, 2, 3}.?[#this > 1]");
    interpret(&ctx, &selection);
    assert!(SpelCompiler::new().compile(&selection).is_err());
}

#[test]
fn disassembly_lists_every_instruction() {
    let ctx = StandardEvaluationContext::new();
    let node = node("1 + 2");
    interpret(&ctx, &node);
    let compiled = compile(&node);
    let listing = compiled.program().to_string();
    assert_eq!(listing.lines().count(), compiled.program().code().len());
    assert_eq!(compiled.program().result_descriptor(), &TypeDescriptor::INT);
}
