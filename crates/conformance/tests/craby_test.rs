//! Conformance tests for the craby test module bindings.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use modgen_conformance::craby_test::{
    CrabyTestModule, CrabyTestSpec, MODULE_NAME, MyEnum, SubObject, TestObject,
};
use modgen_runtime::{InvokeError, ModuleLookup, ModuleRegistry, NativeModule, Promise, Value};
use std::sync::Arc;
use std::sync::mpsc;

struct Impl;

impl CrabyTestSpec for Impl {
    fn numeric_method(&self, arg: f64) -> f64 {
        arg * 2.0
    }

    fn boolean_method(&self, arg: bool) -> bool {
        !arg
    }

    fn string_method(&self, arg: String) -> String {
        arg.to_uppercase()
    }

    fn object_method(&self, mut arg: TestObject) -> TestObject {
        arg.bar += 1.0;
        if let Some(sub) = arg.sub.as_mut() {
            sub.b += 1;
        }
        arg
    }

    fn array_method(&self, arg: Vec<f64>) -> Vec<f64> {
        arg.into_iter().rev().collect()
    }

    fn enum_method(&self, arg0: MyEnum, arg1: Option<MyEnum>) -> String {
        format!("{}:{}", arg0.as_str(), arg1.map_or("none", |e| e.as_str()))
    }

    fn nullable_method(&self, arg: Option<f64>) -> Option<f64> {
        arg.map(|n| n + 1.0)
    }

    fn promise_method(&self, arg: f64, promise: Promise<f64>) {
        if arg < 0.0 {
            promise.reject("negative");
        } else {
            promise.resolve(arg * 2.0);
        }
    }

    fn fire_and_forget(&self, promise: Promise<()>) {
        promise.resolve(());
    }
}

fn module() -> Arc<dyn NativeModule> {
    let mut registry = ModuleRegistry::new();
    registry.register(CrabyTestModule(Impl)).unwrap();
    registry.get_enforcing("CrabyTest").unwrap()
}

fn call_async(
    module: &dyn NativeModule,
    method: &str,
    args: Vec<Value>,
) -> mpsc::Receiver<Result<Value, String>> {
    let (tx, rx) = mpsc::channel();
    let promise = Promise::new(move |result| {
        let _ = tx.send(result);
    });
    module.call_async(method, args, promise);
    rx
}

fn unwrap_argument(err: InvokeError) -> (usize, InvokeError) {
    match err {
        InvokeError::Argument { index, source } => (index, *source),
        other => panic!("expected an argument error, got {other:?}"),
    }
}

#[test]
fn test_registry_lookup() {
    let mut registry = ModuleRegistry::new();
    registry.register(CrabyTestModule(Impl)).unwrap();

    assert_eq!(MODULE_NAME, "CrabyTest");
    assert!(registry.get("CrabyTest").is_some());
    assert!(registry.get("crabyTest").is_none());
    assert!(registry.get_enforcing("Missing").is_err());

    let module = registry.get_enforcing("CrabyTest").unwrap();
    assert_eq!(module.name(), "CrabyTest");
    assert_eq!(
        module.methods(),
        &[
            "numericMethod",
            "booleanMethod",
            "stringMethod",
            "objectMethod",
            "arrayMethod",
            "enumMethod",
            "nullableMethod",
            "promiseMethod",
            "fireAndForget",
        ]
    );
}

#[test]
fn test_primitive_methods() {
    let module = module();
    assert_eq!(
        module.call("numericMethod", vec![Value::Number(1.5)]).unwrap(),
        Value::Number(3.0)
    );
    assert_eq!(
        module.call("booleanMethod", vec![Value::Bool(true)]).unwrap(),
        Value::Bool(false)
    );
    assert_eq!(
        module
            .call("stringMethod", vec![Value::String("crab".into())])
            .unwrap(),
        Value::String("CRAB".into())
    );
    assert_eq!(
        module
            .call(
                "arrayMethod",
                vec![Value::Array(vec![Value::Number(1.0), Value::Number(2.0)])]
            )
            .unwrap(),
        Value::Array(vec![Value::Number(2.0), Value::Number(1.0)])
    );
}

#[test]
fn test_object_round_trip_keeps_wire_names() {
    let module = module();
    let input = Value::Object(vec![
        ("foo".into(), Value::String("x".into())),
        ("bar".into(), Value::Number(1.0)),
        ("baz".into(), Value::Bool(true)),
        (
            "sub".into(),
            Value::Object(vec![
                ("a".into(), Value::Null),
                ("b".into(), Value::Number(41.0)),
                ("c".into(), Value::Bool(false)),
            ]),
        ),
    ]);
    let output = module.call("objectMethod", vec![input]).unwrap();
    assert_eq!(output.field("bar"), Some(&Value::Number(2.0)));
    let sub = output.field("sub").unwrap();
    assert_eq!(sub.field("a"), Some(&Value::Null));
    assert_eq!(sub.field("b"), Some(&Value::Number(42.0)));

    let typed = TestObject {
        foo: "y".into(),
        bar: 0.0,
        baz: false,
        sub: Some(SubObject {
            a: Some("z".into()),
            b: 1,
            c: true,
        }),
    };
    assert_eq!(Impl.object_method(typed).sub.unwrap().b, 2);
}

#[test]
fn test_object_with_fractional_int32_field_is_rejected() {
    let module = module();
    let input = Value::Object(vec![
        ("foo".into(), Value::String("x".into())),
        ("bar".into(), Value::Number(1.0)),
        ("baz".into(), Value::Bool(true)),
        (
            "sub".into(),
            Value::Object(vec![("b".into(), Value::Number(1.5)), ("c".into(), Value::Bool(true))]),
        ),
    ]);
    let err = module.call("objectMethod", vec![input]).unwrap_err();
    let (index, source) = unwrap_argument(err);
    assert_eq!(index, 0);
    assert!(matches!(source, InvokeError::Field { ref field, .. } if field == "sub"));
}

#[test]
fn test_enum_accepts_declared_values_only() {
    let module = module();
    assert_eq!(
        module
            .call(
                "enumMethod",
                vec![Value::String("foo".into()), Value::String("baz".into())]
            )
            .unwrap(),
        Value::String("foo:baz".into())
    );
    assert_eq!(
        module
            .call("enumMethod", vec![Value::String("bar".into()), Value::Null])
            .unwrap(),
        Value::String("bar:none".into())
    );

    let err = module
        .call("enumMethod", vec![Value::String("qux".into()), Value::Null])
        .unwrap_err();
    let (index, source) = unwrap_argument(err);
    assert_eq!(index, 0);
    assert_eq!(
        source,
        InvokeError::UnknownVariant {
            enum_name: "MyEnum",
            value: "qux".into(),
        }
    );

    // Variant names are not wire values
    assert!(
        module
            .call("enumMethod", vec![Value::String("FOO".into()), Value::Null])
            .is_err()
    );
    assert_eq!(MyEnum::ALL.len(), 3);
}

#[test]
fn test_nullable_passes_null_through() {
    let module = module();
    assert_eq!(
        module.call("nullableMethod", vec![Value::Null]).unwrap(),
        Value::Null
    );
    assert_eq!(
        module
            .call("nullableMethod", vec![Value::Number(1.0)])
            .unwrap(),
        Value::Number(2.0)
    );
}

#[test]
fn test_arity_and_unknown_method() {
    let module = module();
    assert!(matches!(
        module.call("numericMethod", vec![]),
        Err(InvokeError::Arity {
            expected: 1,
            actual: 0,
            ..
        })
    ));
    assert!(matches!(
        module.call("promiseMethod", vec![Value::Number(1.0)]),
        Err(InvokeError::UnknownMethod { .. })
    ));
}

#[test]
fn test_promise_settles_exactly_once() {
    let module = module();

    let rx = call_async(module.as_ref(), "promiseMethod", vec![Value::Number(2.0)]);
    assert_eq!(rx.recv().unwrap(), Ok(Value::Number(4.0)));
    assert!(rx.try_recv().is_err());

    let rx = call_async(module.as_ref(), "promiseMethod", vec![Value::Number(-1.0)]);
    assert_eq!(rx.recv().unwrap(), Err("negative".to_string()));
    assert!(rx.try_recv().is_err());

    let rx = call_async(module.as_ref(), "fireAndForget", vec![]);
    assert_eq!(rx.recv().unwrap(), Ok(Value::Null));
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_async_marshaling_errors_reject() {
    let module = module();

    let rx = call_async(
        module.as_ref(),
        "promiseMethod",
        vec![Value::String("two".into())],
    );
    let reason = rx.recv().unwrap().unwrap_err();
    assert!(reason.contains("argument 0"), "{reason}");
    assert!(rx.try_recv().is_err());

    let rx = call_async(module.as_ref(), "numericMethod", vec![Value::Number(1.0)]);
    assert!(rx.recv().unwrap().is_err());
}
