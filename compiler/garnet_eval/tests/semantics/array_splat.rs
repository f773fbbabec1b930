//! Splats inside array literals.

use garnet_eval::{ObjectValue, Value};
use garnet_ir::{Elem, ExprBuilder, ExprId};
use pretty_assertions::assert_eq;

use crate::common::{array, ints, run, run_with};

fn broken_to_a(_: &ObjectValue) -> Value {
    Value::Int(23)
}

fn payload_to_a(object: &ObjectValue) -> Value {
    Value::array(object.payload.clone())
}

/// `[1, 2, *foo, 3, 4]`
fn splat_between(b: &mut ExprBuilder<'_>, foo: ExprId) -> ExprId {
    let one = b.int(1);
    let two = b.int(2);
    let three = b.int(3);
    let four = b.int(4);
    b.array(vec![
        Elem::Plain(one),
        Elem::Plain(two),
        Elem::Splat(foo),
        Elem::Plain(three),
        Elem::Plain(four),
    ])
}

#[test]
fn splat_nil_adds_nothing() {
    let out = run(|b| {
        let nil = b.nil();
        let init = b.assign("foo", nil);
        let foo = b.ident("foo");
        let arr = splat_between(b, foo);
        b.seq(vec![init, arr])
    });

    assert_eq!(out.value(), ints(&[1, 2, 3, 4]));
}

#[test]
fn splat_array_adds_its_elements() {
    let out = run(|b| {
        let ten = b.int(10);
        let eleven = b.int(11);
        let lit = b.array_of(vec![ten, eleven]);
        let init = b.assign("foo", lit);
        let foo = b.ident("foo");
        let arr = splat_between(b, foo);
        b.seq(vec![init, arr])
    });

    assert_eq!(out.value(), ints(&[1, 2, 10, 11, 3, 4]));
}

#[test]
fn splat_hash_adds_pairs_in_order() {
    // foo = { foo: :bar, quux: 23 }
    let out = run(|b| {
        let bar = b.sym("bar");
        let n23 = b.int(23);
        let hash = b.sym_hash(vec![("foo", bar), ("quux", n23)]);
        let init = b.assign("foo", hash);
        let foo = b.ident("foo");
        let arr = splat_between(b, foo);
        b.seq(vec![init, arr])
    });

    let expected = array(vec![
        Value::Int(1),
        Value::Int(2),
        array(vec![out.sym("foo"), out.sym("bar")]),
        array(vec![out.sym("quux"), Value::Int(23)]),
        Value::Int(3),
        Value::Int(4),
    ]);
    assert_eq!(out.value(), expected);
}

#[test]
fn splat_scalar_adds_the_value() {
    let out = run(|b| {
        let n20 = b.int(20);
        let init = b.assign("foo", n20);
        let foo = b.ident("foo");
        let arr = splat_between(b, foo);
        b.seq(vec![init, arr])
    });

    assert_eq!(out.value(), ints(&[1, 2, 20, 3, 4]));
}

#[test]
fn splat_object_uses_its_to_a() {
    let object = ObjectValue::new("Pair")
        .with_payload(vec![Value::Int(7), Value::Int(8)])
        .with_to_a(payload_to_a);
    let out = run_with(vec![("foo", Value::object(object))], |b| {
        let foo = b.ident("foo");
        splat_between(b, foo)
    });

    assert_eq!(out.value(), ints(&[1, 2, 7, 8, 3, 4]));
}

#[test]
fn splat_with_broken_to_a_is_a_type_error() {
    let object = ObjectValue::new("BrokenToA").with_to_a(broken_to_a);
    let out = run_with(vec![("foo", Value::object(object))], |b| {
        let foo = b.ident("foo");
        let arr = splat_between(b, foo);
        b.assign("arr", arr)
    });

    assert_eq!(out.error().class_name(), "TypeError");
    assert_eq!(
        out.error().message,
        "can't convert BrokenToA to Array (BrokenToA#to_a gives Integer)"
    );
    assert_eq!(out.local("arr"), Some(Value::Nil));
}
