//! Lambdas: strict binding and exits that stop at the lambda.

use garnet_eval::Value;
use garnet_ir::{Arg, BinaryOp, ExprBuilder, ExprId, Param, ParamList};
use pretty_assertions::assert_eq;

use crate::common::{array, ints, required, run, sym_hash};

/// l = ->(x, mode = 23) do BODY end
fn assign_mode_lambda(b: &mut ExprBuilder<'_>, body: ExprId) -> ExprId {
    let n23 = b.int(23);
    let params = ParamList::new(vec![
        Param::required(b.name("x")),
        Param::optional(b.name("mode"), n23),
    ]);
    let lambda = b.lambda(params, body);
    b.assign("l", lambda)
}

/// `[x, mode]`
fn x_and_mode(b: &mut ExprBuilder<'_>) -> ExprId {
    let x = b.ident("x");
    let mode = b.ident("mode");
    b.array_of(vec![x, mode])
}

/// l.call(args...)
fn call_l(b: &mut ExprBuilder<'_>, args: Vec<Arg>) -> ExprId {
    let l = b.ident("l");
    b.call_proc(l, args, None)
}

fn positional(b: &mut ExprBuilder<'_>, ns: &[i64]) -> Vec<Arg> {
    ns.iter().map(|&n| Arg::Positional(b.int(n))).collect()
}

#[test]
fn no_arguments() {
    let out = run(|b| {
        let body = b.str("foo");
        let lambda = b.lambda(ParamList::empty(), body);
        let assign = b.assign("l", lambda);
        let call = call_l(b, vec![]);
        b.seq(vec![assign, call])
    });

    assert_eq!(out.value(), Value::from("foo"));
}

#[test]
fn not_enough_arguments() {
    let out = run(|b| {
        let body = x_and_mode(b);
        let assign = assign_mode_lambda(b, body);
        let call = call_l(b, vec![]);
        b.seq(vec![assign, call])
    });

    assert_eq!(out.error().class_name(), "ArgumentError");
    assert_eq!(
        out.error().message,
        "wrong number of arguments (given 0, expected 1..2)"
    );
}

#[test]
fn too_many_arguments() {
    let out = run(|b| {
        let body = x_and_mode(b);
        let assign = assign_mode_lambda(b, body);
        let args = positional(b, &[10, 20, 30]);
        let call = call_l(b, args);
        b.seq(vec![assign, call])
    });

    assert_eq!(out.error().class_name(), "ArgumentError");
    assert_eq!(
        out.error().message,
        "wrong number of arguments (given 3, expected 1..2)"
    );
}

#[test]
fn default_arguments() {
    let out = run(|b| {
        let body = x_and_mode(b);
        let assign = assign_mode_lambda(b, body);
        let args = positional(b, &[10]);
        let call = call_l(b, args);
        b.seq(vec![assign, call])
    });

    assert_eq!(out.value(), ints(&[10, 23]));
}

#[test]
fn break_leaves_the_lambda() {
    let out = run(|b| {
        let value = x_and_mode(b);
        let brk = b.break_(Some(value));
        let n20 = b.int(20);
        let dead = b.assign("a", n20);
        let body = b.seq(vec![brk, dead]);
        let assign = assign_mode_lambda(b, body);
        let args = positional(b, &[10]);
        let call = call_l(b, args);
        b.seq(vec![assign, call])
    });

    assert_eq!(out.value(), ints(&[10, 23]));
}

#[test]
fn bare_break_is_nil() {
    let out = run(|b| {
        let brk = b.break_(None);
        let n20 = b.int(20);
        let dead = b.assign("a", n20);
        let body = b.seq(vec![brk, dead]);
        let assign = assign_mode_lambda(b, body);
        let args = positional(b, &[10]);
        let call = call_l(b, args);
        b.seq(vec![assign, call])
    });

    assert_eq!(out.value(), Value::Nil);
}

#[test]
fn return_leaves_only_the_lambda() {
    // r = -> do return 1; 2 end.call; [r, 3]
    let out = run(|b| {
        let one = b.int(1);
        let ret = b.return_(Some(one));
        let two = b.int(2);
        let body = b.seq(vec![ret, two]);
        let lambda = b.lambda(ParamList::empty(), body);
        let call = b.call_proc(lambda, vec![], None);
        let assign = b.assign("r", call);
        let r = b.ident("r");
        let three = b.int(3);
        let pair = b.array_of(vec![r, three]);
        b.seq(vec![assign, pair])
    });

    assert_eq!(out.value(), ints(&[1, 3]));
}

/// l = ->(x, mode: 23) do [x, mode] end
fn assign_keyword_lambda(b: &mut ExprBuilder<'_>) -> ExprId {
    let n23 = b.int(23);
    let params = ParamList::new(vec![
        Param::required(b.name("x")),
        Param::keyword_optional(b.name("mode"), n23),
    ]);
    let body = x_and_mode(b);
    let lambda = b.lambda(params, body);
    b.assign("l", lambda)
}

#[test]
fn keyword_arguments() {
    let out = run(|b| {
        let assign = assign_keyword_lambda(b);
        let ten = b.int(10);
        let five = b.int(5);
        let args = vec![Arg::Positional(ten), b.kwarg("mode", five)];
        let call = call_l(b, args);
        b.seq(vec![assign, call])
    });

    assert_eq!(out.value(), ints(&[10, 5]));
}

#[test]
fn default_keyword_arguments() {
    let out = run(|b| {
        let assign = assign_keyword_lambda(b);
        let args = positional(b, &[10]);
        let call = call_l(b, args);
        b.seq(vec![assign, call])
    });

    assert_eq!(out.value(), ints(&[10, 23]));
}

/// l = ->(x:, y:) do [x, y] end
fn assign_required_keywords(b: &mut ExprBuilder<'_>) -> ExprId {
    let params = ParamList::new(vec![
        Param::keyword(b.name("x")),
        Param::keyword(b.name("y")),
    ]);
    let x = b.ident("x");
    let y = b.ident("y");
    let body = b.array_of(vec![x, y]);
    let lambda = b.lambda(params, body);
    b.assign("l", lambda)
}

#[test]
fn double_splat_supplies_keywords() {
    // args = { x: 10, y: 20 }; l.call(**args)
    let out = run(|b| {
        let assign = assign_required_keywords(b);
        let ten = b.int(10);
        let twenty = b.int(20);
        let hash = b.sym_hash(vec![("x", ten), ("y", twenty)]);
        let args = b.assign("args", hash);
        let splat = b.ident("args");
        let call = call_l(b, vec![Arg::DoubleSplat(splat)]);
        b.seq(vec![assign, args, call])
    });

    assert_eq!(out.value(), ints(&[10, 20]));
}

#[test]
fn missing_keyword_is_reported() {
    let out = run(|b| {
        let assign = assign_required_keywords(b);
        let one = b.int(1);
        let args = vec![b.kwarg("x", one)];
        let call = call_l(b, args);
        b.seq(vec![assign, call])
    });

    assert_eq!(out.error().class_name(), "ArgumentError");
    assert_eq!(out.error().message, "missing keyword: :y");
}

#[test]
fn unknown_keyword_is_reported() {
    let out = run(|b| {
        let assign = assign_required_keywords(b);
        let one = b.int(1);
        let two = b.int(2);
        let three = b.int(3);
        let args = vec![b.kwarg("x", one), b.kwarg("y", two), b.kwarg("g", three)];
        let call = call_l(b, args);
        b.seq(vec![assign, call])
    });

    assert_eq!(out.error().class_name(), "ArgumentError");
    assert_eq!(out.error().message, "unknown keyword: :g");
}

#[test]
fn rest_parameter_collects_extra_arguments() {
    // ->(x, *y) do [x, y] end.call(1, 2, 3)
    let out = run(|b| {
        let params = ParamList::new(vec![Param::required(b.name("x")), Param::rest(b.name("y"))]);
        let x = b.ident("x");
        let y = b.ident("y");
        let body = b.array_of(vec![x, y]);
        let lambda = b.lambda(params, body);
        let args = positional(b, &[1, 2, 3]);
        b.call_proc(lambda, args, None)
    });

    assert_eq!(out.value(), array(vec![Value::Int(1), ints(&[2, 3])]));
}

#[test]
fn it_is_not_an_implicit_parameter() {
    let out = run(|b| {
        let body = b.ident("it");
        let params = required(b, &["x"]);
        let lambda = b.lambda(params, body);
        let args = positional(b, &[10]);
        b.call_proc(lambda, args, None)
    });

    assert_eq!(out.error().class_name(), "NameError");
}

#[test]
fn defaults_see_earlier_parameters() {
    // ->(x, y = x + 3) do [x, y] end.call(10)
    let out = run(|b| {
        let x = b.ident("x");
        let three = b.int(3);
        let default = b.binary(BinaryOp::Add, x, three);
        let params = ParamList::new(vec![
            Param::required(b.name("x")),
            Param::optional(b.name("y"), default),
        ]);
        let x = b.ident("x");
        let y = b.ident("y");
        let body = b.array_of(vec![x, y]);
        let lambda = b.lambda(params, body);
        let args = positional(b, &[10]);
        b.call_proc(lambda, args, None)
    });

    assert_eq!(out.value(), ints(&[10, 13]));
}

#[test]
fn full_signature_binding() {
    // ->(a, b = 20, *c, d:, e: 42, **f) do [a, b, c, d, e, f] end
    //   .call(10, 15, 20, 25, d: "x", e: 74, g: 100, h: 200)
    let out = run(|b| {
        let n20 = b.int(20);
        let n42 = b.int(42);
        let params = ParamList::new(vec![
            Param::required(b.name("a")),
            Param::optional(b.name("b"), n20),
            Param::rest(b.name("c")),
            Param::keyword(b.name("d")),
            Param::keyword_optional(b.name("e"), n42),
            Param::keyword_rest(b.name("f")),
        ]);
        let reads: Vec<ExprId> = ["a", "b", "c", "d", "e", "f"]
            .iter()
            .map(|n| b.ident(n))
            .collect();
        let body = b.array_of(reads);
        let lambda = b.lambda(params, body);

        let mut args = positional(b, &[10, 15, 20, 25]);
        let x = b.str("x");
        let n74 = b.int(74);
        let n100 = b.int(100);
        let n200 = b.int(200);
        args.extend([
            b.kwarg("d", x),
            b.kwarg("e", n74),
            b.kwarg("g", n100),
            b.kwarg("h", n200),
        ]);
        b.call_proc(lambda, args, None)
    });

    let expected = array(vec![
        Value::Int(10),
        Value::Int(15),
        ints(&[20, 25]),
        Value::from("x"),
        Value::Int(74),
        sym_hash(&out, &[("g", Value::Int(100)), ("h", Value::Int(200))]),
    ]);
    assert_eq!(out.value(), expected);
}

#[test]
fn no_keywords_marker_accepts_an_empty_splat() {
    // l = ->(**nil) do end; args = {}; l.call(*args)
    let out = run(|b| {
        let body = b.nil();
        let lambda = b.lambda(ParamList::new(vec![Param::no_keywords()]), body);
        let assign = b.assign("l", lambda);
        let empty = b.hash(vec![]);
        let args = b.assign("args", empty);
        let splat = b.ident("args");
        let call = call_l(b, vec![Arg::Splat(splat)]);
        b.seq(vec![assign, args, call])
    });

    assert_eq!(out.value(), Value::Nil);
}

#[test]
fn no_keywords_marker_rejects_a_splatted_pair() {
    // l = ->(**nil) do end; args = { foo: 20 }; l.call(*args)
    let out = run(|b| {
        let body = b.nil();
        let lambda = b.lambda(ParamList::new(vec![Param::no_keywords()]), body);
        let assign = b.assign("l", lambda);
        let n20 = b.int(20);
        let hash = b.sym_hash(vec![("foo", n20)]);
        let args = b.assign("args", hash);
        let splat = b.ident("args");
        let call = call_l(b, vec![Arg::Splat(splat)]);
        b.seq(vec![assign, args, call])
    });

    assert_eq!(out.error().class_name(), "ArgumentError");
}

#[test]
fn splat_call_fills_positional_parameters() {
    // l = ->(x, y, z) do [x, y, z] end; args = [20, 30]; l.call(10, *args)
    let out = run(|b| {
        let params = required(b, &["x", "y", "z"]);
        let x = b.ident("x");
        let y = b.ident("y");
        let z = b.ident("z");
        let body = b.array_of(vec![x, y, z]);
        let lambda = b.lambda(params, body);
        let assign = b.assign("l", lambda);
        let n20 = b.int(20);
        let n30 = b.int(30);
        let lit = b.array_of(vec![n20, n30]);
        let args = b.assign("args", lit);
        let ten = b.int(10);
        let splat = b.ident("args");
        let call = call_l(b, vec![Arg::Positional(ten), Arg::Splat(splat)]);
        b.seq(vec![assign, args, call])
    });

    assert_eq!(out.value(), ints(&[10, 20, 30]));
}
