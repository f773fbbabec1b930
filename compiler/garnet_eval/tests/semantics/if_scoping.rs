//! Hoisting out of transparent constructs.

use garnet_eval::Value;
use garnet_ir::{Elem, ParamList};
use pretty_assertions::assert_eq;

use crate::common::{array, run};

#[test]
fn nested_if_assignments_are_hoisted() {
    // if true
    //   caught = begin; b; false; rescue NameError; true; end
    // else
    //   a = 23
    //   if false then b = 20 else c = 10 end
    //   puts "hello" if e = 30
    //   quux(f = 40)
    //   { foo: (g = 20) }
    // end
    // [a, b, c, e, f, g]
    let out = run(|b| {
        let read_b = b.ident("b");
        let no = b.bool(false);
        let probe_body = b.seq(vec![read_b, no]);
        let yes = b.bool(true);
        let rescue = b.rescue(&["NameError"], None, yes);
        let probe = b.begin(probe_body, vec![rescue], None, None);
        let then_branch = b.assign("caught", probe);

        let n23 = b.int(23);
        let assign_a = b.assign("a", n23);
        let n20 = b.int(20);
        let assign_b = b.assign("b", n20);
        let n10 = b.int(10);
        let assign_c = b.assign("c", n10);
        let never = b.bool(false);
        let inner_if = b.if_(never, assign_b, Some(assign_c));
        let n30 = b.int(30);
        let assign_e = b.assign("e", n30);
        let hello = b.str("hello");
        let puts = b.call_simple("puts", vec![hello]);
        let modifier_if = b.if_(assign_e, puts, None);
        let n40 = b.int(40);
        let assign_f = b.assign("f", n40);
        let quux = b.call_simple("quux", vec![assign_f]);
        let n20 = b.int(20);
        let assign_g = b.assign("g", n20);
        let hash = b.sym_hash(vec![("foo", assign_g)]);
        let else_branch = b.seq(vec![assign_a, inner_if, modifier_if, quux, hash]);

        let cond = b.bool(true);
        let outer = b.if_(cond, then_branch, Some(else_branch));
        let reads: Vec<Elem> = ["a", "b", "c", "e", "f", "g"]
            .iter()
            .map(|n| Elem::Plain(b.ident(n)))
            .collect();
        let snapshot = b.array(reads);
        b.seq(vec![outer, snapshot])
    });

    assert_eq!(out.value(), array(vec![Value::Nil; 6]));
    assert_eq!(out.local("caught"), Some(Value::Bool(true)));
    assert_eq!(out.local("d"), None);
}

#[test]
fn never_assigned_name_is_unbound() {
    let out = run(|b| {
        let cond = b.bool(false);
        let n1 = b.int(1);
        let assign = b.assign("a", n1);
        let branch = b.if_(cond, assign, None);
        let d = b.ident("d");
        b.seq(vec![branch, d])
    });

    assert_eq!(out.error().class_name(), "NameError");
    assert_eq!(
        out.error().message,
        "undefined local variable or method 'd' for main"
    );
    assert_eq!(out.local("a"), Some(Value::Nil));
}

#[test]
fn taken_branch_assignment_is_visible_after() {
    let out = run(|b| {
        let cond = b.bool(true);
        let five = b.int(5);
        let assign = b.assign("x", five);
        let branch = b.if_(cond, assign, None);
        let x = b.ident("x");
        b.seq(vec![branch, x])
    });

    assert_eq!(out.value(), Value::Int(5));
}

#[test]
fn begin_body_and_unused_rescue_hoist() {
    // begin
    //   a = 23
    // rescue Foo::Bar
    //   b = 20
    //   if true then c = 10 end
    // end
    let out = run(|b| {
        let n23 = b.int(23);
        let body = b.assign("a", n23);
        let n20 = b.int(20);
        let assign_b = b.assign("b", n20);
        let yes = b.bool(true);
        let n10 = b.int(10);
        let assign_c = b.assign("c", n10);
        let branch = b.if_(yes, assign_c, None);
        let rescue_body = b.seq(vec![assign_b, branch]);
        let rescue = b.rescue(&["Foo::Bar"], None, rescue_body);
        b.begin(body, vec![rescue], None, None)
    });

    assert_eq!(out.value(), Value::Int(23));
    assert_eq!(out.local("a"), Some(Value::Int(23)));
    assert_eq!(out.local("b"), Some(Value::Nil));
    assert_eq!(out.local("c"), Some(Value::Nil));
}

#[test]
fn while_body_hoists_but_block_locals_stay_inside() {
    // while false
    //   a = 10
    //   if false then b = 10 end
    //   foo do c = 30 end
    // end
    // c
    let out = run(|b| {
        let cond = b.bool(false);
        let n10 = b.int(10);
        let assign_a = b.assign("a", n10);
        let no = b.bool(false);
        let n10 = b.int(10);
        let assign_b = b.assign("b", n10);
        let branch = b.if_(no, assign_b, None);
        let n30 = b.int(30);
        let assign_c = b.assign("c", n30);
        let foo = b.call_with_block("foo", vec![], ParamList::empty(), assign_c);
        let body = b.seq(vec![assign_a, branch, foo]);
        let lp = b.while_(cond, body);
        let c = b.ident("c");
        b.seq(vec![lp, c])
    });

    assert_eq!(out.error().class_name(), "NameError");
    assert_eq!(out.local("a"), Some(Value::Nil));
    assert_eq!(out.local("b"), Some(Value::Nil));
    assert_eq!(out.local("c"), None);
}
