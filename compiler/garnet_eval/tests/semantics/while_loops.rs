//! `while`/`until` values, loop-local signals and postfix loops.

use garnet_eval::Value;
use garnet_ir::BinaryOp;
use pretty_assertions::assert_eq;

use crate::common::run;

#[test]
fn assignments_in_untaken_body_are_nil() {
    let out = run(|b| {
        let cond = b.bool(false);
        let two = b.int(2);
        let body = b.assign("a", two);
        let lp = b.while_(cond, body);
        let a = b.ident("a");
        b.seq(vec![lp, a])
    });

    assert_eq!(out.value(), Value::Nil);
}

#[test]
fn loop_without_break_is_nil() {
    let out = run(|b| {
        let cond = b.bool(false);
        let body = b.int(10);
        let lp = b.while_(cond, body);
        b.assign("a", lp)
    });

    assert_eq!(out.local("a"), Some(Value::Nil));
}

#[test]
fn break_value_is_the_loop_value() {
    let out = run(|b| {
        let cond = b.bool(true);
        let ten = b.int(10);
        let body = b.break_(Some(ten));
        let lp = b.while_(cond, body);
        b.assign("a", lp)
    });

    assert_eq!(out.local("a"), Some(Value::Int(10)));
}

#[test]
fn postfix_while_reads_before_condition_assignment() {
    // begin
    //   caught = begin; a; false; rescue NameError; true; end
    // end while a = false
    let out = run(|b| {
        let read_a = b.ident("a");
        let no = b.bool(false);
        let probe_body = b.seq(vec![read_a, no]);
        let yes = b.bool(true);
        let rescue = b.rescue(&["NameError"], None, yes);
        let probe = b.begin(probe_body, vec![rescue], None, None);
        let body = b.assign("caught", probe);
        let f = b.bool(false);
        let cond = b.assign("a", f);
        b.do_while(body, cond)
    });

    assert_eq!(out.local("caught"), Some(Value::Bool(true)));
    assert_eq!(out.local("a"), Some(Value::Bool(false)));
}

#[test]
fn postfix_while_break_skips_condition() {
    // begin; break; end while a = 20
    let out = run(|b| {
        let body = b.break_(None);
        let n20 = b.int(20);
        let cond = b.assign("a", n20);
        b.do_while(body, cond)
    });

    assert_eq!(out.value(), Value::Nil);
    assert_eq!(out.local("a"), Some(Value::Nil));
}

#[test]
fn next_rechecks_the_condition() {
    // i = 0; sum = 0
    // while i < 5
    //   i += 1
    //   next if i == 2
    //   sum += i
    // end
    let out = run(|b| {
        let zero = b.int(0);
        let init_i = b.assign("i", zero);
        let zero = b.int(0);
        let init_sum = b.assign("sum", zero);
        let i = b.ident("i");
        let five = b.int(5);
        let cond = b.binary(BinaryOp::Lt, i, five);
        let one = b.int(1);
        let step = b.op_assign("i", BinaryOp::Add, one);
        let i = b.ident("i");
        let two = b.int(2);
        let is_two = b.binary(BinaryOp::Eq, i, two);
        let skip = b.next(None);
        let guard = b.if_(is_two, skip, None);
        let i = b.ident("i");
        let add = b.op_assign("sum", BinaryOp::Add, i);
        let body = b.seq(vec![step, guard, add]);
        let lp = b.while_(cond, body);
        b.seq(vec![init_i, init_sum, lp])
    });

    assert_eq!(out.local("sum"), Some(Value::Int(13)));
}

#[test]
fn redo_reruns_body_without_condition() {
    // count = 0; runs = 0
    // while count < 1
    //   runs += 1
    //   redo if runs < 3
    //   count += 1
    // end
    let out = run(|b| {
        let zero = b.int(0);
        let init_count = b.assign("count", zero);
        let zero = b.int(0);
        let init_runs = b.assign("runs", zero);
        let count = b.ident("count");
        let one = b.int(1);
        let cond = b.binary(BinaryOp::Lt, count, one);
        let one = b.int(1);
        let bump_runs = b.op_assign("runs", BinaryOp::Add, one);
        let runs = b.ident("runs");
        let three = b.int(3);
        let again = b.binary(BinaryOp::Lt, runs, three);
        let redo = b.redo();
        let guard = b.if_(again, redo, None);
        let one = b.int(1);
        let bump_count = b.op_assign("count", BinaryOp::Add, one);
        let body = b.seq(vec![bump_runs, guard, bump_count]);
        let lp = b.while_(cond, body);
        b.seq(vec![init_count, init_runs, lp])
    });

    assert_eq!(out.local("runs"), Some(Value::Int(3)));
    assert_eq!(out.local("count"), Some(Value::Int(1)));
}

#[test]
fn until_runs_while_condition_is_false() {
    let out = run(|b| {
        let zero = b.int(0);
        let init = b.assign("i", zero);
        let i = b.ident("i");
        let three = b.int(3);
        let done = b.binary(BinaryOp::Eq, i, three);
        let one = b.int(1);
        let step = b.op_assign("i", BinaryOp::Add, one);
        let lp = b.until(done, step);
        let i = b.ident("i");
        b.seq(vec![init, lp, i])
    });

    assert_eq!(out.value(), Value::Int(3));
}

#[test]
fn break_leaves_only_the_innermost_loop() {
    // outer = 0
    // while outer < 2
    //   outer += 1
    //   while true; break; end
    // end
    let out = run(|b| {
        let zero = b.int(0);
        let init = b.assign("outer", zero);
        let outer = b.ident("outer");
        let two = b.int(2);
        let cond = b.binary(BinaryOp::Lt, outer, two);
        let one = b.int(1);
        let step = b.op_assign("outer", BinaryOp::Add, one);
        let yes = b.bool(true);
        let brk = b.break_(None);
        let inner = b.while_(yes, brk);
        let body = b.seq(vec![step, inner]);
        let lp = b.while_(cond, body);
        b.seq(vec![init, lp])
    });

    assert_eq!(out.local("outer"), Some(Value::Int(2)));
}

#[test]
fn next_outside_any_loop_is_a_local_jump_error() {
    let out = run(|b| b.next(None));

    assert_eq!(out.error().class_name(), "LocalJumpError");
}
