//! Integration tests for the Rill tree-walking evaluator.
//!
//! Tests key evaluator features:
//! - literals and built-ins
//! - shadowing vs mutation
//! - closures capturing by reference
//! - early return from nested forms
//! - quote / eval in the caller's scope
//! - cancellation and step limits

use rill_eval::{global_scope, run, Evaluator, Value};
use rill_types::{Context, ErrorCode};

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

/// Run source and render every top-level value (panics on errors).
fn eval(source: &str) -> Vec<String> {
    eval_with_output(source).0
}

/// Run source and return the rendered values plus everything displayed.
fn eval_with_output(source: &str) -> (Vec<String>, String) {
    let mut out = Vec::new();
    match run(source, "test.rill", &mut out) {
        Ok(values) => (
            values.iter().map(ToString::to_string).collect(),
            String::from_utf8(out).expect("display output is UTF-8"),
        ),
        Err(errors) => panic!(
            "errors:\n{}",
            errors
                .errors
                .iter()
                .map(|e| format!("  [{}] {}", e.code, e.message))
                .collect::<Vec<_>>()
                .join("\n")
        ),
    }
}

/// Value of the last top-level form.
fn last(source: &str) -> String {
    eval(source).pop().expect("at least one form")
}

/// Run source and assert that it fails with `code`.
fn assert_error(source: &str, code: ErrorCode) {
    let mut out = Vec::new();
    match run(source, "test.rill", &mut out) {
        Ok(values) => panic!("expected {code}, got values {values:?}"),
        Err(errors) => {
            let codes: Vec<ErrorCode> = errors.errors.iter().map(|e| e.code).collect();
            assert!(codes.contains(&code), "expected {code}, got {codes:?}");
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Literals and built-ins
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn literals_render_canonically() {
    assert_eq!(
        eval(r#"42 -7 1.5 2.0 "hi" #t #f () 'x '(a 1)"#),
        vec!["42", "-7", "1.5", "2.0", "\"hi\"", "#t", "#f", "()", "'x", "'(a 1)"]
    );
}

#[test]
fn true_and_false_are_bound() {
    assert_eq!(eval("true false"), vec!["#t", "#f"]);
}

#[test]
fn arithmetic_per_numeric_type() {
    assert_eq!(last("(+ 1 2)"), "3");
    assert_eq!(last("(- 10 4)"), "6");
    assert_eq!(last("(* 1.5 2.0)"), "3.0");
    assert_eq!(last("(/ 9 2)"), "4");
    assert_eq!(last("(/ 1.0 4.0)"), "0.25");
}

#[test]
fn mixed_arithmetic_is_rejected() {
    assert_error("(+ 1 2.0)", ErrorCode::BUILTIN_FAILURE);
}

#[test]
fn comparisons_and_equality() {
    assert_eq!(
        eval(r#"(< 1 2) (>= 2.5 3.0) (< "a" "b") (= (list 1 2) (list 1 2)) (= 1 1.0) (not #f)"#),
        vec!["#t", "#f", "#t", "#t", "#f", "#t"]
    );
}

#[test]
fn list_primitives() {
    assert_eq!(
        eval(
            "(list 1 2 3) (cons 1 2) (car (list 1 2)) (cdr (list 1 2)) \
             (length (list 1 2 3)) (length \"abc\") (append (list 1) (list 2 3)) \
             (reverse (list 1 2 3)) (null? ()) (null? (list 1))"
        ),
        vec!["(1 2 3)", "(1 . 2)", "1", "(2)", "3", "3", "(1 2 3)", "(3 2 1)", "#t", "#f"]
    );
}

#[test]
fn car_of_empty_list_fails() {
    assert_error("(car ())", ErrorCode::BUILTIN_FAILURE);
}

#[test]
fn length_of_improper_list_fails() {
    assert_error("(length (cons 1 2))", ErrorCode::IMPROPER_LIST);
}

#[test]
fn display_writes_to_sink() {
    let (values, output) = eval_with_output(r#"(display "x =" 1 2.5 (list 1 2)) (newline)"#);
    assert_eq!(values, vec!["()", "()"]);
    assert_eq!(output, "x = 1 2.5 (1 2)\n");
}

#[test]
fn display_with_no_arguments() {
    let (_, output) = eval_with_output("(display)");
    assert_eq!(output, "");
}

#[test]
fn functions_render_by_name_and_params() {
    assert_eq!(eval("+ (lambda (x y) x)"), vec!["<builtin +>", "<lambda (x y)>"]);
}

#[test]
fn integer_literal_overflow() {
    assert_error("99999999999999999999", ErrorCode::MALFORMED_LITERAL);
}

// ══════════════════════════════════════════════════════════════════════════════
// Scopes
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn define_and_set_yield_unit() {
    assert_eq!(eval("(define x 1) (set! x 2) x"), vec!["()", "()", "2"]);
}

#[test]
fn define_shadows_in_inner_block() {
    assert_eq!(last("(define x 1) (begin (define x 2) x)"), "2");
    assert_eq!(last("(define x 1) (begin (define x 2) x) x"), "1");
}

#[test]
fn set_mutates_outer_binding() {
    assert_eq!(last("(define x 1) (begin (set! x 2)) x"), "2");
}

#[test]
fn redefinition_in_same_frame_fails() {
    assert_error("(define x 1) (define x 2)", ErrorCode::SYMBOL_REDEFINED);
}

#[test]
fn set_of_undefined_symbol_fails() {
    assert_error("(set! nope 1)", ErrorCode::UNDEFINED_SYMBOL);
}

#[test]
fn undefined_symbol_fails() {
    assert_error("(+ y 1)", ErrorCode::UNDEFINED_SYMBOL);
}

#[test]
fn while_loop_counts() {
    let (_, output) = eval_with_output(
        "(define i 0) (while (< i 3) (display i) (set! i (+ i 1)))",
    );
    assert_eq!(output, "012");
}

#[test]
fn non_boolean_predicates_fail() {
    assert_error("(if 1 2 3)", ErrorCode::NON_BOOLEAN_PREDICATE);
    assert_error("(while ())", ErrorCode::NON_BOOLEAN_PREDICATE);
}

#[test]
fn cond_picks_first_true_case() {
    let source = "(define sign (lambda (n) (cond ((< n 0) -1) ((> n 0) 1) (else 0)))) \
                  (sign -5) (sign 5) (sign 0)";
    assert_eq!(eval(source)[1..], ["-1", "1", "0"]);
}

#[test]
fn if_without_else_yields_unit() {
    assert_eq!(last("(if #f 1)"), "()");
}

// ══════════════════════════════════════════════════════════════════════════════
// Functions and closures
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn recursion() {
    let source = "(define fact (lambda (n) (if (< n 2) 1 (* n (fact (- n 1)))))) (fact 10)";
    assert_eq!(last(source), "3628800");
}

#[test]
fn closure_captures_by_reference() {
    let source = "(define x 1) (define get (lambda () x)) (set! x 2) (get)";
    assert_eq!(last(source), "2");
}

#[test]
fn closure_keeps_its_frame_alive() {
    let source = "
        (define make-counter (lambda ()
          (begin
            (define n 0)
            (lambda () (set! n (+ n 1)) n))))
        (define c (make-counter))
        (c) (c) (c)";
    assert_eq!(eval(source)[2..], ["1", "2", "3"]);
}

#[test]
fn separate_closures_have_separate_state() {
    let source = "
        (define make-counter (lambda () (define n 0) (lambda () (set! n (+ n 1)) n)))
        (define a (make-counter))
        (define b (make-counter))
        (a) (a) (b)";
    assert_eq!(eval(source)[3..], ["1", "2", "1"]);
}

#[test]
fn arity_is_checked_for_every_count() {
    let source = "(define f (lambda (a b) a))";
    assert_eq!(last(&format!("{source} (f 1 2)")), "1");
    assert_error(&format!("{source} (f)"), ErrorCode::WRONG_ARG_COUNT);
    assert_error(&format!("{source} (f 1)"), ErrorCode::WRONG_ARG_COUNT);
    assert_error(&format!("{source} (f 1 2 3)"), ErrorCode::WRONG_ARG_COUNT);
    assert_error("(not #t #f)", ErrorCode::WRONG_ARG_COUNT);
}

#[test]
fn calling_a_non_function_fails() {
    assert_error("(1 2)", ErrorCode::NOT_CALLABLE);
    assert_error(r#"("f")"#, ErrorCode::NOT_CALLABLE);
}

#[test]
fn parameters_shadow_globals() {
    assert_eq!(last("(define x 1) ((lambda (x) x) 5)"), "5");
}

// ══════════════════════════════════════════════════════════════════════════════
// Early return
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn return_exits_from_nested_forms() {
    let source = "
        (define find (lambda (n)
          (define i 0)
          (while #t
            (begin
              (if (= i n) (return! (* i 10)))
              (set! i (+ i 1))))))
        (find 4)";
    assert_eq!(last(source), "40");
}

#[test]
fn return_stops_at_the_innermost_call() {
    let source = "
        (define inner (lambda () (return! 1) 2))
        (define outer (lambda () (+ (inner) 10)))
        (outer)";
    assert_eq!(last(source), "11");
}

#[test]
fn return_with_no_value_yields_unit() {
    assert_eq!(last("((lambda () (return!) 5))"), "()");
}

#[test]
fn quoted_return_escaping_to_top_level_fails() {
    // The quote is built inside a lambda, then evaluated at top level.
    let source = "(define q ((lambda () '(return! 1)))) (eval q)";
    assert_error(source, ErrorCode::RETURN_OUTSIDE_FUNCTION);
}

// ══════════════════════════════════════════════════════════════════════════════
// Quote / eval
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn eval_uses_the_callers_scope() {
    let source = "
        (define expr '(+ x 1))
        (define f (lambda (x) (eval expr)))
        (f 41)";
    assert_eq!(last(source), "42");
}

#[test]
fn eval_of_plain_value_is_identity() {
    assert_eq!(last("(eval 5)"), "5");
}

#[test]
fn eval_errors_keep_their_code() {
    assert_error("(eval '(undefined-thing))", ErrorCode::UNDEFINED_SYMBOL);
}

// ══════════════════════════════════════════════════════════════════════════════
// Context and limits
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn cancelled_context_fails_on_first_node() {
    let nodes = rill_parser::parse_source("(display 1)", "test.rill").unwrap();
    let ctx = Context::new();
    ctx.cancel();
    let mut out = Vec::new();
    let mut evaluator = Evaluator::new(&mut out);
    let err = evaluator.eval(&ctx, &global_scope(), &nodes[0]).unwrap_err();
    assert_eq!(err.code, ErrorCode::CANCELLED);
    assert_eq!(evaluator.steps(), 0);
    drop(evaluator);
    assert!(out.is_empty());
}

#[test]
fn step_limit_stops_infinite_loop() {
    let nodes = rill_parser::parse_source("(while #t ())", "test.rill").unwrap();
    let mut out = Vec::new();
    let mut evaluator = Evaluator::with_step_limit(&mut out, 1_000).with_file("loop.rill");
    let err = evaluator
        .eval(&Context::new(), &global_scope(), &nodes[0])
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::STEP_LIMIT_EXCEEDED);
    assert_eq!(err.file, "loop.rill");
}

#[test]
fn scope_survives_across_top_level_calls() {
    let scope = global_scope();
    let ctx = Context::new();
    let mut out = Vec::new();
    let mut evaluator = Evaluator::new(&mut out);
    for source in ["(define x 20)", "(set! x (+ x 1))"] {
        let nodes = rill_parser::parse_source(source, "test.rill").unwrap();
        evaluator.eval(&ctx, &scope, &nodes[0]).unwrap();
    }
    assert_eq!(scope.lookup("x"), Some(Value::Int(21)));
}

#[test]
fn runtime_error_reports_location() {
    let mut out = Vec::new();
    let errors = run("(define x 1)\n  (car x)", "test.rill", &mut out).unwrap_err();
    let err = &errors.errors[0];
    assert_eq!(err.code, ErrorCode::BUILTIN_FAILURE);
    assert_eq!(err.span.start_line, 2);
    assert_eq!(err.span.start_col, 3);
}

#[test]
fn evaluation_is_deterministic_100_iterations() {
    let source = "(define f (lambda (n) (if (< n 1) (list) (cons n (f (- n 1)))))) (f 5)";
    let first = eval(source);
    for i in 0..100 {
        assert_eq!(first, eval(source), "Determinism failure at iteration {i}");
    }
}

#[test]
fn deep_recursion_grows_the_stack() {
    let source = "(define count (lambda (n) (if (= n 0) 0 (+ 1 (count (- n 1)))))) (count 20000)";
    assert_eq!(last(source), "20000");
}

#[test]
fn deep_tail_position_recursion_returns() {
    let source = "(define down (lambda (n) (if (= n 0) (return! 'done) (down (- n 1))))) (down 20000)";
    assert_eq!(last(source), "'done");
}

#[test]
fn deeply_nested_blocks_evaluate() {
    let depth = 2_000;
    let source = format!("{}7{}", "(begin ".repeat(depth), ")".repeat(depth));
    assert_eq!(last(&source), "7");
}
