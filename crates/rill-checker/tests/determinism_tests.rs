//! Determinism tests: type checking the same program must always produce
//! the same rendered types, whatever order union members arrive in.

use rill_checker::{type_check, Type};

fn render(source: &str) -> Vec<String> {
    type_check(source, "test.rill")
        .map(|types| types.iter().map(ToString::to_string).collect())
        .unwrap_or_else(|errors| {
            errors
                .errors
                .iter()
                .map(|e| format!("{}: {}", e.code, e.message))
                .collect()
        })
}

#[test]
fn union_simplification_is_deterministic_100_iterations() {
    let sources = [
        r#"(cond (#t #t) (#f 1.5) (else 1))"#,
        r#"(cond (#t 1) (#f #t) (else 1.5))"#,
        r#"(cond (#t 1.5) (#f 1) (else (if #t #t 1)))"#,
    ];
    for i in 0..100 {
        for source in sources {
            assert_eq!(
                render(source),
                vec!["(Union Bool Float64 Int)"],
                "Determinism failure at iteration {i} for {source}"
            );
        }
    }
}

#[test]
fn union_built_in_any_order_is_identical() {
    let orders = [
        [Type::Bool, Type::Float64, Type::Int],
        [Type::Int, Type::Float64, Type::Bool],
        [Type::Float64, Type::Int, Type::Bool],
    ];
    let expected = Type::union(orders[0].clone());
    for order in orders {
        let u = Type::union(order);
        assert_eq!(u, expected);
        assert_eq!(u.to_string(), "(Union Bool Float64 Int)");
    }
}

#[test]
fn overload_resolution_is_deterministic_100_iterations() {
    let source = "(+ 1 2) (+ 1.5 2.5) (+ 1 2.5)";
    let first = render(source);
    assert_eq!(first.len(), 1, "mixed call should fail: {first:?}");
    assert!(first[0].starts_with("E402"), "{first:?}");
    for i in 0..100 {
        assert_eq!(first, render(source), "Determinism failure at iteration {i}");
    }
    for i in 0..100 {
        assert_eq!(
            render("(+ 1 2) (+ 1.5 2.5)"),
            vec!["Int", "Float64"],
            "Determinism failure at iteration {i}"
        );
    }
}

#[test]
fn overload_error_lists_candidates_in_order() {
    let rendered = render("(< #t #f)");
    let message = &rendered[0];
    let string = message.find("(Callable (String String) Bool)").unwrap();
    let float = message.find("(Callable (Float64 Float64) Bool)").unwrap();
    let int = message.find("(Callable (Int Int) Bool)").unwrap();
    assert!(string < float && float < int, "{message}");
}

#[test]
fn return_join_is_order_independent_100_iterations() {
    let returns = ["(return! 1.5)", "(return! #t)", "(return! 1)"];
    let orders = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
    for i in 0..100 {
        for order in orders {
            let [a, b, c] = order.map(|k| returns[k]);
            let source = format!("(lambda (x) (if x {a}) (if x {b}) {c})");
            assert_eq!(
                render(&source),
                vec!["(Callable (Any) (Union Bool Float64 Int))"],
                "Determinism failure at iteration {i} for {source}"
            );
        }
    }
}
