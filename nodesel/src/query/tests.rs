//! Tests for the query compiler and evaluator.

use serde_json::{json, Value};

use super::*;
use crate::bitset::Bitset;
use crate::Error;
use crate::hostglob::HostGlobber;

fn vocab(fields: &[&str]) -> Vocabulary {
    let mut v = Vocabulary::new();
    for f in fields {
        v.add_field(*f);
    }
    v
}

fn run(query: &str, v: &Vocabulary, data: &[Value]) -> Vec<u8> {
    let q = compile_query(query, v).unwrap();
    q.eval(data, &Bitset::new(data.len(), true)).to_array()
}

fn compile_err(query: &str, v: &Vocabulary) -> String {
    match compile_query(query, v) {
        Ok(e) => panic!("expected {:?} to fail, got {}", query, e),
        Err(e) => e.to_string(),
    }
}

fn xs() -> Vec<Value> {
    vec![json!({"x": 5}), json!({"x": 10}), json!({"x": 20}), json!({"x": 30}), json!({"x": 7})]
}

#[test]
fn test_relational_operators() {
    let v = vocab(&["x"]);
    let data = xs();
    assert_eq!(run("x < 20", &v, &data), vec![1, 1, 0, 0, 1]);
    assert_eq!(run("x <= 20", &v, &data), vec![1, 1, 1, 0, 1]);
    assert_eq!(run("x > 20", &v, &data), vec![0, 0, 0, 1, 0]);
    assert_eq!(run("x >= 20", &v, &data), vec![0, 0, 1, 1, 0]);
    assert_eq!(run("x = 20", &v, &data), vec![0, 0, 1, 0, 0]);
}

#[test]
fn test_relational_without_spaces() {
    let v = vocab(&["x"]);
    assert_eq!(run("x<=20", &v, &xs()), vec![1, 1, 1, 0, 1]);
    assert_eq!(run("(x>=7)and(x<30)", &v, &xs()), vec![0, 1, 1, 0, 1]);
}

#[test]
fn test_not() {
    let v = vocab(&["x"]);
    assert_eq!(run("~(x = 20)", &v, &xs()), vec![1, 1, 0, 1, 1]);
}

#[test]
fn test_double_not_is_identity() {
    let v = vocab(&["x"]);
    assert_eq!(run("~ ~(x = 20)", &v, &xs()), vec![0, 0, 1, 0, 0]);
}

#[test]
fn test_not_complements_against_whole_table() {
    let v = vocab(&["x"]);
    let data = xs();
    let q = compile_query("~(x = 20)", &v).unwrap();

    // Only rows 0 and 2 are candidates, but the complement covers the table.
    let mut elems = Bitset::new(data.len(), false);
    elems.set_bit(0);
    elems.set_bit(2);
    assert_eq!(q.eval(&data, &elems).to_array(), vec![1, 1, 0, 1, 1]);
}

#[test]
fn test_candidates_limit_evaluation() {
    let v = vocab(&["x"]);
    let data = xs();
    let q = compile_query("x < 20", &v).unwrap();
    let mut elems = Bitset::new(data.len(), false);
    elems.set_bit(1);
    elems.set_bit(3);
    assert_eq!(q.eval(&data, &elems).to_array(), vec![0, 1, 0, 0, 0]);
}

#[test]
fn test_wrong_type() {
    let r = compile_err("x = 10", &Vocabulary::default());
    assert!(r.contains("Wrong type"), "{}", r);

    let r = compile_err("x = y", &vocab(&["x", "y"]));
    assert!(r.contains("Wrong type"), "{}", r);

    let r = compile_err("10 < x", &vocab(&["x"]));
    assert!(r.contains("Wrong type"), "{}", r);

    let r = compile_err("x < 5 < 6", &vocab(&["x"]));
    assert!(r.contains("Wrong type"), "{}", r);
}

#[test]
fn test_errors_are_located() {
    let v = vocab(&["x"]);
    assert_eq!(
        compile_query("x = y", &v).unwrap_err().to_string(),
        "Location 5: Wrong type of arguments to relational operator ="
    );
    assert_eq!(compile_query("x < 5 < 6", &v).unwrap_err().location(), Some(9));
    assert_eq!(compile_query("x = (c1)", &v).unwrap_err().location(), Some(8));
    let e = compile_query("x < 5 )", &v).unwrap_err();
    assert_eq!(e.location(), Some(7));
    assert!(e.to_string().starts_with("Location 7: Junk at end of expression"));
}

#[test]
fn test_syntax_errors() {
    let v = vocab(&["x"]);
    assert!(compile_err("", &v).contains("Unexpected end of expression"));
    assert!(compile_err("   ", &v).contains("Unexpected end of expression"));
    assert!(compile_err("x <", &v).contains("Unexpected end of expression"));
    assert!(compile_err("x <> 5", &v).contains("Unknown operator '<>'"));
    assert!(compile_err("x == 5", &v).contains("Unknown operator"));
    assert!(compile_err("(x < 5", &v).contains("Expected ')' here"));
    assert!(compile_err("c1 c2", &v).contains("Junk at end of expression: c2"));
    assert!(compile_err("and x", &v).contains("Misplaced operator or punctuation 'and'"));
    assert!(compile_err(")", &v).contains("Misplaced operator or punctuation"));
    assert!(compile_err("x < 5 or < 3", &v).contains("Misplaced"));
}

#[test]
fn test_glob_errors_become_diagnostics() {
    let e = compile_query("c[4-3]", &Vocabulary::default()).unwrap_err();
    assert!(matches!(e, Error::Query { location: 1, .. }));
    assert!(e.to_string().contains("Invalid range"));

    let e = compile_query("x and a[1-50000]", &Vocabulary::default()).unwrap_err();
    assert_eq!(e.location(), Some(7));
    assert!(e.to_string().contains("Range too large"));
}

#[test]
fn test_host_globs() {
    let data = vec![
        json!({"hostname": "c1-1"}),
        json!({"hostname": "c2-1"}),
        json!({"hostname": "c1-37"}),
    ];
    let v = Vocabulary::default();
    assert_eq!(run("c1-*", &v, &data), vec![1, 0, 1]);
    assert_eq!(run("~c1-*", &v, &data), vec![0, 1, 0]);
    assert_eq!(run("c[1-2]-1", &v, &data), vec![1, 1, 0]);
}

#[test]
fn test_host_globs_match_element_prefix() {
    let data = vec![
        json!({"hostname": "c1-1.fox.uio.no"}),
        json!({"hostname": "c1-10.fox.uio.no"}),
        json!({"hostname": "gpu-1.fox.uio.no"}),
    ];
    let v = Vocabulary::default();
    assert_eq!(run("c1-1", &v, &data), vec![1, 0, 0]);
    assert_eq!(run("c1-1.fox", &v, &data), vec![1, 0, 0]);
    assert_eq!(run("c1-*", &v, &data), vec![1, 1, 0]);
}

#[test]
fn test_numbers_and_fields_read_as_hosts_outside_relations() {
    let data = vec![
        json!({"hostname": "37.5", "x": 1}),
        json!({"hostname": "x", "x": 2}),
        json!({"hostname": "c1", "x": 9}),
    ];
    let v = vocab(&["x"]);
    assert_eq!(run("37.5", &v, &data), vec![1, 0, 0]);
    assert_eq!(run("x > 5 or 37.5", &v, &data), vec![1, 0, 1]);
    assert_eq!(run("~x", &v, &data), vec![1, 0, 1]);
}

#[test]
fn test_conjunction_and_disjunction() {
    let data = vec![
        json!({"x": 5, "y": 10}),
        json!({"x": 10, "y": 1}),
        json!({"x": 20, "y": 9}),
        json!({"x": 30, "y": 1}),
        json!({"x": 7, "y": 5}),
    ];
    let v = vocab(&["x", "y"]);
    assert_eq!(run("x < 20 and y > 5", &v, &data), vec![1, 0, 0, 0, 0]);
    assert_eq!(run("x < 20 or y > 5", &v, &data), vec![1, 1, 1, 0, 1]);
}

#[test]
fn test_and_binds_tighter_than_or() {
    let data = vec![
        json!({"x": 1, "y": 2, "z": 3}),
        json!({"x": 1, "y": 3, "z": 4}),
        json!({"x": 2, "y": 3, "z": 4}),
    ];
    let v = vocab(&["x", "y", "z"]);
    assert_eq!(run("x = 1 and (y = 2 or z = 4)", &v, &data), vec![1, 1, 0]);
    assert_eq!(run("x = 1 and y = 2 or z = 4", &v, &data), vec![1, 1, 1]);
}

#[test]
fn test_missing_and_text_fields_never_match() {
    let data = vec![json!({"x": "5"}), json!({}), json!({"x": 5})];
    let v = vocab(&["x"]);
    assert_eq!(run("x = 5", &v, &data), vec![0, 0, 1]);
    assert_eq!(run("~(x = 5)", &v, &data), vec![1, 1, 0]);
}

#[test]
fn test_aliases() {
    let mut v = vocab(&["cpu_recent"]);
    v.add_alias("cpu-recent", "cpu_recent");
    v.add_alias("cpu%", "cpu-recent");
    let data = vec![json!({"cpu_recent": 80}), json!({"cpu_recent": 20})];
    assert_eq!(run("cpu% > 50", &v, &data), vec![1, 0]);
    assert_eq!(v.resolve_field("cpu%"), Some("cpu_recent"));
    assert_eq!(v.resolve_field("mem%"), None);

    let q = compile_query("cpu% > 50", &v).unwrap();
    assert_eq!(q.to_string(), "(> cpu_recent 50)");
}

#[test]
fn test_cyclic_alias_is_an_error() {
    let mut v = Vocabulary::new();
    v.add_alias("a", "b");
    v.add_alias("b", "a");
    let r = compile_err("a > 1", &v);
    assert!(r.contains("Cyclic field alias 'a'"), "{}", r);
    assert_eq!(v.resolve_field("a"), None);
}

#[test]
fn test_named_operations() {
    let mut v = vocab(&["x"]);
    v.define_operation("small", "x < 10").unwrap();
    v.define_operation("compute", "c*").unwrap();
    v.define_operation("small-compute", "small and compute").unwrap();

    let data = vec![
        json!({"hostname": "c1", "x": 5}),
        json!({"hostname": "c2", "x": 50}),
        json!({"hostname": "login1", "x": 5}),
    ];
    assert_eq!(run("small", &v, &data), vec![1, 0, 1]);
    assert_eq!(run("small-compute", &v, &data), vec![1, 0, 0]);
    assert_eq!(run("~compute", &v, &data), vec![0, 0, 1]);
    assert!(v.operation("small").is_some());

    assert!(v.define_operation("bad", "x <").is_err());
    assert!(v.operation("bad").is_none());
}

#[test]
fn test_prebuilt_operation() {
    // Compiled where `l%` is known; used where it is not.
    let mut source = vocab(&["load"]);
    source.add_alias("l%", "load");
    let heavy = compile_query("l% > 80", &source).unwrap();

    let mut v = vocab(&["y"]);
    v.insert_operation("heavy", heavy)
        .insert_operation("gpus", Expr::Glob(HostGlobber::new("gpu*", true).unwrap()));

    let data = vec![
        json!({"hostname": "c1", "load": 95, "y": 1}),
        json!({"hostname": "c2", "load": 95, "y": 7}),
        json!({"hostname": "gpu-1", "load": 10, "y": 1}),
    ];
    assert_eq!(run("heavy and y < 3", &v, &data), vec![1, 0, 0]);
    assert_eq!(run("heavy or gpus", &v, &data), vec![1, 1, 1]);
    assert_eq!(run("~heavy", &v, &data), vec![0, 0, 1]);
    assert_eq!(
        compile_query("heavy and y < 3", &v).unwrap().to_string(),
        "(and (> load 80) (< y 3))"
    );
    assert!(compile_query("l% > 80", &v).unwrap_err().to_string().contains("Wrong type"));

    match v.operation("gpus") {
        Some(Expr::Glob(g)) => {
            assert_eq!(g.pattern(), "gpu*");
            assert!(g.is_prefix());
        }
        other => panic!("unexpected operation {:?}", other),
    }
}

#[test]
fn test_alias_to_operation() {
    let mut v = Vocabulary::new();
    v.define_operation("compute", "c*").unwrap();
    v.add_alias("nodes", "compute");
    let data = vec![json!({"hostname": "c1"}), json!({"hostname": "d1"})];
    assert_eq!(run("nodes", &v, &data), vec![1, 0]);
}

#[test]
fn test_display() {
    let v = vocab(&["x", "y"]);
    let q = compile_query("~c1-* and (x < 20 or y >= 2.5)", &v).unwrap();
    assert_eq!(q.to_string(), "(and (~ (node c1-*)) (or (< x 20) (>= y 2.5)))");
}

#[test]
fn test_left_associative() {
    let v = vocab(&["x"]);
    let q = compile_query("a or b or c", &v).unwrap();
    assert_eq!(q.to_string(), "(or (or (node a) (node b)) (node c))");
}

#[test]
fn test_matches_single_record() {
    let v = vocab(&["x"]);
    let q = compile_query("c* and x > 3", &v).unwrap();
    assert!(q.matches(&json!({"hostname": "c7", "x": 4})));
    assert!(!q.matches(&json!({"hostname": "c7", "x": 2})));
    assert!(!q.matches(&json!({"hostname": "d7", "x": 4})));
}

#[test]
fn test_eval_is_idempotent() {
    let v = vocab(&["x"]);
    let data = xs();
    let q = compile_query("~(x > 6 and x < 25) or x = 30", &v).unwrap();
    let elems = Bitset::new(data.len(), true);
    let a = q.eval(&data, &elems);
    let b = q.eval(&data, &elems);
    assert_eq!(a, b);
    assert_eq!(q.select(&data), a);
}

#[test]
fn test_eval_on_empty_table() {
    let v = vocab(&["x"]);
    let data: Vec<Value> = vec![];
    let q = compile_query("~(x > 1) or c*", &v).unwrap();
    assert!(q.select(&data).is_empty());
}
