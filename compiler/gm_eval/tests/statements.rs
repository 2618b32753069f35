//! Statement sequences against the two scopes.

use std::collections::BTreeMap;

use gm_eval::Interpreter;
use gm_ir::{BinaryOp, ScopeKind, Statement, StatementList};
use gm_model::{Datum, ModelError};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use ScopeKind::{Data, Model};

#[test]
fn rebinding_replaces_the_prior_value() {
    let mut list = StatementList::new();
    let (one, two) = (list.arena_mut().literal("1"), list.arena_mut().literal("2"));
    list.data(Statement::assign("x", one));
    list.data(Statement::assign("x", two));

    let mut interp = Interpreter::new();
    interp.process_all(&list).unwrap();

    assert_eq!(interp.datum(Data, "x"), Some(&Datum::Int(2)));
    let snapshot = interp.snapshot(Data);
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.get("x"), Some(&Datum::Int(2)));
    assert_eq!(interp.history().len(), 2);
}

#[test]
fn stochastic_declaration_in_data_scope_leaves_data_alone() {
    let mut interp = Interpreter::builder().seed(1).build();
    let mut head = StatementList::new();
    let five = head.arena_mut().literal("5");
    head.data(Statement::assign("n", five));
    interp.process_all(&head).unwrap();
    let before = interp.snapshot(Data);

    let mut list = StatementList::new();
    let rate = list.arena_mut().literal("1.0");
    list.data(Statement::draw("x", "Exp", [("rate", rate)]));
    let err = interp.process_all(&list).unwrap_err();

    assert_eq!(err, ModelError::StochasticInDataScope { name: "x".into() });
    assert!(err.to_string().contains("`x`"));
    assert_eq!(interp.snapshot(Data), before);
    assert_eq!(interp.history().len(), 1);
}

#[test]
fn unknown_distribution_and_bad_arguments() {
    let mut interp = Interpreter::new();

    let mut list = StatementList::new();
    let one = list.arena_mut().literal("1.0");
    list.model(Statement::draw("x", "Nope", [("rate", one)]));
    let err = interp.process_all(&list).unwrap_err();
    assert!(matches!(err, ModelError::UnknownGenerator { .. }));

    let mut list = StatementList::new();
    let (m, s) = (list.arena_mut().literal("0.0"), list.arena_mut().literal("1.0"));
    list.model(Statement::draw("x", "Normal", [("mean", m), ("scale", s)]));
    let err = interp.process_all(&list).unwrap_err();
    assert_eq!(
        err,
        ModelError::NoMatchingSignature {
            name: "Normal".into(),
            arguments: "mean, scale".into(),
        }
    );
    assert_eq!(interp.graph().value_count(), 0);
    assert_eq!(interp.graph().generator_count(), 0);
}

#[test]
fn first_registered_overload_takes_a_single_argument() {
    let mut list = StatementList::new();
    let a = list.arena_mut();
    let probs = [a.literal("0.25"), a.literal("0.75")];
    let probs = a.array(probs);
    list.model(Statement::draw("c", "Categorical", [("probs", probs)]));

    let mut interp = Interpreter::builder().seed(21).build();
    interp.process_all(&list).unwrap();
    let c = interp.datum(Model, "c").and_then(Datum::as_i64).unwrap();
    assert!((0..2).contains(&c));

    // `n` binds to the first-registered `probs` form, which rejects an Int.
    let mut list = StatementList::new();
    let four = list.arena_mut().literal("4");
    list.model(Statement::draw("k", "Categorical", [("n", four)]));
    let err = interp.process_all(&list).unwrap_err();
    assert!(matches!(
        &err,
        ModelError::ShapeMismatch { context, .. } if context == "Categorical.probs"
    ));
    assert_eq!(interp.lookup(Model, "k"), None);
}

#[test]
fn functions_and_operators_compose() {
    let mut list = StatementList::new();
    let a = list.arena_mut();
    let (one, five) = (a.literal("1"), a.literal("5"));
    let range = a.call("range", [one, five]);
    let r = a.ident("r");
    let total = a.call("sum", [r]);
    let r2 = a.ident("r");
    let two = a.literal("2");
    let doubled = a.binary(BinaryOp::Mul, r2, two);
    let label = [a.literal("\"ta\""), a.literal("\"xa\"")];
    let label = a.binary(BinaryOp::Add, label[0], label[1]);
    list.data(Statement::assign("r", range));
    list.data(Statement::assign("total", total));
    list.data(Statement::assign("doubled", doubled));
    list.data(Statement::assign("label", label));

    let mut interp = Interpreter::new();
    interp.process_all(&list).unwrap();

    assert_eq!(interp.datum(Data, "total"), Some(&Datum::Int(15)));
    assert_eq!(
        interp.datum(Data, "doubled"),
        Some(&Datum::int_array([2, 4, 6, 8, 10]))
    );
    assert_eq!(interp.datum(Data, "label"), Some(&Datum::Str("taxa".into())));
}

#[test]
fn rate_matrix_with_and_without_mean_rate() {
    let mut list = StatementList::new();
    let a = list.arena_mut();
    let plain = a.call("jukesCantor", []);
    let two = a.literal("2.0");
    let scaled = a.call_named("jukesCantor", [("meanRate", two)]);
    list.data(Statement::assign("q", plain));
    list.data(Statement::assign("q2", scaled));

    let mut interp = Interpreter::new();
    interp.process_all(&list).unwrap();

    let diagonal = |name: &str| {
        let rows = interp.datum(Data, name).and_then(Datum::as_array).unwrap();
        (0..4)
            .map(|i| rows.get(i).and_then(Datum::to_f64_vec).unwrap()[i])
            .collect::<Vec<_>>()
    };
    assert_eq!(diagonal("q"), vec![-1.0; 4]);
    assert_eq!(diagonal("q2"), vec![-2.0; 4]);
}

#[test]
fn oversized_ranges_are_invalid_indices() {
    let mut list = StatementList::new();
    let a = list.arena_mut();
    let (from, to) = (a.literal("0"), a.literal("4611686018427387904"));
    let range = a.binary(BinaryOp::Range, from, to);
    list.data(Statement::assign("r", range));

    let mut interp = Interpreter::new();
    let err = interp.process_all(&list).unwrap_err();
    assert!(matches!(err, ModelError::InvalidIndex { .. }));
    assert_eq!(interp.lookup(Data, "r"), None);
}

#[test]
fn remove_then_redeclare() {
    let mut list = StatementList::new();
    let (one, two) = (list.arena_mut().literal("1"), list.arena_mut().literal("2"));
    list.model(Statement::assign("x", one));
    list.model(Statement::remove("x"));
    list.model(Statement::assign("x", two));

    let mut interp = Interpreter::new();
    interp.process_all(&list).unwrap();
    assert_eq!(interp.datum(Model, "x"), Some(&Datum::Int(2)));
}

#[test]
fn reset_clears_everything() {
    let mut interp = Interpreter::new();
    let mut list = StatementList::new();
    let one = list.arena_mut().literal("1");
    list.data(Statement::assign("x", one));
    interp.process_all(&list).unwrap();

    interp.reset();

    assert_eq!(interp.lookup(Data, "x"), None);
    assert_eq!(interp.graph().value_count(), 0);
    assert!(interp.history().is_empty());
}

proptest! {
    #[test]
    fn ranged_writes_grow_and_last_write_wins(indices in prop::collection::vec(0usize..16, 1..8)) {
        let mut list = StatementList::new();
        for (k, index) in indices.iter().enumerate() {
            let a = list.arena_mut();
            let index = a.literal(&index.to_string());
            let value = a.literal(&format!("{k}.0"));
            list.data(Statement::indexed("x", [index], value));
        }

        let mut interp = Interpreter::builder().seed(0).build();
        interp.process_all(&list).unwrap();

        let mut expected = BTreeMap::new();
        for (k, index) in indices.iter().enumerate() {
            expected.insert(*index, k as f64);
        }
        let max = indices.iter().copied().max().unwrap();
        let x = interp.datum(Data, "x").and_then(Datum::as_array).unwrap();
        prop_assert_eq!(x.len(), max + 1);
        for i in 0..=max {
            prop_assert_eq!(x.get(i).and_then(Datum::as_f64), expected.get(&i).copied());
        }
    }
}
