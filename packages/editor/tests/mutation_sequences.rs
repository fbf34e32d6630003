//! End-to-end editing sequences: chained mutations, undo/redo walks, and
//! integrity after every step.

use anyhow::Result;
use rulecanvas_editor::{EditSession, NewNodeKind};
use rulecanvas_graph::OperatorRegistry;
use serde_json::{json, Value};

fn session(expr: Value) -> EditSession {
    EditSession::from_expression("seq", &expr, OperatorRegistry::standard())
}

fn root_id(session: &EditSession) -> String {
    session.store().roots()[0].id.clone()
}

#[test]
fn build_a_rule_from_a_literal() -> Result<()> {
    // Start from `0` and grow it into a real rule, the way the palette does
    let mut s = session(json!(0));
    let root = root_id(&s);

    // Wrapping in `<` pads to its minimum of two operands
    assert!(s.wrap_in_operator(&root, "<"));
    let lt = root_id(&s);
    assert_eq!(s.root_expression(), Some(&json!({"<": [0, 0]})));
    s.check_integrity()?;

    assert!(s.wrap_in_operator(&lt, "and"));
    assert!(s.add_argument(&root_id(&s), NewNodeKind::Operator, Some("==")));
    assert_eq!(
        s.root_expression(),
        Some(&json!({"and": [{"<": [0, 0]}, true, {"==": [0, 0]}]}))
    );
    s.check_integrity()?;
    Ok(())
}

#[test]
fn undo_walks_back_through_every_state() {
    let mut s = session(json!({"+": [1, 2]}));
    let root = root_id(&s);

    let mut states = vec![s.root_expression().cloned().unwrap()];
    assert!(s.add_argument(&root, NewNodeKind::Literal, None));
    states.push(s.root_expression().cloned().unwrap());
    assert!(s.add_argument(&root, NewNodeKind::Literal, None));
    states.push(s.root_expression().cloned().unwrap());
    assert!(s.remove_argument(&root, 0));
    states.push(s.root_expression().cloned().unwrap());

    assert_eq!(states.last(), Some(&json!({"+": [2, 0, 0]})));

    // Walk all the way back, then all the way forward again
    for expected in states.iter().rev().skip(1) {
        assert!(s.undo());
        assert_eq!(s.root_expression(), Some(expected));
        assert!(s.check_integrity().is_ok());
    }
    assert!(!s.undo());

    for expected in states.iter().skip(1) {
        assert!(s.redo());
        assert_eq!(s.root_expression(), Some(expected));
    }
    assert!(!s.redo());
}

#[test]
fn new_edit_after_undo_forks_history() {
    let mut s = session(json!({"+": [1, 2]}));
    let root = root_id(&s);

    s.add_argument(&root, NewNodeKind::Literal, None);
    s.undo();
    assert!(s.can_redo());

    s.add_argument(&root, NewNodeKind::Literal, None);
    assert!(!s.can_redo());
    assert_eq!(s.root_expression(), Some(&json!({"+": [1, 2, 0]})));
}

#[test]
fn decision_editing_round_trip() {
    let mut s = session(json!({"if": [{"<": [{"var": "t"}, 0]}, "cold", "warm"]}));
    let root = root_id(&s);
    let original = s.root_expression().cloned().unwrap();

    // Grow a second branch, edit it, then collapse it again
    assert!(s.add_argument(&root, NewNodeKind::Operator, Some(">")));
    assert_eq!(
        s.root_expression(),
        Some(&json!({"if": [
            {"<": [{"var": "t"}, 0]}, "cold",
            {">": [0, 0]}, 0,
            "warm"
        ]}))
    );
    assert!(s.check_integrity().is_ok());

    let new_then = s.store().children(&root)[3].id.clone();
    assert!(s.set_literal_value(&new_then, json!("hot")));
    assert_eq!(
        s.root_expression(),
        Some(&json!({"if": [
            {"<": [{"var": "t"}, 0]}, "cold",
            {">": [0, 0]}, "hot",
            "warm"
        ]}))
    );

    assert!(s.remove_argument(&root, 2));
    assert_eq!(s.root_expression(), Some(&original));
    assert!(s.check_integrity().is_ok());
}

#[test]
fn delete_then_undo_restores_decision_branch() {
    let mut s = session(json!({"if": [true, "yes", "no"]}));
    let root = root_id(&s);
    let then_node = s.store().children(&root)[1].id.clone();

    assert!(s.delete_node_tree(&then_node));
    assert_eq!(s.root_expression(), Some(&json!({"if": [true, null, "no"]})));

    assert!(s.undo());
    assert_eq!(s.root_expression(), Some(&json!({"if": [true, "yes", "no"]})));
    assert!(s.store().contains(&then_node));
}

#[test]
fn duplicate_paste_and_undo_interleaved() {
    let mut s = session(json!({"or": [{"var": "a"}, {"var": "b"}]}));
    let root = root_id(&s);
    let first = s.store().children(&root)[0].id.clone();

    assert!(s.copy(&first));
    assert!(s.duplicate_node_tree(&first));
    assert_eq!(
        s.root_expression(),
        Some(&json!({"or": [{"var": "a"}, {"var": "b"}, {"var": "a"}]}))
    );

    // Paste over the duplicate we just made
    let copy_id = s.store().children(&root)[2].id.clone();
    s.selection_mut().select_one(copy_id);
    assert!(s.paste());
    assert!(s.check_integrity().is_ok());

    // Clipboard still pastes after its source state is undone away
    assert!(s.undo());
    assert!(s.undo());
    assert_eq!(
        s.root_expression(),
        Some(&json!({"or": [{"var": "a"}, {"var": "b"}]}))
    );
    assert!(s.can_paste());
    let second = s.store().children(&root)[1].id.clone();
    s.selection_mut().select_one(second);
    assert!(s.paste());
    assert_eq!(
        s.root_expression(),
        Some(&json!({"or": [{"var": "a"}, {"var": "a"}]}))
    );
    assert!(s.check_integrity().is_ok());
}

#[test]
fn refused_edits_never_dirty_history() {
    let mut s = session(json!({"!": [true]}));
    let root = root_id(&s);

    assert!(!s.add_argument(&root, NewNodeKind::Literal, None));
    assert!(!s.remove_argument(&root, 0));
    assert!(!s.delete_node_tree("missing"));
    assert!(!s.set_literal_value(&root, json!(1)));

    assert!(!s.can_undo());
    assert_eq!(s.version(), 0);
    assert_eq!(s.root_expression(), Some(&json!({"!": [true]})));
}

#[test]
fn long_mixed_sequence_preserves_integrity() -> Result<()> {
    let mut s = session(json!({"and": [
        {"<": [{"var": "temp"}, 110]},
        {"==": [{"var": "pie.filling"}, "apple"]}
    ]}));
    let root = root_id(&s);

    for _ in 0..10 {
        assert!(s.add_argument(&root, NewNodeKind::Operator, Some("!")));
        s.check_integrity()?;
    }
    for _ in 0..5 {
        let last = s.store().children(&root).last().unwrap().id.clone();
        assert!(s.delete_node_tree(&last));
        s.check_integrity()?;
    }
    for _ in 0..7 {
        assert!(s.undo());
        s.check_integrity()?;
    }
    for _ in 0..3 {
        assert!(s.redo());
        s.check_integrity()?;
    }

    // Cached expressions still match a from-scratch projection
    let root = root_id(&s);
    assert_eq!(s.root_expression(), Some(&s.project(&root)));
    Ok(())
}
