mod common;

use common::*;
use cycore::cyformal::prelude::*;
use cycore::derivation::{DerivationRecord, RecordStep};
use cycore::prelude::*;

fn reloaded(record: &DerivationRecord) -> CyResult<Derivation> {
    let text = record.to_json()?;
    Derivation::from_record(&DerivationRecord::from_json(&text)?)
}

fn step_of(record: &mut DerivationRecord, id: NodeId) -> &mut RecordStep {
    &mut record
        .nodes
        .iter_mut()
        .find(|n| n.id == id)
        .expect("node is listed")
        .step
}

#[test]
fn records_survive_json_and_verify_again() {
    let (goal, derivation) = successor_proof();
    let record = derivation.to_record();
    let restored = reloaded(&record).unwrap();

    assert_eq!(restored.len(), derivation.len());
    assert_eq!(restored.to_record(), record);
    assert_eq!(restored.segments(), derivation.segments());
    assert!(verify(&goal, &restored).is_valid());
}

#[test]
fn records_keep_invalid_derivations_invalid() {
    let (goal, derivation, _, _) = spinning_derivation();
    let restored = reloaded(&derivation.to_record()).unwrap();
    assert!(matches!(
        verify(&goal, &restored),
        Verdict::Invalid(CyError::TraceConditionFailed { .. })
    ));
}

#[test]
fn json_uses_tagged_steps() {
    let (_, derivation, _, _) = spinning_derivation();
    let text = derivation.to_record().to_json().unwrap();
    assert!(text.contains("\"kind\": \"back_edge\""));
    assert!(text.contains("\"kind\": \"rule\""));
}

#[test]
fn duplicate_and_dangling_nodes_are_rejected() {
    let (_, derivation) = successor_proof();

    let mut duplicated = derivation.to_record();
    let copy = duplicated.nodes[1].clone();
    duplicated.nodes.push(copy);
    assert!(Derivation::from_record(&duplicated).unwrap_err().is_malformed_record());

    let mut dangling = derivation.to_record();
    let root = dangling.root;
    if let RecordStep::Rule { children, .. } = step_of(&mut dangling, root) {
        children.push(NodeId(u32::MAX));
    }
    assert!(Derivation::from_record(&dangling).unwrap_err().is_malformed_record());

    let mut orphaned = derivation.to_record();
    orphaned.root = NodeId(u32::MAX);
    assert!(Derivation::from_record(&orphaned).unwrap_err().is_malformed_record());
}

#[test]
fn unreachable_nodes_are_rejected() {
    let (_, derivation) = successor_proof();
    let mut record = derivation.to_record();
    let root = record.root;
    *step_of(&mut record, root) = RecordStep::Axiom;
    assert!(Derivation::from_record(&record).unwrap_err().is_malformed_record());
}

#[test]
fn tampered_rules_are_detected_when_loading() {
    let (_, derivation) = successor_proof();
    let mut record = derivation.to_record();
    let root = record.root;
    if let RecordStep::Rule { rule, .. } = step_of(&mut record, root) {
        *rule = Rule::ConjunctionRight;
    }
    assert!(Derivation::from_record(&record).unwrap_err().is_rule_mismatch());
}

#[test]
fn tampered_back_edges_are_detected_when_verifying() {
    let (goal, derivation) = successor_proof();
    let (bud, _) = derivation.back_edges().next().unwrap();

    let mut record = derivation.to_record();
    if let RecordStep::BackEdge { substitution, .. } = step_of(&mut record, bud) {
        *substitution = [(Atom::new("x"), v("z"))].into_iter().collect();
    }
    let restored = Derivation::from_record(&record).unwrap();
    assert!(restored.segments().is_empty());
    assert!(matches!(
        verify(&goal, &restored),
        Verdict::Invalid(CyError::BackEdgeMismatch { .. })
    ));
}

#[test]
fn open_leaves_load_but_do_not_verify() {
    let (goal, derivation) = successor_proof();
    let mut record = derivation.to_record();
    let leaf = derivation
        .nodes()
        .find(|n| n.status.is_closed_axiom())
        .map(|n| n.id)
        .unwrap();
    *step_of(&mut record, leaf) = RecordStep::Open;

    let restored = Derivation::from_record(&record).unwrap();
    assert!(!restored.is_complete());
    match verify(&goal, &restored) {
        Verdict::Invalid(CyError::IncompleteDerivation { open }) => assert_eq!(open, vec![leaf]),
        other => panic!("unexpected verdict {other:?}"),
    }
}

#[test]
fn loading_rejects_propositions_that_break_their_invariants() {
    let (_, derivation) = successor_proof();
    let value = serde_json::to_value(derivation.to_record()).unwrap();
    assert_eq!(value["nodes"][0]["id"], serde_json::json!(0));

    let mut empty = value.clone();
    empty["nodes"][0]["sequent"]["conclusion"]["Quantifier"]["body"]["Connective"]["operands"] =
        serde_json::json!([]);
    let err = DerivationRecord::from_json(&empty.to_string()).unwrap_err();
    assert!(err.is_serialization_error(), "{err}");

    let mut duplicated = value.clone();
    duplicated["nodes"][0]["sequent"]["assumption"]["Quantifier"]["vars"] =
        serde_json::json!(["a", "a"]);
    let err = DerivationRecord::from_json(&duplicated.to_string()).unwrap_err();
    assert!(err.is_serialization_error(), "{err}");

    let mut unbound = value;
    unbound["nodes"][0]["sequent"]["conclusion"]["Quantifier"]["fixpoint"] = serde_json::Value::Null;
    let err = DerivationRecord::from_json(&unbound.to_string()).unwrap_err();
    assert!(err.is_serialization_error(), "{err}");

    assert!(DerivationRecord::from_json(&derivation.to_record().to_json().unwrap()).is_ok());
}

#[test]
fn recorded_premises_must_match_the_rule() {
    let (goal, derivation) = successor_proof();
    let instance_parent = derivation
        .nodes()
        .find(|n| n.status.is_closed_axiom())
        .and_then(|n| n.parent)
        .unwrap();

    let mut record = derivation.to_record();
    let node = record.nodes.iter_mut().find(|n| n.id == instance_parent).unwrap();
    node.sequent = Sequent::new(
        node.sequent.assumption.clone(),
        Proposition::apply("Succ", [v("x"), v("z")]),
    );

    let restored = Derivation::from_record(&record).unwrap();
    assert!(matches!(
        verify(&goal, &restored),
        Verdict::Invalid(CyError::RuleMismatch { .. })
    ));
}

#[test]
fn axiom_steps_must_close_axioms() {
    let (goal, derivation) = successor_proof();
    let (bud, _) = derivation.back_edges().next().unwrap();

    let mut record = derivation.to_record();
    *step_of(&mut record, bud) = RecordStep::Axiom;

    let restored = Derivation::from_record(&record).unwrap();
    assert!(restored.segments().is_empty());
    match verify(&goal, &restored) {
        Verdict::Invalid(CyError::AxiomMismatch { node, .. }) => assert_eq!(node, bud),
        other => panic!("unexpected verdict {other:?}"),
    }
}
