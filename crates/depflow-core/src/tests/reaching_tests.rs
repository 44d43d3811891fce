use super::fixtures;
use crate::analysis::cfg::StmtGraph;
use crate::analysis::{DefUseSets, ReachingDefinitions};
use crate::stmt::StmtId;
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;

#[test]
fn test_recompute_from_fixpoint_is_identity() {
    for body in fixtures::all_programs() {
        let du = DefUseSets::compute(&body);
        let first = ReachingDefinitions::compute(&body, &du, 1000);
        assert!(first.converged(), "{}", body.name);

        let second = first.recompute_from_current(&body, &du, 1000);
        for s in body.stmt_ids() {
            assert_eq!(first.reaching_in(s), second.reaching_in(s), "{}: IN[{}]", body.name, s);
            assert_eq!(first.reaching_out(s), second.reaching_out(s), "{}: OUT[{}]", body.name, s);
        }
    }
}

#[test]
fn test_out_follows_gen_kill_equation() {
    for body in fixtures::all_programs() {
        let du = DefUseSets::compute(&body);
        let rd = ReachingDefinitions::compute(&body, &du, 1000);

        for s in body.stmt_ids() {
            let mut expected_in = BTreeSet::new();
            for &p in body.predecessors(s) {
                expected_in.extend(rd.reaching_out(p).iter().copied());
            }
            assert_eq!(rd.reaching_in(s), &expected_in);

            let mut expected_out: BTreeSet<StmtId> = expected_in
                .iter()
                .copied()
                .filter(|&d| !du.defs_overlap(d, s))
                .collect();
            if du.has_defs(s) {
                expected_out.insert(s);
            }
            assert_eq!(rd.reaching_out(s), &expected_out, "{}: OUT[{}]", body.name, s);
        }
    }
}

#[test]
fn test_nested_loop_definitions_reach_outer_header() {
    let body = fixtures::nested_loops();
    let du = DefUseSets::compute(&body);
    let rd = ReachingDefinitions::compute(&body, &du, 1000);

    let outer = StmtId(1);
    assert_eq!(rd.definitions_of(outer, "i", &du), vec![StmtId(0), StmtId(7)]);
    assert_eq!(rd.definitions_of(outer, "t", &du), vec![StmtId(4)]);
    assert_eq!(
        rd.definitions_of(StmtId(3), "j", &du),
        vec![StmtId(2), StmtId(5)]
    );
}

#[test]
fn test_iteration_cap_leaves_partial_result() {
    let body = fixtures::nested_loops();
    let du = DefUseSets::compute(&body);

    let capped = ReachingDefinitions::compute(&body, &du, 1);
    assert!(!capped.converged());
    assert_eq!(capped.iterations(), 1);

    let resumed = capped.recompute_from_current(&body, &du, 1000);
    let full = ReachingDefinitions::compute(&body, &du, 1000);
    for s in body.stmt_ids() {
        assert_eq!(resumed.reaching_in(s), full.reaching_in(s));
    }
}
