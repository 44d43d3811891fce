use super::fixtures;
use crate::analysis::cfg::{find_exits, StmtGraph};
use crate::analysis::{DominatorTree, PostDominatorTree};
use crate::stmt::StmtId;
use pretty_assertions::assert_eq;

#[test]
fn test_dominance_is_reflexive_and_antisymmetric() {
    for body in fixtures::all_programs() {
        let dom = DominatorTree::compute(&body, 1000);

        for a in body.stmt_ids() {
            assert!(dom.dominates(a, a), "{}: {} should dominate itself", body.name, a);
            for b in body.stmt_ids() {
                if a != b {
                    assert!(
                        !(dom.dominates(a, b) && dom.dominates(b, a)),
                        "{}: {} and {} dominate each other",
                        body.name,
                        a,
                        b
                    );
                }
            }
        }
    }
}

#[test]
fn test_entry_dominates_every_reachable_statement() {
    for body in fixtures::all_programs() {
        let dom = DominatorTree::compute(&body, 1000);
        let entry = dom.entry().unwrap();

        for s in body.stmt_ids() {
            assert!(dom.is_reachable(s));
            assert!(dom.dominates(entry, s), "{}: entry misses {}", body.name, s);
        }
    }
}

#[test]
fn test_dominance_is_transitive() {
    for body in fixtures::all_programs() {
        let dom = DominatorTree::compute(&body, 1000);
        let ids: Vec<StmtId> = body.stmt_ids().collect();

        for &a in &ids {
            for &b in &ids {
                for &c in &ids {
                    if dom.dominates(a, b) && dom.dominates(b, c) {
                        assert!(dom.dominates(a, c), "{}: {} {} {}", body.name, a, b, c);
                    }
                }
            }
        }
    }
}

#[test]
fn test_idom_is_closest_strict_dominator() {
    for body in fixtures::all_programs() {
        let dom = DominatorTree::compute(&body, 1000);

        for s in body.stmt_ids() {
            let Some(idom) = dom.idom(s) else {
                assert_eq!(Some(s), dom.entry());
                continue;
            };
            assert!(dom.strictly_dominates(idom, s));
            for &other in dom.dominators(s).unwrap() {
                if other != s {
                    assert!(dom.dominates(other, idom));
                }
            }
        }
    }
}

#[test]
fn test_post_dominance_matches_dominance_on_reversed_graph() {
    for body in fixtures::single_exit_programs() {
        assert_eq!(find_exits(&body).len(), 1, "{}", body.name);

        let pdom = PostDominatorTree::compute(&body, 1000);
        let reversed = body.reversed();
        let rdom = DominatorTree::compute(&reversed, 1000);
        assert_eq!(rdom.entry(), find_exits(&body).first().copied());

        for a in body.stmt_ids() {
            for b in body.stmt_ids() {
                assert_eq!(
                    pdom.post_dominates(a, b),
                    rdom.dominates(a, b),
                    "{}: post_dominates({}, {})",
                    body.name,
                    a,
                    b
                );
            }
            assert_eq!(pdom.ipdom(a), rdom.idom(a), "{}: ipdom({})", body.name, a);
        }
    }
}

#[test]
fn test_counted_loop_tree_shape() {
    let body = fixtures::counted_loop();
    let dom = DominatorTree::compute(&body, 1000);
    let pdom = PostDominatorTree::compute(&body, 1000);

    let s = |n| StmtId(n);
    assert_eq!(
        dom.preorder(),
        vec![(s(0), 0), (s(1), 1), (s(2), 2), (s(3), 3), (s(4), 4), (s(5), 3)]
    );
    assert_eq!(pdom.ipdom(s(4)), Some(s(2)));
    assert_eq!(pdom.ipdom(s(2)), Some(s(5)));
    assert_eq!(pdom.ipdom(s(5)), None);
}
