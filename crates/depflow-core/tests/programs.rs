use depflow_core::{
    analysis::cfg::StmtGraph, format::format_body, AnalysisConfig, BinOp, DataFlowAnalysis,
    Dependency, DependencyKind, Expr, LoopDependencyKind, MethodBody, MethodBuilder, StmtId,
};
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;

fn local(name: &str) -> Expr {
    Expr::local(name)
}

fn analyze(body: &MethodBody) -> DataFlowAnalysis {
    DataFlowAnalysis::analyze(body, &AnalysisConfig::default()).unwrap()
}

fn loop_kind(
    analysis: &DataFlowAnalysis,
    source: StmtId,
    target: StmtId,
    var: &str,
) -> (LoopDependencyKind, u64) {
    let dep = analysis
        .dependencies
        .loop_dependencies_for(target)
        .and_then(|deps| deps.iter().find(|d| d.source == source && d.variable == var))
        .unwrap();
    (dep.kind, dep.distance)
}

/// `i = 1; while (i < n) { a[i] = x; t = a[<read>]; a[j] = 0; i++; }`
///
/// The trailing `a[j] = 0` keeps the first store from reaching the next iteration, so the
/// subscript comparison decides the pair.
fn array_walk(read: Expr) -> MethodBody {
    array_walk_reading(Expr::array_elem(local("a"), read))
}

/// Same loop, with `t = <rhs>` as the reading statement.
fn array_walk_reading(rhs: Expr) -> MethodBody {
    let mut builder = MethodBuilder::new("array_walk");
    builder.assign(local("i"), Expr::int(1));
    builder.label("head").unwrap();
    builder.if_goto(Expr::binop(BinOp::Ge, local("i"), local("n")), "done");
    builder.assign(Expr::array_elem(local("a"), local("i")), local("x"));
    builder.assign(local("t"), rhs);
    builder.assign(Expr::array_elem(local("a"), local("j")), Expr::int(0));
    builder.assign(local("i"), Expr::add(local("i"), Expr::int(1)));
    builder.then_jump("head").unwrap();
    builder.label("done").unwrap();
    builder.ret(None);
    builder.build().unwrap()
}

#[test]
fn test_array_read_of_previous_element_is_carried() {
    let body = array_walk(Expr::sub(local("i"), Expr::int(1)));
    let analysis = analyze(&body);

    assert_eq!(
        loop_kind(&analysis, StmtId(2), StmtId(3), "a"),
        (LoopDependencyKind::Carried, 1)
    );
}

#[test]
fn test_array_read_of_same_element_is_independent() {
    let body = array_walk(local("i"));
    let analysis = analyze(&body);

    assert_eq!(
        loop_kind(&analysis, StmtId(2), StmtId(3), "a"),
        (LoopDependencyKind::Independent, 0)
    );
}

#[test]
fn test_array_read_ahead_uses_the_shift_as_distance() {
    let body = array_walk(Expr::add(local("i"), Expr::int(2)));
    let analysis = analyze(&body);

    assert_eq!(
        loop_kind(&analysis, StmtId(2), StmtId(3), "a"),
        (LoopDependencyKind::Carried, 2)
    );
}

#[test]
fn test_any_shifted_element_read_makes_the_pair_carried() {
    let elem = |index: Expr| Expr::array_elem(local("a"), index);

    let body = array_walk_reading(Expr::add(
        elem(local("i")),
        elem(Expr::sub(local("i"), Expr::int(1))),
    ));
    let analysis = analyze(&body);
    assert_eq!(
        loop_kind(&analysis, StmtId(2), StmtId(3), "a"),
        (LoopDependencyKind::Carried, 1)
    );

    // The farthest shift sets the distance, whatever the read order.
    let body = array_walk_reading(Expr::add(
        elem(Expr::add(local("i"), Expr::int(3))),
        Expr::add(elem(local("i")), elem(Expr::sub(local("i"), Expr::int(1)))),
    ));
    let analysis = analyze(&body);
    assert_eq!(
        loop_kind(&analysis, StmtId(2), StmtId(3), "a"),
        (LoopDependencyKind::Carried, 3)
    );

    let body = array_walk_reading(Expr::add(elem(local("i")), elem(local("i"))));
    let analysis = analyze(&body);
    assert_eq!(
        loop_kind(&analysis, StmtId(2), StmtId(3), "a"),
        (LoopDependencyKind::Independent, 0)
    );
}

#[test]
fn test_unrelated_subscripts_default_to_carried() {
    let body = array_walk(local("k"));
    let analysis = analyze(&body);

    assert_eq!(
        loop_kind(&analysis, StmtId(2), StmtId(3), "a"),
        (LoopDependencyKind::Carried, 1)
    );
    // The later store survives to the header.
    assert_eq!(
        loop_kind(&analysis, StmtId(4), StmtId(2), "a").0,
        LoopDependencyKind::Carried
    );
}

#[test]
fn test_do_while_loop() {
    let mut builder = MethodBuilder::new("do_while");
    builder.assign(local("sum"), Expr::int(0));
    builder.assign(local("i"), Expr::int(0));
    builder.label("body").unwrap();
    let acc = builder.assign(local("sum"), Expr::add(local("sum"), local("i")));
    builder.assign(local("i"), Expr::add(local("i"), Expr::int(1)));
    let test = builder.if_goto(Expr::binop(BinOp::Lt, local("i"), local("n")), "body");
    let exit = builder.ret(Some(local("sum")));
    let body = builder.build().unwrap();

    let analysis = analyze(&body);
    let lp = analysis.loops.get(acc).unwrap();

    assert_eq!(lp.back_edges, vec![(test, acc)]);
    assert_eq!(lp.exits, vec![test]);
    assert_eq!(lp.stmts.len(), 3);

    let deps = &analysis.dependencies;
    assert!(deps.contains(test, acc, DependencyKind::Control));
    assert!(!deps.contains(test, exit, DependencyKind::Control));
    assert_eq!(
        loop_kind(&analysis, acc, acc, "sum").0,
        LoopDependencyKind::Carried
    );
}

#[test]
fn test_break_and_continue() {
    let mut builder = MethodBuilder::new("break_continue");
    builder.assign(local("i"), Expr::int(0));
    builder.label("head").unwrap();
    let head = builder.if_goto(Expr::binop(BinOp::Ge, local("i"), local("n")), "done");
    let brk = builder.if_goto(local("stop"), "done");
    let cont = builder.if_goto(local("skip"), "next");
    let work = builder.assign(local("w"), Expr::add(local("w"), local("i")));
    builder.label("next").unwrap();
    let inc = builder.assign(local("i"), Expr::add(local("i"), Expr::int(1)));
    builder.then_jump("head").unwrap();
    builder.label("done").unwrap();
    let done = builder.ret(Some(local("w")));
    let body = builder.build().unwrap();

    let analysis = analyze(&body);
    let lp = analysis.loops.get(head).unwrap();

    assert_eq!(lp.stmts, BTreeSet::from([head, brk, cont, work, inc]));
    assert_eq!(lp.exits, vec![head, brk]);
    assert_eq!(lp.latches, vec![inc]);

    let control: Vec<Dependency> = analysis
        .dependencies
        .control_dependencies()
        .cloned()
        .collect();
    assert_eq!(
        control,
        vec![
            Dependency::control(head, brk),
            Dependency::control(brk, cont),
            Dependency::control(cont, work),
        ]
    );

    assert!(!analysis.post_dominators.post_dominates(inc, head));
    assert!(analysis.post_dominators.post_dominates(done, head));
    assert_eq!(
        loop_kind(&analysis, work, work, "w").0,
        LoopDependencyKind::Carried
    );
    assert_eq!(
        loop_kind(&analysis, inc, work, "i").0,
        LoopDependencyKind::Carried
    );
}

#[test]
fn test_unreachable_code_is_tolerated() {
    let mut builder = MethodBuilder::new("dead");
    builder.assign(local("x"), Expr::int(1));
    builder.ret(Some(local("x")));
    let dead = builder.assign(local("x"), Expr::int(2));
    builder.ret(None);
    let body = builder.build().unwrap();

    let analysis = analyze(&body);

    assert!(!analysis.dominators.is_reachable(dead));
    assert!(analysis.dominators.dominates(dead, dead));
    assert_eq!(analysis.dominators.idom(dead), None);
    assert!(analysis.converged());
    assert!(analysis.loops.is_empty());
}

#[test]
fn test_config_from_json_controls_stages() {
    let config = AnalysisConfig::from_json(
        r#"{ "max_iterations": 50, "control_dependencies": false }"#,
    )
    .unwrap();

    let mut builder = MethodBuilder::new("loop");
    builder.assign(local("i"), Expr::int(0));
    builder.label("head").unwrap();
    builder.if_goto(local("c"), "done");
    builder.assign(local("i"), Expr::add(local("i"), Expr::int(1)));
    builder.then_jump("head").unwrap();
    builder.label("done").unwrap();
    builder.ret(None);
    let body = builder.build().unwrap();

    let analysis = DataFlowAnalysis::analyze(&body, &config).unwrap();

    assert_eq!(analysis.dependencies.control_dependencies().count(), 0);
    assert!(analysis.dependencies.loop_dependencies().count() > 0);
    assert!(AnalysisConfig::from_json(r#"{ "max_iterations": 0 }"#).is_err());
    assert!(AnalysisConfig::from_json("not json").is_err());
}

#[test]
fn test_results_serialize() {
    let mut builder = MethodBuilder::new("ser");
    builder.assign(local("x"), Expr::int(1));
    builder.assign(local("y"), local("x"));
    builder.ret(Some(local("y")));
    let body = builder.build().unwrap();

    let analysis = analyze(&body);
    let json = serde_json::to_value(analysis.dependencies).unwrap();

    let raw_into_y = &json["data"]["1"][0];
    assert_eq!(raw_into_y["kind"], "Raw");
    assert_eq!(raw_into_y["variable"], "x");
    assert_eq!(raw_into_y["source"], 0);
}

#[test]
fn test_listing_matches_graph() {
    let mut builder = MethodBuilder::new("listing");
    builder.param("n", 0);
    builder.if_goto(Expr::binop(BinOp::Le, local("n"), Expr::int(0)), "out");
    builder.invoke(Expr::call(Some(local("log")), "info", vec![local("n")]));
    builder.label("out").unwrap();
    builder.ret(None);
    let body = builder.build().unwrap();

    let text = format_body(&body);
    assert_eq!(
        text,
        "method listing\n\
         \x20   s0: n := @parameter0  -> s1\n\
         \x20   s1: if n <= 0  -> s2 s3\n\
         \x20   s2: log.info(n)  -> s3\n\
         out:\n\
         \x20   s3: return\n"
    );
    assert_eq!(body.len(), 4);
}
