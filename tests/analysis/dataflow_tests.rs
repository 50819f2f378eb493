use crate::fixtures;
use cilscope::AnalysisSession;

#[test]
fn loop_variable_is_live_around_the_back_edge() {
    let session = AnalysisSession::new(fixtures::math_module());
    let cfg = session.build_cfg("Math.Ops", "Sum").expect("cfg");
    let body = session.method_body("Math.Ops", "Sum").expect("body");
    let liveness = session.analyze_liveness(&cfg, body);

    // Slot 0 (the accumulator) is read at the loop body and after the loop,
    // so it stays live out of the defining block.
    let entry = cfg.entry;
    assert!(liveness.def_sets[&entry].contains(&0));
    assert!(liveness.live_out[&entry].contains(&0));

    let body_block = cfg
        .blocks
        .iter()
        .find(|b| b.instructions.iter().any(|i| i.offset == 3))
        .expect("loop body block");
    assert!(liveness.use_sets[&body_block.id].contains(&0));
    assert!(liveness.live_in[&body_block.id].contains(&0));
}

#[test]
fn straight_line_liveness_is_empty_without_locals() {
    let session = AnalysisSession::new(fixtures::math_module());
    let cfg = session.build_cfg("Math.Ops", "Add").expect("cfg");
    let body = session.method_body("Math.Ops", "Add").expect("body");
    let liveness = session.analyze_liveness(&cfg, body);

    assert!(liveness.live_in[&cfg.entry].is_empty());
    assert!(liveness.live_out[&cfg.entry].is_empty());
}

#[test]
fn reaching_defs_enumerates_stores_and_joins_at_the_exit() {
    let session = AnalysisSession::new(fixtures::math_module());
    let cfg = session.build_cfg("Math.Ops", "Sum").expect("cfg");
    let body = session.method_body("Math.Ops", "Sum").expect("body");
    let reaching = session.analyze_reaching_defs(&cfg, body);

    // Two stores to slot 0: the initializer and the loop accumulation.
    assert_eq!(reaching.definitions.len(), 2);
    assert!(reaching.definitions.iter().all(|d| d.local == 0));
    let offsets: Vec<u32> = reaching.definitions.iter().map(|d| d.offset).collect();
    assert_eq!(offsets, vec![1, 6]);

    // At the block reading the final value both definitions reach.
    let exit_block = cfg
        .blocks
        .iter()
        .find(|b| b.instructions.iter().any(|i| i.offset == 14))
        .expect("return block");
    let reach_in = &reaching.reach_in[&exit_block.id];
    assert!(reach_in.contains(&0) && reach_in.contains(&1));
}

#[test]
fn gen_kill_partition_definitions_of_the_same_slot() {
    let session = AnalysisSession::new(fixtures::math_module());
    let cfg = session.build_cfg("Math.Ops", "Sum").expect("cfg");
    let body = session.method_body("Math.Ops", "Sum").expect("body");
    let reaching = session.analyze_reaching_defs(&cfg, body);

    for block in &cfg.blocks {
        let generated = &reaching.gen_sets[&block.id];
        let killed = &reaching.kill_sets[&block.id];
        assert!(generated.is_disjoint(killed), "{}", block.id);
        // A block defining slot 0 kills every other definition of slot 0.
        if !generated.is_empty() {
            assert_eq!(generated.len() + killed.len(), reaching.definitions.len());
        }
    }
}
