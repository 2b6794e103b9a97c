//! Gate decisions stay whole while topologies are installed concurrently.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use shoal_test_utils::fixtures::{dist_config, ClusterFixture};
use shoal_test_utils::{
    init_test_tracing, CacheKey, CommandKind, InvocationContext, LoadDecision, LoadGate,
    LoadType, SkipReason, TopologyGate, WriteCommand,
};

const INSTALLS: u32 = 2_000;

/// Odd topology ids make node-0 primary, even ids make it the backup.
fn owners_for(topology_id: u32) -> [usize; 2] {
    if topology_id % 2 == 1 {
        [0, 1]
    } else {
        [1, 0]
    }
}

fn expected_for(topology_id: u32) -> LoadDecision {
    if topology_id % 2 == 1 {
        LoadDecision::Load
    } else {
        LoadDecision::Skip(SkipReason::NotPrimaryOwner)
    }
}

#[test]
fn multi_key_plans_follow_one_layout_during_installs() {
    init_test_tracing();
    let cluster = Arc::new(ClusterFixture::new(2, &owners_for(1)));
    let gate = Arc::new(cluster.gate(0, dist_config().with_stats(false)));
    let done = Arc::new(AtomicBool::new(false));
    let command = Arc::new(
        WriteCommand::multi(CommandKind::PutMap, ["a", "b", "c", "d", "e", "f"])
            .with_load_type(LoadType::Primary),
    );

    let writer = {
        let cluster = Arc::clone(&cluster);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            for id in 2..=INSTALLS {
                let installed = cluster.reassign(&owners_for(id));
                assert_eq!(installed.topology_id(), id);
            }
            done.store(true, Ordering::Release);
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let gate = Arc::clone(&gate);
            let done = Arc::clone(&done);
            let command = Arc::clone(&command);
            thread::spawn(move || {
                let ctx = InvocationContext::local();
                while !done.load(Ordering::Acquire) {
                    // Every key of one plan comes from the same layout.
                    let plan = gate.plan(&command, &ctx);
                    assert_eq!(plan.len(), 6);
                    let first = plan[0].1;
                    assert!(
                        plan.iter().all(|(_, decision)| *decision == first),
                        "mixed plan: {:?}",
                        plan
                    );

                    // A pinned snapshot decides by its own id.
                    let snapshot = gate.topology().current_topology();
                    let key = CacheKey::from("c");
                    assert_eq!(
                        gate.decide_in(&snapshot, &command, &key, &ctx),
                        expected_for(snapshot.topology_id())
                    );

                    let to_load = gate.keys_to_load(&command, &ctx);
                    assert!(to_load.is_empty() || to_load.len() == 6);
                }
            })
        })
        .collect();

    writer.join().expect("writer");
    for reader in readers {
        reader.join().expect("reader");
    }

    let last = gate.topology().current_topology();
    assert_eq!(last.topology_id(), INSTALLS);
    assert_eq!(
        gate.decide(&command, &CacheKey::from("a"), &InvocationContext::local()),
        expected_for(INSTALLS)
    );
}
