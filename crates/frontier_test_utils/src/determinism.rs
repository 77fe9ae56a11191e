//! Replay harness for checking that a setup always reaches the same state.
//!
//! Every helper builds fresh simulations from a setup closure, advances them
//! and compares [`Simulation::state_hash`] values. [`find_first_divergence`]
//! narrows a mismatch down to the first tick whose updates or hash differ,
//! and [`verify_serialization_determinism`] checks that a snapshot restores
//! to an identical [`Game`].
//!
//! The core keeps state in ordered collections, uses fixed-point fractions
//! and seeds each defense post from its tick and tile, so any mismatch found
//! here is a bug.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use frontier_core::game::Game;
use frontier_core::simulation::Simulation;

/// Final state hashes of repeated runs of one setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunHashes {
    /// Ticks each run advanced.
    pub ticks: u64,
    /// One hash per run, in run order.
    pub hashes: Vec<u64>,
}

impl RunHashes {
    /// Whether every run ended in the same state.
    #[must_use]
    pub fn all_match(&self) -> bool {
        self.hashes.windows(2).all(|pair| pair[0] == pair[1])
    }

    /// Distinct hashes, ascending.
    #[must_use]
    pub fn distinct(&self) -> Vec<u64> {
        let mut distinct = self.hashes.clone();
        distinct.sort_unstable();
        distinct.dedup();
        distinct
    }

    /// Panic listing every run's hash unless all runs match.
    ///
    /// # Panics
    ///
    /// Panics if two runs ended in different states.
    pub fn assert_matching(&self) {
        assert!(
            self.all_match(),
            "runs diverged after {} ticks: {} distinct hashes across {} runs {:?}",
            self.ticks,
            self.distinct().len(),
            self.hashes.len(),
            self.hashes
        );
    }
}

/// Build `runs` fresh states with `setup`, advance each `ticks` times with
/// `step`, and record `hash` of each final state.
pub fn replay_hashes<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> RunHashes
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let hashes = (0..runs)
        .map(|_| {
            let mut state = setup();
            (0..ticks).for_each(|_| step(&mut state));
            hash(&state)
        })
        .collect();

    RunHashes { ticks, hashes }
}

/// Run a [`Simulation`] setup twice and compare final state hashes.
pub fn verify_simulation_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> Simulation,
{
    replay_hashes(
        2,
        num_ticks,
        &setup_fn,
        |sim| {
            sim.tick();
        },
        Simulation::state_hash,
    )
    .all_match()
}

/// Run N simulations on scoped threads and collect final hashes.
///
/// Each thread builds its own simulation from `setup_fn`, so executions
/// never cross threads.
///
/// # Panics
///
/// Panics if a simulation thread panics.
pub fn run_parallel_simulations_scoped<F>(
    setup_fn: F,
    num_sims: usize,
    num_ticks: u64,
) -> RunHashes
where
    F: Fn() -> Simulation + Sync,
{
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut sim = setup_fn();
                    for _ in 0..num_ticks {
                        sim.tick();
                    }
                    sim.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("simulation thread panicked"))
            .collect()
    });

    RunHashes {
        ticks: num_ticks,
        hashes,
    }
}

/// Compare two simulation runs tick-by-tick, finding first divergence.
///
/// # Returns
///
/// `None` if simulations are deterministic, `Some(tick)` if they diverge
/// at that tick.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> Simulation,
{
    let mut sim1 = setup_fn();
    let mut sim2 = setup_fn();

    if sim1.state_hash() != sim2.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        let updates1 = sim1.tick();
        let updates2 = sim2.tick();

        if updates1 != updates2 || sim1.state_hash() != sim2.state_hash() {
            return Some(tick);
        }
    }

    None
}

/// Verify that a game snapshot round-trip preserves state exactly.
pub fn verify_serialization_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> Simulation,
{
    let mut sim = setup_fn();

    for _ in 0..num_ticks {
        sim.tick();
    }

    let hash_before = sim.state_hash();

    let Ok(bytes) = sim.game().serialize() else {
        return false;
    };
    let Ok(restored) = Game::deserialize(&bytes) else {
        return false;
    };

    hash_before == restored.state_hash()
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for determinism testing.
pub mod strategies {
    use frontier_core::unit::UnitKind;
    use proptest::prelude::*;

    /// A structure to place during setup.
    #[derive(Debug, Clone)]
    pub struct PlannedStructure {
        /// Structure kind.
        pub kind: UnitKind,
        /// Index of the owning player.
        pub owner: usize,
        /// Column.
        pub x: u32,
        /// Row.
        pub y: u32,
    }

    /// Generate a structure kind that has an execution.
    pub fn arb_structure_kind() -> impl Strategy<Value = UnitKind> {
        prop_oneof![
            Just(UnitKind::DefensePost),
            Just(UnitKind::RecruitmentCenter),
        ]
    }

    /// Generate a troop count (0-100000).
    pub fn arb_troops() -> impl Strategy<Value = u32> {
        0u32..100_000u32
    }

    /// Generate a structure on a `size` square map owned by one of `players`.
    pub fn arb_structure(size: u32, players: usize) -> impl Strategy<Value = PlannedStructure> {
        (arb_structure_kind(), 0..players, 0..size, 0..size).prop_map(|(kind, owner, x, y)| {
            PlannedStructure { kind, owner, x, y }
        })
    }

    /// Generate a list of structures.
    pub fn arb_structure_list(
        size: u32,
        players: usize,
        max_len: usize,
    ) -> impl Strategy<Value = Vec<PlannedStructure>> {
        proptest::collection::vec(arb_structure(size, players), 1..max_len)
    }
}
