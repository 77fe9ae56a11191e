//! Execution scheduler and tick loop.
//!
//! [`Simulation`] owns the [`Game`] and the registered executions and
//! advances both one tick at a time.
//!
//! # Tick Order
//!
//! Each tick:
//!
//! 1. Every [`ExecutionPhase::Territory`] execution, in registration order
//! 2. Every [`ExecutionPhase::Structure`] execution, in registration order
//! 3. Terminated executions are dropped
//! 4. The tick counter advances and the tick's updates are returned
//!
//! During the spawn phase, executions that are not active during spawn are
//! skipped.
//!
//! # Determinism
//!
//! Registration order is the only ordering input, so the same setup
//! produces the same state hash on every run.
//!
//! # Example
//!
//! ```
//! use frontier_core::prelude::*;
//!
//! let mut game = Game::new(GameMap::new(32, 32), GameConfig::default());
//! let red = game.add_player("red", 1000);
//! let tile = game.map().ref_at(4, 4);
//! game.conquer(red, tile).unwrap();
//!
//! let mut sim = Simulation::new(game);
//! sim.add_execution(Box::new(PlayerExecution::new(red)));
//! sim.add_execution(Box::new(DefensePostExecution::new(red, tile)));
//!
//! let updates = sim.tick();
//! assert_eq!(updates.tick, 0);
//! ```

use serde::{Deserialize, Serialize};

use crate::execution::{Execution, ExecutionPhase};
use crate::game::Game;
use crate::updates::GameUpdate;
use crate::Tick;

/// Updates produced by one call to [`Simulation::tick`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickUpdates {
    /// Tick that produced the updates.
    pub tick: Tick,
    /// Updates in emission order.
    pub updates: Vec<GameUpdate>,
}

impl TickUpdates {
    /// Whether the tick produced nothing observable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }
}

/// Game state plus the executions that drive it.
pub struct Simulation {
    game: Game,
    executions: Vec<Box<dyn Execution>>,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&'static str> = self.executions.iter().map(|e| e.name()).collect();
        f.debug_struct("Simulation")
            .field("tick", &self.game.ticks())
            .field("executions", &names)
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Wrap a game with no executions.
    #[must_use]
    pub fn new(game: Game) -> Self {
        Self {
            game,
            executions: Vec::new(),
        }
    }

    /// Current tick.
    #[must_use]
    pub const fn ticks(&self) -> Tick {
        self.game.ticks()
    }

    /// The game state.
    #[must_use]
    pub const fn game(&self) -> &Game {
        &self.game
    }

    /// Mutable game state, for scripted changes between ticks.
    pub fn game_mut(&mut self) -> &mut Game {
        &mut self.game
    }

    /// Consume the simulation, returning the game state.
    #[must_use]
    pub fn into_game(self) -> Game {
        self.game
    }

    /// Register an execution and initialize it at the current tick.
    pub fn add_execution(&mut self, mut execution: Box<dyn Execution>) {
        let ticks = self.game.ticks();
        execution.init(&mut self.game, ticks);
        tracing::trace!(execution = execution.name(), tick = ticks, "execution registered");
        self.executions.push(execution);
    }

    /// Number of live executions.
    #[must_use]
    pub fn execution_count(&self) -> usize {
        self.executions.len()
    }

    /// Advance the simulation by one tick.
    pub fn tick(&mut self) -> TickUpdates {
        let ticks = self.game.ticks();
        let spawning = self.game.in_spawn_phase();

        for phase in [ExecutionPhase::Territory, ExecutionPhase::Structure] {
            for execution in &mut self.executions {
                if execution.phase() != phase || !execution.is_active() {
                    continue;
                }
                if spawning && !execution.active_during_spawn_phase() {
                    continue;
                }
                execution.tick(&mut self.game, ticks);
            }
        }

        self.executions.retain(|execution| {
            let keep = execution.is_active();
            if !keep {
                tracing::debug!(execution = execution.name(), tick = ticks, "execution terminated");
            }
            keep
        });

        let updates = self.game.take_updates();
        self.game.advance_tick();

        #[cfg(feature = "debug-validation")]
        if let Err(err) = self.game.check_consistency() {
            tracing::error!(tick = ticks, error = %err, "game state inconsistent");
        }

        #[cfg(debug_assertions)]
        {
            let hash = self.game.state_hash();
            tracing::debug!(tick = self.game.ticks(), state_hash = hash, "Simulation state hash");
        }

        TickUpdates {
            tick: ticks,
            updates,
        }
    }

    /// Advance `count` ticks, collecting the updates of each.
    pub fn run(&mut self, count: u64) -> Vec<TickUpdates> {
        (0..count).map(|_| self.tick()).collect()
    }

    /// Hash of the current game state.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        self.game.state_hash()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::config::GameConfig;
    use crate::execution::{DefensePostExecution, PlayerExecution};
    use crate::map::GameMap;
    use crate::unit::UnitKind;

    /// Records the ticks and order in which it ran.
    struct Probe {
        label: &'static str,
        phase: ExecutionPhase,
        during_spawn: bool,
        lifetime: Option<u64>,
        log: Rc<RefCell<Vec<(Tick, &'static str)>>>,
    }

    impl Execution for Probe {
        fn name(&self) -> &'static str {
            self.label
        }

        fn init(&mut self, _game: &mut Game, _ticks: Tick) {}

        fn tick(&mut self, _game: &mut Game, ticks: Tick) {
            self.log.borrow_mut().push((ticks, self.label));
            if let Some(left) = self.lifetime.as_mut() {
                *left = left.saturating_sub(1);
            }
        }

        fn is_active(&self) -> bool {
            self.lifetime != Some(0)
        }

        fn active_during_spawn_phase(&self) -> bool {
            self.during_spawn
        }

        fn phase(&self) -> ExecutionPhase {
            self.phase
        }
    }

    fn probe(
        label: &'static str,
        phase: ExecutionPhase,
        log: &Rc<RefCell<Vec<(Tick, &'static str)>>>,
    ) -> Box<Probe> {
        Box::new(Probe {
            label,
            phase,
            during_spawn: true,
            lifetime: None,
            log: Rc::clone(log),
        })
    }

    fn empty_game(spawn_phase_ticks: u64) -> Game {
        let config = GameConfig {
            spawn_phase_ticks,
            ..GameConfig::default()
        };
        Game::new(GameMap::new(16, 16), config)
    }

    #[test]
    fn test_territory_phase_runs_first() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut sim = Simulation::new(empty_game(0));
        sim.add_execution(probe("post", ExecutionPhase::Structure, &log));
        sim.add_execution(probe("player", ExecutionPhase::Territory, &log));
        sim.add_execution(probe("center", ExecutionPhase::Structure, &log));

        sim.tick();

        assert_eq!(
            *log.borrow(),
            vec![(0, "player"), (0, "post"), (0, "center")]
        );
    }

    #[test]
    fn test_spawn_phase_skips_executions() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut sim = Simulation::new(empty_game(2));
        let mut late = probe("late", ExecutionPhase::Structure, &log);
        late.during_spawn = false;
        sim.add_execution(late);
        sim.add_execution(probe("early", ExecutionPhase::Structure, &log));

        sim.run(3);

        assert_eq!(
            *log.borrow(),
            vec![(0, "early"), (1, "early"), (2, "late"), (2, "early")]
        );
    }

    #[test]
    fn test_terminated_executions_dropped() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut sim = Simulation::new(empty_game(0));
        let mut short = probe("short", ExecutionPhase::Structure, &log);
        short.lifetime = Some(2);
        sim.add_execution(short);
        sim.add_execution(probe("long", ExecutionPhase::Structure, &log));

        sim.run(4);

        assert_eq!(sim.execution_count(), 1);
        let short_runs = log.borrow().iter().filter(|(_, l)| *l == "short").count();
        assert_eq!(short_runs, 2);
    }

    #[test]
    fn test_tick_updates_carry_tick() {
        let mut game = empty_game(0);
        let red = game.add_player("red", 100);
        let tile = game.map().ref_at(3, 3);
        game.conquer(red, tile).unwrap();

        let mut sim = Simulation::new(game);
        sim.add_execution(Box::new(DefensePostExecution::new(red, tile)));

        let first = sim.tick();
        assert_eq!(first.tick, 0);
        assert_eq!(first.updates.len(), 1);

        let second = sim.tick();
        assert_eq!(second.tick, 1);
        assert!(second.is_empty());
        assert_eq!(sim.ticks(), 2);
    }

    #[test]
    fn test_adjudication_visible_to_structures_same_tick() {
        let mut game = empty_game(0);
        let red = game.add_player("red", 100);
        let blue = game.add_player("blue", 100);
        let tile = game.map().ref_at(3, 3);
        game.conquer(red, tile).unwrap();
        game.conquer(red, game.map().ref_at(10, 10)).unwrap();

        let mut sim = Simulation::new(game);
        sim.add_execution(Box::new(DefensePostExecution::new(red, tile)));
        sim.add_execution(Box::new(PlayerExecution::new(red)));
        sim.tick();
        assert_eq!(sim.execution_count(), 2);

        sim.game_mut().conquer(blue, tile).unwrap();
        sim.tick();

        // The post was destroyed in the territory phase, so its execution
        // retired in the same tick
        assert_eq!(sim.game().unit_count(UnitKind::DefensePost), 0);
        assert_eq!(sim.execution_count(), 1);
    }

    #[test]
    fn test_identical_setups_hash_equal() {
        let build = || {
            let mut game = empty_game(0);
            let red = game.add_player("red", 500);
            for x in 0..4 {
                game.conquer(red, game.map().ref_at(x, 2)).unwrap();
            }
            let mut sim = Simulation::new(game);
            sim.add_execution(Box::new(PlayerExecution::new(red)));
            sim.run(50);
            sim.state_hash()
        };

        assert_eq!(build(), build());
    }
}
