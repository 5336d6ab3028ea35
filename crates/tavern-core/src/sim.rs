//! Tavern Facade
//!
//! Owns the ECS world holding every tavern resource plus the per-tick
//! schedule. External callers (the headless runner, tests, a UI) drive time
//! and issue operations through this type; each operation borrows the same
//! [`TavernCtx`] the per-tick systems use.

use bevy_ecs::prelude::*;
use bevy_ecs::schedule::ExecutorKind;
use bevy_ecs::system::SystemState;
use tavern_events::{generate_snapshot_id, QuestSummary, SimTime, TavernEvent, TavernSnapshot};

use crate::clock::SimClock;
use crate::components::catalog::Catalog;
use crate::components::guest::{GuestState, NpcRegistry};
use crate::components::npc::{Npc, NpcId};
use crate::components::quest::{PostOutcome, Quest, QuestBoard, QuestId, QuestStatus, RequirementTable};
use crate::components::seating::{SeatRef, Seating};
use crate::components::tavern::{Pantry, TavernState};
use crate::config::TavernConfig;
use crate::error::TavernResult;
use crate::events::PendingEvents;
use crate::persistence::{new_save_id, SaveGame, SAVE_VERSION};
use crate::rng::SimRng;
use crate::scheduler::{EventScheduler, EventToken, ScheduledAction};
use crate::setup::{default_catalog, default_requirements, generate_roster};
use crate::systems::{self, ConsumptionResult, TavernCtx};

type TimeListener = Box<dyn FnMut(SimTime)>;
type DayListener = Box<dyn FnMut(u64)>;

/// One running tavern simulation.
pub struct Tavern {
    world: World,
    schedule: Schedule,
    ctx_state: SystemState<TavernCtx<'static>>,
    time_listeners: Vec<TimeListener>,
    day_listeners: Vec<DayListener>,
    summaries: u64,
}

impl Tavern {
    /// Builds an empty tavern (no NPCs) starting at `start`.
    ///
    /// The pantry starts with `economy.starting_stock` of every catalog item.
    pub fn new(
        config: TavernConfig,
        catalog: Catalog,
        requirements: RequirementTable,
        start: SimTime,
    ) -> Self {
        let mut world = World::new();

        let mut pantry = Pantry::new();
        for item in catalog.items() {
            pantry.add(&item.id, config.economy.starting_stock);
        }

        world.insert_resource(SimClock::new(start));
        world.insert_resource(SimRng::seeded(config.simulation.seed));
        world.insert_resource(EventScheduler::new());
        world.insert_resource(NpcRegistry::new());
        world.insert_resource(Seating::new(&config.capacity.tables));
        world.insert_resource(QuestBoard::new(config.capacity.quest_board_slots));
        world.insert_resource(TavernState::new(
            config.economy.starting_gold,
            config.economy.starting_renown,
        ));
        world.insert_resource(pantry);
        world.insert_resource(PendingEvents::new());
        world.insert_resource(catalog);
        world.insert_resource(requirements);
        world.insert_resource(config);

        let mut schedule = Schedule::default();
        schedule.set_executor_kind(ExecutorKind::SingleThreaded);
        schedule.add_systems(
            (
                systems::fire_scheduled_events,
                systems::apply_day_boundaries,
                systems::sweep_guests,
                systems::resolve_quests,
            )
                .chain(),
        );

        let ctx_state = SystemState::new(&mut world);

        Self {
            world,
            schedule,
            ctx_state,
            time_listeners: Vec::new(),
            day_listeners: Vec::new(),
            summaries: 0,
        }
    }

    /// Tavern with no content at all; useful for scenario setups.
    pub fn bare_at(config: TavernConfig, start: SimTime) -> Self {
        Self::new(config, Catalog::new(), RequirementTable::new(), start)
    }

    /// Tavern with the default menu, classes, requirement tables and a
    /// generated roster of `simulation.roster_size` NPCs, starting at day 0.
    pub fn with_default_content(config: TavernConfig) -> Self {
        let roster_size = config.simulation.roster_size;
        let mut tavern = Self::new(config, default_catalog(), default_requirements(), SimTime::ZERO);
        let roster = {
            let ctx = tavern.ctx();
            let TavernCtx { catalog, mut rng, .. } = ctx;
            generate_roster(&mut rng.0, &catalog, 1, roster_size)
        };
        for npc in roster {
            tavern.add_npc(npc);
        }
        tracing::info!("Tavern ready with {} NPCs", roster_size);
        tavern
    }

    /// Borrows every tavern resource at once.
    pub fn ctx(&mut self) -> TavernCtx<'_> {
        self.ctx_state.get_mut(&mut self.world)
    }

    // ---- time ----

    /// Advances exactly one simulated second and runs the per-tick pipeline.
    pub fn tick(&mut self) -> SimTime {
        let signal = self.world.resource_mut::<SimClock>().tick();
        self.schedule.run(&mut self.world);

        for listener in &mut self.time_listeners {
            listener(signal.now);
        }
        if let Some(day) = signal.new_day {
            for listener in &mut self.day_listeners {
                listener(day);
            }
        }
        signal.now
    }

    /// Feeds real elapsed time through the multiplier and ticks every
    /// simulated second that came due. Returns the number of ticks run.
    pub fn advance_clock(&mut self, real_seconds: f64) -> u64 {
        let due = self.world.resource_mut::<SimClock>().advance(real_seconds);
        for _ in 0..due {
            self.tick();
        }
        due
    }

    /// Ticks `seconds` simulated seconds regardless of the multiplier.
    pub fn run_for(&mut self, seconds: u64) {
        for _ in 0..seconds {
            self.tick();
        }
    }

    pub fn run_until(&mut self, until: SimTime) {
        while self.now() < until {
            self.tick();
        }
    }

    pub fn set_time_multiplier(&mut self, multiplier: f32) {
        self.world
            .resource_mut::<SimClock>()
            .set_multiplier(multiplier);
    }

    /// Registers a callback run after every tick with the new time.
    pub fn on_time_advanced(&mut self, listener: impl FnMut(SimTime) + 'static) {
        self.time_listeners.push(Box::new(listener));
    }

    /// Registers a callback run whenever a tick crosses midnight.
    pub fn on_new_day(&mut self, listener: impl FnMut(u64) + 'static) {
        self.day_listeners.push(Box::new(listener));
    }

    pub fn now(&self) -> SimTime {
        self.world.resource::<SimClock>().now()
    }

    // ---- read access ----

    pub fn clock(&self) -> &SimClock {
        self.world.resource::<SimClock>()
    }

    pub fn config(&self) -> &TavernConfig {
        self.world.resource::<TavernConfig>()
    }

    pub fn catalog(&self) -> &Catalog {
        self.world.resource::<Catalog>()
    }

    pub fn registry(&self) -> &NpcRegistry {
        self.world.resource::<NpcRegistry>()
    }

    pub fn seating(&self) -> &Seating {
        self.world.resource::<Seating>()
    }

    pub fn board(&self) -> &QuestBoard {
        self.world.resource::<QuestBoard>()
    }

    pub fn state(&self) -> &TavernState {
        self.world.resource::<TavernState>()
    }

    pub fn pantry(&self) -> &Pantry {
        self.world.resource::<Pantry>()
    }

    pub fn scheduler(&self) -> &EventScheduler {
        self.world.resource::<EventScheduler>()
    }

    /// Takes every event raised since the last drain.
    pub fn drain_events(&mut self) -> Vec<TavernEvent> {
        self.world.resource_mut::<PendingEvents>().drain()
    }

    // ---- operations ----

    /// Registers an NPC and plans their first visit.
    pub fn add_npc(&mut self, npc: Npc) -> NpcId {
        let id = npc.id;
        let mut ctx = self.ctx();
        ctx.registry.insert_npc(npc);
        if let Err(e) = systems::queue_guest(&mut ctx, id) {
            tracing::debug!("{} keeps the visit already planned: {}", id, e);
        }
        id
    }

    pub fn schedule_event(&mut self, at: SimTime, action: ScheduledAction) -> EventToken {
        self.world.resource_mut::<EventScheduler>().schedule(at, action)
    }

    pub fn cancel_event(&mut self, token: EventToken) -> bool {
        self.world.resource_mut::<EventScheduler>().cancel(token)
    }

    pub fn queue_guest(&mut self, npc: NpcId) -> TavernResult<()> {
        systems::queue_guest(&mut self.ctx(), npc)
    }

    pub fn admit_guest(&mut self, npc: NpcId) -> TavernResult<GuestState> {
        systems::admit_guest(&mut self.ctx(), npc)
    }

    pub fn remove_guest(&mut self, npc: NpcId, forced: bool) -> TavernResult<bool> {
        systems::remove_guest(&mut self.ctx(), npc, forced)
    }

    pub fn seat_guest(&mut self, npc: NpcId, seat: SeatRef) -> TavernResult<()> {
        systems::seat_guest(&mut self.ctx(), npc, seat)
    }

    pub fn unseat_guest(&mut self, npc: NpcId) -> TavernResult<()> {
        systems::unseat_guest(&mut self.ctx(), npc)
    }

    pub fn generate_quest(&mut self, level: u32) -> Quest {
        systems::generate_quest(&mut self.ctx(), level)
    }

    pub fn publish_quest(&mut self, quest: Quest) -> PostOutcome {
        systems::publish_quest(&mut self.ctx(), quest)
    }

    pub fn post_quest(&mut self, poster: NpcId) -> TavernResult<QuestId> {
        systems::post_quest(&mut self.ctx(), poster)
    }

    pub fn assign_to_quest(&mut self, quest: QuestId, npc: NpcId) -> TavernResult<()> {
        systems::assign_to_quest(&mut self.ctx(), quest, npc)
    }

    pub fn unassign_from_quest(&mut self, quest: QuestId, npc: NpcId) -> TavernResult<()> {
        systems::unassign_from_quest(&mut self.ctx(), quest, npc)
    }

    pub fn accept_quest(&mut self, quest: QuestId, party: &[NpcId]) -> TavernResult<SimTime> {
        systems::accept_quest(&mut self.ctx(), quest, party)
    }

    pub fn dismiss_quest(&mut self, quest: QuestId) -> TavernResult<()> {
        systems::dismiss_quest(&mut self.ctx(), quest)
    }

    pub fn retry_quest(&mut self, quest: QuestId) -> TavernResult<SimTime> {
        systems::retry_quest(&mut self.ctx(), quest)
    }

    pub fn serve_item(&mut self, npc: NpcId, item: &str, fast: bool) -> TavernResult<ConsumptionResult> {
        systems::serve_item(&mut self.ctx(), npc, item, fast)
    }

    pub fn restock(&mut self, item: &str, quantity: u32) -> TavernResult<i64> {
        systems::restock(&mut self.ctx(), item, quantity)
    }

    pub fn sell_item(&mut self, npc: NpcId, item: &str, asking: u32) -> TavernResult<()> {
        systems::sell_item(&mut self.ctx(), npc, item, asking)
    }

    // ---- persistence ----

    /// Captures the tavern for saving.
    pub fn snapshot(&self) -> SaveGame {
        let clock = self.clock();
        SaveGame {
            version: SAVE_VERSION,
            save_id: new_save_id(),
            now: clock.now(),
            multiplier: clock.multiplier(),
            registry: self.registry().clone(),
            seating: self.seating().clone(),
            board: self.board().clone(),
            tavern: self.state().clone(),
            pantry: self.pantry().clone(),
        }
    }

    /// Replaces the tavern state with a save.
    ///
    /// Scheduling is suspended while state is swapped, then rebuilt: every
    /// guest on the floor or seated gets its departure back at the saved
    /// `departs_at` (past-due ones fire on the next tick), and an open tavern
    /// gets an autosave request at the resume point.
    pub fn restore(&mut self, save: SaveGame) {
        {
            let mut scheduler = self.world.resource_mut::<EventScheduler>();
            scheduler.suspend();
            scheduler.clear();
        }

        self.world
            .resource_mut::<SimClock>()
            .restore(save.now, save.multiplier);
        self.world.insert_resource(save.registry);
        self.world.insert_resource(save.seating);
        self.world.insert_resource(save.board);
        self.world.insert_resource(save.tavern);
        self.world.insert_resource(save.pantry);

        let departures: Vec<(NpcId, SimTime)> = self
            .registry()
            .guests()
            .filter(|g| matches!(g.state, GuestState::TavernFloor | GuestState::Seats))
            .filter_map(|g| g.departs_at.map(|at| (g.npc, at)))
            .collect();
        let autosave = self.state().open && self.config().simulation.autosave;
        let now = self.now();

        let mut scheduler = self.world.resource_mut::<EventScheduler>();
        for (npc, at) in &departures {
            scheduler.schedule_departure(*npc, *at);
        }
        if autosave {
            scheduler.schedule(now, ScheduledAction::Autosave);
        }
        scheduler.resume();

        tracing::info!(
            "Restored {} at {} ({} departures rescheduled)",
            save.save_id,
            now,
            departures.len()
        );
    }

    /// Flat totals for reporting.
    pub fn summary(&mut self) -> TavernSnapshot {
        self.summaries += 1;
        let board = self.board();
        let mut quests = QuestSummary {
            backlog: board.backlog().count(),
            ..QuestSummary::default()
        };
        for quest in board.quests() {
            match quest.status {
                QuestStatus::Posted => quests.posted += 1,
                QuestStatus::Accepted => quests.in_progress += 1,
                QuestStatus::Resolved { failed: false } => quests.succeeded += 1,
                QuestStatus::Resolved { failed: true } => quests.failed += 1,
                QuestStatus::Unposted => {}
            }
        }

        let state = self.state();
        let seating = self.seating();
        let registry = self.registry();
        TavernSnapshot {
            snapshot_id: generate_snapshot_id(self.summaries),
            timestamp: self.now(),
            gold: state.gold,
            renown: state.renown,
            guests_by_state: registry.state_counts(),
            seats_taken: seating.occupied_seats(),
            seats_total: seating.total_seats(),
            quests,
            mean_loyalty: registry.mean_loyalty(),
        }
    }
}
