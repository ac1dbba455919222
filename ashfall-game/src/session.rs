//! Composition root: one instance of every controller plus the plumbing that
//! turns inbound commands into settled state and published notifications.
//!
//! Every command follows the same shape: run against the controllers while
//! events pile up in the outbox, resolve follow-on transitions (forced
//! recovery, defeat inside a battle), then publish the batch.
use serde::{Deserialize, Serialize};

use crate::camp::{Camp, RestKind, RestOutcome};
use crate::combat::{
    Battle, BattleDescriptor, BattleInfo, BattleResult, CombatAction, CombatEngine, TurnReport,
};
use crate::config::BalanceConfig;
use crate::data::{EncounterData, EnemyCatalog};
use crate::effects::{Attribute, AttributeDeltas, EffectChange, StatusEffectRegistry, StatusKind};
use crate::encounters::{DispatchOutcome, EncounterContext, EncounterDispatcher, GridCoord};
use crate::error::CommandError;
use crate::events::{EventBus, GameEvent, Outbox, Subscriber, SubscriberId};
use crate::rng::RngBundle;
use crate::scheduler::{Segment, TimeScheduler, TimeSnapshot};
use crate::timers::{TimerKind, TimerQueue};
use crate::vitals::{ItemEffect, ItemOutcome, VitalsController, VitalsSnapshot};

/// Inventory collaborator. The session only reads from it.
pub trait InventoryLink {
    fn carried_weight(&self) -> f32;

    fn has_crafting_materials(&self) -> bool;

    /// Summed bonuses from equipped gear.
    fn equipment_bonus(&self) -> AttributeDeltas {
        AttributeDeltas::NONE
    }
}

pub const SAVE_VERSION: u32 = 1;

/// Scalar state handed to [`crate::GameStorage`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveSnapshot {
    #[serde(default = "save_version")]
    pub version: u32,
    pub seed: u64,
    pub vitals: VitalsSnapshot,
    pub time: TimeSnapshot,
    #[serde(default)]
    pub triggered_encounters: Vec<GridCoord>,
}

const fn save_version() -> u32 {
    SAVE_VERSION
}

pub struct SurvivalSession {
    config: BalanceConfig,
    vitals: VitalsController,
    scheduler: TimeScheduler,
    combat: CombatEngine,
    encounters: EncounterDispatcher,
    timers: TimerQueue,
    rng: RngBundle,
    inventory: Option<Box<dyn InventoryLink>>,
    inventory_warned: bool,
    bus: EventBus,
    outbox: Outbox,
    last_events: Vec<GameEvent>,
}

impl SurvivalSession {
    #[must_use]
    pub fn new(config: BalanceConfig, encounters: EncounterDispatcher, seed: u64) -> Self {
        let vitals = VitalsController::new(&config.vitals, &config.effects);
        let scheduler = TimeScheduler::new(&config.time, vitals.weight_ratio());
        let combat = CombatEngine::new(&config.combat);
        log::debug!("session seeded with {seed}");
        Self {
            vitals,
            scheduler,
            combat,
            encounters,
            timers: TimerQueue::new(),
            rng: RngBundle::from_user_seed(seed),
            inventory: None,
            inventory_warned: false,
            bus: EventBus::new(),
            outbox: Outbox::new(),
            last_events: Vec::new(),
            config,
        }
    }

    /// Session over the bundled balance, enemy and encounter data.
    #[must_use]
    pub fn with_bundled_data(seed: u64) -> Self {
        let config = BalanceConfig::load_from_static();
        let encounters = Self::encounters_from(&EncounterData::load_from_static(), &config);
        Self::new(config, encounters, seed)
    }

    /// Resolve an encounter table, degrading to an empty grid when it is
    /// inconsistent.
    #[must_use]
    pub fn encounters_from(data: &EncounterData, config: &BalanceConfig) -> EncounterDispatcher {
        EncounterDispatcher::from_data(data, &EnemyCatalog::load_from_static(), &config.encounters)
            .unwrap_or_else(|err| {
                log::warn!("encounter table rejected, continuing without encounters: {err}");
                EncounterDispatcher::empty(&config.encounters)
            })
    }

    // Wiring --------------------------------------------------------------

    pub fn set_inventory(&mut self, inventory: Box<dyn InventoryLink>) {
        self.inventory = Some(inventory);
        self.inventory_warned = false;
        self.sync_inventory();
    }

    pub fn clear_inventory(&mut self) -> Option<Box<dyn InventoryLink>> {
        self.inventory.take()
    }

    pub fn subscribe(&mut self, subscriber: Box<dyn Subscriber>) -> SubscriberId {
        self.bus.subscribe(subscriber)
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        self.bus.unsubscribe(id)
    }

    // Queries -------------------------------------------------------------

    #[must_use]
    pub const fn config(&self) -> &BalanceConfig {
        &self.config
    }

    #[must_use]
    pub const fn vitals(&self) -> &VitalsController {
        &self.vitals
    }

    #[must_use]
    pub const fn scheduler(&self) -> &TimeScheduler {
        &self.scheduler
    }

    #[must_use]
    pub const fn combat(&self) -> &CombatEngine {
        &self.combat
    }

    #[must_use]
    pub const fn encounters(&self) -> &EncounterDispatcher {
        &self.encounters
    }

    #[must_use]
    pub const fn rng(&self) -> &RngBundle {
        &self.rng
    }

    #[must_use]
    pub fn effective(&self, attribute: Attribute) -> i32 {
        self.vitals.effective(attribute)
    }

    #[must_use]
    pub const fn health(&self) -> i32 {
        self.vitals.health()
    }

    #[must_use]
    pub const fn hunger(&self) -> f32 {
        self.vitals.hunger()
    }

    #[must_use]
    pub const fn energy(&self) -> f32 {
        self.vitals.energy()
    }

    #[must_use]
    pub const fn radiation(&self) -> f32 {
        self.vitals.radiation()
    }

    #[must_use]
    pub const fn active_effects(&self) -> &StatusEffectRegistry {
        self.vitals.effects()
    }

    #[must_use]
    pub const fn segment(&self) -> Segment {
        self.scheduler.segment()
    }

    #[must_use]
    pub const fn day(&self) -> u32 {
        self.scheduler.day()
    }

    #[must_use]
    pub const fn moves_remaining(&self) -> u8 {
        self.scheduler.moves_remaining()
    }

    #[must_use]
    pub const fn moves_max(&self) -> u8 {
        self.scheduler.moves_max()
    }

    #[must_use]
    pub const fn is_in_combat(&self) -> bool {
        self.combat.is_in_combat()
    }

    #[must_use]
    pub const fn current_battle(&self) -> Option<&Battle> {
        self.combat.current_battle()
    }

    #[must_use]
    pub fn battle_info(&self) -> Option<BattleInfo> {
        self.combat.battle_info()
    }

    #[must_use]
    pub const fn is_defeated(&self) -> bool {
        self.vitals.is_defeated()
    }

    #[must_use]
    pub fn rest_in_progress(&self) -> bool {
        self.timers.is_pending(TimerKind::RestPanelClose)
    }

    #[must_use]
    pub fn combat_panel_open(&self) -> bool {
        self.timers.is_pending(TimerKind::CombatPanelClose)
    }

    /// The batch delivered by the most recent command or tick.
    #[must_use]
    pub fn last_events(&self) -> &[GameEvent] {
        &self.last_events
    }

    // Commands ------------------------------------------------------------

    /// Apply a consumed item's payload.
    ///
    /// # Errors
    ///
    /// Rejected once defeated or when the payload targets a derived status.
    pub fn apply_item_effect(&mut self, item: &ItemEffect) -> Result<ItemOutcome, CommandError> {
        self.command(|s| {
            s.ensure_alive()?;
            s.vitals
                .apply_item_effect(item, s.rng.items(), &mut s.outbox)
        })
    }

    /// Grant an externally caused injury or boost.
    ///
    /// # Errors
    ///
    /// Rejected for threshold-derived kinds or once defeated.
    pub fn grant_status(
        &mut self,
        kind: StatusKind,
        deltas: Option<AttributeDeltas>,
        duration_secs: Option<f32>,
    ) -> Result<EffectChange, CommandError> {
        self.command(|s| {
            s.ensure_alive()?;
            s.vitals
                .grant_status(kind, deltas, duration_secs, &mut s.outbox)
        })
    }

    /// # Errors
    ///
    /// [`CommandError::NotCurable`] for threshold-derived kinds.
    pub fn cure(&mut self, kind: StatusKind) -> Result<bool, CommandError> {
        self.command(|s| s.vitals.cure(kind, &mut s.outbox))
    }

    /// Spend one move from the segment budget.
    ///
    /// # Errors
    ///
    /// Rejected during battle, while paused, with an empty budget or once
    /// defeated.
    pub fn request_move(&mut self) -> Result<u8, CommandError> {
        self.command(|s| {
            s.ensure_alive()?;
            s.ensure_out_of_combat()?;
            s.sync_inventory_inner();
            s.scheduler
                .consume_move(&mut s.vitals, &mut s.timers, &mut s.outbox)
        })
    }

    /// Step onto `coord`: spend a move, then fire whatever waits there.
    ///
    /// # Errors
    ///
    /// Same as [`Self::request_move`]; the encounter is not touched when the
    /// move is refused.
    pub fn travel_to(&mut self, coord: GridCoord) -> Result<DispatchOutcome, CommandError> {
        self.command(|s| {
            s.ensure_alive()?;
            s.ensure_out_of_combat()?;
            s.sync_inventory_inner();
            s.scheduler
                .consume_move(&mut s.vitals, &mut s.timers, &mut s.outbox)?;
            s.dispatch(coord)
        })
    }

    /// # Errors
    ///
    /// Rejected during battle, during another rest, for insufficient
    /// resources or missing materials, or once defeated.
    pub fn request_rest(&mut self, kind: RestKind) -> Result<RestOutcome, CommandError> {
        self.command(|s| {
            s.ensure_alive()?;
            s.ensure_out_of_combat()?;
            s.sync_inventory_inner();
            let has_materials = s.inventory.as_ref().map(|inv| inv.has_crafting_materials());
            if has_materials.is_none() && kind == RestKind::Craft {
                s.warn_missing_inventory();
            }
            let mut camp = Camp {
                config: &s.config.rest,
                scheduler: &mut s.scheduler,
                vitals: &mut s.vitals,
                timers: &mut s.timers,
                has_materials,
            };
            camp.rest(kind, &mut s.outbox)
        })
    }

    /// # Errors
    ///
    /// [`CommandError::BattleInProgress`] during battle, or once defeated.
    pub fn trigger_encounter(&mut self, coord: GridCoord) -> Result<DispatchOutcome, CommandError> {
        self.command(|s| {
            s.ensure_alive()?;
            s.dispatch(coord)
        })
    }

    /// Start a battle outside the encounter grid.
    ///
    /// # Errors
    ///
    /// [`CommandError::BattleInProgress`] leaves the running battle as is.
    pub fn start_battle(&mut self, descriptor: BattleDescriptor) -> Result<(), CommandError> {
        self.command(|s| {
            s.ensure_alive()?;
            s.combat.start(descriptor, &mut s.outbox)?;
            s.scheduler.consume_combat(&mut s.vitals, &mut s.outbox);
            Ok(())
        })
    }

    /// # Errors
    ///
    /// [`CommandError::NoActiveBattle`] or [`CommandError::MeleeUnavailable`].
    pub fn submit_combat_action(&mut self, action: CombatAction) -> Result<TurnReport, CommandError> {
        self.command(|s| {
            s.combat.act(
                action,
                &mut s.vitals,
                s.rng.combat(),
                &mut s.timers,
                &mut s.outbox,
            )
        })
    }

    /// End the active battle as an escape.
    ///
    /// # Errors
    ///
    /// [`CommandError::NoActiveBattle`] when nothing is running.
    pub fn cancel_battle(&mut self) -> Result<BattleResult, CommandError> {
        self.command(|s| {
            s.combat
                .force_end(BattleResult::Escaped, &mut s.timers, &mut s.outbox)
        })
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.scheduler.set_paused(paused);
        self.settle_and_publish();
    }

    /// Pull weight, materials and equipment from the inventory collaborator.
    pub fn sync_inventory(&mut self) {
        self.sync_inventory_inner();
        self.settle_and_publish();
    }

    /// Frame-driver entry point.
    pub fn tick(&mut self, delta_secs: f32) {
        self.vitals.tick(delta_secs, &mut self.outbox);
        self.scheduler.tick(delta_secs, &self.vitals, &mut self.outbox);
        for timer in self.timers.advance(delta_secs) {
            match timer {
                TimerKind::AutoAdvanceSegment => {
                    self.scheduler.on_auto_advance(&self.vitals, &mut self.outbox);
                }
                TimerKind::RestPanelClose => self.outbox.push(GameEvent::RestPanelClosed),
                TimerKind::CombatPanelClose => self.outbox.push(GameEvent::CombatPanelClosed),
            }
        }
        self.settle_and_publish();
    }

    // Persistence ---------------------------------------------------------

    #[must_use]
    pub fn snapshot(&self) -> SaveSnapshot {
        SaveSnapshot {
            version: SAVE_VERSION,
            seed: self.rng.seed(),
            vitals: self.vitals.snapshot(),
            time: self.scheduler.snapshot(),
            triggered_encounters: self.encounters.triggered(),
        }
    }

    /// Load persisted scalars. Any running battle is abandoned without a
    /// result; pending timers are dropped.
    pub fn restore(&mut self, snapshot: &SaveSnapshot) {
        self.combat = CombatEngine::new(&self.config.combat);
        self.timers = TimerQueue::new();
        self.rng = RngBundle::from_user_seed(snapshot.seed);
        self.vitals.restore(&snapshot.vitals, &mut self.outbox);
        self.sync_inventory_inner();
        self.scheduler
            .restore(&snapshot.time, self.vitals.weight_ratio(), &mut self.outbox);
        self.encounters
            .restore_triggered(&snapshot.triggered_encounters);
        self.settle_and_publish();
    }

    // Internals -----------------------------------------------------------

    fn command<T>(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<T, CommandError>,
    ) -> Result<T, CommandError> {
        let result = body(self);
        if let Err(error) = &result {
            log::warn!("command rejected: {error}");
            self.outbox.push(GameEvent::Rejected { error: *error });
        }
        self.settle_and_publish();
        result
    }

    fn ensure_alive(&self) -> Result<(), CommandError> {
        if self.vitals.is_defeated() {
            Err(CommandError::PlayerDefeated)
        } else {
            Ok(())
        }
    }

    fn ensure_out_of_combat(&self) -> Result<(), CommandError> {
        if self.combat.is_in_combat() {
            Err(CommandError::BattleInProgress)
        } else {
            Ok(())
        }
    }

    fn dispatch(&mut self, coord: GridCoord) -> Result<DispatchOutcome, CommandError> {
        let mut ctx = EncounterContext {
            vitals: &mut self.vitals,
            scheduler: &self.scheduler,
            combat: &mut self.combat,
            rng: self.rng.encounter(),
        };
        self.encounters.dispatch(coord, &mut ctx, &mut self.outbox)
    }

    fn sync_inventory_inner(&mut self) {
        let Some(inventory) = self.inventory.as_ref() else {
            self.warn_missing_inventory();
            return;
        };
        let weight = inventory.carried_weight();
        let equipment = inventory.equipment_bonus();
        self.vitals.set_equipment_bonus(equipment, &mut self.outbox);
        if self.vitals.set_carried_weight(weight) {
            self.scheduler
                .sync_weight(self.vitals.weight_ratio(), &mut self.outbox);
        }
    }

    fn warn_missing_inventory(&mut self) {
        if !self.inventory_warned {
            self.inventory_warned = true;
            log::warn!("no inventory linked; treating the pack as empty");
        }
    }

    /// Resolve follow-on transitions, then publish the settled batch.
    fn settle_and_publish(&mut self) {
        // Recovery waits until any battle is over; defeat drops it.
        if !self.combat.is_in_combat()
            && self.vitals.take_forced_recovery()
            && !self.vitals.is_defeated()
        {
            self.scheduler
                .force_recovery(&mut self.vitals, &mut self.timers, &mut self.outbox);
        }
        if self.combat.is_in_combat() {
            self.combat
                .check_battle_end(&self.vitals, &mut self.timers, &mut self.outbox);
        }
        let batch = self.outbox.drain();
        if !batch.is_empty() {
            self.bus.publish(&batch);
        }
        self.last_events = batch;
    }
}

impl std::fmt::Debug for SurvivalSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurvivalSession")
            .field("vitals", &self.vitals)
            .field("scheduler", &self.scheduler)
            .field("combat", &self.combat)
            .field("inventory_linked", &self.inventory.is_some())
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}
