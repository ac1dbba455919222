//! Ashfall Game Engine
//!
//! Platform-agnostic survival rules for the Ashfall wasteland game: vitals and
//! status effects, day segments with a move budget, rest actions, dice-driven
//! battles and grid encounters. No UI, storage or inventory implementation
//! lives here; those are collaborators supplied by the host.

pub mod camp;
pub mod combat;
pub mod config;
pub mod constants;
pub mod data;
pub mod effects;
pub mod encounters;
pub mod error;
pub mod events;
pub mod numbers;
pub mod rng;
pub mod scheduler;
pub mod session;
pub mod timers;
pub mod vitals;

// Re-export commonly used types
pub use camp::{Camp, RestKind, RestOutcome};
pub use combat::{
    Battle, BattleDescriptor, BattleInfo, BattleResult, CombatAction, CombatEngine, Dice, Enemy,
    ScriptedDice, TurnReport,
};
pub use config::{BalanceConfig, ConfigError};
pub use data::{EncounterData, EncounterRecord, EnemyCatalog, EnemyRecord, EnemySpec};
pub use effects::{
    Attribute, AttributeDeltas, EffectChange, EffectDuration, StatusEffect, StatusEffectRegistry,
    StatusKind, ThresholdFamily,
};
pub use encounters::{
    DispatchOutcome, EncounterCategory, EncounterDescriptor, EncounterDispatcher, EncounterKind,
    EncounterTableError, GridCoord,
};
pub use error::CommandError;
pub use events::{EventBus, EventSeverity, GameEvent, Subscriber, SubscriberId, UiSurfaceHint};
pub use rng::{CountingRng, RngBundle};
pub use scheduler::{Segment, TimeScheduler, TimeSnapshot};
pub use session::{InventoryLink, SaveSnapshot, SurvivalSession};
pub use timers::{TimerKind, TimerQueue};
pub use vitals::{ItemEffect, ItemOutcome, StatusGrant, Vital, VitalsController, VitalsSnapshot};

/// Trait for abstracting data loading operations
/// Platform-specific implementations should provide this
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the encounter grid from the platform-specific source
    ///
    /// # Errors
    ///
    /// Returns an error if the encounter data cannot be loaded.
    fn load_encounter_data(&self) -> Result<EncounterData, Self::Error>;

    /// Load configuration data for a specific system
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or parsed.
    fn load_config<T>(&self, config_name: &str) -> Result<T, Self::Error>
    where
        T: serde::de::DeserializeOwned;
}

/// Trait for abstracting save/load operations
/// Platform-specific implementations should provide this
pub trait GameStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist a session snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be saved.
    fn save_game(&self, save_name: &str, snapshot: &SaveSnapshot) -> Result<(), Self::Error>;

    /// Load a session snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be loaded.
    fn load_game(&self, save_name: &str) -> Result<Option<SaveSnapshot>, Self::Error>;

    /// Delete saved game
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    fn delete_save(&self, save_name: &str) -> Result<(), Self::Error>;
}

/// Name passed to [`DataLoader::load_config`] for the balance document.
pub const BALANCE_CONFIG_NAME: &str = "balance";

/// Main game engine for managing sessions
pub struct GameEngine<L, S>
where
    L: DataLoader,
    S: GameStorage,
{
    data_loader: L,
    storage: S,
}

impl<L, S> GameEngine<L, S>
where
    L: DataLoader,
    S: GameStorage,
{
    /// Create a new game engine with the provided data loader and storage
    pub const fn new(data_loader: L, storage: S) -> Self {
        Self {
            data_loader,
            storage,
        }
    }

    /// Construct a fresh session from loaded balance and encounter data.
    /// A balance document that fails validation falls back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the loader cannot produce either document.
    pub fn create_session(&self, seed: u64) -> Result<SurvivalSession, L::Error> {
        let config: BalanceConfig = self.data_loader.load_config(BALANCE_CONFIG_NAME)?;
        let config = match config.validate() {
            Ok(()) => config,
            Err(err) => {
                log::warn!("balance config rejected, using defaults: {err}");
                BalanceConfig::default()
            }
        };
        let data = self.data_loader.load_encounter_data()?;
        let encounters = SurvivalSession::encounters_from(&data, &config);
        Ok(SurvivalSession::new(config, encounters, seed))
    }

    /// Save a session
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be saved.
    pub fn save_game(&self, save_name: &str, session: &SurvivalSession) -> Result<(), S::Error> {
        self.storage.save_game(save_name, &session.snapshot())
    }

    /// Load a session
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be loaded or rehydrated.
    pub fn load_game(&self, save_name: &str) -> Result<Option<SurvivalSession>, anyhow::Error>
    where
        L::Error: Into<anyhow::Error>,
        S::Error: Into<anyhow::Error>,
    {
        let Some(snapshot) = self.storage.load_game(save_name).map_err(Into::into)? else {
            return Ok(None);
        };
        if snapshot.version > session::SAVE_VERSION {
            anyhow::bail!(
                "save '{save_name}' has version {} but this build reads up to {}",
                snapshot.version,
                session::SAVE_VERSION
            );
        }
        // Rehydrate with fresh data
        let mut session = self.create_session(snapshot.seed).map_err(Into::into)?;
        session.restore(&snapshot);
        Ok(Some(session))
    }

    /// Delete a saved session
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    pub fn delete_save(&self, save_name: &str) -> Result<(), S::Error> {
        self.storage.delete_save(save_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::de::DeserializeOwned;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::convert::Infallible;
    use std::rc::Rc;

    #[derive(Clone, Copy, Default)]
    struct FixtureLoader;

    impl DataLoader for FixtureLoader {
        type Error = Infallible;

        fn load_encounter_data(&self) -> Result<EncounterData, Self::Error> {
            Ok(EncounterData::load_from_static())
        }

        fn load_config<T>(&self, _config_name: &str) -> Result<T, Self::Error>
        where
            T: DeserializeOwned,
        {
            let parsed = serde_json::from_str("{}")
                .or_else(|_| serde_json::from_str("null"))
                .unwrap();
            Ok(parsed)
        }
    }

    #[derive(Clone, Default)]
    struct MemoryStorage {
        saves: Rc<RefCell<HashMap<String, SaveSnapshot>>>,
    }

    impl GameStorage for MemoryStorage {
        type Error = Infallible;

        fn save_game(&self, save_name: &str, snapshot: &SaveSnapshot) -> Result<(), Self::Error> {
            self.saves
                .borrow_mut()
                .insert(save_name.to_string(), snapshot.clone());
            Ok(())
        }

        fn load_game(&self, save_name: &str) -> Result<Option<SaveSnapshot>, Self::Error> {
            Ok(self.saves.borrow().get(save_name).cloned())
        }

        fn delete_save(&self, save_name: &str) -> Result<(), Self::Error> {
            self.saves.borrow_mut().remove(save_name);
            Ok(())
        }
    }

    #[test]
    fn engine_creates_and_roundtrips_session() {
        let engine = GameEngine::new(FixtureLoader, MemoryStorage::default());
        let mut session = engine.create_session(0xABCD).unwrap();
        session.request_move().unwrap();
        session.request_move().unwrap();
        session.trigger_encounter(GridCoord::new(2, 1)).unwrap();
        engine.save_game("slot-one", &session).unwrap();

        let loaded = engine.load_game("slot-one").unwrap().expect("save exists");
        assert_eq!(loaded.snapshot(), session.snapshot());
        assert_eq!(loaded.moves_remaining(), 2);
        assert!(loaded.encounters().peek(GridCoord::new(2, 1)).is_none());
        assert!(engine.load_game("missing-slot").unwrap().is_none());

        engine.delete_save("slot-one").unwrap();
        assert!(engine.load_game("slot-one").unwrap().is_none());
    }

    #[test]
    fn empty_config_document_yields_defaults() {
        let engine = GameEngine::new(FixtureLoader, MemoryStorage::default());
        let session = engine.create_session(7).unwrap();
        assert_eq!(session.config(), &BalanceConfig::default());
        assert_eq!(session.health(), 100);
        assert_eq!(session.day(), 1);
    }

    #[test]
    fn newer_save_versions_are_refused() {
        let engine = GameEngine::new(FixtureLoader, MemoryStorage::default());
        let session = engine.create_session(1).unwrap();
        let mut snapshot = session.snapshot();
        snapshot.version = session::SAVE_VERSION + 1;
        engine.storage.save_game("future", &snapshot).unwrap();
        assert!(engine.load_game("future").is_err());
    }
}
