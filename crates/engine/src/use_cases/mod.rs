//! Use cases - User story orchestration.
//!
//! Each module contains use cases for a specific area. Use cases orchestrate
//! ports and domain types to fulfil one user story each.

pub mod dice;
pub mod dungeon_master;
pub mod settings;

pub use dice::DiceUseCases;
pub use dungeon_master::DungeonMasterUseCases;
pub use settings::SettingsUseCases;
