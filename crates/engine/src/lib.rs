//! MythicBot Engine library.
//!
//! Runs the Dungeon Master for a solo role-playing game: classifies player
//! actions, asks for dice rolls, narrates outcomes through a language model
//! and falls back to an offline narrator whenever the model is unavailable.
//!
//! ## Structure
//!
//! - `use_cases/` - Turn orchestration, settings and dice
//! - `infrastructure/` - External dependency implementations (ports + adapters)
//! - `api/` - HTTP entry points
//! - `app` - Application composition

pub mod api;
pub mod app;
pub mod infrastructure;
pub mod use_cases;

pub use app::App;
