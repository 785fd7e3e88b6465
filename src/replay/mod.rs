//! Host stand-in: drafts, scripted replays and random soak walks

pub mod draft;
pub mod script;
pub mod walk;

pub use draft::CharacterDraft;
pub use script::{replay, Action, ReplayReport, ReplayScript, Step, StepOutcome, StepRecord};
pub use walk::{random_walk, soak, step_pool, SoakFailure, SoakReport};
