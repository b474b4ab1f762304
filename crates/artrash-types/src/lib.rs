//! Shared types for the artrash feedback bot.

mod classify;
mod event;
mod prediction;

pub use classify::*;
pub use event::*;
pub use prediction::*;
