//! Telegram bindings and bootstrap for the artrash bot.

pub mod config;
pub mod dispatch;
pub mod logging;
pub mod state;
pub mod telegram;
