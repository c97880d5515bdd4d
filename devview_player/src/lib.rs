//! DevView Playback Runner
//!
//! Ties a [`devview_core::RenderCycle`] to a clock and a set of display
//! sinks:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                   PlaybackRunner                     │
//! │   ctx.sleep(period) ──► cycle.tick() ──► sinks       │
//! │          ▲                                  │        │
//! │          └──────────── next tick ◄──────────┘        │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! The clock is a [`devview_env::PlaybackContext`]: `TokioContext` for real
//! playback, [`VirtualContext`] for tests and offline export.
//!
//! # Usage
//!
//! ```ignore
//! use devview_core::{LogSink, PlaybackConfig, RenderCycle, SqliteStore};
//! use devview_env::TokioContext;
//! use devview_player::PlaybackRunner;
//!
//! let config = PlaybackConfig::default();
//! let store = SqliteStore::open_read_only("database.sqlite")?;
//! let cycle = RenderCycle::new(store, &config)?;
//!
//! let mut runner = PlaybackRunner::new(TokioContext::shared(), cycle, config.period)
//!     .with_sink(LogSink);
//! runner.run().await?;
//! ```

mod context;
mod runner;

pub use context::VirtualContext;
pub use runner::{PlaybackRunner, PlaybackSummary};
