//! DevView Environment Abstraction Layer
//!
//! This crate provides the clock abstraction that lets the playback loop run
//! against the **real** wall clock (tokio) or a **virtual** clock (tests and
//! offline rendering) without changing a line of loop code.
//!
//! # Core Concept
//!
//! The playback loop never calls `tokio::time` directly. Every wait between
//! ticks goes through [`PlaybackContext::sleep`], so a virtual clock can make
//! an hour of playback complete instantly and deterministically.
//!
//! # Example
//!
//! ```ignore
//! use devview_env::{PlaybackContext, TokioContext};
//!
//! async fn timer_loop<Ctx: PlaybackContext>(ctx: &Ctx) {
//!     loop {
//!         ctx.sleep(Duration::from_millis(1000)).await;
//!         tick();
//!     }
//! }
//! ```

mod context;
mod tokio_impl;

pub use context::PlaybackContext;
pub use tokio_impl::TokioContext;
