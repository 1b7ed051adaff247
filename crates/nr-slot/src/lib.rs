//! # nr-slot: Spin Resolution and Payout Engine for Neon Reels
//!
//! Generates reel strips by weighted selection, samples the visible grid,
//! evaluates paylines and grid-wide scatter/bonus counts, and settles payouts
//! with win multipliers, free spins and a progressive jackpot. Presentation
//! (rendering, audio, notifications) stays outside, behind traits.
//!
//! ## Features
//!
//! - **Weighted Reels**: Strips sampled by selection weight, zero weights never land
//! - **Win Evaluation**: Left-to-right paylines with Wild substitution, scatter pays
//! - **Features**: Win multiplier bonus, free spins with retrigger, jackpot pool
//! - **State Machine**: Idle → Spinning → Evaluating → Settling, one spin in flight
//! - **Chaining**: Auto-spin and free spins queued on a virtual clock, never recursive
//! - **Config Files**: JSON and YAML game definitions with validation
//!
//! ## Architecture
//!
//! ```text
//! SlotMachine
//!     │
//!     ├── GameConfig (grid, symbols, paylines, bets, features, timing)
//!     ├── ReelStrip × reels ──sample_grid──▶ Grid
//!     ├── PayTable::evaluate(Grid, bet) ──▶ SpinOutcome
//!     ├── FeatureController::settle ──▶ Settlement
//!     └── SpinScheduler (next auto / free spin)
//!           │
//!           v
//!     SpinReport + Renderer / AudioPlayer / Notifier calls
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod features;
pub mod grid;
pub mod machine;
pub mod parser;
pub mod paytable;
pub mod reels;
pub mod scheduler;
pub mod state;
pub mod stats;
pub mod symbols;
pub mod timing;

pub use config::*;
pub use error::*;
pub use events::*;
pub use features::*;
pub use grid::*;
pub use machine::*;
pub use parser::*;
pub use paytable::*;
pub use reels::*;
pub use scheduler::*;
pub use state::*;
pub use stats::*;
pub use symbols::*;
pub use timing::*;
