//! Lucent Animation System
//!
//! Time-based building blocks for the glass lens motion:
//!
//! - **Easing**: cubic and back-eased curves
//! - **Curves**: jelly deformation, wobble, alpha envelopes and frame-rate
//!   independent follow
//! - **Ticker**: a single cancellable periodic subscription to the host's
//!   frame clock
//! - **Tasks**: deferred one-shot work guarded by generation tokens
//!
//! All functions take time explicitly (`now` in seconds) so motion can be
//! driven by a real display link or stepped deterministically in tests.

pub mod curves;
pub mod easing;
pub mod tasks;
pub mod ticker;

pub use curves::{Deformation, SettleCurve, Wobble};
pub use easing::{ease_out_back, Easing};
pub use tasks::{Deferred, TaskId, TaskQueue};
pub use ticker::{DisplayLink, FrameTicker, ManualLink, SubscriptionId};
