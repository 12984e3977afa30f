//! Lucent Core
//!
//! Shared primitives for the lucent glass lens:
//!
//! - **Geometry**: points, sizes, rects and edge insets in a stable outer
//!   coordinate space, with pixel snapping and centre scaling
//! - **Events**: pointer samples and gesture phases forwarded by the host
//!
//! # Example
//!
//! ```rust
//! use lucent_core::{EdgeInsets, Rect};
//!
//! let a = Rect::new(0.0, 0.0, 100.0, 50.0);
//! let b = Rect::new(150.0, 0.0, 100.0, 50.0);
//! let corridor = a.union(&b).outset_by(EdgeInsets::uniform(8.0));
//! assert_eq!(corridor, Rect::new(-8.0, -8.0, 266.0, 66.0));
//! ```

pub mod events;
pub mod geometry;

pub use events::{GesturePhase, PanEvent, PointerSample, PressEvent};
pub use geometry::{floor_to_pixels, snap_to_pixels, EdgeInsets, Point, Rect, Size};
