//! Anchoring of marker-tracked scene nodes to the viewer.
//!
//! [`AnchorController`] takes a node that follows a printed marker and
//! re-parents it under the viewer frame at the measured (clamped) distance,
//! so it stays in view after the marker is gone. While anchored, a
//! [`VisibilityEnforcer`] keeps undoing whatever the marker tracker does to
//! the node, and pointer input is routed through a
//! [`freeview_gesture::GestureInterpreter`].

mod binding;
mod controller;
mod enforcer;
mod error;
mod params;

pub use binding::{anchor_offset, AnchorBinding, AnchorRequest, AnchorState};
pub use controller::AnchorController;
pub use enforcer::{EnforcementReport, EnforcementTarget, EnforcerParams, VisibilityEnforcer};
pub use error::AnchorError;
pub use params::AnchorParams;
