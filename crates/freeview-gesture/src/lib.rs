//! Gesture interpretation for inspecting a model by touch or mouse.
//!
//! Input is a stream of [`PointerEvent`]s; output is a sequence of
//! [`GestureOutput`] updates applied to a [`ModelPose`]. The crate has no
//! notion of markers, anchors or scenes: it is plain 2D input math.
//!
//! ```
//! use freeview_gesture::{GestureInterpreter, GestureParams, ModelPose, PointerEvent};
//!
//! let mut gestures = GestureInterpreter::new(GestureParams::default());
//! gestures.enable();
//!
//! let mut pose = ModelPose::default();
//! for ev in [PointerEvent::down(1, 10.0, 10.0), PointerEvent::moved(1, 30.0, 10.0)] {
//!     if let Some(out) = gestures.on_pointer(&ev, pose) {
//!         pose.apply(out);
//!     }
//! }
//! assert_eq!(pose.yaw, 10.0);
//! ```

mod interpreter;
mod params;
mod pointer;
mod pose;

pub use interpreter::GestureInterpreter;
pub use params::GestureParams;
pub use pointer::{PointerEvent, PointerPhase};
pub use pose::{GestureOutput, ModelPose};
