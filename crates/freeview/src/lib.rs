//! High-level facade crate for the `freeview-*` workspace.
//!
//! A printed marker identifies one of a few crystal structures. When the
//! marker tracker finds it, the structure's model is lifted off the marker
//! and anchored in front of the viewer, where it stays (and can be rotated
//! and zoomed) after the marker leaves the camera view.
//!
//! ## Quickstart
//!
//! ```
//! use freeview::core::{Scene, Structure};
//! use freeview::session::{layout, NullUi, SessionCoordinator, ViewerConfig};
//! use freeview::gesture::PointerEvent;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (mut scene, nodes) = layout::default_scene()?;
//! let mut viewer = SessionCoordinator::new(ViewerConfig::default(), NullUi);
//!
//! viewer.on_marker_found(&mut scene, Structure::Fcc);
//! viewer.on_pointer(&mut scene, &PointerEvent::down(1, 0.0, 0.0));
//! viewer.on_pointer(&mut scene, &PointerEvent::moved(1, 60.0, 0.0));
//! viewer.on_marker_lost(&mut scene, Structure::Fcc);
//! viewer.on_frame(&mut scene, 1.0 / 60.0);
//!
//! assert_eq!(scene.parent(nodes[1].atom), scene.viewer_frame());
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `freeview::core`: scene interface, in-memory scene graph, structures.
//! - `freeview::gesture`: pointer input to rotation and zoom.
//! - `freeview::anchor`: anchor controller and visibility enforcer.
//! - `freeview::session`: tracking state machine and session coordinator.
//! - `freeview::scenario`: JSON scenario replay used by the CLI.

pub use freeview_anchor as anchor;
pub use freeview_core as core;
pub use freeview_gesture as gesture;
pub use freeview_session as session;

pub use freeview_anchor::{AnchorController, AnchorError, AnchorParams};
pub use freeview_core::{DisplayMode, Scene, SceneGraph, Structure};
pub use freeview_session::{DebugSnapshot, SessionCoordinator, UiSink, ViewerConfig};

pub mod scenario;
