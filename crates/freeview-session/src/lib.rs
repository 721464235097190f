//! Session layer of the marker-anchored viewer.
//!
//! [`SessionCoordinator`] receives marker found/lost signals, pointer input
//! and frame ticks from the host. It keeps exactly one structure active at a
//! time, anchors that structure's model in front of the viewer, and reports
//! progress to a [`UiSink`].
//!
//! ```
//! use freeview_core::Structure;
//! use freeview_session::{layout, RecordingUi, SessionCoordinator, ViewerConfig};
//!
//! let (mut scene, _) = layout::default_scene()?;
//! let mut viewer = SessionCoordinator::new(ViewerConfig::default(), RecordingUi::new());
//!
//! viewer.on_marker_found(&mut scene, Structure::Bcc);
//! viewer.on_marker_lost(&mut scene, Structure::Bcc);
//!
//! let snap = viewer.debug_snapshot();
//! assert_eq!(snap.structure, Some(Structure::Bcc));
//! assert!(snap.enforcer_running);
//! # Ok::<(), freeview_core::SceneError>(())
//! ```

mod config;
mod coordinator;
pub mod layout;
mod session;
mod tracker;
mod ui;

pub use config::{ConfigIoError, ViewerConfig};
pub use coordinator::{DebugSnapshot, SessionCoordinator};
pub use session::TrackableSession;
pub use tracker::{MarkerTracker, TrackingAction, TrackingState};
pub use ui::{NullUi, RecordingUi, UiEvent, UiSink};
