//! Engine event notifications.
//!
//! The engine emits a single event, [`PixelAssignedEvent`], fired once per session when its pixel assignment is
//! first recorded. Interested parties register an async [`AssignmentHook`] at startup; fulfillment hands events
//! to a bounded channel so that a slow hook never stalls a webhook response.
mod event_types;
mod notify;

pub use event_types::PixelAssignedEvent;
pub use notify::{AssignmentHook, AssignmentListener, AssignmentNotifier};
