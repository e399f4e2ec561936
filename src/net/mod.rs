//! Host-side data collaborators. The touch layer never calls into here;
//! only the demo binary wires these into reload and swipe callbacks.

pub mod api;
