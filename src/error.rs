//! Crate-wide error type.
//!
//! Transient X races (`BadWindow`/`BadDrawable`/`BadPixmap`) never reach this
//! type: the X connection's error trap swallows them at the request boundary
//! (see [`crate::x::x11rb_conn`]) and callers see `Ok(())` or `None` instead.

use crate::portal::Xid;

/// Everything that can go wrong inside the core engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A non-recoverable failure talking to the X server.
    #[error("X connection error: {0}")]
    XConnection(String),

    /// `create` was called with no free portal slot (`MAX_PORTALS` reached).
    #[error("portal registry is full (MAX_PORTALS reached)")]
    RegistryFull,

    /// A workspace already holds `MAX_WORKSPACE_PORTALS` non-transient portals.
    #[error("workspace {workspace} is full")]
    WorkspaceFull {
        /// The workspace index that refused the map/move.
        workspace: u8,
    },

    /// Reference to a portal that is not (or no longer) active.
    #[error("unknown or inactive portal: {0}")]
    UnknownPortal(Xid),

    /// Reference to a workspace index outside `[0, MAX_WORKSPACES)`.
    #[error("unknown workspace index: {0}")]
    UnknownWorkspace(u8),

    /// The compositor could not be initialized or a composite request failed.
    ///
    /// Always non-fatal: callers disable compositing and keep managing windows.
    #[error("compositor error: {0}")]
    Compositor(String),

    /// Unrecoverable startup failure: display acquisition or allocation failure.
    #[error("fatal error: {0}")]
    Fatal(String),

    /// A [`crate::x::mock::MockXConn`] method was called without a test
    /// providing an override.
    #[error("mock XConn method not implemented by this test")]
    UnimplementedMock,

    /// An attempt to use the Cairo C API failed while drawing a frame
    /// (spec §4.5) or compositing a portal (spec §4.9).
    #[error("error calling Cairo API: {0}")]
    Cairo(#[from] cairo::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
