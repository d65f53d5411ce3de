//! The tagged X event union (C1) and the raw XInput2 variants the
//! interaction engine consumes.

use crate::portal::Xid;

/// A decoded `ClientMessage` the protocol surface (C11) understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// `_NET_WM_STATE` with one of the three standard actions.
    NetWmState {
        /// The target window.
        window: Xid,
        /// 0 = remove, 1 = add, 2 = toggle (spec §4.7/§4.10).
        action: u32,
        /// First state atom in the message (fullscreen is checked in either slot).
        first: Xid,
        /// Second state atom in the message.
        second: Xid,
    },
    /// `_NET_WM_MOVERESIZE`.
    NetWmMoveresize {
        /// The target window.
        window: Xid,
        /// Root-relative pointer x at the time of the request.
        x_root: i32,
        /// Root-relative pointer y at the time of the request.
        y_root: i32,
        /// One of `MOVE` (8), `MOVE_KEYBOARD` (10), `SIZE_BOTTOMRIGHT` (4),
        /// `CANCEL` (11) per spec §6.
        direction: u32,
    },
    /// `_NET_CLOSE_WINDOW`.
    NetCloseWindow {
        /// The target window.
        window: Xid,
    },
    /// Any other client message, not acted on but still dispatched so
    /// out-of-scope collaborators (shortcut layer etc.) can observe it.
    Other {
        /// The target window.
        window: Xid,
        /// The message type atom.
        message_type: Xid,
    },
}

/// A raw XInput2 pointer/key event, selected on the root window (spec §6).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawEvent {
    /// Raw button press; `detail` 1 is the primary button.
    ButtonPress { detail: u8 },
    /// Raw button release.
    ButtonRelease { detail: u8 },
    /// Raw pointer motion. Position is queried separately per spec §4.6;
    /// `time` is the server timestamp used to throttle drag/resize updates.
    Motion { time: u32 },
    /// Raw key press.
    KeyPress { keycode: u8 },
    /// Raw key release.
    KeyRelease { keycode: u8 },
}

/// The core event union dispatched through the [`crate::bus::EventBus`].
#[derive(Debug, Clone, PartialEq)]
pub enum XEvent {
    /// A new top-level child was created under root.
    CreateNotify { window: Xid },
    /// A client requested to be mapped.
    MapRequest { window: Xid },
    /// A window finished mapping.
    MapNotify { window: Xid },
    /// A window was unmapped.
    UnmapNotify { window: Xid },
    /// A window (and any portal wrapping it) was destroyed at the X level.
    DestroyNotify { window: Xid },
    /// A client requested a geometry change via `ConfigureRequest`.
    ConfigureRequest {
        window: Xid,
        x: Option<i32>,
        y: Option<i32>,
        width: Option<u32>,
        height: Option<u32>,
    },
    /// A window's geometry actually changed.
    ConfigureNotify {
        window: Xid,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
    /// A property changed on a window.
    PropertyNotify { window: Xid, atom: Xid },
    /// A decoded client message.
    ClientMessage(ClientMessage),
    /// A raw XInput2 event, already filtered to non-duplicate raw variants
    /// (spec §4.11 step 3).
    Raw(RawEvent),
    /// Internal tick fired by the event loop at the configured framerate
    /// (spec §4.11 step 5). Not an X protocol event.
    Update,
}

/// The set of tags handlers register against in the [`crate::bus::EventBus`].
///
/// Kept distinct from [`XEvent`]'s variants (rather than matching on the enum
/// discriminant) so unrelated `ClientMessage`/`Raw` payloads can share one
/// registration point, matching how the C component table groups C5/C7/C8/C9/
/// C11 handlers by concern rather than by literal X event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTag {
    CreateNotify,
    MapRequest,
    MapNotify,
    UnmapNotify,
    DestroyNotify,
    ConfigureRequest,
    ConfigureNotify,
    PropertyNotify,
    ClientMessage,
    Raw,
    Update,
}

impl XEvent {
    /// The tag handlers register against to receive this event.
    pub fn tag(&self) -> EventTag {
        match self {
            XEvent::CreateNotify { .. } => EventTag::CreateNotify,
            XEvent::MapRequest { .. } => EventTag::MapRequest,
            XEvent::MapNotify { .. } => EventTag::MapNotify,
            XEvent::UnmapNotify { .. } => EventTag::UnmapNotify,
            XEvent::DestroyNotify { .. } => EventTag::DestroyNotify,
            XEvent::ConfigureRequest { .. } => EventTag::ConfigureRequest,
            XEvent::ConfigureNotify { .. } => EventTag::ConfigureNotify,
            XEvent::PropertyNotify { .. } => EventTag::PropertyNotify,
            XEvent::ClientMessage(_) => EventTag::ClientMessage,
            XEvent::Raw(_) => EventTag::Raw,
            XEvent::Update => EventTag::Update,
        }
    }
}
