//! Known X atoms and an interning cache.
//!
//! Atom names are shared between every X11 API library, so this enum gives a
//! little type safety around their use (see spec §6 / §10 for the exact set
//! read and written by the core).

use std::collections::HashMap;
use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator};

use crate::portal::Xid;
use crate::x::XConn;
use crate::Result;

/// A statically known X atom name.
#[derive(AsRefStr, EnumString, EnumIter, Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Atom {
    /// UTF8_STRING
    #[strum(serialize = "UTF8_STRING")]
    Utf8String,
    /// WM_CLASS
    #[strum(serialize = "WM_CLASS")]
    WmClass,
    /// WM_DELETE_WINDOW
    #[strum(serialize = "WM_DELETE_WINDOW")]
    WmDeleteWindow,
    /// WM_NAME
    #[strum(serialize = "WM_NAME")]
    WmName,
    /// WM_NORMAL_HINTS
    #[strum(serialize = "WM_NORMAL_HINTS")]
    WmNormalHints,
    /// WM_PROTOCOLS
    #[strum(serialize = "WM_PROTOCOLS")]
    WmProtocols,
    /// WM_STATE
    #[strum(serialize = "WM_STATE")]
    WmState,
    /// WM_TRANSIENT_FOR
    #[strum(serialize = "WM_TRANSIENT_FOR")]
    WmTransientFor,
    /// _MOTIF_WM_HINTS
    #[strum(serialize = "_MOTIF_WM_HINTS")]
    MotifWmHints,
    /// _NET_ACTIVE_WINDOW
    #[strum(serialize = "_NET_ACTIVE_WINDOW")]
    NetActiveWindow,
    /// _NET_CLIENT_LIST
    #[strum(serialize = "_NET_CLIENT_LIST")]
    NetClientList,
    /// _NET_CLOSE_WINDOW
    #[strum(serialize = "_NET_CLOSE_WINDOW")]
    NetCloseWindow,
    /// _NET_CURRENT_DESKTOP
    #[strum(serialize = "_NET_CURRENT_DESKTOP")]
    NetCurrentDesktop,
    /// _NET_DESKTOP_NAMES
    #[strum(serialize = "_NET_DESKTOP_NAMES")]
    NetDesktopNames,
    /// _NET_FRAME_EXTENTS
    #[strum(serialize = "_NET_FRAME_EXTENTS")]
    NetFrameExtents,
    /// _NET_NUMBER_OF_DESKTOPS
    #[strum(serialize = "_NET_NUMBER_OF_DESKTOPS")]
    NetNumberOfDesktops,
    /// _NET_SUPPORTED
    #[strum(serialize = "_NET_SUPPORTED")]
    NetSupported,
    /// _NET_SUPPORTING_WM_CHECK
    #[strum(serialize = "_NET_SUPPORTING_WM_CHECK")]
    NetSupportingWmCheck,
    /// _NET_WM_DESKTOP
    #[strum(serialize = "_NET_WM_DESKTOP")]
    NetWmDesktop,
    /// _NET_WM_MOVERESIZE
    #[strum(serialize = "_NET_WM_MOVERESIZE")]
    NetWmMoveresize,
    /// _NET_WM_NAME
    #[strum(serialize = "_NET_WM_NAME")]
    NetWmName,
    /// _NET_WM_PID
    #[strum(serialize = "_NET_WM_PID")]
    NetWmPid,
    /// _NET_WM_STATE
    #[strum(serialize = "_NET_WM_STATE")]
    NetWmState,
    /// _NET_WM_STATE_FULLSCREEN
    #[strum(serialize = "_NET_WM_STATE_FULLSCREEN")]
    NetWmStateFullscreen,
    /// _NET_WM_WINDOW_TYPE
    #[strum(serialize = "_NET_WM_WINDOW_TYPE")]
    NetWmWindowType,
    /// _NET_WM_WINDOW_TYPE_DIALOG
    #[strum(serialize = "_NET_WM_WINDOW_TYPE_DIALOG")]
    NetWmWindowTypeDialog,
    /// _NET_WM_WINDOW_TYPE_DOCK
    #[strum(serialize = "_NET_WM_WINDOW_TYPE_DOCK")]
    NetWmWindowTypeDock,
    /// _NET_WM_WINDOW_TYPE_MENU
    #[strum(serialize = "_NET_WM_WINDOW_TYPE_MENU")]
    NetWmWindowTypeMenu,
    /// _NET_WM_WINDOW_TYPE_NOTIFICATION
    #[strum(serialize = "_NET_WM_WINDOW_TYPE_NOTIFICATION")]
    NetWmWindowTypeNotification,
    /// _NET_WM_WINDOW_TYPE_TOOLTIP
    #[strum(serialize = "_NET_WM_WINDOW_TYPE_TOOLTIP")]
    NetWmWindowTypeTooltip,
    /// _NET_WM_WINDOW_TYPE_SPLASH
    #[strum(serialize = "_NET_WM_WINDOW_TYPE_SPLASH")]
    NetWmWindowTypeSplash,
    /// _NET_WM_WINDOW_TYPE_UTILITY
    #[strum(serialize = "_NET_WM_WINDOW_TYPE_UTILITY")]
    NetWmWindowTypeUtility,
    /// _NET_WM_WINDOW_TYPE_NORMAL
    #[strum(serialize = "_NET_WM_WINDOW_TYPE_NORMAL")]
    NetWmWindowTypeNormal,
}

/// Window types that disqualify a portal from receiving a server-drawn frame
/// (spec §4.2 "Framing decision").
pub const UNFRAMED_WINDOW_TYPES: &[Atom] = &[
    Atom::NetWmWindowTypeTooltip,
    Atom::NetWmWindowTypeNotification,
    Atom::NetWmWindowTypeDock,
    Atom::NetWmWindowTypeMenu,
    Atom::NetWmWindowTypeSplash,
    Atom::NetWmWindowTypeUtility,
];

/// Every `_NET_*` atom this window manager advertises via `_NET_SUPPORTED`
/// (spec §4.10).
pub const EWMH_SUPPORTED: &[Atom] = &[
    Atom::NetSupportingWmCheck,
    Atom::NetWmName,
    Atom::NetClientList,
    Atom::NetActiveWindow,
    Atom::NetCloseWindow,
    Atom::NetCurrentDesktop,
    Atom::NetNumberOfDesktops,
    Atom::NetDesktopNames,
    Atom::NetWmDesktop,
    Atom::NetWmState,
    Atom::NetWmStateFullscreen,
    Atom::NetWmWindowType,
    Atom::NetWmMoveresize,
    Atom::NetFrameExtents,
];

/// A cache of interned atoms, populated once during `Prepare`.
///
/// Looking an atom up by [`Atom`] after the cache is warm never round-trips
/// to the X server.
#[derive(Debug, Default)]
pub struct AtomCache {
    by_atom: HashMap<Atom, Xid>,
}

impl AtomCache {
    /// Intern every known [`Atom`] up front.
    pub fn prepare<X: XConn>(conn: &X) -> Result<Self> {
        let mut by_atom = HashMap::new();
        for atom in Atom::iter() {
            let xid = conn.intern_atom(atom.as_ref())?;
            by_atom.insert(atom, xid);
        }
        Ok(Self { by_atom })
    }

    /// Look up the cached [`Xid`] for a known atom.
    ///
    /// Panics if called before [`AtomCache::prepare`]: every [`Atom`] variant
    /// is interned during `Prepare`, so a miss here indicates a programming
    /// error rather than a recoverable runtime condition.
    pub fn get(&self, atom: Atom) -> Xid {
        *self
            .by_atom
            .get(&atom)
            .unwrap_or_else(|| panic!("atom {atom:?} was not interned during Prepare"))
    }
}
