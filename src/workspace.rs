//! Workspace and layout engine (C8, spec §4.8).
//!
//! Grounded in `workspaces/tiling.c`'s `calc_tile_geometry`/
//! `cascade_tiled_portals`: the per-count tile recipes and the
//! toggle-to-floating cascade are ported arithmetic-for-arithmetic from that
//! source, since the distilled spec only summarizes them at table level.

use tracing::{debug, trace};

use crate::atom::Atom;
use crate::geometry::Rect;
use crate::lifecycle::{move_portal, resize_portal};
use crate::portal::{
    PortalId, PortalRegistry, Xid, MINIMUM_PORTAL_HEIGHT, MINIMUM_PORTAL_WIDTH, VIEWPORT_THRESHOLD,
};
use crate::visibility::Visibility;
use crate::x::property::Prop;
use crate::x::XConn;
use crate::{Error, Result};

/// `WM_CLASS` is two null-separated strings (instance, class); the second
/// is what first-map cascade groups siblings by.
fn read_wm_class<X: XConn>(conn: &X, window: Xid) -> String {
    match conn.get_prop(window, Atom::WmClass.as_ref()) {
        Ok(Some(Prop::Strings(parts))) => parts.into_iter().nth(1).unwrap_or_default(),
        _ => String::new(),
    }
}

/// A workspace's layout discipline (spec §4.8 "Layout modes").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutMode {
    #[default]
    Floating,
    Tiling,
}

/// Per-workspace layout bookkeeping.
#[derive(Debug, Default)]
pub struct WorkspaceState {
    pub mode: LayoutMode,
    /// Eligible portals in the order they joined tiling, oldest first.
    tile_order: Vec<PortalId>,
    pub last_focused_portal: Option<PortalId>,
}

impl WorkspaceState {
    pub fn tile_order(&self) -> &[PortalId] {
        &self.tile_order
    }

    fn append_to_tile_order(&mut self, id: PortalId) {
        if !self.tile_order.contains(&id) {
            self.tile_order.push(id);
        }
    }

    fn remove_from_tile_order(&mut self, id: PortalId) {
        self.tile_order.retain(|&i| i != id);
    }
}

/// Owns every workspace's layout state and the current/active index.
#[derive(Debug)]
pub struct WorkspaceManager {
    workspaces: Vec<WorkspaceState>,
    current: u8,
    /// Suppresses `PortalTransformed`-driven `geometry_floating_backup`
    /// writes while a tiling pass is itself repositioning portals.
    applying_layout: bool,
    tile_gap: u32,
}

impl WorkspaceManager {
    pub fn new(workspace_count: u8, tile_gap: u32) -> Self {
        Self {
            workspaces: (0..workspace_count).map(|_| WorkspaceState::default()).collect(),
            current: 0,
            applying_layout: false,
            tile_gap,
        }
    }

    pub fn current(&self) -> u8 {
        self.current
    }

    pub fn state(&self, workspace: u8) -> Option<&WorkspaceState> {
        self.workspaces.get(workspace as usize)
    }

    /// `true` while a tiling pass's own move/resize calls are in flight; a
    /// `PortalTransformed` handler checks this to skip the floating-backup
    /// write it would otherwise make.
    pub fn is_applying_layout(&self) -> bool {
        self.applying_layout
    }

    /// `switch` (spec §4.8 "Switch"): suspend everything on the outgoing
    /// workspace, reveal everything on the incoming one, and resolve the
    /// next input focus.
    pub fn switch_workspace<X: XConn>(
        &mut self,
        conn: &X,
        registry: &mut PortalRegistry,
        target: u8,
    ) -> Result<Option<PortalId>> {
        if target as usize >= self.workspaces.len() {
            return Err(Error::UnknownWorkspace(target));
        }
        if target == self.current {
            return Ok(self.workspaces[target as usize].last_focused_portal);
        }

        let outgoing = self.current;
        let ids: Vec<PortalId> = registry.iter().map(|(id, _)| id).collect();
        for id in ids {
            let Some(portal) = registry.get(id) else { continue };
            if portal.override_redirect || !portal.initialized {
                continue;
            }
            match portal.workspace {
                Some(ws) if ws == outgoing => {
                    crate::lifecycle::suspend_portal(conn, registry, id)?;
                }
                Some(ws) if ws == target => {
                    crate::lifecycle::reveal_portal(conn, registry, id)?;
                }
                _ => {}
            }
        }

        self.current = target;

        let focus = match self.workspaces[target as usize].last_focused_portal {
            Some(id) if registry.get(id).map(|p| p.visibility == Visibility::Visible).unwrap_or(false) => Some(id),
            _ => registry
                .sorted()
                .iter()
                .rev()
                .copied()
                .find(|&id| registry.get(id).map(|p| p.workspace == Some(target) && p.visibility == Visibility::Visible).unwrap_or(false)),
        };
        self.workspaces[target as usize].last_focused_portal = focus;
        debug!(outgoing, target, ?focus, "workspace switched");
        Ok(focus)
    }

    /// `move_portal_to_workspace` (spec §4.8 "Move portal to workspace").
    /// Operates on the transient root, then follows every portal whose
    /// transient root matches, keeping the group co-located.
    pub fn move_portal_to_workspace<X: XConn>(
        &mut self,
        conn: &X,
        registry: &mut PortalRegistry,
        id: PortalId,
        target: u8,
    ) -> Result<()> {
        if target as usize >= self.workspaces.len() {
            return Err(Error::UnknownWorkspace(target));
        }
        let root_id = registry.find_transient_root(id);
        self.move_one_portal(conn, registry, root_id, target)?;

        let children: Vec<PortalId> = registry
            .iter()
            .filter(|(pid, _)| *pid != root_id && registry.find_transient_root(*pid) == root_id)
            .map(|(pid, _)| pid)
            .collect();
        for child in children {
            self.move_one_portal(conn, registry, child, target)?;
        }

        self.workspaces[target as usize].last_focused_portal = Some(root_id);
        self.retile_if_needed(conn, registry, target)?;
        self.retile_if_needed(conn, registry, self.current)?;
        Ok(())
    }

    fn move_one_portal<X: XConn>(
        &mut self,
        conn: &X,
        registry: &mut PortalRegistry,
        id: PortalId,
        target: u8,
    ) -> Result<()> {
        let Some(portal) = registry.get(id) else { return Ok(()) };
        let current_ws = portal.workspace;
        let non_transient = portal.transient_for.is_none() && !portal.override_redirect;

        if non_transient && current_ws != Some(target) && !self.workspace_has_room(registry, target) {
            return Err(Error::WorkspaceFull { workspace: target });
        }

        if current_ws == Some(self.current) {
            crate::lifecycle::suspend_portal(conn, registry, id)?;
        }
        if let Some(portal) = registry.get_mut(id) {
            portal.workspace = Some(target);
        }
        if let Some(ws) = current_ws {
            if let Some(state) = self.workspaces.get_mut(ws as usize) {
                state.remove_from_tile_order(id);
            }
        }
        if target == self.current {
            crate::lifecycle::reveal_portal(conn, registry, id)?;
        }
        if let Some(portal) = registry.get(id) {
            if portal.is_tiling_eligible() && self.workspaces[target as usize].mode == LayoutMode::Tiling {
                self.workspaces[target as usize].append_to_tile_order(id);
            }
        }
        Ok(())
    }

    /// Spec §4.8 "Portal limit": `MAX_WORKSPACE_PORTALS` non-transient,
    /// non-hidden portals per workspace; transients and adoption are exempt.
    pub fn workspace_has_room(&self, registry: &PortalRegistry, workspace: u8) -> bool {
        crate::lifecycle::workspace_has_room(registry, workspace)
    }

    /// Register a freshly mapped, tiling-eligible portal with its
    /// workspace's state: applies first-map cascade (floating mode) or joins
    /// `tile_order` and re-tiles (tiling mode); also evaluates the
    /// auto-tile trigger.
    pub fn on_portal_mapped<X: XConn>(
        &mut self,
        conn: &X,
        registry: &mut PortalRegistry,
        id: PortalId,
    ) -> Result<()> {
        let Some(portal) = registry.get(id) else { return Ok(()) };
        if !portal.is_tiling_eligible() {
            return Ok(());
        }
        let Some(ws) = portal.workspace else { return Ok(()) };
        let (w, h) = (portal.geometry.w, portal.geometry.h);

        let (screen_w, screen_h) = conn.screen_size()?;
        let auto_tile = (w as f64) > screen_w as f64 * VIEWPORT_THRESHOLD
            || (h as f64) > screen_h as f64 * VIEWPORT_THRESHOLD;

        if auto_tile {
            self.workspaces[ws as usize].mode = LayoutMode::Tiling;
        }

        match self.workspaces[ws as usize].mode {
            LayoutMode::Tiling => {
                self.workspaces[ws as usize].append_to_tile_order(id);
                self.apply_tiling_layout(conn, registry, ws)?;
            }
            LayoutMode::Floating => {
                self.apply_first_map_cascade(conn, registry, id)?;
            }
        }
        Ok(())
    }

    /// Spec §4.8 "First-map cascade": offset a newly mapped portal by
    /// `(46, 46)` from the topmost visible sibling on the same workspace
    /// that shares its `WM_CLASS`, if one exists.
    fn apply_first_map_cascade<X: XConn>(&mut self, conn: &X, registry: &mut PortalRegistry, id: PortalId) -> Result<()> {
        let Some(portal) = registry.get(id) else { return Ok(()) };
        let workspace = portal.workspace;
        let window = portal.client_window;
        let class = read_wm_class(conn, window);
        if class.is_empty() {
            return Ok(());
        }

        let sibling = registry
            .sorted()
            .iter()
            .rev()
            .copied()
            .filter(|&sid| sid != id)
            .find(|&sid| {
                registry
                    .get(sid)
                    .map(|p| {
                        p.workspace == workspace
                            && p.visibility == Visibility::Visible
                            && read_wm_class(conn, p.client_window) == class
                    })
                    .unwrap_or(false)
            });

        if let Some(sibling) = sibling {
            let anchor = registry.get(sibling).unwrap().geometry;
            move_portal(
                conn,
                registry,
                id,
                anchor.x + crate::portal::CASCADE_OFFSET_PX,
                anchor.y + crate::portal::CASCADE_OFFSET_PX,
            )?;
        }
        Ok(())
    }

    /// Drop `id` from its workspace's tile order (destroy or workspace
    /// change) and, if that workspace is tiling, recompute layout.
    pub fn on_portal_removed<X: XConn>(&mut self, conn: &X, registry: &mut PortalRegistry, workspace: u8, id: PortalId) -> Result<()> {
        let Some(state) = self.workspaces.get_mut(workspace as usize) else {
            return Ok(());
        };
        state.remove_from_tile_order(id);
        self.retile_if_needed(conn, registry, workspace)
    }

    fn retile_if_needed<X: XConn>(&mut self, conn: &X, registry: &mut PortalRegistry, workspace: u8) -> Result<()> {
        if self.workspaces[workspace as usize].mode == LayoutMode::Tiling {
            self.apply_tiling_layout(conn, registry, workspace)?;
        }
        Ok(())
    }

    /// `toggle_workspace_layout_mode`: flips between `Tiling` and `Floating`,
    /// cascading the portals back out when leaving Tiling.
    pub fn toggle_layout_mode<X: XConn>(&mut self, conn: &X, registry: &mut PortalRegistry, workspace: u8) -> Result<()> {
        match self.workspaces[workspace as usize].mode {
            LayoutMode::Floating => {
                self.workspaces[workspace as usize].mode = LayoutMode::Tiling;
                let eligible: Vec<PortalId> = registry
                    .sorted()
                    .iter()
                    .copied()
                    .filter(|&id| registry.get(id).map(|p| p.workspace == Some(workspace) && p.is_tiling_eligible()).unwrap_or(false))
                    .collect();
                for id in eligible {
                    self.workspaces[workspace as usize].append_to_tile_order(id);
                }
                self.apply_tiling_layout(conn, registry, workspace)?;
            }
            LayoutMode::Tiling => {
                self.workspaces[workspace as usize].mode = LayoutMode::Floating;
                self.cascade_to_floating(conn, registry, workspace)?;
            }
        }
        Ok(())
    }

    /// Apply the recipe table to every portal in `tile_order[workspace]`
    /// (spec §4.8 "Tiling"). Fullscreen portals are skipped; the fullscreen
    /// engine owns their geometry.
    pub fn apply_tiling_layout<X: XConn>(&mut self, conn: &X, registry: &mut PortalRegistry, workspace: u8) -> Result<()> {
        if self.applying_layout {
            return Ok(());
        }
        self.applying_layout = true;
        let result = self.apply_tiling_layout_inner(conn, registry, workspace);
        self.applying_layout = false;
        result
    }

    fn apply_tiling_layout_inner<X: XConn>(&mut self, conn: &X, registry: &mut PortalRegistry, workspace: u8) -> Result<()> {
        let (screen_w, screen_h) = conn.screen_size()?;
        let gap = self.tile_gap;
        let order: Vec<PortalId> = self.workspaces[workspace as usize]
            .tile_order
            .iter()
            .copied()
            .filter(|&id| registry.get(id).map(|p| !p.fullscreen).unwrap_or(false))
            .collect();
        let count = order.len();

        for (index, id) in order.into_iter().enumerate() {
            let cell = calc_tile_geometry(count, index, screen_w, screen_h, gap);
            move_portal(conn, registry, id, cell.x, cell.y)?;
            resize_portal(conn, registry, id, cell.w, cell.h)?;
            trace!(id, index, count, "tiled portal placed");
        }
        Ok(())
    }

    /// `cascade_tiled_portals`: size the group to the median of the
    /// portals' last floating geometries, clamp, center, and cascade
    /// diagonally (spec §4.8 "Toggle to Floating").
    fn cascade_to_floating<X: XConn>(&mut self, conn: &X, registry: &mut PortalRegistry, workspace: u8) -> Result<()> {
        let (screen_w, screen_h) = conn.screen_size()?;
        let eligible: Vec<PortalId> = registry
            .sorted()
            .iter()
            .copied()
            .filter(|&id| registry.get(id).map(|p| p.workspace == Some(workspace) && p.is_tiling_eligible()).unwrap_or(false))
            .collect();
        let count = eligible.len();
        if count == 0 {
            return Ok(());
        }

        let mut widths: Vec<u32> = Vec::with_capacity(count);
        let mut heights: Vec<u32> = Vec::with_capacity(count);
        for &id in &eligible {
            let portal = registry.get(id).unwrap();
            let backup = portal.geometry_floating_backup;
            let (w, h) = if backup.w == 0 || backup.h == 0 {
                (portal.geometry.w, portal.geometry.h)
            } else {
                (backup.w, backup.h)
            };
            widths.push(w);
            heights.push(h);
        }
        widths.sort_unstable();
        heights.sort_unstable();
        let median_w = widths[count / 2];
        let median_h = heights[count / 2];

        let max_w = (screen_w as f64 * VIEWPORT_THRESHOLD) as u32;
        let max_h = (screen_h as f64 * VIEWPORT_THRESHOLD) as u32;
        let cell_w = median_w.clamp(MINIMUM_PORTAL_WIDTH, max_w.max(MINIMUM_PORTAL_WIDTH));
        let cell_h = median_h.clamp(MINIMUM_PORTAL_HEIGHT, max_h.max(MINIMUM_PORTAL_HEIGHT));

        let offset = crate::portal::CASCADE_OFFSET_PX;
        let group_w = cell_w as i32 + (count as i32 - 1) * offset;
        let group_h = cell_h as i32 + (count as i32 - 1) * offset;
        let start_x = (screen_w as i32 - group_w) / 2;
        let start_y = (screen_h as i32 - group_h) / 2;

        for (i, id) in eligible.into_iter().enumerate() {
            let x = start_x + i as i32 * offset;
            let y = start_y + i as i32 * offset;
            resize_portal(conn, registry, id, cell_w, cell_h)?;
            move_portal(conn, registry, id, x, y)?;
        }
        self.workspaces[workspace as usize].tile_order.clear();
        Ok(())
    }
}

/// Pure per-recipe geometry function, ported arithmetic-for-arithmetic from
/// `workspaces/tiling.c`'s `calc_tile_geometry` (spec §4.8 recipe table).
pub fn calc_tile_geometry(count: usize, index: usize, viewport_w: u32, viewport_h: u32, gap: u32) -> Rect {
    let g = gap as i32;
    let vw = viewport_w as i32;
    let vh = viewport_h as i32;

    match count {
        0 => Rect::new(g, g, 0, 0),
        1 => Rect::new(g, g, (vw - 2 * g).max(0) as u32, (vh - 2 * g).max(0) as u32),
        2 => {
            let col_w = (vw - 3 * g) / 2;
            let i = index as i32;
            Rect::new(g + i * (col_w + g), g, col_w.max(0) as u32, (vh - 2 * g).max(0) as u32)
        }
        3 => {
            let col_w = (vw - 3 * g) / 2;
            if index == 0 {
                Rect::new(g, g, col_w.max(0) as u32, (vh - 2 * g).max(0) as u32)
            } else {
                let row_h = (vh - 3 * g) / 2;
                let row = index as i32 - 1;
                Rect::new(g + col_w + g, g + row * (row_h + g), col_w.max(0) as u32, row_h.max(0) as u32)
            }
        }
        4 => {
            let col_w = (vw - 3 * g) / 2;
            let row_h = (vh - 3 * g) / 2;
            let row = index as i32 / 2;
            let col = index as i32 % 2;
            Rect::new(g + col * (col_w + g), g + row * (row_h + g), col_w.max(0) as u32, row_h.max(0) as u32)
        }
        5 => {
            let row_h = (vh - 3 * g) / 2;
            if index < 2 {
                let col_w = (vw - 3 * g) / 2;
                let i = index as i32;
                Rect::new(g + i * (col_w + g), g, col_w.max(0) as u32, row_h.max(0) as u32)
            } else {
                let col_w = (vw - 4 * g) / 3;
                let col = index as i32 - 2;
                Rect::new(g + col * (col_w + g), g + row_h + g, col_w.max(0) as u32, row_h.max(0) as u32)
            }
        }
        6 => {
            let col_w = (vw - 4 * g) / 3;
            let row_h = (vh - 3 * g) / 2;
            let row = index as i32 / 3;
            let col = index as i32 % 3;
            Rect::new(g + col * (col_w + g), g + row * (row_h + g), col_w.max(0) as u32, row_h.max(0) as u32)
        }
        7 => {
            let row_h = (vh - 3 * g) / 2;
            if index < 3 {
                let col_w = (vw - 4 * g) / 3;
                let i = index as i32;
                Rect::new(g + i * (col_w + g), g, col_w.max(0) as u32, row_h.max(0) as u32)
            } else {
                let col_w = (vw - 5 * g) / 4;
                let col = index as i32 - 3;
                Rect::new(g + col * (col_w + g), g + row_h + g, col_w.max(0) as u32, row_h.max(0) as u32)
            }
        }
        _ => {
            // N = 8 (and as a defensive fallback for an out-of-table count).
            let col_w = (vw - 5 * g) / 4;
            let row_h = (vh - 3 * g) / 2;
            let row = index as i32 / 4;
            let col = index as i32 % 4;
            Rect::new(g + col * (col_w + g), g + row * (row_h + g), col_w.max(0) as u32, row_h.max(0) as u32)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn n1_fills_viewport_minus_gap() {
        let r = calc_tile_geometry(1, 0, 1920, 1080, 6);
        assert_eq!(r, Rect::new(6, 6, 1908, 1068));
    }

    #[test]
    fn n3_three_portal_tile_covers_the_viewport_exactly() {
        // 1920x1080 screen, gap=6: left column full height, right column
        // split into two equal rows (P9 completeness: rows + gaps == 1068,
        // the same usable height the single-column side gets).
        let p0 = calc_tile_geometry(3, 0, 1920, 1080, 6);
        let p1 = calc_tile_geometry(3, 1, 1920, 1080, 6);
        let p2 = calc_tile_geometry(3, 2, 1920, 1080, 6);
        assert_eq!(p0, Rect::new(6, 6, 951, 1068));
        assert_eq!(p1, Rect::new(963, 6, 951, 531));
        assert_eq!(p2, Rect::new(963, 543, 951, 531));
        assert_eq!(p1.h + p2.h + 6, p0.h);
    }

    #[test]
    fn n4_is_a_2x2_grid() {
        let cells: Vec<Rect> = (0..4).map(|i| calc_tile_geometry(4, i, 1920, 1080, 6)).collect();
        assert_eq!(cells[0], Rect::new(6, 6, 951, 531));
        assert_eq!(cells[1], Rect::new(963, 6, 951, 531));
        assert_eq!(cells[2], Rect::new(6, 543, 951, 531));
        assert_eq!(cells[3], Rect::new(963, 543, 951, 531));
    }

    #[test]
    fn n8_is_a_4x2_grid_with_four_non_overlapping_columns() {
        let cells: Vec<Rect> = (0..8).map(|i| calc_tile_geometry(8, i, 1920, 1080, 6)).collect();
        assert_eq!(cells[0].x, 6);
        for col in 0..3 {
            let left = cells[col];
            let right = cells[col + 1];
            assert_eq!(right.x, left.x + left.w as i32 + 6, "column {col} should be followed by a single gap");
        }
        assert_eq!(cells[4].y, cells[0].y + cells[0].h as i32 + 6);
    }
}
