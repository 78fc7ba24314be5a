use crate::dom::{DomAdapter, PageRect};
use crate::registry::{ElementId, ElementRegistry};
use std::collections::HashMap;

/// Box movement below this many pixels is layout jitter, not a change.
pub const POSITION_EPSILON: f32 = 0.5;

/// Recomputes document-coordinate boxes for tracked elements and reports
/// which ones actually moved, so the overlay renderer only repaints anchors
/// that changed.
#[derive(Default)]
pub struct PositionTracker {
    boxes: HashMap<ElementId, PageRect>,
}

impl PositionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refresh the given ids (or every tracked id when `ids` is `None`).
    ///
    /// Returns the ids whose box moved by more than [`POSITION_EPSILON`].
    /// A node that cannot be read mid-refresh (detached between the scan and
    /// this call) is a transient miss: its cached box is kept and the read is
    /// retried on the next refresh. Retired ids are never reported.
    pub fn refresh(
        &mut self,
        dom: &dyn DomAdapter,
        registry: &mut ElementRegistry,
        ids: Option<&[ElementId]>,
    ) -> Vec<ElementId> {
        let targets: Vec<ElementId> = match ids {
            Some(ids) => ids.to_vec(),
            None => registry.all_ids(),
        };

        let mut changed = Vec::new();
        for id in targets {
            let Some(node) = registry.node_of(id) else {
                // Retired since the caller collected the id set.
                self.boxes.remove(&id);
                continue;
            };
            let Some(snap) = dom.snapshot(node) else {
                tracing::debug!(?node, "box read missed, will retry next refresh");
                continue;
            };
            if !snap.attached {
                continue;
            }
            let rect = snap.rect;
            let moved = match self.boxes.get(&id) {
                Some(prev) => !prev.approx_eq(&rect, POSITION_EPSILON),
                None => true,
            };
            self.boxes.insert(id, rect);
            registry.set_rect(id, rect);
            if moved {
                changed.push(id);
            }
        }
        changed
    }

    /// Drop cached boxes for retired ids. Must be called with the retired
    /// set of every registry rescan.
    pub fn forget(&mut self, ids: &[ElementId]) {
        for id in ids {
            self.boxes.remove(id);
        }
    }

    pub fn get(&self, id: ElementId) -> Option<PageRect> {
        self.boxes.get(&id).copied()
    }

    pub fn tracked_count(&self) -> usize {
        self.boxes.len()
    }
}
