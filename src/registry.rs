use crate::dom::{DomAdapter, NodeId, NodeSnapshot, PageRect};
use slab::Slab;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// Quiet window for coalescing mutation bursts into a single rescan.
pub const MUTATION_DEBOUNCE: Duration = Duration::from_millis(50);

/// Stable identity for a tracked element. The slab slot may be reused after
/// retirement, so the serial disambiguates: a stale id never resolves to a
/// later occupant of the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId {
    key: usize,
    serial: u64,
}

/// Filter selector for ordered element sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Describable,
    Focusable,
}

/// Classification outcome. Describable and Focusable are orthogonal: a
/// clickable image without alt text is both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Classification {
    pub describable: bool,
    pub focusable: bool,
}

impl Classification {
    pub fn is_tracked(&self) -> bool {
        self.describable || self.focusable
    }
}

const NAVIGABLE_ROLES: &[&str] = &[
    "button", "link", "checkbox", "radio", "textbox", "searchbox", "combobox", "listbox",
    "menuitem", "menuitemcheckbox", "menuitemradio", "option", "slider", "spinbutton", "switch",
    "tab", "treeitem",
];

/// Classify a node snapshot. Recomputed on every scan; kinds are never
/// inferred once and frozen.
pub fn classify(snap: &NodeSnapshot) -> Classification {
    if !snap.attached || snap.hidden || snap.rect.area() <= 0.0 {
        return Classification::default();
    }

    let has_text_alternative = snap
        .accessible_text
        .as_deref()
        .map(|t| !t.trim().is_empty())
        .unwrap_or(false);
    let describable = snap.image_bearing && !has_text_alternative;

    let navigable_role = snap
        .role
        .as_deref()
        .map(|r| NAVIGABLE_ROLES.contains(&r.to_ascii_lowercase().as_str()))
        .unwrap_or(false);
    let focusable = snap.interactive || navigable_role;

    Classification {
        describable,
        focusable,
    }
}

#[derive(Debug, Clone)]
pub struct TrackedElement {
    pub node: NodeId,
    pub classification: Classification,
    /// Last-known box in document coordinates, refreshed by the position
    /// tracker.
    pub rect: PageRect,
    /// Position in the most recent scan, used for document-order iteration.
    doc_order: usize,
    serial: u64,
}

/// Net effect of one reconciling rescan.
#[derive(Debug, Default)]
pub struct RescanOutcome {
    pub added: Vec<ElementId>,
    pub retired: Vec<ElementId>,
}

impl RescanOutcome {
    pub fn changed(&self) -> bool {
        !self.added.is_empty() || !self.retired.is_empty()
    }
}

/// Tracks describable/focusable elements across DOM mutation. Ids are
/// assigned on first sighting, matched by node identity on later scans, and
/// retired exactly once when the node disappears or stops matching.
pub struct ElementRegistry {
    elements: Slab<TrackedElement>,
    by_node: HashMap<NodeId, ElementId>,
    next_serial: u64,
    rescan_due: Option<Instant>,
    debounce: Duration,
}

impl Default for ElementRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementRegistry {
    pub fn new() -> Self {
        Self {
            elements: Slab::new(),
            by_node: HashMap::new(),
            next_serial: 0,
            rescan_due: None,
            debounce: MUTATION_DEBOUNCE,
        }
    }

    /// Record a DOM mutation signal. The rescan deadline slides so a burst
    /// of mutations inside the quiet window costs a single rescan.
    pub fn note_mutation(&mut self, now: Instant) {
        self.rescan_due = Some(now + self.debounce);
    }

    pub fn mutation_pending(&self) -> bool {
        self.rescan_due.is_some()
    }

    /// True once the quiet window after the last mutation has elapsed.
    /// Clears the pending deadline; the caller performs the rescan.
    pub fn take_due_rescan(&mut self, now: Instant) -> bool {
        match self.rescan_due {
            Some(due) if now >= due => {
                self.rescan_due = None;
                true
            }
            _ => false,
        }
    }

    /// Walk the document, classify every node and reconcile against the
    /// existing id map. Matching is by node identity, never by position.
    pub fn rescan(&mut self, dom: &dyn DomAdapter) -> RescanOutcome {
        let mut outcome = RescanOutcome::default();
        let mut seen: HashSet<NodeId> = HashSet::new();

        for (order, node) in dom.nodes_in_document_order().into_iter().enumerate() {
            let Some(snap) = dom.snapshot(node) else {
                continue;
            };
            let classification = classify(&snap);
            if !classification.is_tracked() {
                continue;
            }
            seen.insert(node);

            if let Some(&id) = self.by_node.get(&node) {
                if let Some(el) = self.elements.get_mut(id.key) {
                    el.classification = classification;
                    el.rect = snap.rect;
                    el.doc_order = order;
                }
            } else {
                let serial = self.next_serial;
                self.next_serial += 1;
                let key = self.elements.insert(TrackedElement {
                    node,
                    classification,
                    rect: snap.rect,
                    doc_order: order,
                    serial,
                });
                let id = ElementId { key, serial };
                self.by_node.insert(node, id);
                outcome.added.push(id);
            }
        }

        // Nodes no longer present or no longer matching lose their ids.
        let stale: Vec<(NodeId, ElementId)> = self
            .by_node
            .iter()
            .filter(|(node, _)| !seen.contains(node))
            .map(|(&node, &id)| (node, id))
            .collect();
        for (node, id) in stale {
            self.by_node.remove(&node);
            self.elements.remove(id.key);
            outcome.retired.push(id);
        }

        if outcome.changed() {
            tracing::debug!(
                added = outcome.added.len(),
                retired = outcome.retired.len(),
                "registry reconciled"
            );
        }
        outcome
    }

    pub fn get(&self, id: ElementId) -> Option<&TrackedElement> {
        self.elements
            .get(id.key)
            .filter(|el| el.serial == id.serial)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.get(id).is_some()
    }

    pub fn node_of(&self, id: ElementId) -> Option<NodeId> {
        self.get(id).map(|el| el.node)
    }

    pub fn set_rect(&mut self, id: ElementId, rect: PageRect) {
        if let Some(el) = self
            .elements
            .get_mut(id.key)
            .filter(|el| el.serial == id.serial)
        {
            el.rect = rect;
        }
    }

    /// Ids of the given kind in document order. Restartable: each call
    /// yields a fresh pass over the current sequence.
    pub fn elements_of_kind(&self, kind: ElementKind) -> impl Iterator<Item = ElementId> + '_ {
        let mut ids: Vec<(usize, ElementId)> = self
            .elements
            .iter()
            .filter(|(_, el)| match kind {
                ElementKind::Describable => el.classification.describable,
                ElementKind::Focusable => el.classification.focusable,
            })
            .map(|(key, el)| {
                (
                    el.doc_order,
                    ElementId {
                        key,
                        serial: el.serial,
                    },
                )
            })
            .collect();
        ids.sort_by_key(|(order, _)| *order);
        ids.into_iter().map(|(_, id)| id)
    }

    pub fn all_ids(&self) -> Vec<ElementId> {
        self.elements
            .iter()
            .map(|(key, el)| ElementId {
                key,
                serial: el.serial,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}
