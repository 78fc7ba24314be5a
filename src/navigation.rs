use crate::registry::{ElementId, ElementKind, ElementRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavMode {
    Inactive,
    Active,
}

/// Keys the navigator interprets while global mode is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    Tab,
    ShiftTab,
    Enter,
    Escape,
}

/// What a transition asks the engine to do. All DOM side effects (scrolling,
/// activation, focus ring) happen in the engine; the navigator only owns the
/// mode and the current index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavEffect {
    None,
    FocusMoved(ElementId),
    Activate(ElementId),
    Exited,
}

/// Keyboard-driven navigation over the ordered Focusable sequence.
///
/// Transitions are synchronous; `current` is always a valid index into the
/// live sequence while Active, and `None` otherwise.
pub struct Navigator {
    mode: NavMode,
    sequence: Vec<ElementId>,
    current: Option<usize>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator {
    pub fn new() -> Self {
        Self {
            mode: NavMode::Inactive,
            sequence: Vec::new(),
            current: None,
        }
    }

    pub fn mode(&self) -> NavMode {
        self.mode
    }

    pub fn is_active(&self) -> bool {
        self.mode == NavMode::Active
    }

    pub fn focused(&self) -> Option<ElementId> {
        self.current.map(|i| self.sequence[i])
    }

    pub fn sequence_len(&self) -> usize {
        self.sequence.len()
    }

    /// Enter Active mode: build the Focusable sequence and focus its first
    /// element, or none when the sequence is empty.
    pub fn activate(&mut self, registry: &ElementRegistry) -> NavEffect {
        self.sequence = registry.elements_of_kind(ElementKind::Focusable).collect();
        self.current = if self.sequence.is_empty() {
            None
        } else {
            Some(0)
        };
        self.mode = NavMode::Active;
        tracing::debug!(len = self.sequence.len(), "global mode entered");
        match self.focused() {
            Some(id) => NavEffect::FocusMoved(id),
            None => NavEffect::None,
        }
    }

    /// Leave Active mode; the focus index is cleared, the engine removes
    /// the ring.
    pub fn deactivate(&mut self) -> NavEffect {
        self.mode = NavMode::Inactive;
        self.sequence.clear();
        self.current = None;
        tracing::debug!("global mode exited");
        NavEffect::Exited
    }

    pub fn toggle(&mut self, registry: &ElementRegistry) -> NavEffect {
        match self.mode {
            NavMode::Inactive => self.activate(registry),
            NavMode::Active => self.deactivate(),
        }
    }

    pub fn handle_key(&mut self, key: NavKey) -> NavEffect {
        if self.mode == NavMode::Inactive {
            return NavEffect::None;
        }
        match key {
            NavKey::Tab => self.step(1),
            NavKey::ShiftTab => self.step(-1),
            NavKey::Enter => match self.focused() {
                Some(id) => NavEffect::Activate(id),
                None => NavEffect::None,
            },
            NavKey::Escape => self.deactivate(),
        }
    }

    /// Move to the next/previous element, wrapping cyclically.
    fn step(&mut self, direction: i64) -> NavEffect {
        let len = self.sequence.len();
        if len == 0 {
            return NavEffect::None;
        }
        let next = match self.current {
            Some(i) => (i as i64 + direction).rem_euclid(len as i64) as usize,
            None => 0,
        };
        self.current = Some(next);
        NavEffect::FocusMoved(self.sequence[next])
    }

    /// Rebuild the sequence after a registry rescan, keeping mode Active.
    ///
    /// If the focused element survived it keeps focus at its new index.
    /// Otherwise the nearest valid successor from the old ordering takes
    /// over, falling back to the nearest predecessor, or no focus when the
    /// new sequence is empty.
    pub fn resync(&mut self, registry: &ElementRegistry) -> NavEffect {
        if self.mode == NavMode::Inactive {
            return NavEffect::None;
        }
        let old_sequence = std::mem::take(&mut self.sequence);
        let old_index = self.current;
        self.sequence = registry.elements_of_kind(ElementKind::Focusable).collect();

        self.current = old_index.and_then(|old_i| {
            let position_of = |id: ElementId| self.sequence.iter().position(|&x| x == id);
            // Successors first (the focused element itself included), then
            // predecessors walking backwards.
            old_sequence[old_i..]
                .iter()
                .find_map(|&id| position_of(id))
                .or_else(|| {
                    old_sequence[..old_i]
                        .iter()
                        .rev()
                        .find_map(|&id| position_of(id))
                })
        });
        if self.current.is_none() && !self.sequence.is_empty() {
            self.current = Some(0);
        }
        match self.focused() {
            Some(id) => NavEffect::FocusMoved(id),
            None => NavEffect::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{NavEffect, NavKey, Navigator};
    use crate::dom::{DomAdapter, NodeId, NodeSnapshot, PageRect};
    use crate::overlay::OverlayOp;
    use crate::registry::ElementRegistry;

    struct Buttons(Vec<u64>);

    impl DomAdapter for Buttons {
        fn nodes_in_document_order(&self) -> Vec<NodeId> {
            self.0.iter().map(|&n| NodeId(n)).collect()
        }
        fn snapshot(&self, node: NodeId) -> Option<NodeSnapshot> {
            Some(NodeSnapshot {
                tag: "button".into(),
                interactive: true,
                rect: PageRect::new(0.0, node.0 as f32 * 30.0, 100.0, node.0 as f32 * 30.0 + 20.0),
                attached: true,
                ..NodeSnapshot::default()
            })
        }
        fn scroll_into_view(&self, _node: NodeId) {}
        fn activate(&self, _node: NodeId) {}
        fn fetch_image(&self, _node: NodeId) -> Option<Vec<u8>> {
            None
        }
        fn apply_overlay(&self, _op: &OverlayOp) {}
        fn set_contrast_fix(&self, _enabled: bool) {}
    }

    #[test]
    fn activate_on_empty_page_focuses_nothing() {
        let registry = ElementRegistry::new();
        let mut nav = Navigator::new();
        assert_eq!(nav.activate(&registry), NavEffect::None);
        assert!(nav.is_active());
        assert_eq!(nav.focused(), None);
        assert_eq!(nav.handle_key(NavKey::Tab), NavEffect::None);
    }

    #[test]
    fn tab_wraps_forward_and_backward() {
        let dom = Buttons(vec![1, 2, 3]);
        let mut registry = ElementRegistry::new();
        registry.rescan(&dom);
        let mut nav = Navigator::new();
        let first = match nav.activate(&registry) {
            NavEffect::FocusMoved(id) => id,
            other => panic!("unexpected effect {other:?}"),
        };

        // Shift+Tab from the first element wraps to the last.
        let NavEffect::FocusMoved(last) = nav.handle_key(NavKey::ShiftTab) else {
            panic!("expected focus move");
        };
        assert_ne!(last, first);

        // Tab from the last wraps back to the first.
        assert_eq!(nav.handle_key(NavKey::Tab), NavEffect::FocusMoved(first));
    }

    #[test]
    fn enter_activates_without_leaving_active_mode() {
        let dom = Buttons(vec![1, 2]);
        let mut registry = ElementRegistry::new();
        registry.rescan(&dom);
        let mut nav = Navigator::new();
        nav.activate(&registry);
        let focused = nav.focused().expect("focus");
        assert_eq!(nav.handle_key(NavKey::Enter), NavEffect::Activate(focused));
        assert!(nav.is_active());
        assert_eq!(nav.focused(), Some(focused));
    }

    #[test]
    fn escape_clears_focus_and_mode() {
        let dom = Buttons(vec![1]);
        let mut registry = ElementRegistry::new();
        registry.rescan(&dom);
        let mut nav = Navigator::new();
        nav.activate(&registry);
        assert_eq!(nav.handle_key(NavKey::Escape), NavEffect::Exited);
        assert!(!nav.is_active());
        assert_eq!(nav.focused(), None);
    }
}
