use crate::describe::{DescribeCoordinator, DescribeStatus};
use crate::dom::PageRect;
use crate::registry::{ElementId, ElementKind, ElementRegistry};
use crate::tracker::PositionTracker;
use std::collections::HashMap;

/// Visual state of a describe button, derived from the element's request
/// status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescribeButtonState {
    Default,
    Processing,
    Done,
    Failed,
}

impl DescribeButtonState {
    pub fn label(self) -> &'static str {
        match self {
            DescribeButtonState::Default => "Describe",
            DescribeButtonState::Processing => "Analyzing…",
            DescribeButtonState::Done => "✓ Described",
            DescribeButtonState::Failed => "Retry",
        }
    }

    pub fn enabled(self) -> bool {
        !matches!(self, DescribeButtonState::Processing)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    DescribeButton,
    FocusRing,
}

/// Key of one floating control: a control is unique per (element, kind).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlKey {
    pub element: ElementId,
    pub kind: ControlKind,
}

/// One floating control anchored to a tracked element's live box.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayControl {
    DescribeButton {
        element: ElementId,
        anchor: PageRect,
        state: DescribeButtonState,
    },
    FocusRing {
        element: ElementId,
        anchor: PageRect,
    },
}

impl OverlayControl {
    pub fn key(&self) -> ControlKey {
        match self {
            OverlayControl::DescribeButton { element, .. } => ControlKey {
                element: *element,
                kind: ControlKind::DescribeButton,
            },
            OverlayControl::FocusRing { element, .. } => ControlKey {
                element: *element,
                kind: ControlKind::FocusRing,
            },
        }
    }
}

/// DOM side effects required to move the applied overlay from one frame to
/// the next. Ops only ever touch controls the engine itself mounted.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayOp {
    Mount(OverlayControl),
    Update(OverlayControl),
    Unmount(ControlKey),
}

/// The full set of controls that should exist for the current engine state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayFrame {
    controls: HashMap<ControlKey, OverlayControl>,
}

impl OverlayFrame {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, control: OverlayControl) {
        self.controls.insert(control.key(), control);
    }

    pub fn contains(&self, key: &ControlKey) -> bool {
        self.controls.contains_key(key)
    }

    pub fn get(&self, key: &ControlKey) -> Option<&OverlayControl> {
        self.controls.get(key)
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    pub fn controls(&self) -> impl Iterator<Item = &OverlayControl> {
        self.controls.values()
    }
}

fn button_state(status: &DescribeStatus) -> DescribeButtonState {
    match status {
        DescribeStatus::Idle => DescribeButtonState::Default,
        DescribeStatus::Processing => DescribeButtonState::Processing,
        DescribeStatus::Done(_) => DescribeButtonState::Done,
        DescribeStatus::Failed(_) => DescribeButtonState::Failed,
    }
}

/// Pure view computation: the frame is a function of the registry contents,
/// tracked boxes, per-element describe status and the navigation focus.
pub fn build_frame(
    registry: &ElementRegistry,
    tracker: &PositionTracker,
    describe: &DescribeCoordinator,
    focused: Option<ElementId>,
) -> OverlayFrame {
    let mut frame = OverlayFrame::empty();

    // Hidden nodes never make it into the registry, so every describable
    // element here is renderable.
    for id in registry.elements_of_kind(ElementKind::Describable) {
        let Some(anchor) = tracker.get(id).or_else(|| registry.get(id).map(|el| el.rect)) else {
            continue;
        };
        frame.insert(OverlayControl::DescribeButton {
            element: id,
            anchor,
            state: button_state(describe.status(id)),
        });
    }

    if let Some(id) = focused {
        if let Some(anchor) = tracker.get(id).or_else(|| registry.get(id).map(|el| el.rect)) {
            frame.insert(OverlayControl::FocusRing {
                element: id,
                anchor,
            });
        }
    }

    frame
}

/// Diff two frames into the op list that turns `prev` into `next`.
pub fn plan_frame(prev: &OverlayFrame, next: &OverlayFrame) -> Vec<OverlayOp> {
    let mut ops = Vec::new();

    for (key, control) in &next.controls {
        match prev.controls.get(key) {
            None => ops.push(OverlayOp::Mount(control.clone())),
            Some(old) if old != control => ops.push(OverlayOp::Update(control.clone())),
            Some(_) => {}
        }
    }
    for key in prev.controls.keys() {
        if !next.controls.contains_key(key) {
            ops.push(OverlayOp::Unmount(*key));
        }
    }

    ops
}
