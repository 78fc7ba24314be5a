use page_narrator::dom::PageRect;
use page_narrator::registry::ElementRegistry;
use page_narrator::tracker::PositionTracker;

use mock_dom::MockDom;

fn rect(top: f32) -> PageRect {
    PageRect::new(0.0, top, 100.0, top + 50.0)
}

#[test]
fn only_moved_boxes_are_reported() {
    let dom = MockDom::new();
    dom.add_image(1, rect(0.0));
    dom.add_image(2, rect(100.0));
    let mut registry = ElementRegistry::new();
    let ids = registry.rescan(&dom).added;
    let mut tracker = PositionTracker::new();

    // First refresh: everything is new, everything changed.
    let changed = tracker.refresh(&dom, &mut registry, None);
    assert_eq!(changed.len(), 2);

    // Nothing moved: no notifications.
    assert!(tracker.refresh(&dom, &mut registry, None).is_empty());

    // Sub-epsilon jitter is not a change.
    dom.set_rect(1, PageRect::new(0.2, 0.0, 100.2, 50.0));
    assert!(tracker.refresh(&dom, &mut registry, None).is_empty());

    // A real move is.
    dom.set_rect(1, rect(500.0));
    let changed = tracker.refresh(&dom, &mut registry, None);
    assert_eq!(changed, vec![ids[0]]);
    assert_eq!(tracker.get(ids[0]), Some(rect(500.0)));
}

#[test]
fn retired_ids_are_never_reported() {
    let dom = MockDom::new();
    dom.add_image(1, rect(0.0));
    let mut registry = ElementRegistry::new();
    let id = registry.rescan(&dom).added[0];
    let mut tracker = PositionTracker::new();
    tracker.refresh(&dom, &mut registry, None);

    dom.remove_node(1);
    let outcome = registry.rescan(&dom);
    tracker.forget(&outcome.retired);

    assert_eq!(tracker.get(id), None);
    assert!(tracker.refresh(&dom, &mut registry, None).is_empty());
    assert_eq!(tracker.tracked_count(), 0);
}

#[test]
fn detached_node_mid_read_is_a_transient_miss() {
    let dom = MockDom::new();
    dom.add_image(1, rect(0.0));
    let mut registry = ElementRegistry::new();
    let id = registry.rescan(&dom).added[0];
    let mut tracker = PositionTracker::new();
    tracker.refresh(&dom, &mut registry, None);

    // The node vanishes between the scan and the refresh. No rescan has run
    // yet, so the registry still tracks it; the read is skipped and the
    // cached box survives.
    dom.remove_node(1);
    assert!(tracker.refresh(&dom, &mut registry, None).is_empty());
    assert_eq!(tracker.get(id), Some(rect(0.0)));

    // The node comes back at a new position; the next refresh picks it up.
    dom.add_image(1, rect(300.0));
    let changed = tracker.refresh(&dom, &mut registry, None);
    assert_eq!(changed, vec![id]);
}

#[test]
fn partial_refresh_only_touches_requested_ids() {
    let dom = MockDom::new();
    dom.add_image(1, rect(0.0));
    dom.add_image(2, rect(100.0));
    let mut registry = ElementRegistry::new();
    let ids = registry.rescan(&dom).added;
    let mut tracker = PositionTracker::new();
    tracker.refresh(&dom, &mut registry, None);

    dom.set_rect(1, rect(700.0));
    dom.set_rect(2, rect(800.0));
    let changed = tracker.refresh(&dom, &mut registry, Some(&ids[..1]));
    assert_eq!(changed, vec![ids[0]]);
    // The unrequested id still holds its stale box until its own refresh.
    assert_eq!(tracker.get(ids[1]), Some(rect(100.0)));
}
