use page_narrator::dom::PageRect;
use page_narrator::navigation::{NavEffect, NavKey, Navigator};
use page_narrator::registry::ElementRegistry;

use mock_dom::MockDom;

fn rect(top: f32) -> PageRect {
    PageRect::new(0.0, top, 100.0, top + 30.0)
}

fn page_with_buttons(nodes: &[u64]) -> (MockDom, ElementRegistry) {
    let dom = MockDom::new();
    for &n in nodes {
        dom.add_button(n, rect(n as f32 * 40.0));
    }
    let mut registry = ElementRegistry::new();
    registry.rescan(&dom);
    (dom, registry)
}

#[test]
fn entering_global_mode_focuses_the_first_focusable() {
    let dom = MockDom::new();
    for n in 0..3 {
        dom.add_image(n, rect(n as f32 * 60.0));
    }
    for n in 10..15 {
        dom.add_button(n, rect(n as f32 * 40.0));
    }
    let mut registry = ElementRegistry::new();
    registry.rescan(&dom);

    let mut nav = Navigator::new();
    let NavEffect::FocusMoved(first) = nav.activate(&registry) else {
        panic!("expected initial focus");
    };
    assert_eq!(registry.node_of(first).unwrap().0, 10);

    // Five focusable controls: five Tab presses land back on the first.
    for _ in 0..5 {
        nav.handle_key(NavKey::Tab);
    }
    assert_eq!(nav.focused(), Some(first));
}

#[test]
fn shift_tab_from_the_first_wraps_to_the_last() {
    let (_dom, registry) = page_with_buttons(&[1, 2, 3]);
    let mut nav = Navigator::new();
    nav.activate(&registry);

    let NavEffect::FocusMoved(last) = nav.handle_key(NavKey::ShiftTab) else {
        panic!("expected focus move");
    };
    assert_eq!(registry.node_of(last).unwrap().0, 3);
}

#[test]
fn retiring_the_focused_element_moves_focus_to_its_successor() {
    let (dom, mut registry) = page_with_buttons(&[1, 2, 3]);
    let mut nav = Navigator::new();
    nav.activate(&registry);
    nav.handle_key(NavKey::Tab); // focus node 2

    dom.remove_node(2);
    registry.rescan(&dom);
    let effect = nav.resync(&registry);

    let focused = nav.focused().expect("focus should survive resync");
    assert_eq!(registry.node_of(focused).unwrap().0, 3);
    assert_eq!(effect, NavEffect::FocusMoved(focused));
    assert!(nav.is_active());
}

#[test]
fn retiring_the_last_focused_element_falls_back_to_a_predecessor() {
    let (dom, mut registry) = page_with_buttons(&[1, 2, 3]);
    let mut nav = Navigator::new();
    nav.activate(&registry);
    nav.handle_key(NavKey::Tab);
    nav.handle_key(NavKey::Tab); // focus node 3

    dom.remove_node(3);
    registry.rescan(&dom);
    nav.resync(&registry);

    let focused = nav.focused().expect("focus should fall back");
    assert_eq!(registry.node_of(focused).unwrap().0, 2);
}

#[test]
fn focus_index_follows_the_surviving_element_when_others_leave() {
    let (dom, mut registry) = page_with_buttons(&[1, 2, 3]);
    let mut nav = Navigator::new();
    nav.activate(&registry);
    nav.handle_key(NavKey::Tab); // focus node 2
    let focused = nav.focused().unwrap();

    dom.remove_node(1);
    registry.rescan(&dom);
    nav.resync(&registry);

    // Same element keeps focus even though its index changed.
    assert_eq!(nav.focused(), Some(focused));
}

#[test]
fn emptied_sequence_clears_focus_but_keeps_mode_active() {
    let (dom, mut registry) = page_with_buttons(&[1]);
    let mut nav = Navigator::new();
    nav.activate(&registry);
    assert!(nav.focused().is_some());

    dom.remove_node(1);
    registry.rescan(&dom);
    assert_eq!(nav.resync(&registry), NavEffect::None);
    assert_eq!(nav.focused(), None);
    assert!(nav.is_active());

    // Keys on an empty sequence do nothing but Escape still exits.
    assert_eq!(nav.handle_key(NavKey::Tab), NavEffect::None);
    assert_eq!(nav.handle_key(NavKey::Escape), NavEffect::Exited);
}

#[test]
fn keys_are_ignored_while_inactive() {
    let (_dom, _registry) = page_with_buttons(&[1, 2]);
    let mut nav = Navigator::new();
    assert_eq!(nav.handle_key(NavKey::Tab), NavEffect::None);
    assert_eq!(nav.handle_key(NavKey::Enter), NavEffect::None);
    assert_eq!(nav.focused(), None);
}
