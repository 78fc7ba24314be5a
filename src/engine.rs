use crate::bridge::EngineMessage;
use crate::describe::{DescribeCoordinator, DescribeStatus};
use crate::dom::DomAdapter;
use crate::navigation::{NavEffect, NavKey, Navigator};
use crate::overlay::{build_frame, plan_frame, OverlayFrame};
use crate::provider::DescriptionProvider;
use crate::registry::{ElementId, ElementKind, ElementRegistry};
use crate::settings::Settings;
use crate::shortcut::KeyEvent;
use crate::speech::{SpeechController, SpeechEngine, SpeechEvent};
use crate::tracker::PositionTracker;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Snapshot of engine state for the popup UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatus {
    pub global_mode: bool,
    pub describable: usize,
    pub focusable: usize,
    pub speaking: bool,
    pub listening: bool,
    pub tts_enabled: bool,
    pub contrast_fix: bool,
}

/// The in-page accessibility engine: one owned context holding the element
/// registry, position tracker, overlay state, navigation, description
/// coordinator and speech controller. Instances are independent; nothing
/// here is process-global.
///
/// All entry points run on the host's single UI thread. The only
/// asynchronous work is description requests (worker threads reporting back
/// through the coordinator's channel) and speech callbacks; both re-validate
/// their target against current state before anything is applied.
pub struct Engine<D: DomAdapter> {
    dom: D,
    settings: Settings,
    registry: ElementRegistry,
    tracker: PositionTracker,
    nav: Navigator,
    describe: DescribeCoordinator,
    speech: SpeechController,
    provider: Arc<dyn DescriptionProvider>,
    applied: OverlayFrame,
    shut_down: bool,
}

impl<D: DomAdapter> Engine<D> {
    /// Attach to the document, run the initial scan and restore persisted
    /// toggles. Fails only when the document cannot be attached to at all;
    /// the caller logs that once and gives up rather than surfacing an
    /// error dialog.
    pub fn attach(
        dom: D,
        settings: Settings,
        provider: Arc<dyn DescriptionProvider>,
        speech_engine: Box<dyn SpeechEngine>,
    ) -> anyhow::Result<Self> {
        if !dom.document_ready() {
            anyhow::bail!("document is not ready, engine cannot attach");
        }
        let mut engine = Self {
            dom,
            settings,
            registry: ElementRegistry::new(),
            tracker: PositionTracker::new(),
            nav: Navigator::new(),
            describe: DescribeCoordinator::new(),
            speech: SpeechController::new(speech_engine),
            provider,
            applied: OverlayFrame::empty(),
            shut_down: false,
        };
        if engine.settings.contrast_fix {
            engine.dom.set_contrast_fix(true);
        }
        engine.rescan_now();
        if engine.settings.global_mode {
            let effect = engine.nav.activate(&engine.registry);
            engine.apply_nav_effect(effect);
            engine.rerender();
        }
        Ok(engine)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &ElementRegistry {
        &self.registry
    }

    pub fn is_global_mode(&self) -> bool {
        self.nav.is_active()
    }

    pub fn focused(&self) -> Option<ElementId> {
        self.nav.focused()
    }

    pub fn describe_status(&self, id: ElementId) -> &DescribeStatus {
        self.describe.status(id)
    }

    pub fn overlay_frame(&self) -> &OverlayFrame {
        &self.applied
    }

    /// Replace the settings snapshot wholesale. Field-by-field mutation is
    /// deliberately not offered; partial updates cannot race a reader this
    /// way.
    pub fn replace_settings(&mut self, next: Settings) {
        if next.contrast_fix != self.settings.contrast_fix {
            self.dom.set_contrast_fix(next.contrast_fix);
        }
        if !next.tts_enabled && self.settings.tts_enabled {
            self.speech.stop_speaking();
        }
        self.settings = next;
    }

    /// Record a DOM mutation burst; the actual rescan happens on a later
    /// tick once the quiet window elapses.
    pub fn on_mutation(&mut self, now: Instant) {
        if self.shut_down {
            return;
        }
        self.registry.note_mutation(now);
    }

    pub fn on_scroll(&mut self) {
        self.refresh_positions();
    }

    pub fn on_resize(&mut self) {
        self.refresh_positions();
    }

    fn refresh_positions(&mut self) {
        if self.shut_down {
            return;
        }
        let changed = self.tracker.refresh(&self.dom, &mut self.registry, None);
        if !changed.is_empty() {
            self.rerender();
        }
    }

    /// Drive the debounce clock and apply any asynchronous completions.
    pub fn tick(&mut self, now: Instant) {
        if self.shut_down {
            return;
        }
        if self.registry.take_due_rescan(now) {
            self.rescan_now();
        }
        let finished = self.describe.drain(&self.registry, now);
        if finished.is_empty() {
            return;
        }
        if self.settings.tts_enabled {
            for id in &finished {
                if let DescribeStatus::Done(text) = self.describe.status(*id) {
                    let text = text.clone();
                    self.speech.speak(&text);
                }
            }
        }
        self.rerender();
    }

    /// Reconcile the registry against the live document and propagate the
    /// retired set into every dependent cache.
    pub fn rescan_now(&mut self) {
        let outcome = self.registry.rescan(&self.dom);
        if !outcome.retired.is_empty() {
            self.tracker.forget(&outcome.retired);
            self.describe.invalidate(&outcome.retired);
        }
        // Focus survives or moves to the nearest successor; no scrolling on
        // background mutations.
        self.nav.resync(&self.registry);
        self.tracker.refresh(&self.dom, &mut self.registry, None);
        self.rerender();
    }

    /// Interpret one keyboard event. Returns true when the engine consumed
    /// it and the host should suppress default handling.
    pub fn handle_key(&mut self, event: &KeyEvent) -> bool {
        if self.shut_down {
            return false;
        }
        if self
            .settings
            .global_mode_chord()
            .is_some_and(|c| c.matches(event))
        {
            self.toggle_global_mode();
            return true;
        }
        if self.settings.tts_chord().is_some_and(|c| c.matches(event)) {
            self.toggle_tts();
            return true;
        }
        if self
            .settings
            .stop_speech_chord()
            .is_some_and(|c| c.matches(event))
        {
            self.speech.stop_speaking();
            return true;
        }

        if !self.nav.is_active() {
            return false;
        }
        let Some(key) = nav_key(event) else {
            return false;
        };
        let effect = self.nav.handle_key(key);
        self.apply_nav_effect(effect);
        self.rerender();
        true
    }

    /// Handle a command from the popup/background.
    pub fn handle_message(&mut self, msg: &EngineMessage) {
        if self.shut_down {
            return;
        }
        match msg {
            EngineMessage::ToggleGlobalMode => self.toggle_global_mode(),
            EngineMessage::ToggleTts => self.toggle_tts(),
            EngineMessage::ToggleStt => self.speech.toggle_listening(),
            EngineMessage::ToggleContrast => {
                let next = Settings {
                    contrast_fix: !self.settings.contrast_fix,
                    ..self.settings.clone()
                };
                self.replace_settings(next);
            }
            EngineMessage::SetApiKeys(keys) => {
                let next = Settings {
                    api_keys: keys.clone(),
                    ..self.settings.clone()
                };
                self.replace_settings(next);
            }
            EngineMessage::SetActiveProfile(profile) => {
                let next = Settings {
                    active_profile: profile.clone(),
                    ..self.settings.clone()
                };
                self.replace_settings(next);
            }
            EngineMessage::OpenOptions => {
                tracing::debug!("open-options message has no engine effect");
            }
        }
    }

    fn toggle_global_mode(&mut self) {
        let effect = self.nav.toggle(&self.registry);
        self.apply_nav_effect(effect);
        let next = Settings {
            global_mode: self.nav.is_active(),
            ..self.settings.clone()
        };
        self.replace_settings(next);
        self.rerender();
    }

    fn toggle_tts(&mut self) {
        let next = Settings {
            tts_enabled: !self.settings.tts_enabled,
            ..self.settings.clone()
        };
        self.replace_settings(next);
    }

    fn apply_nav_effect(&mut self, effect: NavEffect) {
        match effect {
            NavEffect::FocusMoved(id) => {
                if let Some(node) = self.registry.node_of(id) {
                    self.dom.scroll_into_view(node);
                }
            }
            NavEffect::Activate(id) => {
                if let Some(node) = self.registry.node_of(id) {
                    self.dom.activate(node);
                }
            }
            NavEffect::Exited | NavEffect::None => {}
        }
    }

    /// A describe button was pressed. At-most-one in-flight call per
    /// element and cache hits are the coordinator's concern.
    pub fn on_describe_pressed(&mut self, id: ElementId) {
        if self.shut_down || !self.registry.contains(id) {
            return;
        }
        let image = self
            .registry
            .node_of(id)
            .and_then(|node| self.dom.fetch_image(node));
        let credential = self.settings.active_credential().map(str::to_string);
        self.describe
            .request(id, image, credential, Arc::clone(&self.provider));
        self.rerender();
    }

    pub fn on_speech_event(&mut self, event: SpeechEvent) {
        if self.shut_down {
            return;
        }
        self.speech.on_event(event);
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            global_mode: self.nav.is_active(),
            describable: self
                .registry
                .elements_of_kind(ElementKind::Describable)
                .count(),
            focusable: self
                .registry
                .elements_of_kind(ElementKind::Focusable)
                .count(),
            speaking: self.speech.is_speaking(),
            listening: self.speech.is_listening(),
            tts_enabled: self.settings.tts_enabled,
            contrast_fix: self.settings.contrast_fix,
        }
    }

    /// Tear the engine down: silence speech, stop applying async results,
    /// unmount every overlay control and undo the contrast fix. Idempotent;
    /// after this nothing writes to the registry.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.nav.deactivate();
        self.describe.shutdown();
        self.speech.shutdown();
        let empty = OverlayFrame::empty();
        for op in plan_frame(&self.applied, &empty) {
            self.dom.apply_overlay(&op);
        }
        self.applied = empty;
        if self.settings.contrast_fix {
            self.dom.set_contrast_fix(false);
        }
        self.shut_down = true;
        tracing::debug!("engine shut down");
    }

    fn rerender(&mut self) {
        let next = build_frame(&self.registry, &self.tracker, &self.describe, self.nav.focused());
        for op in plan_frame(&self.applied, &next) {
            self.dom.apply_overlay(&op);
        }
        self.applied = next;
    }
}

fn nav_key(event: &KeyEvent) -> Option<NavKey> {
    match event.key.to_ascii_lowercase().as_str() {
        "tab" => Some(if event.shift {
            NavKey::ShiftTab
        } else {
            NavKey::Tab
        }),
        "enter" => Some(NavKey::Enter),
        "escape" | "esc" => Some(NavKey::Escape),
        _ => None,
    }
}
