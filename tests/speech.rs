use page_narrator::speech::{SpeechController, SpeechEvent};

use mock_dom::{DeniedSpeech, RecordingSpeech, SpeechCall};

fn controller() -> (SpeechController, RecordingSpeech) {
    let engine = RecordingSpeech::default();
    (SpeechController::new(Box::new(engine.clone())), engine)
}

#[test]
fn a_new_utterance_cancels_the_active_one() {
    let (mut speech, engine) = controller();
    speech.speak("a");
    speech.speak("b");

    let calls = engine.calls();
    assert_eq!(
        calls,
        vec![
            SpeechCall::Speak {
                text: "a".into(),
                token: 1
            },
            SpeechCall::CancelUtterance,
            SpeechCall::Speak {
                text: "b".into(),
                token: 2
            },
        ]
    );
    assert!(speech.is_speaking());

    // The cancelled utterance's end event is stale and changes nothing.
    speech.on_event(SpeechEvent::UtteranceEnded { token: 1 });
    assert!(speech.is_speaking());
    speech.on_event(SpeechEvent::UtteranceEnded { token: 2 });
    assert!(!speech.is_speaking());
}

#[test]
fn stop_speaking_is_idempotent() {
    let (mut speech, engine) = controller();
    speech.stop_speaking();
    assert!(engine.calls().is_empty());

    speech.speak("hello");
    speech.stop_speaking();
    speech.stop_speaking();
    let cancels = engine
        .calls()
        .into_iter()
        .filter(|c| *c == SpeechCall::CancelUtterance)
        .count();
    assert_eq!(cancels, 1);
    assert!(!speech.is_speaking());
}

#[test]
fn restarting_recognition_cancels_the_prior_session() {
    let (mut speech, engine) = controller();
    speech.start_listening();
    speech.start_listening();

    assert_eq!(
        engine.calls(),
        vec![
            SpeechCall::Listen { token: 1 },
            SpeechCall::CancelRecognition,
            SpeechCall::Listen { token: 2 },
        ]
    );
    assert!(speech.is_listening());
}

#[test]
fn transcripts_track_the_current_session_only() {
    let (mut speech, _engine) = controller();
    speech.start_listening();
    speech.on_event(SpeechEvent::Transcript {
        token: 1,
        text: "turn on".into(),
        is_final: false,
    });
    assert_eq!(speech.transcript(), "turn on");

    // A transcript from a dead session is ignored.
    speech.on_event(SpeechEvent::Transcript {
        token: 99,
        text: "garbage".into(),
        is_final: true,
    });
    assert_eq!(speech.transcript(), "turn on");

    speech.on_event(SpeechEvent::Transcript {
        token: 1,
        text: "turn on the light".into(),
        is_final: true,
    });
    assert_eq!(speech.transcript(), "turn on the light");

    speech.on_event(SpeechEvent::RecognitionEnded { token: 1 });
    assert!(!speech.is_listening());
}

#[test]
fn synthesis_and_recognition_are_independent() {
    let (mut speech, _engine) = controller();
    speech.start_listening();
    speech.speak("status report");
    assert!(speech.is_listening());
    assert!(speech.is_speaking());

    speech.stop_speaking();
    assert!(speech.is_listening());
}

#[test]
fn denied_engine_degrades_to_a_silent_no_op() {
    let mut speech = SpeechController::new(Box::new(DeniedSpeech));
    speech.speak("anything");
    assert!(!speech.is_speaking());
    speech.start_listening();
    assert!(!speech.is_listening());
    // Stops on a degraded controller are harmless.
    speech.stop_speaking();
    speech.stop_listening();
}

#[test]
fn shutdown_silences_both_session_kinds() {
    let (mut speech, engine) = controller();
    speech.speak("a");
    speech.start_listening();
    speech.shutdown();
    assert!(!speech.is_speaking());
    assert!(!speech.is_listening());
    let calls = engine.calls();
    assert!(calls.contains(&SpeechCall::CancelUtterance));
    assert!(calls.contains(&SpeechCall::CancelRecognition));
}
