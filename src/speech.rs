use std::fmt;

/// Speech stack failure. The feature degrades to a logged no-op; it never
/// breaks page interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechError {
    Unavailable,
    PermissionDenied,
}

impl fmt::Display for SpeechError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpeechError::Unavailable => write!(f, "speech engine unavailable"),
            SpeechError::PermissionDenied => write!(f, "speech permission denied"),
        }
    }
}

/// Host speech stack seam. Calls are fire-and-forget; outcomes come back as
/// [`SpeechEvent`]s tagged with the token the session was started with.
pub trait SpeechEngine: Send {
    fn start_utterance(&self, text: &str, token: u64) -> Result<(), SpeechError>;
    fn cancel_utterance(&self);
    fn start_recognition(&self, token: u64) -> Result<(), SpeechError>;
    fn cancel_recognition(&self);
}

/// Engine callbacks. Events whose token no longer matches the current
/// session are stale and ignored.
#[derive(Debug, Clone, PartialEq)]
pub enum SpeechEvent {
    UtteranceEnded { token: u64 },
    UtteranceFailed { token: u64, error: SpeechError },
    Transcript { token: u64, text: String, is_final: bool },
    RecognitionEnded { token: u64 },
}

/// At most one active utterance and one active recognition session.
///
/// `speak` is latest-wins: a new request cancels the active utterance and
/// starts immediately; there is no FIFO queue. All stop operations are
/// idempotent.
pub struct SpeechController {
    engine: Box<dyn SpeechEngine>,
    speaking: Option<u64>,
    listening: Option<u64>,
    partial_transcript: String,
    final_transcript: String,
    next_token: u64,
}

impl SpeechController {
    pub fn new(engine: Box<dyn SpeechEngine>) -> Self {
        Self {
            engine,
            speaking: None,
            listening: None,
            partial_transcript: String::new(),
            final_transcript: String::new(),
            next_token: 0,
        }
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking.is_some()
    }

    pub fn is_listening(&self) -> bool {
        self.listening.is_some()
    }

    pub fn transcript(&self) -> &str {
        if self.partial_transcript.is_empty() {
            &self.final_transcript
        } else {
            &self.partial_transcript
        }
    }

    fn fresh_token(&mut self) -> u64 {
        self.next_token += 1;
        self.next_token
    }

    /// Speak `text`, cancelling any active utterance first so audio never
    /// overlaps.
    pub fn speak(&mut self, text: &str) {
        if self.speaking.is_some() {
            self.engine.cancel_utterance();
            self.speaking = None;
        }
        let token = self.fresh_token();
        match self.engine.start_utterance(text, token) {
            Ok(()) => self.speaking = Some(token),
            Err(err) => {
                tracing::warn!(error = %err, "speech synthesis unavailable, staying silent");
            }
        }
    }

    /// Cancel any active or pending utterance. No-op when nothing speaks.
    pub fn stop_speaking(&mut self) {
        if self.speaking.take().is_some() {
            self.engine.cancel_utterance();
        }
    }

    /// Start a recognition session, cancelling a prior one first so capture
    /// never overlaps.
    pub fn start_listening(&mut self) {
        if self.listening.is_some() {
            self.engine.cancel_recognition();
            self.listening = None;
        }
        self.partial_transcript.clear();
        self.final_transcript.clear();
        let token = self.fresh_token();
        match self.engine.start_recognition(token) {
            Ok(()) => self.listening = Some(token),
            Err(err) => {
                tracing::warn!(error = %err, "speech recognition unavailable");
            }
        }
    }

    /// Stop the recognition session. No-op when nothing listens.
    pub fn stop_listening(&mut self) {
        if self.listening.take().is_some() {
            self.engine.cancel_recognition();
        }
    }

    pub fn toggle_listening(&mut self) {
        if self.is_listening() {
            self.stop_listening();
        } else {
            self.start_listening();
        }
    }

    /// Apply a host speech callback, ignoring anything stale.
    pub fn on_event(&mut self, event: SpeechEvent) {
        match event {
            SpeechEvent::UtteranceEnded { token } => {
                if self.speaking == Some(token) {
                    self.speaking = None;
                }
            }
            SpeechEvent::UtteranceFailed { token, error } => {
                if self.speaking == Some(token) {
                    tracing::warn!(error = %error, "utterance failed");
                    self.speaking = None;
                }
            }
            SpeechEvent::Transcript {
                token,
                text,
                is_final,
            } => {
                if self.listening == Some(token) {
                    if is_final {
                        self.final_transcript = text;
                        self.partial_transcript.clear();
                    } else {
                        self.partial_transcript = text;
                    }
                }
            }
            SpeechEvent::RecognitionEnded { token } => {
                if self.listening == Some(token) {
                    self.listening = None;
                }
            }
        }
    }

    /// Silence both kinds of session. Used on engine teardown.
    pub fn shutdown(&mut self) {
        self.stop_speaking();
        self.stop_listening();
    }
}
