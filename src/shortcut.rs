/// Non-modifier part of a shortcut chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChordKey {
    Char(char),
    Tab,
    Enter,
    Escape,
}

/// A keyboard chord like `Alt+A`, as configured in the settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortcut {
    pub key: ChordKey,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

/// A key event as reported by the host page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    /// Key name: a single character, or `Tab`/`Enter`/`Escape`.
    pub key: String,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl KeyEvent {
    pub fn plain(key: &str) -> Self {
        Self {
            key: key.to_string(),
            ctrl: false,
            shift: false,
            alt: false,
        }
    }

    pub fn alt(key: &str) -> Self {
        Self {
            alt: true,
            ..Self::plain(key)
        }
    }

    pub fn shift(key: &str) -> Self {
        Self {
            shift: true,
            ..Self::plain(key)
        }
    }

    fn chord_key(&self) -> Option<ChordKey> {
        parse_key(&self.key.trim().to_ascii_uppercase())
    }
}

impl Shortcut {
    pub fn matches(&self, event: &KeyEvent) -> bool {
        event.chord_key() == Some(self.key)
            && event.ctrl == self.ctrl
            && event.shift == self.shift
            && event.alt == self.alt
    }
}

/// Parse a shortcut string like `Alt+Shift+A` into a [`Shortcut`].
pub fn parse_shortcut(s: &str) -> Option<Shortcut> {
    let mut ctrl = false;
    let mut shift = false;
    let mut alt = false;
    let mut key: Option<ChordKey> = None;

    for part in s.split('+') {
        let upper = part.trim().to_ascii_uppercase();
        match upper.as_str() {
            "CTRL" | "CONTROL" => ctrl = true,
            "SHIFT" => shift = true,
            "ALT" => alt = true,
            "" => {}
            _ => match parse_key(&upper) {
                Some(k) => key = Some(k),
                None => return None,
            },
        }
    }

    key.map(|k| Shortcut {
        key: k,
        ctrl,
        shift,
        alt,
    })
}

fn parse_key(upper: &str) -> Option<ChordKey> {
    match upper {
        "TAB" => Some(ChordKey::Tab),
        "ENTER" | "RETURN" => Some(ChordKey::Enter),
        "ESC" | "ESCAPE" => Some(ChordKey::Escape),
        _ if upper.chars().count() == 1 => {
            let c = upper.chars().next()?;
            if c.is_ascii_alphanumeric() {
                Some(ChordKey::Char(c))
            } else {
                None
            }
        }
        _ => None,
    }
}
