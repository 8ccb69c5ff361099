use crate::error::{ExpanderError, Result};
use enigo::{Direction, Enigo, Key, Keyboard, Settings};
use rdev::{self, Key as RdevKey};
use std::thread;
use std::time::Duration;

/// Keys that trigger an expansion attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Space,
    Return,
    Tab,
}

impl Delimiter {
    pub fn from_key(key: &RdevKey) -> Option<Self> {
        match key {
            RdevKey::Space => Some(Delimiter::Space),
            RdevKey::Return | RdevKey::KpReturn => Some(Delimiter::Return),
            RdevKey::Tab => Some(Delimiter::Tab),
            _ => None,
        }
    }

    /// Character the delimiter inserts into a text field
    pub fn as_char(self) -> char {
        match self {
            Delimiter::Space => ' ',
            Delimiter::Return => '\n',
            Delimiter::Tab => '\t',
        }
    }

    /// Tab usually moves focus to the next control
    pub fn moves_focus(self) -> bool {
        self == Delimiter::Tab
    }

    pub fn enigo_key(self) -> Key {
        match self {
            Delimiter::Space => Key::Space,
            Delimiter::Return => Key::Return,
            Delimiter::Tab => Key::Tab,
        }
    }
}

/// Keys after which the caret position is no longer known
pub fn is_caret_motion(key: &RdevKey) -> bool {
    matches!(
        key,
        RdevKey::LeftArrow
            | RdevKey::RightArrow
            | RdevKey::UpArrow
            | RdevKey::DownArrow
            | RdevKey::Home
            | RdevKey::End
            | RdevKey::PageUp
            | RdevKey::PageDown
            | RdevKey::Escape
    )
}

pub fn is_modifier(key: &RdevKey) -> bool {
    matches!(
        key,
        RdevKey::ControlLeft
            | RdevKey::ControlRight
            | RdevKey::MetaLeft
            | RdevKey::MetaRight
            | RdevKey::Alt
    )
}

/// Character a key press types, taken from the event's layout-aware name
pub fn rdev_key_to_char(event: &rdev::Event) -> Option<char> {
    let name = event.name.as_deref()?;
    let mut chars = name.chars();
    let c = chars.next()?;
    if chars.next().is_some() || c.is_control() {
        return None;
    }
    Some(c)
}

/// Create a keyboard controller
pub fn create_keyboard_controller() -> Result<Enigo> {
    Enigo::new(&Settings::default()).map_err(|err| {
        ExpanderError::Enigo(format!("Failed to create keyboard controller: {}", err))
    })
}

/// Type text using the keyboard controller
pub fn type_text(keyboard: &mut impl Keyboard, text: &str) -> Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    keyboard
        .text(text)
        .map_err(|err| ExpanderError::Enigo(format!("Failed to type text: {}", err)))
}

/// Click a single key
pub fn press_key(keyboard: &mut impl Keyboard, key: Key) -> Result<()> {
    keyboard
        .key(key, Direction::Click)
        .map_err(|err| ExpanderError::Enigo(format!("Failed to press {:?}: {}", key, err)))
}

/// Send backspace key presses
pub fn send_backspace(keyboard: &mut impl Keyboard, count: usize) -> Result<()> {
    for _ in 0..count {
        thread::sleep(Duration::from_millis(2));
        keyboard
            .key(Key::Backspace, Direction::Click)
            .map_err(|err| ExpanderError::Enigo(format!("Failed to send backspace: {}", err)))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn key_event(key: RdevKey, name: Option<&str>) -> rdev::Event {
        rdev::Event {
            time: SystemTime::now(),
            name: name.map(str::to_string),
            event_type: rdev::EventType::KeyPress(key),
        }
    }

    #[test]
    fn test_delimiters() {
        assert_eq!(Delimiter::from_key(&RdevKey::Space), Some(Delimiter::Space));
        assert_eq!(Delimiter::from_key(&RdevKey::Return), Some(Delimiter::Return));
        assert_eq!(Delimiter::from_key(&RdevKey::KpReturn), Some(Delimiter::Return));
        assert_eq!(Delimiter::from_key(&RdevKey::Tab), Some(Delimiter::Tab));
        assert_eq!(Delimiter::from_key(&RdevKey::KeyA), None);
        assert_eq!(Delimiter::Return.as_char(), '\n');
        assert!(Delimiter::Tab.moves_focus());
        assert!(!Delimiter::Space.moves_focus());
    }

    #[test]
    fn test_key_to_char_uses_event_name() {
        assert_eq!(
            rdev_key_to_char(&key_event(RdevKey::SemiColon, Some(":"))),
            Some(':')
        );
        assert_eq!(rdev_key_to_char(&key_event(RdevKey::KeyE, Some("é"))), Some('é'));
    }

    #[test]
    fn test_key_to_char_skips_unnamed_and_control_keys() {
        assert_eq!(rdev_key_to_char(&key_event(RdevKey::ShiftLeft, None)), None);
        assert_eq!(
            rdev_key_to_char(&key_event(RdevKey::Backspace, Some("\u{8}"))),
            None
        );
        assert_eq!(rdev_key_to_char(&key_event(RdevKey::KeyA, Some("ab"))), None);
    }

    #[test]
    fn test_caret_motion_keys() {
        assert!(is_caret_motion(&RdevKey::LeftArrow));
        assert!(!is_caret_motion(&RdevKey::KeyA));
        assert!(is_modifier(&RdevKey::MetaLeft));
    }
}
