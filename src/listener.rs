use crate::config::{LISTENER_MAX_RETRIES, LISTENER_RETRY_DELAY};
use crate::engine::{Expander, Outcome};
use crate::error::ExpanderError;
use crate::keyboard::{is_caret_motion, is_modifier, rdev_key_to_char, Delimiter};
use crate::mirror::{KeystrokeMirror, KeystrokeSink};
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use rdev::{self, EventType, Key as RdevKey};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Feeds global key events into the mirror and the expander
pub struct KeyEventHandler<S: KeystrokeSink> {
    expander: Arc<Expander>,
    mirror: KeystrokeMirror<S>,
    modifiers_held: Vec<RdevKey>,
}

impl<S: KeystrokeSink> KeyEventHandler<S> {
    pub fn new(expander: Arc<Expander>, mirror: KeystrokeMirror<S>) -> Self {
        Self {
            expander,
            mirror,
            modifiers_held: Vec::new(),
        }
    }

    pub fn mirror(&self) -> &KeystrokeMirror<S> {
        &self.mirror
    }

    pub fn handle(&mut self, event: &rdev::Event) {
        match event.event_type {
            EventType::KeyPress(key) if is_modifier(&key) => {
                if !self.modifiers_held.contains(&key) {
                    self.modifiers_held.push(key);
                }
                return;
            }
            EventType::KeyRelease(key) if is_modifier(&key) => {
                self.modifiers_held.retain(|held| *held != key);
                return;
            }
            _ => {}
        }

        // Echoes of our own injection cannot be told apart from real typing,
        // so anything seen in the window makes the typed text unknown
        if self.mirror.is_suppressed(Instant::now()) {
            if matches!(
                event.event_type,
                EventType::KeyPress(_) | EventType::ButtonPress(_)
            ) {
                self.mirror.reset();
            }
            return;
        }

        match event.event_type {
            EventType::KeyPress(key) => self.key_press(key, event),
            EventType::ButtonPress(_) => self.mirror.reset(),
            _ => {}
        }
    }

    fn key_press(&mut self, key: RdevKey, event: &rdev::Event) {
        // Shortcuts such as paste or select-all change the field in ways
        // the mirror cannot follow
        if !self.modifiers_held.is_empty() {
            self.mirror.reset();
            return;
        }

        if let Some(delimiter) = Delimiter::from_key(&key) {
            self.mirror.begin_delimiter(delimiter);
            if let Outcome::Expanded(edit) = self.expander.on_delimiter(&mut self.mirror) {
                debug!("Expanded snippet on {:?}; caret at {}", delimiter, edit.caret);
            }
            self.mirror.finish_delimiter();
            return;
        }

        match key {
            RdevKey::Backspace => self.mirror.observe_backspace(),
            _ if is_caret_motion(&key) => self.mirror.reset(),
            _ => {
                if let Some(c) = rdev_key_to_char(event) {
                    self.mirror.observe_char(c);
                }
            }
        }
    }
}

/// Starts listening for keyboard events and handles text expansion
pub fn start_keyboard_listener(expander: Arc<Expander>, running: Arc<AtomicBool>) -> JoinHandle<()> {
    thread::spawn(move || {
        let handler = Arc::new(Mutex::new(KeyEventHandler::new(
            expander,
            KeystrokeMirror::new(),
        )));

        let callback = {
            let running = Arc::clone(&running);
            move |event: rdev::Event| {
                if !running.load(Ordering::SeqCst) {
                    return;
                }
                handler.lock().handle(&event);
            }
        };

        // Start a retry loop for the keyboard listener
        let mut retry_count = 0;
        while running.load(Ordering::SeqCst) && retry_count < LISTENER_MAX_RETRIES {
            info!("Listening for delimiter keys (space, return, tab)");
            match rdev::listen(callback.clone()) {
                // listen() blocks, so returning means the hook was removed
                Ok(()) => break,
                Err(e) => {
                    retry_count += 1;
                    let err = ExpanderError::Listener(format!("{:?}", e));
                    warn!("{}; retrying ({}/{})", err, retry_count, LISTENER_MAX_RETRIES);
                    thread::sleep(LISTENER_RETRY_DELAY);
                }
            }
        }

        if retry_count >= LISTENER_MAX_RETRIES {
            error!(
                "Failed to start keyboard listener after {} attempts",
                LISTENER_MAX_RETRIES
            );
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::mirror::ECHO_WINDOW;
    use crate::models::SharedTable;
    use pretty_assertions::assert_eq;
    use std::time::{Duration, SystemTime};

    #[derive(Default)]
    struct RecordingSink {
        keys: Vec<String>,
    }

    impl RecordingSink {
        fn injections(&self) -> usize {
            self.keys.iter().filter(|key| key.starts_with("<bs")).count()
        }
    }

    impl KeystrokeSink for RecordingSink {
        fn backspace(&mut self, count: usize) -> Result<()> {
            self.keys.push(format!("<bs x{}>", count));
            Ok(())
        }

        fn type_text(&mut self, text: &str) -> Result<()> {
            self.keys.push(text.to_string());
            Ok(())
        }

        fn press(&mut self, delimiter: Delimiter) -> Result<()> {
            self.keys.push(format!("<{:?}>", delimiter));
            Ok(())
        }
    }

    fn handler() -> KeyEventHandler<RecordingSink> {
        KeyEventHandler::new(
            Arc::new(Expander::new(SharedTable::default())),
            KeystrokeMirror::with_sink(RecordingSink::default()),
        )
    }

    fn event(event_type: EventType, name: Option<&str>) -> rdev::Event {
        rdev::Event {
            time: SystemTime::now(),
            name: name.map(str::to_string),
            event_type,
        }
    }

    fn type_str(handler: &mut KeyEventHandler<RecordingSink>, text: &str) {
        for c in text.chars() {
            let key = match c {
                ' ' => RdevKey::Space,
                '\t' => RdevKey::Tab,
                _ => RdevKey::KeyA,
            };
            let name = c.to_string();
            handler.handle(&event(EventType::KeyPress(key), Some(&name)));
        }
    }

    fn wait_out_echo_window() {
        thread::sleep(ECHO_WINDOW + Duration::from_millis(50));
    }

    #[test]
    fn test_typed_trigger_expands_on_space() {
        let mut handler = handler();
        type_str(&mut handler, ":party: ");

        assert_eq!(handler.mirror().sink().injections(), 1);
        assert_eq!(handler.mirror().text(), "🥳 ");
    }

    #[test]
    fn test_events_during_echo_window_reset_mirror() {
        let mut handler = handler();
        type_str(&mut handler, ":party: ");

        // Could be our own echo or real typing; either way it is not expanded
        type_str(&mut handler, ":party: ");

        assert_eq!(handler.mirror().sink().injections(), 1);
        assert_eq!(handler.mirror().text(), "");
    }

    #[test]
    fn test_typing_inside_echo_window_is_never_retyped() {
        let mut handler = handler();
        type_str(&mut handler, ":smile: ");
        // Fast typing that reaches the field while the mirror is suppressed
        type_str(&mut handler, "ab");
        wait_out_echo_window();
        type_str(&mut handler, " :fire: ");

        // The second expansion only touches what was typed after the window
        assert_eq!(
            handler.mirror().sink().keys,
            vec![
                "<bs x8>".to_string(),
                "😄".to_string(),
                "<Space>".to_string(),
                "<bs x8>".to_string(),
                " 🔥".to_string(),
                "<Space>".to_string(),
            ]
        );
    }

    #[test]
    fn test_tab_starts_over_in_next_field() {
        let mut handler = handler();
        type_str(&mut handler, "abc\t:smile: ");

        assert_eq!(
            handler.mirror().sink().keys,
            vec!["<bs x8>".to_string(), "😄".to_string(), "<Space>".to_string()]
        );
        assert_eq!(handler.mirror().text(), "😄 ");
    }

    #[test]
    fn test_caret_motion_and_clicks_reset_mirror() {
        let mut handler = handler();
        type_str(&mut handler, "abc");
        handler.handle(&event(EventType::KeyPress(RdevKey::LeftArrow), None));
        assert_eq!(handler.mirror().text(), "");

        type_str(&mut handler, "abc");
        handler.handle(&event(EventType::ButtonPress(rdev::Button::Left), None));
        assert_eq!(handler.mirror().text(), "");
    }

    #[test]
    fn test_modifier_shortcut_resets_mirror() {
        let mut handler = handler();
        type_str(&mut handler, ":fire:");
        handler.handle(&event(EventType::KeyPress(RdevKey::MetaLeft), None));
        handler.handle(&event(EventType::KeyPress(RdevKey::KeyV), Some("v")));
        handler.handle(&event(EventType::KeyRelease(RdevKey::MetaLeft), None));
        type_str(&mut handler, " ");

        assert_eq!(handler.mirror().sink().injections(), 0);
        assert_eq!(handler.mirror().text(), " ");
    }

    #[test]
    fn test_modifier_release_is_tracked_during_echo_window() {
        let mut handler = handler();
        type_str(&mut handler, ":fire:");
        handler.handle(&event(EventType::KeyPress(RdevKey::ControlLeft), None));
        handler.handle(&event(EventType::KeyRelease(RdevKey::ControlLeft), None));
        type_str(&mut handler, ":party: ");
        handler.handle(&event(EventType::KeyPress(RdevKey::ControlLeft), None));
        handler.handle(&event(EventType::KeyRelease(RdevKey::ControlLeft), None));
        wait_out_echo_window();

        type_str(&mut handler, ":fire: ");

        assert_eq!(handler.mirror().sink().injections(), 2);
    }

    #[test]
    fn test_backspace_edits_mirror() {
        let mut handler = handler();
        type_str(&mut handler, ":fire:x");
        handler.handle(&event(EventType::KeyPress(RdevKey::Backspace), None));
        type_str(&mut handler, " ");

        assert_eq!(
            handler.mirror().sink().keys,
            vec!["<bs x7>".to_string(), "🔥".to_string(), "<Space>".to_string()]
        );
        assert_eq!(handler.mirror().text(), "🔥 ");
    }
}
