use std::collections::HashSet;

use anyhow::{bail, Result};
use crossterm::event::{KeyCode, KeyEventKind};
use tokio::sync::mpsc;
use tracing::warn;

/// The keys the session cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Return,
    Space,
    Y,
    N,
    C,
}

/// Press/release transitions, replacing live key-state polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Press(Key),
    Release(Key),
}

/// Consumes press/release transitions and tracks which keys are currently
/// held. All waits are await points; nothing here blocks the runtime.
pub struct InputQueue {
    rx: mpsc::UnboundedReceiver<InputEvent>,
    held: HashSet<Key>,
}

impl InputQueue {
    pub fn channel() -> (mpsc::UnboundedSender<InputEvent>, InputQueue) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            tx,
            InputQueue {
                rx,
                held: HashSet::new(),
            },
        )
    }

    fn apply(&mut self, event: InputEvent) -> InputEvent {
        match event {
            InputEvent::Press(key) => {
                self.held.insert(key);
            }
            InputEvent::Release(key) => {
                self.held.remove(&key);
            }
        }
        event
    }

    /// Apply every transition already delivered, without waiting.
    pub fn pump(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            self.apply(event);
        }
    }

    /// Whether `key` is held right now, after draining pending transitions.
    pub fn is_held(&mut self, key: Key) -> bool {
        self.pump();
        self.held.contains(&key)
    }

    /// Wait for the next press of `key`.
    pub async fn wait_for_press(&mut self, key: Key) -> Result<()> {
        loop {
            match self.rx.recv().await {
                Some(event) => {
                    if self.apply(event) == InputEvent::Press(key) {
                        return Ok(());
                    }
                }
                None => bail!("input source closed"),
            }
        }
    }

    /// Wait for the next press of any key in `keys`, returning which.
    pub async fn wait_for_any_press(&mut self, keys: &[Key]) -> Result<Key> {
        loop {
            match self.rx.recv().await {
                Some(event) => {
                    if let InputEvent::Press(key) = self.apply(event) {
                        if keys.contains(&key) {
                            return Ok(key);
                        }
                    }
                }
                None => bail!("input source closed"),
            }
        }
    }

    /// Wait until every key in `keys` is held at the same time (the
    /// SPACE+RETURN break confirmation). Transitions are applied one at a
    /// time so a press-then-release between checks is still observed.
    pub async fn wait_until_all_held(&mut self, keys: &[Key]) -> Result<()> {
        loop {
            if keys.iter().all(|k| self.held.contains(k)) {
                return Ok(());
            }
            match self.rx.recv().await {
                Some(event) => {
                    self.apply(event);
                }
                None => bail!("input source closed"),
            }
        }
    }
}

fn map_key(code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::Enter => Some(Key::Return),
        KeyCode::Char(' ') => Some(Key::Space),
        KeyCode::Char('y') | KeyCode::Char('Y') => Some(Key::Y),
        KeyCode::Char('n') | KeyCode::Char('N') => Some(Key::N),
        KeyCode::Char('c') | KeyCode::Char('C') => Some(Key::C),
        _ => None,
    }
}

/// Feed terminal key events into an input queue from a dedicated thread.
/// Release events require a terminal that supports the keyboard
/// enhancement protocol; on others, held-key checks simply never fire.
pub fn spawn_terminal_input() -> InputQueue {
    let (tx, queue) = InputQueue::channel();

    std::thread::spawn(move || loop {
        match crossterm::event::read() {
            Ok(crossterm::event::Event::Key(key)) => {
                let Some(mapped) = map_key(key.code) else {
                    continue;
                };
                let event = match key.kind {
                    KeyEventKind::Press | KeyEventKind::Repeat => InputEvent::Press(mapped),
                    KeyEventKind::Release => InputEvent::Release(mapped),
                };
                if tx.send(event).is_err() {
                    break;
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!("terminal input read failed: {e}");
                break;
            }
        }
    });

    queue
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn wait_for_press_skips_other_keys() {
        let (tx, mut queue) = InputQueue::channel();
        tx.send(InputEvent::Press(Key::Space)).unwrap();
        tx.send(InputEvent::Release(Key::Space)).unwrap();
        tx.send(InputEvent::Press(Key::Return)).unwrap();

        queue.wait_for_press(Key::Return).await.unwrap();
        assert!(!queue.is_held(Key::Space));
    }

    #[tokio::test]
    async fn chord_requires_simultaneous_hold() {
        let (tx, mut queue) = InputQueue::channel();
        // Space pressed and released before Return: no chord yet.
        tx.send(InputEvent::Press(Key::Space)).unwrap();
        tx.send(InputEvent::Release(Key::Space)).unwrap();
        tx.send(InputEvent::Press(Key::Return)).unwrap();
        // Now both held together.
        tx.send(InputEvent::Press(Key::Space)).unwrap();

        queue.wait_until_all_held(&[Key::Space, Key::Return]).await.unwrap();
        assert!(queue.is_held(Key::Space));
        assert!(queue.is_held(Key::Return));
    }

    #[tokio::test]
    async fn held_state_tracks_releases() {
        let (tx, mut queue) = InputQueue::channel();
        tx.send(InputEvent::Press(Key::Space)).unwrap();
        assert!(queue.is_held(Key::Space));

        tx.send(InputEvent::Release(Key::Space)).unwrap();
        assert!(!queue.is_held(Key::Space));
    }

    #[tokio::test]
    async fn closed_channel_errors_instead_of_hanging() {
        let (tx, mut queue) = InputQueue::channel();
        drop(tx);

        assert!(queue.wait_for_press(Key::Return).await.is_err());
    }
}
