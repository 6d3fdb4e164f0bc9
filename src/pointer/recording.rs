use anyhow::{bail, Result};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use super::{MouseButton, PointerCommand, PointerSink};

/// In-memory pointer sink that records every command.
///
/// Clones share the same log, so a test can keep one handle while the
/// engine owns another.
#[derive(Clone)]
pub struct RecordingPointer {
    screen: (u32, u32),
    commands: Arc<Mutex<Vec<PointerCommand>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingPointer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            screen: (width, height),
            commands: Arc::new(Mutex::new(Vec::new())),
            failing: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn commands(&self) -> Vec<PointerCommand> {
        self.commands
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn count(&self, predicate: impl Fn(&PointerCommand) -> bool) -> usize {
        self.commands().iter().filter(|cmd| predicate(cmd)).count()
    }

    pub fn clear(&self) {
        if let Ok(mut guard) = self.commands.lock() {
            guard.clear();
        }
    }

    /// While set, every command fails without being recorded.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn record(&self, command: PointerCommand) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            bail!("pointer sink unreachable");
        }
        if let Ok(mut guard) = self.commands.lock() {
            guard.push(command);
        }
        Ok(())
    }
}

impl PointerSink for RecordingPointer {
    fn screen_size(&mut self) -> Result<(u32, u32)> {
        if self.failing.load(Ordering::SeqCst) {
            bail!("pointer sink unreachable");
        }
        Ok(self.screen)
    }

    fn move_to(&mut self, x: i32, y: i32) -> Result<()> {
        self.record(PointerCommand::Move { x, y })
    }

    fn click(&mut self, button: MouseButton) -> Result<()> {
        self.record(PointerCommand::Click(button))
    }

    fn press(&mut self, button: MouseButton) -> Result<()> {
        self.record(PointerCommand::Press(button))
    }

    fn release(&mut self, button: MouseButton) -> Result<()> {
        self.record(PointerCommand::Release(button))
    }

    fn scroll(&mut self, dy: f64, dx: f64) -> Result<()> {
        self.record(PointerCommand::Scroll { dy, dx })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_command_log() {
        let observer = RecordingPointer::new(100, 50);
        let mut sink = observer.clone();

        sink.move_to(10, 20).unwrap();
        sink.click(MouseButton::Left).unwrap();

        assert_eq!(
            observer.commands(),
            vec![
                PointerCommand::Move { x: 10, y: 20 },
                PointerCommand::Click(MouseButton::Left)
            ]
        );
        assert_eq!(sink.screen_size().unwrap(), (100, 50));
    }

    #[test]
    fn failing_sink_records_nothing() {
        let observer = RecordingPointer::new(100, 50);
        let mut sink = observer.clone();
        observer.set_failing(true);

        assert!(sink.press(MouseButton::Left).is_err());
        assert!(sink.screen_size().is_err());
        assert!(observer.commands().is_empty());

        observer.set_failing(false);
        sink.release(MouseButton::Left).unwrap();
        assert_eq!(
            observer.count(|cmd| matches!(cmd, PointerCommand::Release(_))),
            1
        );
    }
}
