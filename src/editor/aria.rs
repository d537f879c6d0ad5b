use tracing::debug;

use super::direction::Direction;

/// Collects accessibility announcements produced while handling one input event.
#[derive(Debug, Default)]
pub struct Aria {
    items: Vec<String>,
    last_alert: Option<String>,
}

impl Aria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue(&mut self, item: impl Into<String>) -> &mut Self {
        let item = item.into();
        if !item.is_empty() {
            self.items.push(item);
        }
        self
    }

    /// Announces the side of the next queued item the cursor landed on.
    pub fn queue_dir_of(&mut self, dir: Direction) -> &mut Self {
        self.queue(match dir {
            Direction::Left => "before",
            Direction::Right => "after",
        })
    }

    /// Announces which end of the next queued item the cursor landed in.
    pub fn queue_dir_end_of(&mut self, dir: Direction) -> &mut Self {
        self.queue(match dir {
            Direction::Left => "beginning of",
            Direction::Right => "end of",
        })
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Flushes the queue into one message. An empty queue keeps the previous alert.
    pub fn alert(&mut self) -> Option<&str> {
        if !self.items.is_empty() {
            let message = self.items.join(" ");
            self.items.clear();
            debug!(%message, "aria alert");
            self.last_alert = Some(message);
        }
        self.last_alert.as_deref()
    }

    pub fn last_alert(&self) -> Option<&str> {
        self.last_alert.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alert_joins_queued_items() {
        let mut aria = Aria::new();
        aria.queue_dir_end_of(Direction::Right).queue("x");
        assert_eq!(aria.alert(), Some("end of x"));
        assert!(aria.is_empty());
    }

    #[test]
    fn empty_queue_keeps_last_alert() {
        let mut aria = Aria::new();
        assert_eq!(aria.alert(), None);
        aria.queue_dir_of(Direction::Left).queue("y");
        aria.alert();
        aria.queue("");
        assert_eq!(aria.alert(), Some("before y"));
    }
}
