//! Back/forward navigation over viewed help topics.
//!
//! The history is a bounded list with a cursor. Adding a topic while the
//! cursor is not at the tail discards the forward entries, like a browser.
//! Every change of the selected topic is reported to registered listeners.

use cwf_help_types::HelpTopic;
use thiserror::Error;

/// Default bound on the number of history entries.
pub const DEFAULT_MAX_SIZE: usize = 50;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    #[error("history position {position} out of range (length {len})")]
    OutOfRange { position: usize, len: usize },
}

/// Receives the selected topic whenever it changes.
pub trait TopicListener {
    fn on_topic_selected(&mut self, topic: Option<&HelpTopic>);
}

impl<F> TopicListener for F
where
    F: FnMut(Option<&HelpTopic>),
{
    fn on_topic_selected(&mut self, topic: Option<&HelpTopic>) {
        self(topic);
    }
}

pub struct HelpHistory {
    items: Vec<HelpTopic>,
    position: Option<usize>,
    max_size: usize,
    listeners: Vec<Box<dyn TopicListener + Send>>,
}

impl std::fmt::Debug for HelpHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HelpHistory")
            .field("items", &self.items)
            .field("position", &self.position)
            .field("max_size", &self.max_size)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for HelpHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl HelpHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_SIZE)
    }

    /// History bounded to `max_size` entries (at least one).
    #[must_use]
    pub fn with_capacity(max_size: usize) -> Self {
        Self {
            items: Vec::new(),
            position: None,
            max_size: max_size.max(1),
            listeners: Vec::new(),
        }
    }

    /// Listeners run synchronously, in registration order.
    pub fn add_topic_listener(&mut self, listener: impl TopicListener + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Record a newly viewed topic.
    ///
    /// Topics without a url, and a repeat of the current topic, are not
    /// recorded. Listeners are notified with `topic` in every case.
    pub fn add(&mut self, topic: Option<HelpTopic>) {
        if let Some(new) = topic.as_ref().filter(|t| t.has_url()) {
            if self.current() != Some(new) {
                self.push(new.clone());
            }
        }

        self.notify(topic.as_ref());
    }

    fn push(&mut self, topic: HelpTopic) {
        if let Some(position) = self.position {
            self.items.truncate(position + 1);
        }

        let excess = (self.items.len() + 1).saturating_sub(self.max_size);
        self.items.drain(..excess);

        self.items.push(topic);
        self.position = Some(self.items.len() - 1);
    }

    /// Step back one entry. Returns false if already at the start.
    pub fn previous(&mut self) -> bool {
        match self.position {
            Some(position) if position > 0 => {
                self.move_to(position - 1);
                true
            }
            _ => false,
        }
    }

    /// Step forward one entry. Returns false if already at the end.
    pub fn next(&mut self) -> bool {
        match self.position {
            Some(position) if position + 1 < self.items.len() => {
                self.move_to(position + 1);
                true
            }
            _ => false,
        }
    }

    /// Move the cursor. Listeners hear about it only if the position changed.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::OutOfRange`] if `position` is not a valid index;
    /// the history is left unchanged.
    pub fn set_position(&mut self, position: usize) -> Result<(), HistoryError> {
        if position >= self.items.len() {
            return Err(HistoryError::OutOfRange {
                position,
                len: self.items.len(),
            });
        }

        if self.position != Some(position) {
            self.move_to(position);
        }
        Ok(())
    }

    fn move_to(&mut self, position: usize) {
        self.position = Some(position);
        let topic = self.items.get(position).cloned();
        self.notify(topic.as_ref());
    }

    fn notify(&mut self, topic: Option<&HelpTopic>) {
        for listener in &mut self.listeners {
            listener.on_topic_selected(topic);
        }
    }

    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.position.is_some_and(|p| p > 0)
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.position.is_some_and(|p| p + 1 < self.items.len())
    }

    /// Cursor position, `None` while the history is empty.
    #[must_use]
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    #[must_use]
    pub fn current(&self) -> Option<&HelpTopic> {
        self.position.and_then(|p| self.items.get(p))
    }

    #[must_use]
    pub fn items(&self) -> &[HelpTopic] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Drop every entry. Listeners are not notified.
    pub fn clear(&mut self) {
        self.items.clear();
        self.position = None;
    }
}
