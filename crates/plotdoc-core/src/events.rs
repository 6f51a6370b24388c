//! Change notification.
//!
//! Observers are plain closures registered with the document. They run
//! synchronously, in registration order, before the mutating call returns.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentEvent {
    /// The modified flag was set or cleared. `changeset` is the counter after
    /// the change.
    Modified { modified: bool, changeset: u64 },
    /// All datasets and widgets were discarded.
    Wiped,
}

/// Handle returned by [`crate::Document::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

type Observer = Box<dyn FnMut(&DocumentEvent)>;

#[derive(Default)]
pub(crate) struct Observers {
    next: u64,
    entries: Vec<(ObserverId, Observer)>,
}

impl Observers {
    pub(crate) fn subscribe(&mut self, observer: Observer) -> ObserverId {
        let id = ObserverId(self.next);
        self.next += 1;
        self.entries.push((id, observer));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub(crate) fn notify(&mut self, event: &DocumentEvent) {
        for (_, observer) in &mut self.entries {
            observer(event);
        }
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("count", &self.entries.len())
            .finish()
    }
}
