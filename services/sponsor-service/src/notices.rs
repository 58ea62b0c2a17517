use ps_api_types::Notice;
use ps_store::{Notifier, TracingNotifier};
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

pub(crate) const NOTICE_CAPACITY: usize = 50;

/// Keeps the most recent notices for `GET /notices` and logs each one.
pub(crate) struct NoticeBoard {
    capacity: usize,
    entries: Mutex<VecDeque<Notice>>,
    log: TracingNotifier,
}

impl NoticeBoard {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            log: TracingNotifier,
        }
    }

    /// Oldest first.
    pub(crate) fn recent(&self) -> Vec<Notice> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }
}

impl Notifier for NoticeBoard {
    fn notify(&self, notice: Notice) {
        self.log.notify(notice.clone());

        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ps_api_types::NoticeLevel;

    #[test]
    fn board_drops_the_oldest_notice_when_full() {
        let board = NoticeBoard::new(2);
        board.notify(Notice::new(NoticeLevel::Info, "one"));
        board.notify(Notice::new(NoticeLevel::Warning, "two"));
        board.notify(Notice::new(NoticeLevel::Error, "three"));

        let titles: Vec<_> = board.recent().into_iter().map(|n| n.title).collect();
        assert_eq!(titles, ["two", "three"]);
    }
}
