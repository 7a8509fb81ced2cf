use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: u64,
    pub kind: NoticeKind,
    pub message: String,
    pub expires_at: Instant,
}

/// Toast queue. Each notice lives for a fixed time unless dismissed first.
#[derive(Debug, Clone)]
pub struct Notices {
    ttl: Duration,
    next_id: u64,
    items: Vec<Notice>,
}

impl Notices {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            next_id: 1,
            items: Vec::new(),
        }
    }

    pub fn push<S: Into<String>>(&mut self, kind: NoticeKind, message: S, now: Instant) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        let message = message.into();
        match kind {
            NoticeKind::Error => tracing::warn!(notice = id, "{message}"),
            _ => tracing::debug!(notice = id, "{message}"),
        }

        self.items.push(Notice {
            id,
            kind,
            message,
            expires_at: now + self.ttl,
        });
        id
    }

    pub fn success<S: Into<String>>(&mut self, message: S) -> u64 {
        self.push(NoticeKind::Success, message, Instant::now())
    }

    pub fn warning<S: Into<String>>(&mut self, message: S) -> u64 {
        self.push(NoticeKind::Warning, message, Instant::now())
    }

    pub fn error<S: Into<String>>(&mut self, message: S) -> u64 {
        self.push(NoticeKind::Error, message, Instant::now())
    }

    /// Returns `false` if the notice was already gone.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        self.items.len() != before
    }

    /// Drops expired notices.
    pub fn prune(&mut self, now: Instant) {
        self.items.retain(|n| n.expires_at > now);
    }

    pub fn visible(&self, now: Instant) -> impl Iterator<Item = &Notice> {
        self.items.iter().filter(move |n| n.expires_at > now)
    }

    pub fn latest(&self) -> Option<&Notice> {
        self.items.last()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
