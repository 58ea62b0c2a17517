use ps_api_types::{Notice, NoticeLevel};
use tracing::{error, info, warn};

/// The user-facing dialog surface. Fire-and-forget.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Writes notices to the log only.
#[derive(Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        let text = notice.text.as_deref().unwrap_or_default();
        match notice.level {
            NoticeLevel::Info | NoticeLevel::Success => info!(title = %notice.title, text, "notice"),
            NoticeLevel::Warning => warn!(title = %notice.title, text, "notice"),
            NoticeLevel::Error => error!(title = %notice.title, text, "notice"),
        }
    }
}
