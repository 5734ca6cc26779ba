// Failure reporting: one dismissible notice summarizing what did not load.

pub mod notice;
pub mod reporter;

pub use notice::{Notice, NoticeEntry};
pub use reporter::{DismissReason, FailureReporter, NoticeHandle, NOTICE_ID};
