mod hub;
mod reporter;

pub(crate) use hub::{Event, EventHub};
pub(crate) use reporter::report_progress;
