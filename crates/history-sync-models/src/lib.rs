pub mod fields;
pub mod raw_record;
pub mod watch_history;

pub use fields::{HISTORY_FIELDS, KEY_FIELD, SOURCE_DATE_FIELD};
pub use raw_record::RawHistoryRecord;
pub use watch_history::PlaybackRecord;
