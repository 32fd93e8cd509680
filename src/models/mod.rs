pub mod record;
pub mod source;

pub use record::{normalize_currency, ScrapedRecord, DEFAULT_CURRENCY};
pub use source::Source;
