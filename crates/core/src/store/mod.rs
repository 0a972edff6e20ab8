pub mod live;
pub mod records;

pub use live::{LiveQuery, QueryCtx};
pub use records::{Collection, RecordStore};
