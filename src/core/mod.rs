// Core primitives shared by every scanner.

pub mod field;
pub mod pool;
pub mod probe;
pub mod record;

pub use field::{unescape_quotes, FieldSpan};
pub use pool::{scratch_pool, Pool, PooledVec};
pub use probe::vector_path_available;
pub use record::OffsetRecord;
