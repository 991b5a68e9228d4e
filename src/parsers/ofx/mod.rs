mod normalize;
mod reader;
mod tracker;
mod tree;

pub mod prelude {
    pub use super::normalize::{
        OfxDate, normalize_amount, normalize_date, normalize_memo, normalize_name,
        normalize_type,
    };
    pub use super::reader::{Dialect, OfxReader, decode_content};
    pub use super::tracker::{AggregateTracker, TransactionAccumulator};
    pub use super::tree::{AggregateStack, Node};
}
