mod writer;

pub use writer::{QifWriter, to_qif_string};
