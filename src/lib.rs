//! Convert OFX/QFX bank statements into QIF files.
//!
//! ```rust,ignore
//! use ofx2qif::ConverterBuilder;
//!
//! let conversion = ConverterBuilder::new()
//!     .filename("statement.ofx")
//!     .convert_file("statement.qif")?;
//! ```

mod builder;
mod types;

pub mod errors;
pub mod parsers;
pub mod qif;

pub use builder::ConverterBuilder;
pub use parsers::prelude::*;
pub use types::{Conversion, ConvertOptions, DatePolicy, Transaction};
