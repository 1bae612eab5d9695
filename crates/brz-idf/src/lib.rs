//! # brz-idf
//!
//! Term statistics for ranking: document frequency per term and average
//! document length per field.
//!
//! A [`TermStatistics`] table is built once, either from an in-memory feed
//! or from an [`IdfReader`], and is read-only afterwards.
//!
//! ```
//! use std::num::NonZeroU64;
//!
//! use brz_idf::TermStatistics;
//!
//! let docs = NonZeroU64::new(4).expect("non-zero");
//! let stats = TermStatistics::from_feed(
//!     docs,
//!     [("title".to_string(), 10)],
//!     [("rust".to_string(), 3), ("search".to_string(), 1)],
//! );
//!
//! assert_eq!(stats.lookup("rust"), 3);
//! assert_eq!(stats.lookup("missing"), 0);
//! assert_eq!(stats.average_length("title"), Some(2.5));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod reader;
pub mod table;

pub use error::IdfError;
pub use reader::{IdfReader, TextIdfReader};
pub use table::{TableStats, TermStatistics};
