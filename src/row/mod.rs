// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Transactional read path: versioned row codec, predicate filters, and a
//! lazy row fetcher.
//!
//! Committed rows are stored in the `data` column family as a version prefix
//! followed by self-describing column fields (see [`encode`]). The decoder
//! rejects any reference to a column the schema does not know as corruption —
//! silently dropping a primary-key column would break filter correctness.

pub mod encode;

mod decoder;
mod fetcher;
mod filter;
mod value;

pub use decoder::{TxnRowDecoder, TxnRowValue};
pub use fetcher::TxnRowFetcher;
pub use filter::{Match, MatchOp};
pub use value::FieldValue;
