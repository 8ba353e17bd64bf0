// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Lazy row fetcher over a key range.

use std::collections::VecDeque;

use crate::storage::{ColumnFamily, Key, KvEngine};
use crate::txn::TxnError;

use super::decoder::{TxnRowDecoder, TxnRowValue};

/// Rows pulled from the engine per scan round trip.
const SCAN_CHUNK: usize = 128;

/// Iterates over committed rows in `[start, end)`, decoding and filtering
/// lazily.
///
/// Forward-only and finite; once an error is yielded the fetcher is done and
/// cannot be restarted mid-scan.
pub struct TxnRowFetcher<'a, E: KvEngine> {
    engine: &'a E,
    decoder: TxnRowDecoder<'a>,
    next_start: Vec<u8>,
    end: Vec<u8>,
    buffered: VecDeque<(Vec<u8>, Vec<u8>)>,
    exhausted: bool,
}

impl<'a, E: KvEngine> TxnRowFetcher<'a, E> {
    /// Creates a fetcher over `[start, end)`.
    pub fn new(engine: &'a E, decoder: TxnRowDecoder<'a>, start: &Key, end: &Key) -> Self {
        Self {
            engine,
            decoder,
            next_start: start.as_bytes().to_vec(),
            end: end.as_bytes().to_vec(),
            buffered: VecDeque::new(),
            exhausted: false,
        }
    }

    fn refill(&mut self) -> Result<(), TxnError> {
        let chunk = self
            .engine
            .scan(ColumnFamily::Data, &self.next_start, &self.end, SCAN_CHUNK)?;
        if chunk.len() < SCAN_CHUNK {
            self.exhausted = true;
        }
        if let Some((last_key, _)) = chunk.last() {
            // Smallest key strictly greater than last_key.
            let mut next = last_key.clone();
            next.push(0);
            self.next_start = next;
        }
        self.buffered.extend(chunk);
        Ok(())
    }
}

impl<'a, E: KvEngine> Iterator for TxnRowFetcher<'a, E> {
    type Item = Result<(Key, TxnRowValue), TxnError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((key, buf)) = self.buffered.pop_front() {
                match self.decoder.decode_and_filter(&buf) {
                    Ok(Some(row)) => return Some(Ok((Key::new(key), row))),
                    Ok(None) => continue,
                    Err(e) => {
                        self.exhausted = true;
                        self.buffered.clear();
                        return Some(Err(e));
                    }
                }
            }
            if self.exhausted {
                return None;
            }
            if let Err(e) = self.refill() {
                self.exhausted = true;
                return Some(Err(e));
            }
            if self.buffered.is_empty() {
                self.exhausted = true;
                return None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::encode::encode_row;
    use crate::row::filter::{Match, MatchOp};
    use crate::row::value::FieldValue;
    use crate::schema::{Column, ColumnType, TableSchema};
    use crate::storage::{RocksEngine, WriteBatch};
    use tempfile::TempDir;

    fn test_schema() -> TableSchema {
        TableSchema::new(vec![
            Column::new(1, "id", ColumnType::Uint).primary(),
            Column::new(2, "name", ColumnType::Bytes),
        ])
    }

    fn seed_rows(engine: &RocksEngine, count: u64) {
        let mut batch = WriteBatch::new();
        for i in 0..count {
            let key = format!("row{i:05}");
            let buf = encode_row(
                i,
                &[
                    (1, FieldValue::Uint(i)),
                    (2, FieldValue::from(format!("name{i}").as_str())),
                ],
            );
            batch.put(ColumnFamily::Data, key.into_bytes(), buf);
        }
        engine.write(batch).unwrap();
    }

    #[test]
    fn test_fetch_range_in_order() {
        let dir = TempDir::new().unwrap();
        let engine = RocksEngine::open(dir.path()).unwrap();
        seed_rows(&engine, 10);

        let schema = test_schema();
        let decoder = TxnRowDecoder::new(&schema, vec![]);
        let fetcher = TxnRowFetcher::new(
            &engine,
            decoder,
            &Key::from("row00002"),
            &Key::from("row00006"),
        );

        let rows: Vec<_> = fetcher.map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].0, Key::from("row00002"));
        assert_eq!(rows[3].0, Key::from("row00005"));
        assert_eq!(rows[1].1.field(1), Some(&FieldValue::Uint(3)));
    }

    #[test]
    fn test_fetch_applies_filters() {
        let dir = TempDir::new().unwrap();
        let engine = RocksEngine::open(dir.path()).unwrap();
        seed_rows(&engine, 20);

        let schema = test_schema();
        let decoder = TxnRowDecoder::new(
            &schema,
            vec![Match::new(1, MatchOp::GtEq, FieldValue::Uint(15))],
        );
        let fetcher = TxnRowFetcher::new(&engine, decoder, &Key::from("row"), &Key::from("rox"));

        let rows: Vec<_> = fetcher.map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 5);
        assert!(rows.iter().all(|(_, r)| r.version() >= 15));
    }

    #[test]
    fn test_fetch_spans_chunk_boundaries() {
        let dir = TempDir::new().unwrap();
        let engine = RocksEngine::open(dir.path()).unwrap();
        seed_rows(&engine, 3 * SCAN_CHUNK as u64);

        let schema = test_schema();
        let decoder = TxnRowDecoder::new(&schema, vec![]);
        let fetcher = TxnRowFetcher::new(&engine, decoder, &Key::from("row"), &Key::from("rox"));

        let rows: Vec<_> = fetcher.map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 3 * SCAN_CHUNK);
        // Strictly ascending, no duplicates across chunk refills.
        for pair in rows.windows(2) {
            assert!(pair[0].0 < pair[1].0);
        }
    }

    #[test]
    fn test_empty_range_yields_nothing() {
        let dir = TempDir::new().unwrap();
        let engine = RocksEngine::open(dir.path()).unwrap();
        seed_rows(&engine, 5);

        let schema = test_schema();
        let decoder = TxnRowDecoder::new(&schema, vec![]);
        let mut fetcher =
            TxnRowFetcher::new(&engine, decoder, &Key::from("zzz"), &Key::from("zzzz"));
        assert!(fetcher.next().is_none());
    }

    #[test]
    fn test_corrupt_row_surfaces_error_and_stops() {
        let dir = TempDir::new().unwrap();
        let engine = RocksEngine::open(dir.path()).unwrap();
        seed_rows(&engine, 2);

        let mut batch = WriteBatch::new();
        batch.put(ColumnFamily::Data, b"row00000x".to_vec(), vec![1, 2, 3]);
        engine.write(batch).unwrap();

        let schema = test_schema();
        let decoder = TxnRowDecoder::new(&schema, vec![]);
        let mut fetcher =
            TxnRowFetcher::new(&engine, decoder, &Key::from("row"), &Key::from("rox"));

        assert!(fetcher.next().unwrap().is_ok()); // row00000
        assert!(matches!(
            fetcher.next().unwrap(),
            Err(TxnError::Corruption(_))
        ));
        assert!(fetcher.next().is_none()); // not restartable after error
    }
}
