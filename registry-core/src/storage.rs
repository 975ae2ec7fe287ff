//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `events` - Append-only notification log (key: big-endian sequence number)
//! - `state` - Latest registry snapshot (single key)
//!
//! Each commit writes the snapshot and the new events in one `WriteBatch`,
//! so a crash never leaves events without the state that produced them.

use crate::{
    error::{Error, Result},
    state::RegistryState,
    types::SequencedEvent,
    Config,
};
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, Direction, IteratorMode, Options, WriteBatch, DB,
};
use std::sync::Arc;

/// Column family names
const CF_EVENTS: &str = "events";
const CF_STATE: &str = "state";

/// Snapshot key within the state column family
const STATE_KEY: &[u8] = b"registry";

/// Storage wrapper for RocksDB
pub struct Storage {
    db: Arc<DB>,
}

impl Storage {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        // Tuning from config
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_target_file_size_base(config.rocksdb.target_file_size_mb * 1024 * 1024);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_EVENTS, Self::cf_options_events()),
            ColumnFamilyDescriptor::new(CF_STATE, Self::cf_options_state()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!(path = %path.display(), "opened registry storage");

        Ok(Self { db: Arc::new(db) })
    }

    fn cf_options_events() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts.set_bottommost_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    fn cf_options_state() -> Options {
        let mut opts = Options::default();
        // Snapshot is rewritten on every commit, favor speed
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_handle(&self, name: &str) -> Result<Arc<BoundColumnFamily>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("column family {} not found", name)))
    }

    /// Load the persisted snapshot, if any
    pub fn load_state(&self) -> Result<Option<RegistryState>> {
        let cf = self.cf_handle(CF_STATE)?;
        match self.db.get_cf(&cf, STATE_KEY)? {
            Some(value) => {
                let state: RegistryState = bincode::deserialize(&value)?;
                Ok(Some(state))
            }
            None => Ok(None),
        }
    }

    /// Atomically persist the snapshot together with the events it produced
    pub fn commit(&self, state: &RegistryState, events: &[SequencedEvent]) -> Result<()> {
        let mut batch = WriteBatch::default();

        let cf_state = self.cf_handle(CF_STATE)?;
        batch.put_cf(&cf_state, STATE_KEY, bincode::serialize(state)?);

        let cf_events = self.cf_handle(CF_EVENTS)?;
        for event in events {
            batch.put_cf(&cf_events, event.seq.to_be_bytes(), bincode::serialize(event)?);
        }

        self.db.write(batch)?;

        tracing::debug!(events = events.len(), "committed registry state");

        Ok(())
    }

    /// Read up to `limit` events starting at `from_seq` (inclusive), in order
    pub fn events(&self, from_seq: u64, limit: usize) -> Result<Vec<SequencedEvent>> {
        let cf = self.cf_handle(CF_EVENTS)?;
        let start = from_seq.to_be_bytes();
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(&start, Direction::Forward));

        let mut events = Vec::new();
        for item in iter.take(limit) {
            let (_, value) = item?;
            events.push(bincode::deserialize(&value)?);
        }
        Ok(events)
    }

    /// Approximate count of persisted events
    pub fn event_count(&self) -> Result<u64> {
        let cf = self.cf_handle(CF_EVENTS)?;
        let count = self
            .db
            .property_int_value_cf(cf, "rocksdb.estimate-num-keys")?
            .unwrap_or(0);
        Ok(count)
    }
}
