//! internaltx-core — extraction of FEVM internal transactions from a tipset.
//!
//! # Architecture
//!
//! ```text
//! Scheduler ──run(tipset, version, force)──▶ InternalTxTask
//!                                              ├── ChainReader        (parent, messages, replay, hash)
//!                                              ├── AddressTranslator  (native → 0x address)
//!                                              ├── SubCallDeduplicator (concurrent claim table)
//!                                              ├── RecordBuilder      (sub-call → record)
//!                                              └── VersionedStore     (existed / replace_version)
//! ```

pub mod builder;
pub mod chain;
pub mod config;
pub mod dedup;
pub mod error;
pub mod eth;
pub mod extractor;
pub mod record;
pub mod store;
pub mod task;
pub mod types;

pub use builder::ExtractorBuilder;
pub use chain::{AddressTranslator, ChainReader, FilecoinAddressTranslator};
pub use config::{ExtractorConfig, ParentHashPolicy, TraceDepth};
pub use dedup::SubCallDeduplicator;
pub use error::TaskError;
pub use eth::{EthAddress, EthHash};
pub use extractor::{InternalTxTask, TASK_NAME};
pub use record::{InternalTransaction, RecordBuilder};
pub use store::{Column, MemoryVersionedStore, RecordKind, VersionedStore};
pub use task::{RunOutcome, Task};
pub use types::{ChainMessage, ExecutionTrace, SubCall, TipsetKey, TipsetRef};
