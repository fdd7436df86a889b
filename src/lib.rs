// Модель полей и конвейер снапшота
pub mod consts;
pub mod error;
pub mod field;
pub mod selection;
pub mod record;
pub mod filter;
pub mod dedup;
pub mod format;
pub mod snapshot;

// Внешний контур: источник строк, опрос, конфиг, CLI
pub mod source;
pub mod poll;
pub mod config;
pub mod cli;

// Удобные реэкспорты
pub use config::{FieldsSpec, FileConfig, StatConfig};
pub use error::{StatError, StatResult};
pub use field::{Field, FieldDef, FieldRegistry, RegistryBuilder, UNIQUE_KEY_FIELDS};
pub use format::{Formatter, OutputMode};
pub use poll::Poller;
pub use record::{parse_line, Record};
pub use selection::OutputSelection;
pub use snapshot::{Pipeline, SnapshotOutput, SnapshotStats};
pub use source::{FileSource, LineSource, MemorySource};
