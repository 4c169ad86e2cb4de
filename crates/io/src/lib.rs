// File I/O: detector grids, snapshot tables, history log

pub mod dates;
pub mod error;
pub mod grid;
pub mod history;
pub mod snapshot;
pub mod table;

pub use dates::{date_from_filename, resolve_snapshot_date};
pub use error::IoError;
pub use grid::{load_grids, parse_grid_json, read_grid};
pub use history::{HistoryEntry, JsonlHistory};
pub use snapshot::{load_snapshot, read_records, write_snapshot, LoadedSnapshot, RecordTable};
