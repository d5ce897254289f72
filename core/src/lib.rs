pub mod error;
pub mod influx;
pub mod models;
pub mod pace;
pub mod publish;
pub mod select;
pub mod series;
pub mod storage;

pub use error::DmError;
pub use influx::{HttpSink, Sink};
pub use models::{Distance, Entry, EntryLog, Workout};
pub use pace::{derive, format_duration_min, parse_duration_str, Metrics, Pace};
pub use publish::Publisher;
pub use select::Policy;
pub use series::{FieldValue, OutputShape, Point, Row, TaggedShape, WideShape};
pub use storage::{entries_path, load_entries};
