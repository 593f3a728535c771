pub mod update;

pub use update::{UpdateRecordCommand, UpdateRecordError};
