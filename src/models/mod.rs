pub mod entry;
pub mod job;

pub use entry::Entry;
pub use job::{Job, NewJob};
