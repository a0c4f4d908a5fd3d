pub mod registry;
pub mod sync;
