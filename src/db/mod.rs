//! Datastore gateway: connection handling, schema and parameterized queries.
//! No business rules live here.

pub mod initialize;
pub mod log;
pub mod migrate;
pub mod pool;
pub mod queries;
