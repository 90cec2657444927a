pub mod records;
pub mod snapshot;
pub mod tables;
pub mod user;
