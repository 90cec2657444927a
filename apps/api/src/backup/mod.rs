// Snapshot backup and restore.
// Reads every tracked table for one user into a snapshot, keeps the newest N per user,
// and replaces a user's data wholesale from a chosen snapshot.

pub mod archive;
pub mod artifact;
pub mod handlers;
pub mod retention;
pub mod service;
pub mod summary;
