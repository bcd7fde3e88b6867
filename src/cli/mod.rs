pub mod matches;
pub mod setup;
pub mod summary;
pub mod ui;
