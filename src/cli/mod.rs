pub mod markets;
pub mod setup;
pub mod summary;
pub mod ui;
