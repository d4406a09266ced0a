pub mod staging;
pub mod updater;
