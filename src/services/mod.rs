pub mod access;
pub mod bridge;
pub mod intake;
pub mod relay;
pub mod updater;
