pub mod commands;
pub mod error;
pub mod missions;
pub mod passes;
pub mod reservations;
pub mod satellites;
pub mod stations;
