pub mod common;
pub mod menu;
pub mod payload;
pub mod reservation;
