pub mod availability;
pub mod confirmation;
pub mod controller;
pub mod payload;
pub mod time_slots;
pub mod validation;
