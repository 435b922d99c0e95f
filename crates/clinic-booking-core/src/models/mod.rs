//! Domain models for the clinic booking system.

mod activity;
mod appointment;
mod calendar;
mod doctor;

pub use activity::*;
pub use appointment::*;
pub use calendar::*;
pub use doctor::*;
