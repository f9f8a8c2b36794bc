pub mod journey;
pub mod landmark;
pub mod language;
pub mod places;
pub mod recognition;
pub mod trip;
pub mod user;
