//! Domain layer: catalog aggregates, pricing services and the submission boundary.
pub mod aggregates;
pub mod events;
pub mod services;
pub mod submission;
pub mod value_objects;
