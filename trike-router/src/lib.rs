//! Tricycle zone route planner.
//!
//! Answers two questions for a trip across the city: which color-coded
//! tricycle zones can carry me there, with what transfers and at what
//! fare; and which waypoints keep a road route out of restricted areas.

pub mod avoidance;
pub mod cache;
pub mod clock;
pub mod fare;
pub mod geo;
pub mod geojson;
pub mod oracle;
pub mod places;
pub mod planner;
pub mod restriction;
pub mod settings;
pub mod web;
pub mod zones;
