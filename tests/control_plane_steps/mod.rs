//! Step definitions shared by the control-plane behaviour tests.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
