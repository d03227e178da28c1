//! Reading network descriptions and turning them into a `Network`.

pub mod network;
pub mod builder;
