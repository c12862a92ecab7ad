//! Campaign mail delivery: transports and the campaign view renderer.

pub mod mail;
pub mod render;
