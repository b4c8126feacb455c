//! Route handlers organized by resource

pub mod health;
pub mod users;
pub mod hotels;
pub mod rooms;
pub mod support;
