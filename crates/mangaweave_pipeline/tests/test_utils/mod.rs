pub mod fixture;
pub mod routing_driver;

pub use fixture::{Fixture, seed_summary};
pub use routing_driver::RoutingDriver;
