pub mod coordinate;
pub mod order;
pub mod route;
