pub mod holding;
pub mod market;
pub mod order;
pub mod portfolio;
pub mod user;
