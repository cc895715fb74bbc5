pub mod product;
pub mod role;
pub mod user;
