pub mod price;
pub mod text;
