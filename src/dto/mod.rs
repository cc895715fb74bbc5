pub mod auth_dto;
pub mod catalog_dto;
pub mod product_dto;
