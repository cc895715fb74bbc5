//! Client-side storefront state: session token, cart and browse controls.

pub mod browse;
pub mod cart;
pub mod session;
pub mod storage;
