pub mod memory;
pub mod pool;
pub mod products;
pub mod users;

pub use memory::{MemoryProductStore, MemoryUserStore};
pub use products::{PgProductStore, ProductStore};
pub use users::{PgUserStore, UserStore};
