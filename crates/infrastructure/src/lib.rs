pub mod memory;
pub mod models;
pub mod mongo;
pub mod repositories;

pub use memory::*;
pub use models::*;
pub use mongo::*;
pub use repositories::*;
