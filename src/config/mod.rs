pub mod schema;
pub mod storage;
pub mod validation;

pub use schema::*;
pub use storage::*;
pub use validation::*;
