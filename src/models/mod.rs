pub mod stock;
pub mod purchase;
pub mod response;

pub use stock::*;
pub use purchase::*;
pub use response::*;
