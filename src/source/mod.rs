pub mod configuration;
pub mod conversion;
pub mod definition;

pub use configuration::*;
pub use conversion::*;
pub use definition::*;
