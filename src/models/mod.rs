pub mod envelope;
pub mod product;

pub use envelope::*;
pub use product::*;
