pub mod cart;
pub mod product;
pub mod sale;

pub use cart::*;
pub use product::*;
pub use sale::*;
