pub mod sales_screen;

pub use sales_screen::*;
