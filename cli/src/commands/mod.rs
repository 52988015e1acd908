pub mod build;
pub mod neighbors;
pub mod validate;
