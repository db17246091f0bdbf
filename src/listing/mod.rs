pub mod directories;
pub mod error;
pub(crate) mod page;
pub mod pdfs;
