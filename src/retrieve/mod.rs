pub mod client;
pub mod error;
pub(crate) mod index;
pub mod request;
pub mod source;
