pub mod decoder;
pub mod error;
pub(crate) mod header;
pub mod locate;
pub mod parameter;

#[cfg(test)]
pub(crate) mod test_support;
