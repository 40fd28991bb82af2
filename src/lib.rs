pub mod constants;
pub mod domain;
pub mod error;
pub mod logging;
pub mod names;
pub mod storage;
pub mod transform;

#[cfg(test)]
pub mod test_support;
