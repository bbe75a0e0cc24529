pub mod backup;
pub mod controller;
pub mod converter;
pub mod docker;
pub mod error;
pub mod monitor;
pub mod runtime;

pub use backup::*;
pub use controller::*;
pub use converter::*;
pub use docker::*;
pub use error::*;
pub use monitor::*;
pub use runtime::*;

#[cfg(test)]
mod test_support;
