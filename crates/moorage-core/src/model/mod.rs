//! データモデル

mod mooring;
mod port;
mod service;
mod state;
mod volume;

pub use mooring::*;
pub use port::*;
pub use service::*;
pub use state::*;
pub use volume::*;
