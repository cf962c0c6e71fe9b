pub mod bias;
pub mod correlator;
pub mod evidence;
pub mod query;
pub mod ranking;
pub mod request;
pub mod result;

mod error;

pub use error::{Error, Result};
