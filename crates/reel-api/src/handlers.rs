//! Request handlers.

pub mod form;
pub mod health;
pub mod upload;
pub mod video;

pub use form::*;
pub use health::*;
pub use upload::*;
pub use video::*;
