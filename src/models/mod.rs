//! Data models

pub mod user;
pub mod analysis;
pub mod risk_component;
pub mod alert;
pub mod audit;

pub use user::*;
pub use analysis::*;
pub use risk_component::*;
pub use alert::*;
pub use audit::*;
