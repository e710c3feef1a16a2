pub mod config;
pub mod error;
pub mod types;

pub use config::BankedConfig;
pub use error::{BankError, Result};
pub use types::{ActivityId, Experience, ItemId, Quantity, Skill};
