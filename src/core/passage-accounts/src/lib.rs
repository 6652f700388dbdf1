//! # Passage Accounts
//!
//! Maps `(provider type, external subject id)` pairs to internal account ids.
//!
//! ## Guarantees
//!
//! - Each provider identity maps to exactly one account id
//! - Account creation writes the identity and account records atomically
//! - Concurrent first logins for the same identity race safely: one creation
//!   wins, the others observe [`AccountsError::AlreadyExists`]

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod idgen;
pub mod repository;
pub mod store;
pub mod types;

pub use error::AccountsError;
pub use idgen::{IdGenerator, UuidV7Generator};
pub use repository::AccountsRepository;
pub use store::{AccountProviderRecord, KvAccountsRepository};
pub use types::{AccountId, ProviderType};
