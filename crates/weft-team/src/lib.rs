//! # weft-team
//!
//! The Team Data Store: a dense, index-addressed table holding one
//! [`TeamRecord`] and one [`CenterData`] per built cloth instance.
//!
//! The store owns no behavior beyond slot bookkeeping. The runtime
//! scheduler and the instance facade read and write records by
//! [`TeamId`](weft_types::TeamId).

pub mod flags;
pub mod store;
pub mod team;

pub use flags::TeamFlags;
pub use store::TeamDataStore;
pub use team::{CenterData, ForceMode, TeamRecord};
