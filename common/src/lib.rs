//! Moneta Common Types
//!
//! Value model shared by the Moneta crates: currency-tagged integer amounts,
//! directional exchange rates, and the expression tree that defers addition
//! of amounts in different currencies until they are reduced.

pub mod monetary;
pub mod rate;
pub mod expression;
pub mod error;

pub use monetary::*;
pub use rate::*;
pub use expression::*;
pub use error::*;
