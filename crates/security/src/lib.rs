//! Input validation for Shopdesk.
//!
//! Every value a lookup tool passes to the catalog store goes through one of
//! these predicates first. They are pure, total, and never panic.

pub mod input;

pub use input::{MAX_INPUT_LEN, is_valid_identifier, is_valid_person_name, is_valid_search_term};
