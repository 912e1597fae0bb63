pub mod datetime;
pub mod hash;
