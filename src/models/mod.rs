pub mod candidate;
pub mod movie;

pub use candidate::{Candidate, Source};
pub use movie::{year_from_value, Movie};
