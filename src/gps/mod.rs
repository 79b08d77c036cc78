// src/gps/mod.rs
//! GNSS data handling: sentence model, status record, reducer

pub mod reducer;
pub mod satellites;
pub mod sentence;
pub mod status;

pub use reducer::SentenceReducer;
pub use sentence::{Constellation, FixQuality, Sentence};
pub use status::GnssStatus;
