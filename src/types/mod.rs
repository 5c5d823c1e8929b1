pub mod package;
pub mod progress;
pub mod review;
