pub mod resume;
pub mod sample;
