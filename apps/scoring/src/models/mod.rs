pub mod events;
pub mod jd;
pub mod resume;
pub mod score;
