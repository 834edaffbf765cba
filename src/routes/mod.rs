pub mod face_swap;
pub mod health;
pub mod jobs;
pub mod metrics;
pub mod video;
