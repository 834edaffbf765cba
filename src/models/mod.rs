pub mod artifact;
pub mod face_swap;
pub mod job;
pub mod video;
