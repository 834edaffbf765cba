pub mod face_swap;
pub mod jobs;
pub mod kling;
pub mod locator;
pub mod orchestrator;
pub mod presets;
pub mod provider;
pub mod signing;
pub mod storage;
pub mod worker;
