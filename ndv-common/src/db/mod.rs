//! Database access shared by NDV tools

pub mod init;
pub mod models;

pub use init::{connect_readonly, init_database};
pub use models::{load_milestones, load_videos, MilestoneRow, VideoRow};
