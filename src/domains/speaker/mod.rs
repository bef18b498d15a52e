pub mod types;
pub mod repository;
pub mod service;

pub use types::{NewSpeaker, Speaker, SpeakerRow, SpeakerStatus, UpdateSpeaker};
pub use repository::{SpeakerRepository, SqliteSpeakerRepository};
pub use service::{SpeakerService, SpeakerServiceImpl};
