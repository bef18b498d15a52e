pub mod types;
pub mod repository;
pub mod service;

pub use types::{NewPhoto, Photo, PhotoRow, UpdatePhoto};
pub use repository::{PhotoRepository, SqlitePhotoRepository};
pub use service::{PhotoService, PhotoServiceImpl};
