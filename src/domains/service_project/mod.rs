pub mod types;
pub mod repository;
pub mod service;

pub use types::{
    AreaOfFocus, NewServiceProject, ProjectQuery, ProjectStatus, ServiceProject,
    ServiceProjectRow, UpdateServiceProject,
};
pub use repository::{ServiceProjectRepository, SqliteServiceProjectRepository};
pub use service::{ServiceProjectService, ServiceProjectServiceImpl};
