pub mod core;
pub mod settings;
pub mod rotary_year;
pub mod service_project;
pub mod speaker;
pub mod photo;
pub mod timeline;
pub mod impact;
