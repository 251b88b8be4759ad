pub mod activation_code;
pub mod admin;
pub mod batch;
pub mod organization;
pub mod student;
pub mod teacher;
