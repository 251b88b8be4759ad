pub mod activation_codes;
pub mod admins;
pub mod batches;
pub mod organizations;
pub mod prelude;
pub mod students;
pub mod teachers;
