pub use super::activation_codes::Entity as ActivationCodes;
pub use super::admins::Entity as Admins;
pub use super::batches::Entity as Batches;
pub use super::organizations::Entity as Organizations;
pub use super::students::Entity as Students;
pub use super::teachers::Entity as Teachers;
