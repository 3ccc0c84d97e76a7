pub use super::read_progress::Entity as ReadProgress;
