//! SeaORM entities for the application schema.

pub mod users;

pub mod prelude {
    pub use super::users::Entity as Users;
}
