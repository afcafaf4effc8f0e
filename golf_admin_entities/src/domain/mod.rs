pub mod error;
pub mod validation;
pub mod user;
pub mod category;
pub mod tournament;
pub mod assignment;
pub mod institutional_email;
pub mod template;
pub mod letter_template;
pub mod letterhead;
pub mod notification;

pub use error::DomainError;
pub use validation::FieldErrors;
