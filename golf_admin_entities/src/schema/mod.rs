pub mod prelude;

pub mod zone;
pub mod club;
pub mod user;
pub mod tournament_category;
pub mod tournament;
pub mod availability;
pub mod assignment;
pub mod institutional_email;
pub mod letter_template;
pub mod letterhead;
pub mod tournament_notification;
pub mod notification;
