pub use super::assignment::Entity as Assignment;
pub use super::availability::Entity as Availability;
pub use super::club::Entity as Club;
pub use super::institutional_email::Entity as InstitutionalEmail;
pub use super::letter_template::Entity as LetterTemplate;
pub use super::letterhead::Entity as Letterhead;
pub use super::notification::Entity as Notification;
pub use super::tournament::Entity as Tournament;
pub use super::tournament_category::Entity as TournamentCategory;
pub use super::tournament_notification::Entity as TournamentNotification;
pub use super::user::Entity as User;
pub use super::zone::Entity as Zone;
