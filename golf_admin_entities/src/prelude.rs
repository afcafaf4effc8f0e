pub use crate::domain::assignment::{AssignmentRole, AssignmentRequirements};
pub use crate::domain::category::{CategorySettings, ZoneVisibility};
pub use crate::domain::institutional_email::{EmailCategory, NotificationType, NotificationTypeList};
pub use crate::domain::letter_template::{TemplateScope, TemplateType};
pub use crate::domain::letterhead::LetterheadContact;
pub use crate::domain::notification::{DeliveryStatus, DispatchStatus, EmailList, RecipientType};
pub use crate::domain::template::{TemplateContext, TemplateVariable, RenderedMessage};
pub use crate::domain::tournament::TournamentStatus;
pub use crate::domain::user::{RefereeLevel, UserType};
