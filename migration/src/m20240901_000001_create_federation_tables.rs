use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Zone {
    Table,
    Uuid,
    Name,
    Code,
    Description,
    Region,
    Email,
    IsActive,
    SortOrder,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Club {
    Table,
    Uuid,
    Name,
    Code,
    ZoneId,
    Email,
    Phone,
    Address,
    City,
    ContactPerson,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum User {
    Table,
    Uuid,
    Name,
    Email,
    UserType,
    ZoneId,
    RefereeCode,
    RefereeLevel,
    Phone,
    City,
    PhotoPath,
    IsActive,
    LastLoginAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum TournamentCategory {
    Table,
    Uuid,
    Name,
    Code,
    Description,
    IsNational,
    SortOrder,
    IsActive,
    Settings,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Tournament {
    Table,
    Uuid,
    Name,
    StartDate,
    EndDate,
    ClubId,
    ZoneId,
    CategoryId,
    Status,
    AvailabilityDeadline,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Availability {
    Table,
    Uuid,
    UserId,
    TournamentId,
    Notes,
    SubmittedAt,
}

#[derive(DeriveIden)]
enum Assignment {
    Table,
    Uuid,
    TournamentId,
    UserId,
    Role,
    IsConfirmed,
    Notes,
    AssignedAt,
}

#[derive(DeriveIden)]
enum InstitutionalEmail {
    Table,
    Uuid,
    Name,
    Email,
    Description,
    Category,
    ZoneId,
    ReceiveAllNotifications,
    NotificationTypes,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum LetterTemplate {
    Table,
    Uuid,
    Name,
    TemplateType,
    Subject,
    Body,
    ZoneId,
    CategoryId,
    IsActive,
    IsDefault,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Letterhead {
    Table,
    Uuid,
    Title,
    ZoneId,
    HeaderText,
    FooterText,
    Contact,
    LogoPath,
    IsActive,
    IsDefault,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum TournamentNotification {
    Table,
    Uuid,
    TournamentId,
    Status,
    RefereeTemplateId,
    ClubTemplateId,
    InstitutionalTemplateId,
    SendToClub,
    SendToReferees,
    SendToInstitutional,
    AdditionalEmails,
    TotalRecipients,
    SentCount,
    FailedCount,
    SentAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Notification {
    Table,
    Uuid,
    TournamentNotificationId,
    TournamentId,
    RecipientType,
    RecipientName,
    RecipientEmail,
    UserId,
    InstitutionalEmailId,
    Subject,
    Body,
    Status,
    ErrorMessage,
    Attempts,
    SentAt,
    CreatedAt,
}

fn uuid_pk<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col).uuid().not_null().primary_key().to_owned()
}

fn fk<A, B, C, D>(name: &str, from_tbl: A, from_col: B, to_tbl: C, to_col: D, on_delete: ForeignKeyAction) -> ForeignKeyCreateStatement
where
    A: IntoIden + 'static,
    B: IntoIden,
    C: IntoIden + 'static,
    D: IntoIden,
{
    ForeignKeyCreateStatement::new()
        .name(name)
        .from_tbl(from_tbl)
        .from_col(from_col)
        .to_tbl(to_tbl)
        .to_col(to_col)
        .on_delete(on_delete)
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(Zone::Table)
                .if_not_exists()
                .col(uuid_pk(Zone::Uuid))
                .col(ColumnDef::new(Zone::Name).string().not_null())
                .col(ColumnDef::new(Zone::Code).string().not_null().unique_key())
                .col(ColumnDef::new(Zone::Description).text())
                .col(ColumnDef::new(Zone::Region).string())
                .col(ColumnDef::new(Zone::Email).string())
                .col(ColumnDef::new(Zone::IsActive).boolean().not_null().default(true))
                .col(ColumnDef::new(Zone::SortOrder).integer().not_null().default(0))
                .col(ColumnDef::new(Zone::CreatedAt).date_time().not_null())
                .col(ColumnDef::new(Zone::UpdatedAt).date_time().not_null())
                .to_owned()
        ).await?;

        manager.create_table(
            Table::create()
                .table(Club::Table)
                .if_not_exists()
                .col(uuid_pk(Club::Uuid))
                .col(ColumnDef::new(Club::Name).string().not_null())
                .col(ColumnDef::new(Club::Code).string().not_null().unique_key())
                .col(ColumnDef::new(Club::ZoneId).uuid().not_null())
                .col(ColumnDef::new(Club::Email).string())
                .col(ColumnDef::new(Club::Phone).string())
                .col(ColumnDef::new(Club::Address).string())
                .col(ColumnDef::new(Club::City).string())
                .col(ColumnDef::new(Club::ContactPerson).string())
                .col(ColumnDef::new(Club::IsActive).boolean().not_null().default(true))
                .col(ColumnDef::new(Club::CreatedAt).date_time().not_null())
                .col(ColumnDef::new(Club::UpdatedAt).date_time().not_null())
                .foreign_key(&mut fk("fk-club-zone", Club::Table, Club::ZoneId, Zone::Table, Zone::Uuid, ForeignKeyAction::Restrict))
                .to_owned()
        ).await?;

        manager.create_table(
            Table::create()
                .table(User::Table)
                .if_not_exists()
                .col(uuid_pk(User::Uuid))
                .col(ColumnDef::new(User::Name).string().not_null())
                .col(ColumnDef::new(User::Email).string().not_null().unique_key())
                .col(ColumnDef::new(User::UserType).string_len(32).not_null())
                .col(ColumnDef::new(User::ZoneId).uuid())
                .col(ColumnDef::new(User::RefereeCode).string().unique_key())
                .col(ColumnDef::new(User::RefereeLevel).string_len(32))
                .col(ColumnDef::new(User::Phone).string())
                .col(ColumnDef::new(User::City).string())
                .col(ColumnDef::new(User::PhotoPath).string())
                .col(ColumnDef::new(User::IsActive).boolean().not_null().default(true))
                .col(ColumnDef::new(User::LastLoginAt).date_time())
                .col(ColumnDef::new(User::CreatedAt).date_time().not_null())
                .col(ColumnDef::new(User::UpdatedAt).date_time().not_null())
                .foreign_key(&mut fk("fk-user-zone", User::Table, User::ZoneId, Zone::Table, Zone::Uuid, ForeignKeyAction::Restrict))
                .to_owned()
        ).await?;

        manager.create_table(
            Table::create()
                .table(TournamentCategory::Table)
                .if_not_exists()
                .col(uuid_pk(TournamentCategory::Uuid))
                .col(ColumnDef::new(TournamentCategory::Name).string().not_null())
                .col(ColumnDef::new(TournamentCategory::Code).string().not_null().unique_key())
                .col(ColumnDef::new(TournamentCategory::Description).text())
                .col(ColumnDef::new(TournamentCategory::IsNational).boolean().not_null().default(false))
                .col(ColumnDef::new(TournamentCategory::SortOrder).integer().not_null().default(0))
                .col(ColumnDef::new(TournamentCategory::IsActive).boolean().not_null().default(true))
                .col(ColumnDef::new(TournamentCategory::Settings).json().not_null())
                .col(ColumnDef::new(TournamentCategory::CreatedAt).date_time().not_null())
                .col(ColumnDef::new(TournamentCategory::UpdatedAt).date_time().not_null())
                .to_owned()
        ).await?;

        manager.create_table(
            Table::create()
                .table(Tournament::Table)
                .if_not_exists()
                .col(uuid_pk(Tournament::Uuid))
                .col(ColumnDef::new(Tournament::Name).string().not_null())
                .col(ColumnDef::new(Tournament::StartDate).date().not_null())
                .col(ColumnDef::new(Tournament::EndDate).date().not_null())
                .col(ColumnDef::new(Tournament::ClubId).uuid().not_null())
                .col(ColumnDef::new(Tournament::ZoneId).uuid().not_null())
                .col(ColumnDef::new(Tournament::CategoryId).uuid().not_null())
                .col(ColumnDef::new(Tournament::Status).string_len(32).not_null())
                .col(ColumnDef::new(Tournament::AvailabilityDeadline).date())
                .col(ColumnDef::new(Tournament::Notes).text())
                .col(ColumnDef::new(Tournament::CreatedAt).date_time().not_null())
                .col(ColumnDef::new(Tournament::UpdatedAt).date_time().not_null())
                .foreign_key(&mut fk("fk-tournament-club", Tournament::Table, Tournament::ClubId, Club::Table, Club::Uuid, ForeignKeyAction::Restrict))
                .foreign_key(&mut fk("fk-tournament-zone", Tournament::Table, Tournament::ZoneId, Zone::Table, Zone::Uuid, ForeignKeyAction::Restrict))
                .foreign_key(&mut fk("fk-tournament-category", Tournament::Table, Tournament::CategoryId, TournamentCategory::Table, TournamentCategory::Uuid, ForeignKeyAction::Restrict))
                .to_owned()
        ).await?;

        manager.create_table(
            Table::create()
                .table(Availability::Table)
                .if_not_exists()
                .col(uuid_pk(Availability::Uuid))
                .col(ColumnDef::new(Availability::UserId).uuid().not_null())
                .col(ColumnDef::new(Availability::TournamentId).uuid().not_null())
                .col(ColumnDef::new(Availability::Notes).text())
                .col(ColumnDef::new(Availability::SubmittedAt).date_time().not_null())
                .foreign_key(&mut fk("fk-availability-user", Availability::Table, Availability::UserId, User::Table, User::Uuid, ForeignKeyAction::Cascade))
                .foreign_key(&mut fk("fk-availability-tournament", Availability::Table, Availability::TournamentId, Tournament::Table, Tournament::Uuid, ForeignKeyAction::Cascade))
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .name("idx-availability-user-tournament")
                .table(Availability::Table)
                .col(Availability::UserId)
                .col(Availability::TournamentId)
                .unique()
                .to_owned()
        ).await?;

        manager.create_table(
            Table::create()
                .table(Assignment::Table)
                .if_not_exists()
                .col(uuid_pk(Assignment::Uuid))
                .col(ColumnDef::new(Assignment::TournamentId).uuid().not_null())
                .col(ColumnDef::new(Assignment::UserId).uuid().not_null())
                .col(ColumnDef::new(Assignment::Role).string_len(32).not_null())
                .col(ColumnDef::new(Assignment::IsConfirmed).boolean().not_null().default(false))
                .col(ColumnDef::new(Assignment::Notes).text())
                .col(ColumnDef::new(Assignment::AssignedAt).date_time().not_null())
                .foreign_key(&mut fk("fk-assignment-tournament", Assignment::Table, Assignment::TournamentId, Tournament::Table, Tournament::Uuid, ForeignKeyAction::Cascade))
                .foreign_key(&mut fk("fk-assignment-user", Assignment::Table, Assignment::UserId, User::Table, User::Uuid, ForeignKeyAction::Cascade))
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .name("idx-assignment-user-tournament")
                .table(Assignment::Table)
                .col(Assignment::UserId)
                .col(Assignment::TournamentId)
                .unique()
                .to_owned()
        ).await?;

        manager.create_table(
            Table::create()
                .table(InstitutionalEmail::Table)
                .if_not_exists()
                .col(uuid_pk(InstitutionalEmail::Uuid))
                .col(ColumnDef::new(InstitutionalEmail::Name).string().not_null())
                .col(ColumnDef::new(InstitutionalEmail::Email).string().not_null().unique_key())
                .col(ColumnDef::new(InstitutionalEmail::Description).text())
                .col(ColumnDef::new(InstitutionalEmail::Category).string_len(32).not_null())
                .col(ColumnDef::new(InstitutionalEmail::ZoneId).uuid())
                .col(ColumnDef::new(InstitutionalEmail::ReceiveAllNotifications).boolean().not_null().default(false))
                .col(ColumnDef::new(InstitutionalEmail::NotificationTypes).json().not_null())
                .col(ColumnDef::new(InstitutionalEmail::IsActive).boolean().not_null().default(true))
                .col(ColumnDef::new(InstitutionalEmail::CreatedAt).date_time().not_null())
                .col(ColumnDef::new(InstitutionalEmail::UpdatedAt).date_time().not_null())
                .foreign_key(&mut fk("fk-institutional-email-zone", InstitutionalEmail::Table, InstitutionalEmail::ZoneId, Zone::Table, Zone::Uuid, ForeignKeyAction::SetNull))
                .to_owned()
        ).await?;

        manager.create_table(
            Table::create()
                .table(LetterTemplate::Table)
                .if_not_exists()
                .col(uuid_pk(LetterTemplate::Uuid))
                .col(ColumnDef::new(LetterTemplate::Name).string().not_null())
                .col(ColumnDef::new(LetterTemplate::TemplateType).string_len(32).not_null())
                .col(ColumnDef::new(LetterTemplate::Subject).string().not_null())
                .col(ColumnDef::new(LetterTemplate::Body).text().not_null())
                .col(ColumnDef::new(LetterTemplate::ZoneId).uuid())
                .col(ColumnDef::new(LetterTemplate::CategoryId).uuid())
                .col(ColumnDef::new(LetterTemplate::IsActive).boolean().not_null().default(true))
                .col(ColumnDef::new(LetterTemplate::IsDefault).boolean().not_null().default(false))
                .col(ColumnDef::new(LetterTemplate::CreatedAt).date_time().not_null())
                .col(ColumnDef::new(LetterTemplate::UpdatedAt).date_time().not_null())
                .foreign_key(&mut fk("fk-letter-template-zone", LetterTemplate::Table, LetterTemplate::ZoneId, Zone::Table, Zone::Uuid, ForeignKeyAction::Cascade))
                .foreign_key(&mut fk("fk-letter-template-category", LetterTemplate::Table, LetterTemplate::CategoryId, TournamentCategory::Table, TournamentCategory::Uuid, ForeignKeyAction::Cascade))
                .to_owned()
        ).await?;

        manager.create_table(
            Table::create()
                .table(Letterhead::Table)
                .if_not_exists()
                .col(uuid_pk(Letterhead::Uuid))
                .col(ColumnDef::new(Letterhead::Title).string().not_null())
                .col(ColumnDef::new(Letterhead::ZoneId).uuid())
                .col(ColumnDef::new(Letterhead::HeaderText).text())
                .col(ColumnDef::new(Letterhead::FooterText).text())
                .col(ColumnDef::new(Letterhead::Contact).json().not_null())
                .col(ColumnDef::new(Letterhead::LogoPath).string())
                .col(ColumnDef::new(Letterhead::IsActive).boolean().not_null().default(true))
                .col(ColumnDef::new(Letterhead::IsDefault).boolean().not_null().default(false))
                .col(ColumnDef::new(Letterhead::CreatedAt).date_time().not_null())
                .col(ColumnDef::new(Letterhead::UpdatedAt).date_time().not_null())
                .foreign_key(&mut fk("fk-letterhead-zone", Letterhead::Table, Letterhead::ZoneId, Zone::Table, Zone::Uuid, ForeignKeyAction::Cascade))
                .to_owned()
        ).await?;

        manager.create_table(
            Table::create()
                .table(TournamentNotification::Table)
                .if_not_exists()
                .col(uuid_pk(TournamentNotification::Uuid))
                .col(ColumnDef::new(TournamentNotification::TournamentId).uuid().not_null())
                .col(ColumnDef::new(TournamentNotification::Status).string_len(32).not_null())
                .col(ColumnDef::new(TournamentNotification::RefereeTemplateId).uuid())
                .col(ColumnDef::new(TournamentNotification::ClubTemplateId).uuid())
                .col(ColumnDef::new(TournamentNotification::InstitutionalTemplateId).uuid())
                .col(ColumnDef::new(TournamentNotification::SendToClub).boolean().not_null().default(true))
                .col(ColumnDef::new(TournamentNotification::SendToReferees).boolean().not_null().default(true))
                .col(ColumnDef::new(TournamentNotification::SendToInstitutional).boolean().not_null().default(true))
                .col(ColumnDef::new(TournamentNotification::AdditionalEmails).json().not_null())
                .col(ColumnDef::new(TournamentNotification::TotalRecipients).integer().not_null().default(0))
                .col(ColumnDef::new(TournamentNotification::SentCount).integer().not_null().default(0))
                .col(ColumnDef::new(TournamentNotification::FailedCount).integer().not_null().default(0))
                .col(ColumnDef::new(TournamentNotification::SentAt).date_time())
                .col(ColumnDef::new(TournamentNotification::CreatedAt).date_time().not_null())
                .col(ColumnDef::new(TournamentNotification::UpdatedAt).date_time().not_null())
                .foreign_key(&mut fk("fk-tournament-notification-tournament", TournamentNotification::Table, TournamentNotification::TournamentId, Tournament::Table, Tournament::Uuid, ForeignKeyAction::Cascade))
                .foreign_key(&mut fk("fk-tournament-notification-referee-template", TournamentNotification::Table, TournamentNotification::RefereeTemplateId, LetterTemplate::Table, LetterTemplate::Uuid, ForeignKeyAction::SetNull))
                .foreign_key(&mut fk("fk-tournament-notification-club-template", TournamentNotification::Table, TournamentNotification::ClubTemplateId, LetterTemplate::Table, LetterTemplate::Uuid, ForeignKeyAction::SetNull))
                .foreign_key(&mut fk("fk-tournament-notification-institutional-template", TournamentNotification::Table, TournamentNotification::InstitutionalTemplateId, LetterTemplate::Table, LetterTemplate::Uuid, ForeignKeyAction::SetNull))
                .to_owned()
        ).await?;

        manager.create_table(
            Table::create()
                .table(Notification::Table)
                .if_not_exists()
                .col(uuid_pk(Notification::Uuid))
                .col(ColumnDef::new(Notification::TournamentNotificationId).uuid().not_null())
                .col(ColumnDef::new(Notification::TournamentId).uuid().not_null())
                .col(ColumnDef::new(Notification::RecipientType).string_len(32).not_null())
                .col(ColumnDef::new(Notification::RecipientName).string().not_null())
                .col(ColumnDef::new(Notification::RecipientEmail).string().not_null())
                .col(ColumnDef::new(Notification::UserId).uuid())
                .col(ColumnDef::new(Notification::InstitutionalEmailId).uuid())
                .col(ColumnDef::new(Notification::Subject).string().not_null())
                .col(ColumnDef::new(Notification::Body).text().not_null())
                .col(ColumnDef::new(Notification::Status).string_len(32).not_null())
                .col(ColumnDef::new(Notification::ErrorMessage).text())
                .col(ColumnDef::new(Notification::Attempts).integer().not_null().default(0))
                .col(ColumnDef::new(Notification::SentAt).date_time())
                .col(ColumnDef::new(Notification::CreatedAt).date_time().not_null())
                .foreign_key(&mut fk("fk-notification-tournament-notification", Notification::Table, Notification::TournamentNotificationId, TournamentNotification::Table, TournamentNotification::Uuid, ForeignKeyAction::Cascade))
                .foreign_key(&mut fk("fk-notification-tournament", Notification::Table, Notification::TournamentId, Tournament::Table, Tournament::Uuid, ForeignKeyAction::Cascade))
                .foreign_key(&mut fk("fk-notification-user", Notification::Table, Notification::UserId, User::Table, User::Uuid, ForeignKeyAction::SetNull))
                .foreign_key(&mut fk("fk-notification-institutional-email", Notification::Table, Notification::InstitutionalEmailId, InstitutionalEmail::Table, InstitutionalEmail::Uuid, ForeignKeyAction::SetNull))
                .to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Notification::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(TournamentNotification::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Letterhead::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(LetterTemplate::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(InstitutionalEmail::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Assignment::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Availability::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Tournament::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(TournamentCategory::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(User::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Club::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Zone::Table).to_owned()).await?;
        Ok(())
    }
}
