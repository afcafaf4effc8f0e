use golf_admin_entities::domain::institutional_email::{recipients_for, NotificationType};
use golf_admin_entities::queries;
use sea_orm::prelude::*;

mod common;

#[tokio::test]
async fn test_recipients_include_federation_wide_and_zone_addresses() -> Result<(), anyhow::Error> {
    let (db, fx) = common::set_up_db(true).await?;

    let recipients = recipients_for(&db, NotificationType::Assignment, fx.zones[0]).await?;
    let names = recipients.iter().map(|r| r.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["Comitato Zona Nord", "Segreteria Federale"]);

    let recipients = recipients_for(&db, NotificationType::Cancellation, fx.zones[0]).await?;
    let names = recipients.iter().map(|r| r.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["Segreteria Federale", "Ufficio Reclami"]);
    Ok(())
}

#[tokio::test]
async fn test_zone_dependents_are_counted() -> Result<(), anyhow::Error> {
    let (db, fx) = common::set_up_db(true).await?;
    let deps = queries::zone_dependents(&db, &fx.zones).await?;

    let north = deps[&fx.zones[0]];
    assert_eq!(north.users, 5);
    assert_eq!(north.clubs, 1);
    assert_eq!(north.tournaments, 1);
    assert!(north.any());

    let south = deps[&fx.zones[1]];
    assert_eq!(south.users, 0);
    assert_eq!(south.clubs, 1);
    assert_eq!(south.tournaments, 0);
    Ok(())
}

#[tokio::test]
async fn test_unused_zone_has_no_dependents() -> Result<(), anyhow::Error> {
    let (db, _) = common::set_up_db(true).await?;
    let unused = Uuid::from_u128(99);
    let deps = queries::zone_dependents(&db, &[unused]).await?;
    assert!(!deps[&unused].any());
    Ok(())
}

#[tokio::test]
async fn test_user_and_club_dependents() -> Result<(), anyhow::Error> {
    let (db, fx) = common::set_up_db(true).await?;

    let deps = queries::user_dependents(&db, &fx.referees).await?;
    assert_eq!(deps[&fx.referees[0]].assignments, 1);
    assert!(!deps[&fx.referees[3]].any());

    let by_club = queries::tournaments_by_club(&db, &fx.clubs).await?;
    assert_eq!(by_club.get(&fx.clubs[0]), Some(&1));
    assert_eq!(by_club.get(&fx.clubs[1]), None);

    let by_category = queries::tournaments_by_category(&db, &fx.categories).await?;
    assert_eq!(by_category.get(&fx.categories[0]), Some(&1));
    Ok(())
}
