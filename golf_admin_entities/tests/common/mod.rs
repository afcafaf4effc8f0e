use golf_admin_entities::mock::{self, MockFederation};
use migration::MigratorTrait;
use sea_orm::{prelude::*, Database, Statement};

pub async fn set_up_db(with_mock_env: bool) -> Result<(DatabaseConnection, MockFederation), anyhow::Error> {
    let db = Database::connect("sqlite::memory:").await?;
    migration::Migrator::up(&db, None).await.unwrap();
    let _r = db.execute(Statement::from_sql_and_values(
        db.get_database_backend(),
        "PRAGMA foreign_keys = ON;",
        vec![])
    ).await?;

    let fixture = if with_mock_env {
        mock::make_mock_federation_with_options(&db, mock::MockOption { deterministic_uuids: true, ..Default::default() }).await?
    }
    else {
        MockFederation::default()
    };
    Ok((db, fixture))
}
