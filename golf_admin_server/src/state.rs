use std::sync::Arc;
use axum::extract::FromRef;
use db::DatabaseConfig;
use sea_orm::prelude::*;

use crate::config::{Config, MailTransport};
use crate::db;
use crate::mail::{DisabledMailer, LogMailer, Mailer, RecordingMailer};


#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub mailer: Arc<dyn Mailer>,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<AppState, DbErr> {
        let db = db::set_up_db(DatabaseConfig::new(config.db_url.clone())).await?;
        let mailer: Arc<dyn Mailer> = match config.mail_transport {
            MailTransport::Log => Arc::new(LogMailer::new(config.mail_from.clone())),
            MailTransport::Disabled => Arc::new(DisabledMailer),
        };
        Ok(AppState {
            db,
            mailer,
            config: Arc::new(config),
        })
    }

    pub fn new_with_db(db: DatabaseConnection, mailer: Arc<dyn Mailer>, config: Config) -> AppState {
        AppState {
            db,
            mailer,
            config: Arc::new(config),
        }
    }

    pub async fn new_test_app() -> AppState {
        Self::new_test_app_with_mailer(Arc::new(RecordingMailer::new())).await
    }

    pub async fn new_test_app_with_mailer(mailer: Arc<dyn Mailer>) -> AppState {
        let db = db::set_up_db(
            DatabaseConfig::new(
                "sqlite::memory:".into(),
            )
        ).await.expect("Failed to set up database");
        AppState {
            db,
            mailer,
            config: Arc::new(Config::default()),
        }
    }
}

impl FromRef<AppState> for DatabaseConnection {
    fn from_ref(app_state: &AppState) -> DatabaseConnection {
        app_state.db.clone()
    }
}

impl FromRef<AppState> for Arc<dyn Mailer> {
    fn from_ref(app_state: &AppState) -> Arc<dyn Mailer> {
        app_state.mailer.clone()
    }
}

impl FromRef<AppState> for Arc<Config> {
    fn from_ref(app_state: &AppState) -> Arc<Config> {
        app_state.config.clone()
    }
}
