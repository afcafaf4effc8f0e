#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MailTransport {
    Log,
    Disabled,
}

#[derive(Debug, serde::Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub db_url: String,
    pub host: String,
    pub port: u16,
    pub logging_config: String,
    pub federation_name: String,
    pub mail_from: String,
    pub mail_transport: MailTransport,
    pub default_per_page: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            db_url: "sqlite://./golf_admin.sqlite3?mode=rwc".into(),
            host: "0.0.0.0".into(),
            port: 3000,
            logging_config: "info,sqlx::query=warn,tower_http=debug,axum::rejection=trace".into(),
            federation_name: "Federazione Italiana Golf".into(),
            mail_from: "noreply@federgolf.local".into(),
            mail_transport: MailTransport::Log,
            default_per_page: 20,
        }
    }
}

pub(crate) fn read_config_inner() -> Result<Config, anyhow::Error> {
    let config_path = std::env::var("GOLF_ADMIN_CONFIG")?;
    let config = std::fs::read_to_string(config_path)?;
    let config = serde_yaml::from_str::<Config>(&config)?;
    Ok(config)
}

pub fn read_config() -> Config {
    match read_config_inner() {
        Ok(config) => config,
        Err(e) => {
            //Print to stderr, since logging is set up in the config
            eprintln!("Warning: Failed to read config: {}", e);
            Config::default()
        }
    }
}
