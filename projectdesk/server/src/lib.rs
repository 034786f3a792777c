pub mod config {
    use serde::Deserialize;

    use crate::task::OnTaskDelete;

    #[derive(Deserialize, Debug, Clone)]
    pub struct Config {
        pub db_url: String,
        #[serde(default = "default_port")]
        pub port: u16,
        pub admin_email: String,
        pub admin_password: String,
        pub jwt_secret: String,
        /// What happens to dependency edges when one of their tasks is deleted.
        #[serde(default)]
        pub on_task_delete: OnTaskDelete,
    }

    impl Config {
        /// Loads configuration from environment variables.
        pub fn from_env() -> anyhow::Result<Self> {
            let settings = config::Config::builder()
                .add_source(config::Environment::default())
                .build()?;

            let config: Config = settings.try_deserialize()?;
            Ok(config)
        }
    }

    fn default_port() -> u16 {
        8080
    }
}

pub mod attachment;
pub mod auth;
pub mod comment;
pub mod dashboard;
pub mod dependency;
pub mod entities;
pub mod milestone;
pub mod project;
pub mod resource;
pub mod risk;
pub mod role;
pub mod task;
pub mod team;
pub mod timesheet;
pub mod user;
pub mod web;
