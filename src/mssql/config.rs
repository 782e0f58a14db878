use serde::{Deserialize, Serialize};
use tiberius::{AuthMethod, Config as TiberiusConfig};

/// Default SQL Server TCP port.
pub const DEFAULT_PORT: u16 = 1433;

/// Options for connecting to SQL Server.
///
/// Deserializable from configuration files; the password is never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MssqlOptions {
    pub server: String,
    pub database: String,
    pub user: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub instance_name: Option<String>,
    #[serde(default = "default_trust_cert")]
    pub trust_cert: bool,
}

fn default_trust_cert() -> bool {
    true
}

impl MssqlOptions {
    #[must_use]
    pub fn new(server: String, database: String, user: String, password: String) -> Self {
        Self {
            server,
            database,
            user,
            password,
            port: None,
            instance_name: None,
            trust_cert: true,
        }
    }

    #[must_use]
    pub fn builder(
        server: String,
        database: String,
        user: String,
        password: String,
    ) -> MssqlOptionsBuilder {
        MssqlOptionsBuilder::new(server, database, user, password)
    }

    #[must_use]
    pub fn with_port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_instance_name(mut self, instance_name: Option<String>) -> Self {
        self.instance_name = instance_name;
        self
    }

    #[must_use]
    pub fn port_or_default(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub(crate) fn tiberius_config(&self) -> TiberiusConfig {
        let mut config = TiberiusConfig::new();
        config.host(&self.server);
        config.database(&self.database);
        config.port(self.port_or_default());
        config.authentication(AuthMethod::sql_server(&self.user, &self.password));
        if let Some(instance) = &self.instance_name {
            config.instance_name(instance);
        }
        if self.trust_cert {
            config.trust_cert();
        }
        config
    }
}

/// Fluent builder for MSSQL options.
#[derive(Debug, Clone)]
pub struct MssqlOptionsBuilder {
    opts: MssqlOptions,
}

impl MssqlOptionsBuilder {
    #[must_use]
    pub fn new(server: String, database: String, user: String, password: String) -> Self {
        Self {
            opts: MssqlOptions::new(server, database, user, password),
        }
    }

    #[must_use]
    pub fn port(mut self, port: Option<u16>) -> Self {
        self.opts.port = port;
        self
    }

    #[must_use]
    pub fn instance_name(mut self, instance_name: Option<String>) -> Self {
        self.opts.instance_name = instance_name;
        self
    }

    #[must_use]
    pub fn trust_cert(mut self, trust_cert: bool) -> Self {
        self.opts.trust_cert = trust_cert;
        self
    }

    #[must_use]
    pub fn finish(self) -> MssqlOptions {
        self.opts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_is_not_serialized() {
        let opts = MssqlOptions::builder(
            "localhost".into(),
            "app".into(),
            "sa".into(),
            "secret".into(),
        )
        .port(Some(1444))
        .finish();
        let json = serde_json::to_string(&opts).unwrap();
        assert!(!json.contains("secret"));
        assert_eq!(opts.port_or_default(), 1444);
    }

    #[test]
    fn deserializes_with_defaults() {
        let opts: MssqlOptions = serde_json::from_str(
            r#"{"server": "db", "database": "app", "user": "svc", "password": "pw"}"#,
        )
        .unwrap();
        assert_eq!(opts.port_or_default(), DEFAULT_PORT);
        assert!(opts.trust_cert);
        assert!(opts.instance_name.is_none());
        assert_eq!(opts.password, "pw");
    }
}
