use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

/// HTTP mail API settings. An empty `api_url` disables outgoing mail.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub api_url: String,
    pub api_key: String,
    pub from: String,
    pub admin_inbox: String,
}

/// Mobile-money gateway settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    pub base_url: String,
    pub secret_key: String,
    pub webhook_hash: String,
    pub charge_type: String,
    pub currency: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub http: HttpConfig,
    pub jwt: JwtConfig,
    pub storage: StorageConfig,
    pub mail: MailConfig,
    pub gateway: GatewayConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let http = HttpConfig {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("APP_PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(8080),
        };

        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "offisho".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "offisho-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            refresh_ttl_minutes: std::env::var("JWT_REFRESH_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 14),
        };

        let storage = StorageConfig {
            endpoint: std::env::var("STORAGE_ENDPOINT")
                .map_err(|_| anyhow::anyhow!("STORAGE_ENDPOINT environment variable is required"))?,
            bucket: std::env::var("STORAGE_BUCKET").unwrap_or_else(|_| "offisho-cars".into()),
            access_key: std::env::var("STORAGE_ACCESS_KEY")
                .map_err(|_| anyhow::anyhow!("STORAGE_ACCESS_KEY environment variable is required"))?,
            secret_key: std::env::var("STORAGE_SECRET_KEY")
                .map_err(|_| anyhow::anyhow!("STORAGE_SECRET_KEY environment variable is required"))?,
            region: std::env::var("STORAGE_REGION").unwrap_or_else(|_| "us-east-1".into()),
        };

        let mail = MailConfig {
            api_url: std::env::var("MAIL_API_URL").unwrap_or_default(),
            api_key: std::env::var("MAIL_API_KEY").unwrap_or_default(),
            from: std::env::var("MAIL_FROM")
                .unwrap_or_else(|_| "Offisho Transport <no-reply@offisho.example>".into()),
            admin_inbox: std::env::var("MAIL_ADMIN_INBOX").unwrap_or_default(),
        };

        let gateway = GatewayConfig {
            base_url: std::env::var("FLW_BASE_URL")
                .unwrap_or_else(|_| "https://api.flutterwave.com/v3".into()),
            secret_key: std::env::var("FLW_SECRET_KEY")
                .map_err(|_| anyhow::anyhow!("FLW_SECRET_KEY environment variable is required"))?,
            webhook_hash: std::env::var("FLW_WEBHOOK_HASH")
                .map_err(|_| anyhow::anyhow!("FLW_WEBHOOK_HASH environment variable is required"))?,
            charge_type: std::env::var("FLW_CHARGE_TYPE")
                .unwrap_or_else(|_| "mobile_money_uganda".into()),
            currency: std::env::var("FLW_CURRENCY").unwrap_or_else(|_| "UGX".into()),
        };

        Ok(Self {
            database_url,
            http,
            jwt,
            storage,
            mail,
            gateway,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.http.host, self.http.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_address_joins_host_and_port() {
        let http = HttpConfig {
            host: "127.0.0.1".into(),
            port: 9000,
        };
        let config = AppConfig {
            database_url: "postgres://localhost/offisho".into(),
            http,
            jwt: JwtConfig {
                secret: "secret".into(),
                issuer: "offisho".into(),
                audience: "offisho-users".into(),
                ttl_minutes: 60,
                refresh_ttl_minutes: 120,
            },
            storage: StorageConfig {
                endpoint: "http://localhost:9000".into(),
                bucket: "offisho-cars".into(),
                access_key: "ak".into(),
                secret_key: "sk".into(),
                region: "us-east-1".into(),
            },
            mail: MailConfig {
                api_url: String::new(),
                api_key: String::new(),
                from: "no-reply@offisho.example".into(),
                admin_inbox: String::new(),
            },
            gateway: GatewayConfig {
                base_url: "https://api.flutterwave.com/v3".into(),
                secret_key: "sk".into(),
                webhook_hash: "hash".into(),
                charge_type: "mobile_money_uganda".into(),
                currency: "UGX".into(),
            },
        };
        assert_eq!(config.bind_address(), "127.0.0.1:9000");
    }
}
