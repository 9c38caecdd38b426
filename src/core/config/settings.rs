use super::parsing::{
    env_optional, env_or_default, normalize_prefix, parse_bool, parse_cors_origins,
    parse_environment, parse_u16, parse_u32, parse_u64,
};
use super::secret::load_or_create_secret_key;
use super::types::{
    AdminSettings, ApiSettings, ConfigError, CorsSettings, DatabaseSettings, PolicySettings,
    RedisSettings, RuntimeSettings, SecuritySettings, ServerHost, ServerPort, ServerSettings,
    Settings, TelemetrySettings,
};

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let host = env_or_default("ELAMID_HOST", "0.0.0.0");
        let port = env_or_default("ELAMID_PORT", "5000");

        let environment =
            parse_environment(env_optional("ELAMID_ENV").or_else(|| env_optional("NODE_ENV")));
        let strict_config =
            env_optional("ELAMID_STRICT_CONFIG").map(|value| parse_bool(&value)).unwrap_or(false)
                || environment.is_production();

        let project_name = env_or_default("PROJECT_NAME", "El-Amid API");
        let version = env_or_default("VERSION", env!("CARGO_PKG_VERSION"));
        let prefix = normalize_prefix(env_or_default("API_PREFIX", "/api"));

        let secret_key = match env_optional("JWT_SECRET").or_else(|| env_optional("SECRET_KEY")) {
            Some(value) => value,
            None => load_or_create_secret_key(),
        };
        let student_token_expire_minutes = parse_u64(
            "STUDENT_TOKEN_EXPIRE_MINUTES",
            env_or_default("STUDENT_TOKEN_EXPIRE_MINUTES", "43200"),
        )?;
        let admin_token_expire_minutes = parse_u64(
            "ADMIN_TOKEN_EXPIRE_MINUTES",
            env_or_default("ADMIN_TOKEN_EXPIRE_MINUTES", "1440"),
        )?;
        let algorithm = env_or_default("ALGORITHM", "HS256");
        let secure_cookies = env_optional("SECURE_COOKIES")
            .map(|value| parse_bool(&value))
            .unwrap_or_else(|| environment.is_production());

        let cors_origins = parse_cors_origins(env_optional("BACKEND_CORS_ORIGINS"))?;

        let postgres_server = env_or_default("POSTGRES_SERVER", "localhost");
        let postgres_port = parse_u16("POSTGRES_PORT", env_or_default("POSTGRES_PORT", "5432"))?;
        let postgres_user = env_or_default("POSTGRES_USER", "elamid");
        let postgres_password = env_or_default("POSTGRES_PASSWORD", "");
        let postgres_db = env_or_default("POSTGRES_DB", "elamid_db");
        let database_url = env_optional("DATABASE_URL");
        let max_connections =
            parse_u32("DB_MAX_CONNECTIONS", env_or_default("DB_MAX_CONNECTIONS", "20"))?;
        let connect_retries =
            parse_u32("DB_CONNECT_RETRIES", env_or_default("DB_CONNECT_RETRIES", "5"))?;
        let connect_retry_delay_seconds = parse_u64(
            "DB_CONNECT_RETRY_DELAY_SECONDS",
            env_or_default("DB_CONNECT_RETRY_DELAY_SECONDS", "2"),
        )?;

        let redis_host = env_or_default("REDIS_HOST", "localhost");
        let redis_port = parse_u16("REDIS_PORT", env_or_default("REDIS_PORT", "6379"))?;
        let redis_db = parse_u16("REDIS_DB", env_or_default("REDIS_DB", "0"))?;
        let redis_password = env_or_default("REDIS_PASSWORD", "");

        let first_admin_username = env_or_default("FIRST_ADMIN_USERNAME", "admin");
        let first_admin_password = env_or_default("FIRST_ADMIN_PASSWORD", "");

        let device_mismatch_ban_threshold = parse_u32(
            "DEVICE_MISMATCH_BAN_THRESHOLD",
            env_or_default("DEVICE_MISMATCH_BAN_THRESHOLD", "0"),
        )?;
        let login_rate_limit =
            parse_u64("LOGIN_RATE_LIMIT", env_or_default("LOGIN_RATE_LIMIT", "10"))?;
        let login_rate_window_seconds = parse_u64(
            "LOGIN_RATE_WINDOW_SECONDS",
            env_or_default("LOGIN_RATE_WINDOW_SECONDS", "60"),
        )?;
        let max_generated_codes =
            parse_u32("MAX_GENERATED_CODES", env_or_default("MAX_GENERATED_CODES", "500"))?;
        let max_bulk_questions =
            parse_u32("MAX_BULK_QUESTIONS", env_or_default("MAX_BULK_QUESTIONS", "200"))?;

        let log_level = env_or_default("ELAMID_LOG_LEVEL", "info");
        let json = env_optional("ELAMID_LOG_JSON").map(|value| parse_bool(&value)).unwrap_or(false);
        let prometheus_enabled =
            env_optional("PROMETHEUS_ENABLED").map(|value| parse_bool(&value)).unwrap_or(false);

        let settings = Self {
            server: ServerSettings {
                host: ServerHost::parse(host)?,
                port: ServerPort::parse(port)?,
            },
            runtime: RuntimeSettings { environment, strict_config },
            api: ApiSettings { project_name, version, prefix },
            security: SecuritySettings {
                secret_key,
                student_token_expire_minutes,
                admin_token_expire_minutes,
                algorithm,
                secure_cookies,
            },
            cors: CorsSettings { origins: cors_origins },
            database: DatabaseSettings {
                postgres_server,
                postgres_port,
                postgres_user,
                postgres_password,
                postgres_db,
                database_url,
                max_connections,
                connect_retries,
                connect_retry_delay_seconds,
            },
            redis: RedisSettings {
                host: redis_host,
                port: redis_port,
                db: redis_db,
                password: redis_password,
            },
            admin: AdminSettings { first_admin_username, first_admin_password },
            policy: PolicySettings {
                device_mismatch_ban_threshold,
                login_rate_limit,
                login_rate_window_seconds,
                max_generated_codes,
                max_bulk_questions,
            },
            telemetry: TelemetrySettings { log_level, json, prometheus_enabled },
        };

        settings.validate()?;
        Ok(settings)
    }

    pub(crate) fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host.0, self.server.port.0)
    }

    pub(crate) fn server_host(&self) -> &str {
        &self.server.host.0
    }

    pub(crate) fn server_port(&self) -> u16 {
        self.server.port.0
    }

    pub(crate) fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub(crate) fn security(&self) -> &SecuritySettings {
        &self.security
    }

    pub(crate) fn cors(&self) -> &CorsSettings {
        &self.cors
    }

    pub(crate) fn database(&self) -> &DatabaseSettings {
        &self.database
    }

    pub(crate) fn redis(&self) -> &RedisSettings {
        &self.redis
    }

    pub(crate) fn admin(&self) -> &AdminSettings {
        &self.admin
    }

    pub(crate) fn policy(&self) -> &PolicySettings {
        &self.policy
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.security.algorithm != "HS256" {
            return Err(ConfigError::InvalidValue {
                field: "ALGORITHM",
                value: self.security.algorithm.clone(),
            });
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                field: "DB_MAX_CONNECTIONS",
                value: "0".to_string(),
            });
        }

        if self.policy.login_rate_window_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "LOGIN_RATE_WINDOW_SECONDS",
                value: "0".to_string(),
            });
        }

        if self.policy.max_generated_codes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "MAX_GENERATED_CODES",
                value: "0".to_string(),
            });
        }

        if !(self.runtime.strict_config || self.runtime.environment.is_production()) {
            return Ok(());
        }

        if self.database.database_url.is_none() && self.database.postgres_password.is_empty() {
            return Err(ConfigError::MissingSecret("POSTGRES_PASSWORD"));
        }
        if self.admin.first_admin_password.is_empty() {
            return Err(ConfigError::MissingSecret("FIRST_ADMIN_PASSWORD"));
        }

        Ok(())
    }
}
