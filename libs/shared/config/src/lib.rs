use std::env;
use tracing::warn;

const DEFAULT_TOKEN_TTL_HOURS: i64 = 24 * 7;
const DEFAULT_PORT: u16 = 3000;

/// Where providers, users and appointments are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Supabase,
}

/// How much a booking request is checked against the provider catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookingValidation {
    /// Accept any non-empty date, time and service name.
    #[default]
    Lenient,
    /// Require a known provider, a catalogued service and an on-grid time.
    Strict,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub storage_backend: StorageBackend,
    pub booking_validation: BookingValidation,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let supabase_url = env::var("SUPABASE_URL")
            .unwrap_or_else(|_| {
                warn!("SUPABASE_URL not set, using empty value");
                String::new()
            });

        let storage_backend = match env::var("STORAGE_BACKEND").ok().as_deref() {
            Some("memory") => StorageBackend::Memory,
            Some("supabase") => StorageBackend::Supabase,
            Some(other) => {
                warn!("Unknown STORAGE_BACKEND '{}', choosing from SUPABASE_URL", other);
                Self::default_backend(&supabase_url)
            }
            None => Self::default_backend(&supabase_url),
        };

        let booking_validation = match env::var("BOOKING_VALIDATION").ok().as_deref() {
            Some("strict") => BookingValidation::Strict,
            Some("lenient") | None => BookingValidation::Lenient,
            Some(other) => {
                warn!("Unknown BOOKING_VALIDATION '{}', using lenient", other);
                BookingValidation::Lenient
            }
        };

        let config = Self {
            supabase_url,
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            jwt_secret: env::var("JWT_SECRET")
                .or_else(|_| env::var("SUPABASE_JWT_SECRET"))
                .unwrap_or_else(|_| {
                    warn!("JWT_SECRET not set, using empty value");
                    String::new()
                }),
            token_ttl_hours: env::var("TOKEN_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TOKEN_TTL_HOURS),
            storage_backend,
            booking_validation,
            admin_email: env::var("ADMIN_EMAIL").ok().filter(|v| !v.is_empty()),
            admin_password: env::var("ADMIN_PASSWORD").ok().filter(|v| !v.is_empty()),
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_PORT),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    fn default_backend(supabase_url: &str) -> StorageBackend {
        if supabase_url.is_empty() {
            StorageBackend::Memory
        } else {
            StorageBackend::Supabase
        }
    }

    pub fn is_configured(&self) -> bool {
        if self.jwt_secret.is_empty() {
            return false;
        }
        match self.storage_backend {
            StorageBackend::Memory => true,
            StorageBackend::Supabase => self.is_supabase_configured(),
        }
    }

    pub fn is_supabase_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            jwt_secret: String::new(),
            token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
            storage_backend: StorageBackend::Memory,
            booking_validation: BookingValidation::Lenient,
            admin_email: None,
            admin_password: None,
            port: DEFAULT_PORT,
        }
    }
}
