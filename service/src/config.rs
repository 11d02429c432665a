use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use gateway_auth::http::AuthorizationScheme;
use log::LevelFilter;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Sandbox base URL of the gateway, used when `API_BASE_URL` is not set.
pub const DEFAULT_API_BASE_URL: &str = "https://api-preprod.phonepe.com/apis/pg-sandbox";

#[derive(Clone, Debug, PartialEq)]
pub enum RustEnv {
    Development,
    Production,
    Staging,
}

#[derive(Debug, PartialEq, Eq)]
pub struct RustEnvParseError;

impl FromStr for RustEnv {
    type Err = RustEnvParseError;
    fn from_str(level: &str) -> Result<RustEnv, Self::Err> {
        match level.to_lowercase().as_str() {
            "development" => Ok(RustEnv::Development),
            "production" => Ok(RustEnv::Production),
            "staging" => Ok(RustEnv::Staging),
            _ => Err(RustEnvParseError),
        }
    }
}

impl fmt::Display for RustEnv {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RustEnv::Development => write!(f, "development"),
            RustEnv::Production => write!(f, "production"),
            RustEnv::Staging => write!(f, "staging"),
        }
    }
}

/// Which subscription setup contract to speak to the gateway.
///
/// The gateway has been observed accepting several shapes; none is confirmed as
/// canonical, so the choice is left to deployment configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SetupVariant {
    /// `POST /subscriptions/v2/setup` with an `autoDebit` block.
    #[default]
    AutoDebit,
    /// `POST /subscriptions/v2/setup` with a `paymentFlow` block.
    PaymentFlow,
    /// Signed `POST /v3/recurring/auth/init` with a base64 request envelope.
    RecurringAuthInit,
    /// Signed `POST /v3/recurring/debit/init` with a base64 request envelope.
    RecurringDebitInit,
}

#[derive(Debug, PartialEq, Eq)]
pub struct SetupVariantParseError;

impl FromStr for SetupVariant {
    type Err = SetupVariantParseError;
    fn from_str(variant: &str) -> Result<SetupVariant, Self::Err> {
        match variant.to_lowercase().as_str() {
            "auto-debit" => Ok(SetupVariant::AutoDebit),
            "payment-flow" => Ok(SetupVariant::PaymentFlow),
            "recurring-auth-init" => Ok(SetupVariant::RecurringAuthInit),
            "recurring-debit-init" => Ok(SetupVariant::RecurringDebitInit),
            _ => Err(SetupVariantParseError),
        }
    }
}

impl fmt::Display for SetupVariant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SetupVariant::AutoDebit => write!(f, "auto-debit"),
            SetupVariant::PaymentFlow => write!(f, "payment-flow"),
            SetupVariant::RecurringAuthInit => write!(f, "recurring-auth-init"),
            SetupVariant::RecurringDebitInit => write!(f, "recurring-debit-init"),
        }
    }
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// A list of full CORS origin URLs that allowed to receive server responses.
    #[arg(
        long,
        env,
        value_delimiter = ',',
        use_value_delimiter = true,
        default_value = "http://localhost:3000,https://localhost:3000"
    )]
    pub allowed_origins: Vec<String>,

    /// The merchant identifier issued by the gateway.
    #[arg(long, env)]
    merchant_id: Option<String>,

    /// The OAuth client identifier issued by the gateway.
    #[arg(long, env)]
    client_id: Option<String>,

    /// The OAuth client secret. Also used as the X-VERIFY signing salt.
    #[arg(long, env, hide_env_values = true)]
    client_secret: Option<String>,

    /// The OAuth client version sent with the token exchange.
    #[arg(long, env, default_value = "1")]
    client_version: String,

    /// The base URL of the gateway API.
    /// Override in tests to point at a mock server.
    #[arg(long, env, default_value = DEFAULT_API_BASE_URL)]
    api_base_url: String,

    /// Where the gateway sends the customer's browser after authorization.
    #[arg(long, env)]
    redirect_url: Option<String>,

    /// Where the gateway posts server-to-server notifications.
    #[arg(long, env)]
    webhook_url: Option<String>,

    /// The salt key index appended to X-VERIFY signatures.
    #[arg(long, env, default_value_t = 1)]
    pub key_index: u32,

    /// The scheme placed before the access token in the Authorization header.
    #[arg(
        long,
        env,
        default_value_t = AuthorizationScheme::Bearer,
        value_parser = clap::builder::PossibleValuesParser::new([
            "Bearer", "O-Bearer", "bearer", "o-bearer"
        ])
            .map(|s| s.parse::<AuthorizationScheme>().unwrap()),
    )]
    pub auth_scheme: AuthorizationScheme,

    /// The subscription setup contract to use.
    #[arg(
        long,
        env,
        default_value_t = SetupVariant::AutoDebit,
        value_parser = clap::builder::PossibleValuesParser::new([
            "auto-debit", "payment-flow", "recurring-auth-init", "recurring-debit-init"
        ])
            .map(|s| s.parse::<SetupVariant>().unwrap()),
    )]
    pub setup_variant: SetupVariant,

    /// Timeout in seconds applied to every outbound gateway request
    #[arg(long, env, default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = "127.0.0.1")]
    pub interface: Option<String>,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = 4000)]
    pub port: u16,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,

    /// Set the Rust runtime environment to use.
    #[arg(
    short,
    long,
    env,
    default_value_t = RustEnv::Development,
    value_parser = clap::builder::PossibleValuesParser::new([
        "DEVELOPMENT", "PRODUCTION", "STAGING",
        "development", "production", "staging"
    ])
        .map(|s| s.parse::<RustEnv>().unwrap()),
    )]
    pub runtime_env: RustEnv,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    pub fn merchant_id(&self) -> Option<String> {
        self.merchant_id.clone()
    }

    pub fn client_id(&self) -> Option<String> {
        self.client_id.clone()
    }

    pub fn client_secret(&self) -> Option<String> {
        self.client_secret.clone()
    }

    pub fn client_version(&self) -> &str {
        &self.client_version
    }

    /// Returns the gateway API base URL.
    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    pub fn redirect_url(&self) -> Option<String> {
        self.redirect_url.clone()
    }

    pub fn webhook_url(&self) -> Option<String> {
        self.webhook_url.clone()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn runtime_env(&self) -> RustEnv {
        self.runtime_env.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply_when_only_credentials_given() {
        let config = Config::parse_from([
            "autopay",
            "--merchant-id",
            "MERCHANT",
            "--client-id",
            "client",
            "--client-secret",
            "secret",
        ]);

        assert_eq!(config.merchant_id().as_deref(), Some("MERCHANT"));
        assert_eq!(config.client_version(), "1");
        assert_eq!(config.api_base_url(), DEFAULT_API_BASE_URL);
        assert_eq!(config.key_index, 1);
        assert_eq!(config.auth_scheme, AuthorizationScheme::Bearer);
        assert_eq!(config.setup_variant, SetupVariant::AutoDebit);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_gateway_options_parse() {
        let config = Config::parse_from([
            "autopay",
            "--auth-scheme",
            "O-Bearer",
            "--setup-variant",
            "recurring-auth-init",
            "--request-timeout-secs",
            "5",
            "--key-index",
            "2",
        ]);

        assert_eq!(config.auth_scheme, AuthorizationScheme::OBearer);
        assert_eq!(config.setup_variant, SetupVariant::RecurringAuthInit);
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.key_index, 2);
    }

    #[test]
    fn test_unknown_setup_variant_rejected() {
        let result = Config::try_parse_from(["autopay", "--setup-variant", "v4"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_setup_variant_round_trips_through_display() {
        for variant in [
            SetupVariant::AutoDebit,
            SetupVariant::PaymentFlow,
            SetupVariant::RecurringAuthInit,
            SetupVariant::RecurringDebitInit,
        ] {
            assert_eq!(variant.to_string().parse(), Ok(variant));
        }
    }
}
