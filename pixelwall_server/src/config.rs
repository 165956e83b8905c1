use std::{env, net::IpAddr};

use chrono::Duration;
use log::*;
use pixelwall_engine::db_types::MAX_SIDE_LENGTH;
use pxw_common::{helpers::parse_boolean_flag, Secret};
use stripe_tools::StripeConfig as StripeApiConfig;

const DEFAULT_PXW_HOST: &str = "127.0.0.1";
const DEFAULT_PXW_PORT: u16 = 8360;
const DEFAULT_CANVAS_SIDE_LENGTH: i64 = 100;
const DEFAULT_SESSION_TIMEOUT: Duration = Duration::minutes(120);
const DEFAULT_SIGNATURE_TOLERANCE_SECS: i64 = 300;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// The side length of the canvas. Used only to create the canvas on first boot; a running instance refuses
    /// to start against a database whose canvas has a different size.
    pub canvas_side_length: i64,
    /// How long an open payment session may go without a gateway event before the expiry sweep closes it.
    pub session_timeout: Duration,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
    /// Stripe gateway configuration
    pub stripe_config: StripeGatewayConfig,
}

#[derive(Clone, Debug, Default)]
pub struct StripeGatewayConfig {
    /// Secret used to verify `Stripe-Signature` headers on incoming webhook calls.
    pub webhook_secret: Secret<String>,
    pub signature_checks: bool,
    /// Maximum age, in seconds, of a webhook signature timestamp.
    pub signature_tolerance: i64,
    /// If supplied, requests against /stripe endpoints will be checked against a whitelist of IP addresses.
    /// To explicitly disable the whitelist, set this to "false", "none", or "0".
    pub whitelist: Option<Vec<IpAddr>>,
    pub api: StripeApiConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_PXW_HOST.to_string(),
            port: DEFAULT_PXW_PORT,
            database_url: String::default(),
            canvas_side_length: DEFAULT_CANVAS_SIDE_LENGTH,
            session_timeout: DEFAULT_SESSION_TIMEOUT,
            use_x_forwarded_for: false,
            use_forwarded: false,
            stripe_config: StripeGatewayConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("PXW_HOST").ok().unwrap_or_else(|| DEFAULT_PXW_HOST.into());
        let port = env::var("PXW_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for PXW_PORT. {e} Using the default, {DEFAULT_PXW_PORT}, instead."
                    );
                    DEFAULT_PXW_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_PXW_PORT);
        let database_url = env::var("PXW_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ PXW_DATABASE_URL is not set. Please set it to the URL for the pixelwall database.");
            String::default()
        });
        let canvas_side_length = env::var("PXW_CANVAS_SIDE")
            .map_err(|_| {
                info!("🪛️ PXW_CANVAS_SIDE is not set. Using the default value of {DEFAULT_CANVAS_SIDE_LENGTH}.")
            })
            .and_then(|s| {
                s.parse::<i64>().map_err(|e| warn!("🪛️ Invalid configuration value for PXW_CANVAS_SIDE. {e}"))
            })
            .ok()
            .filter(|n| {
                let in_range = (1..=MAX_SIDE_LENGTH).contains(n);
                if !in_range {
                    warn!(
                        "🪛️ PXW_CANVAS_SIDE must be between 1 and {MAX_SIDE_LENGTH}. Using the default instead."
                    );
                }
                in_range
            })
            .unwrap_or(DEFAULT_CANVAS_SIDE_LENGTH);
        let session_timeout = env::var("PXW_SESSION_TIMEOUT")
            .map_err(|_| {
                info!(
                    "🪛️ PXW_SESSION_TIMEOUT is not set. Using the default value of {} minutes.",
                    DEFAULT_SESSION_TIMEOUT.num_minutes()
                )
            })
            .and_then(|s| {
                s.parse::<i64>()
                    .map(Duration::minutes)
                    .map_err(|e| warn!("🪛️ Invalid configuration value for PXW_SESSION_TIMEOUT. {e}"))
            })
            .ok()
            .unwrap_or(DEFAULT_SESSION_TIMEOUT);
        let use_x_forwarded_for = parse_boolean_flag(env::var("PXW_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("PXW_USE_FORWARDED").ok(), false);
        let stripe_config = StripeGatewayConfig::from_env_or_defaults();
        Self {
            host,
            port,
            database_url,
            canvas_side_length,
            session_timeout,
            use_x_forwarded_for,
            use_forwarded,
            stripe_config,
        }
    }
}

impl StripeGatewayConfig {
    pub fn from_env_or_defaults() -> Self {
        let api = StripeApiConfig::new_from_env_or_default();
        let webhook_secret = api.webhook_secret.clone();
        let signature_checks = parse_boolean_flag(env::var("PXW_STRIPE_SIGNATURE_CHECKS").ok(), true);
        if !signature_checks {
            warn!(
                "🚨️ Stripe webhook signature checks are DISABLED. Anyone who can reach this server can forge \
                 payment notifications. Do not run like this in production."
            );
        }
        let signature_tolerance = env::var("PXW_STRIPE_SIGNATURE_TOLERANCE")
            .ok()
            .and_then(|s| {
                s.parse::<i64>()
                    .map_err(|e| warn!("🪛️ Invalid value for PXW_STRIPE_SIGNATURE_TOLERANCE. {e}"))
                    .ok()
            })
            .unwrap_or(DEFAULT_SIGNATURE_TOLERANCE_SECS);
        let whitelist = env::var("PXW_STRIPE_IP_WHITELIST").ok().and_then(|s| {
            if ["none", "false", "0"].contains(&s.to_lowercase().as_str()) {
                info!(
                    "🪛️ Stripe IP whitelist is disabled. If this is not what you want, set \
                     PXW_STRIPE_IP_WHITELIST to a comma-separated list of IP addresses to enable it."
                );
                return None;
            }
            let ip_addrs = s
                .split(',')
                .filter_map(|s| {
                    s.parse()
                        .map_err(|e| {
                            warn!("🪛️ Ignoring invalid IP address ({s}) in PXW_STRIPE_IP_WHITELIST: {e}");
                            None::<IpAddr>
                        })
                        .ok()
                })
                .collect::<Vec<IpAddr>>();
            Some(ip_addrs)
        });
        match &whitelist {
            Some(whitelist) if whitelist.is_empty() => {
                warn!(
                    "🚨️ The Stripe IP whitelist was configured, but is empty. The server will run, but won't \
                     authorise any incoming webhook requests."
                );
            },
            None => {
                info!("🪛️ No Stripe IP whitelist is set. Only signature validation will be used.");
            },
            Some(v) => {
                let addrs = v.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ");
                info!("🪛️ Stripe IP whitelist: {addrs}");
            },
        }
        Self { webhook_secret, signature_checks, signature_tolerance, whitelist, api }
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that handlers need at request time. Generally we try to keep this as small
/// as possible, and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Copy, Debug)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
    pub session_timeout: Duration,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            use_x_forwarded_for: config.use_x_forwarded_for,
            use_forwarded: config.use_forwarded,
            session_timeout: config.session_timeout,
        }
    }
}
