/// URL for accessing the PostrgeSQL database (should contain a schema name in the path)
pub const DB_URL: &str = "DATABASE_URL";
/// Log level configuration for the application. For formatting info, see [tracing_subscriber's documentation](https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html#directives)
pub const LOG_LEVEL: &str = "LOG_LEVEL";

/// Secret used to sign and verify access tokens. The app refuses to start without it.
pub const JWT_SECRET: &str = "JWT_SECRET";
/// Optional override for the access token lifetime, expressed in whole minutes
pub const TOKEN_TTL_MINUTES: &str = "TOKEN_TTL_MINUTES";
