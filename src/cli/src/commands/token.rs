//! Development token minting.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use innsight_core::middleware::{AuthConfig, TokenClaims, TokenVerifier};
use innsight_core::rbac::Role;

use super::config::load_value;
use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct TokenArgs {
    /// Subject (user id)
    #[arg(long)]
    sub: String,

    /// Role claim (repeatable)
    #[arg(short, long = "role")]
    roles: Vec<String>,

    /// Token lifetime, e.g. 30m, 8h
    #[arg(long, default_value = "1h")]
    ttl: String,

    #[arg(long)]
    email: Option<String>,

    /// HMAC secret; falls back to the `jwt-secret` CLI config value
    #[arg(long, env = "INNSIGHT__AUTH__JWT_SECRET", hide_env_values = true)]
    secret: Option<String>,

    #[arg(long)]
    issuer: Option<String>,

    #[arg(long)]
    audience: Option<String>,
}

#[derive(Serialize)]
struct IssuedToken {
    token: String,
    sub: String,
    roles: Vec<String>,
    expires_at: chrono::DateTime<chrono::Utc>,
}

pub fn execute(args: TokenArgs, format: OutputFormat) -> Result<()> {
    let secret = args
        .secret
        .or_else(|| load_value("jwt-secret"))
        .context("No signing secret: pass --secret or run `innsight config set jwt-secret <value>`")?;

    for role in args.roles.iter().filter(|r| Role::parse(r).is_none()) {
        output::print_warning(&format!("Unknown role '{}' will satisfy nothing", role));
    }

    let ttl = humantime::parse_duration(&args.ttl)
        .with_context(|| format!("Invalid --ttl '{}'", args.ttl))?;
    let ttl = chrono::Duration::from_std(ttl).context("--ttl is out of range")?;

    let mut auth = AuthConfig::with_secret(secret);
    if let Some(issuer) = args.issuer {
        auth = auth.issuer(issuer);
    }
    if let Some(audience) = args.audience {
        auth = auth.audience(audience);
    }
    let verifier = TokenVerifier::new(&auth)?;

    let mut claims = TokenClaims::new(&args.sub, args.roles.clone(), ttl);
    if let Some(email) = args.email {
        claims = claims.email(email);
    }
    let token = verifier.issue(&claims)?;

    let issued = IssuedToken {
        token,
        sub: args.sub,
        roles: args.roles,
        expires_at: chrono::Utc::now() + ttl,
    };

    match format {
        // Bare token so it can be captured by the shell.
        OutputFormat::Table => println!("{}", issued.token),
        _ => output::print_item(&issued, format)?,
    }
    Ok(())
}
