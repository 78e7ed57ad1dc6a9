//! Service wiring: one store, the authorization pipeline, and the
//! management services built on top of it.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Duration;

use jktdocs_auth::{AuthorizationPipeline, ConfiguredRoot, DocumentLocator, JwtIssuer, JwtVerifier, TokenAlgorithm};
use jktdocs_infra::{AuthService, DocumentService, InMemoryStore, RoleService, UserService, seed_root_account};

use crate::config::{AppConfig, JwtConfig};

#[derive(Clone)]
pub struct AppServices {
    pub pipeline: AuthorizationPipeline,
    pub auth: AuthService,
    pub roles: RoleService,
    pub users: UserService,
    pub documents: DocumentService,
    pub token_ttl_secs: i64,
}

pub async fn build_services(config: &AppConfig) -> Result<AppServices> {
    let store = Arc::new(InMemoryStore::new());

    let root_role = seed_root_account(store.as_ref(), store.as_ref(), &config.root)
        .await
        .with_context(|| "seed root account")?;
    tracing::info!(role_id = %root_role, email = %config.root.email, "root account ready");

    let (verifier, issuer) = token_keys(&config.jwt)?;
    let root = Arc::new(ConfiguredRoot::new(config.root.role_name.clone(), config.root.email.clone()));
    let locator = DocumentLocator::new(&config.documents_dir, &config.base_dir);

    Ok(AppServices {
        pipeline: AuthorizationPipeline::new(Arc::new(verifier), store.clone()),
        auth: AuthService::new(store.clone(), issuer, config.collation),
        roles: RoleService::new(store.clone(), root.clone(), config.collation),
        users: UserService::new(store.clone(), store.clone(), root, config.collation),
        documents: DocumentService::new(store, locator),
        token_ttl_secs: config.jwt.expiry_secs,
    })
}

fn token_keys(jwt: &JwtConfig) -> Result<(JwtVerifier, JwtIssuer)> {
    let ttl = Duration::seconds(jwt.expiry_secs);
    let (mut verifier, mut issuer) = match jwt.algorithm {
        TokenAlgorithm::Hs256 => (JwtVerifier::hs256(&jwt.secret), JwtIssuer::hs256(&jwt.secret, ttl)),
        TokenAlgorithm::Rs256 => {
            let public = jwt.public_key_pem.as_deref().unwrap_or_default();
            let private = jwt.private_key_pem.as_deref().unwrap_or_default();
            (
                JwtVerifier::rs256_pem(public.as_bytes()).with_context(|| "parse JWT_PUBLIC_KEY")?,
                JwtIssuer::rs256_pem(private.as_bytes(), ttl).with_context(|| "parse JWT_PRIVATE_KEY")?,
            )
        }
    };

    if let Some(iss) = &jwt.issuer {
        verifier = verifier.with_issuer(iss.clone());
        issuer = issuer.with_issuer(iss.clone());
    }
    Ok((verifier.with_leeway(jwt.leeway_secs), issuer))
}
