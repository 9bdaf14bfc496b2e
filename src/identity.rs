//! Bearer token to requester resolution.
//!
//! Authentication is delegated to an external identity provider. Any failure
//! to resolve a token degrades to an anonymous requester; it never fails the
//! request.

use serde_json::Value;

use crate::config::{IdentityConfig, IdentityProviderKind};
use crate::types::Requester;

/// Resolves `Authorization` bearer tokens to a [`Requester`].
#[derive(Clone)]
pub enum IdentityResolver {
    /// Every request is anonymous.
    Anonymous,
    /// Ask Supabase Auth who the token belongs to.
    Supabase {
        base_url: String,
        anon_key: String,
        client: reqwest::Client,
    },
}

impl std::fmt::Debug for IdentityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anonymous => f.write_str("IdentityResolver::Anonymous"),
            Self::Supabase { base_url, .. } => f
                .debug_struct("IdentityResolver::Supabase")
                .field("base_url", base_url)
                .finish_non_exhaustive(),
        }
    }
}

impl IdentityResolver {
    /// Build the resolver selected by `config`.
    pub fn from_config(config: &IdentityConfig) -> Self {
        match config.provider {
            IdentityProviderKind::None => Self::Anonymous,
            IdentityProviderKind::Supabase => Self::supabase(
                config.url.as_deref().unwrap_or_default(),
                &config.anon_key,
            ),
        }
    }

    /// Supabase Auth resolver against `base_url`.
    pub fn supabase(base_url: &str, anon_key: &str) -> Self {
        Self::Supabase {
            base_url: base_url.trim_end_matches('/').to_owned(),
            anon_key: anon_key.to_owned(),
            client: crate::providers::http_client(),
        }
    }

    /// Resolve the value of an `Authorization` header.
    ///
    /// Missing, malformed or rejected tokens yield an anonymous requester
    /// with a fresh session id.
    pub async fn resolve(&self, authorization: Option<&str>) -> Requester {
        let Some(token) = authorization.and_then(bearer_token) else {
            return Requester::anonymous();
        };

        match self {
            Self::Anonymous => Requester::anonymous(),
            Self::Supabase {
                base_url,
                anon_key,
                client,
            } => match fetch_user_id(client, base_url, anon_key, token).await {
                Some(id) => Requester::user(id),
                None => Requester::anonymous(),
            },
        }
    }
}

/// Token from a `Bearer <token>` header value.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

async fn fetch_user_id(
    client: &reqwest::Client,
    base_url: &str,
    anon_key: &str,
    token: &str,
) -> Option<String> {
    let response = client
        .get(format!("{base_url}/auth/v1/user"))
        .header("apikey", anon_key)
        .bearer_auth(token)
        .send()
        .await;

    let response = match response {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!("identity lookup failed: {}", e.without_url());
            return None;
        }
    };
    if !response.status().is_success() {
        tracing::debug!(status = response.status().as_u16(), "identity provider rejected token");
        return None;
    }

    let body: Value = match response.json().await {
        Ok(body) => body,
        Err(e) => {
            tracing::debug!("identity response was not JSON: {e}");
            return None;
        }
    };
    body.get("id")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(bearer_token("bearer  abc123 "), Some("abc123"));
        assert_eq!(bearer_token("Basic dXNlcg=="), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("abc123"), None);
    }

    #[tokio::test]
    async fn anonymous_resolver_ignores_tokens() {
        let requester = IdentityResolver::Anonymous.resolve(Some("Bearer abc")).await;
        assert!(requester.session_id().is_some());
    }

    #[tokio::test]
    async fn supabase_token_resolves_to_user() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header("apikey", "anon"))
            .and(header("authorization", "Bearer user-jwt"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "8d0f-user", "email": "fan@example.com"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let resolver = IdentityResolver::supabase(&server.uri(), "anon");
        let requester = resolver.resolve(Some("Bearer user-jwt")).await;
        assert_eq!(requester.user_id(), Some("8d0f-user"));
    }

    #[tokio::test]
    async fn rejected_token_is_anonymous() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"msg": "invalid JWT"})))
            .mount(&server)
            .await;

        let resolver = IdentityResolver::supabase(&server.uri(), "anon");
        let requester = resolver.resolve(Some("Bearer expired")).await;
        assert!(requester.user_id().is_none());
    }

    #[tokio::test]
    async fn missing_header_skips_lookup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let resolver = IdentityResolver::supabase(&server.uri(), "anon");
        assert!(resolver.resolve(None).await.session_id().is_some());
    }

    #[tokio::test]
    async fn body_without_id_is_anonymous() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": ""})))
            .mount(&server)
            .await;

        let resolver = IdentityResolver::supabase(&server.uri(), "anon");
        assert!(resolver.resolve(Some("Bearer t")).await.user_id().is_none());
    }
}
