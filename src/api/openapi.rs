use super::handlers::{health, login, recovery, register};
use utoipa::openapi::{InfoBuilder, OpenApiBuilder, Tag};
use utoipa_axum::{router::OpenApiRouter, routes};

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    // Same wiring as the served router; only the generated document is kept.
    let (_router, openapi) = api_router().split_for_parts();
    openapi
}

/// Build the router that also drives the `OpenAPI` document.
///
/// New endpoints go through `.routes(routes!(...))` so they are served and
/// documented in one place. Routes added outside (like `/` or
/// `OPTIONS /health`) stay undocumented on purpose.
pub(crate) fn api_router() -> OpenApiRouter {
    let mut auth_tag = Tag::new("auth");
    auth_tag.description = Some("Login and registration".to_string());

    let mut recovery_tag = Tag::new("recovery");
    recovery_tag.description = Some("Three-step password reset".to_string());

    // utoipa-axum 0.1 exposes no mutable access to the stored document, so the
    // tags go on the seed document; `.routes()` merges paths into it.
    let mut openapi = cargo_openapi();
    openapi.tags = Some(vec![auth_tag, recovery_tag]);

    // `routes!` reads #[utoipa::path] to bind the HTTP method and path.
    OpenApiRouter::with_openapi(openapi)
        .routes(routes!(health::health))
        .routes(routes!(login::login))
        .routes(routes!(register::register))
        .routes(routes!(recovery::identify))
        .routes(routes!(recovery::answers))
        .routes(routes!(recovery::complete))
}

fn cargo_openapi() -> utoipa::openapi::OpenApi {
    // Use Cargo.toml metadata instead of the utoipa-axum crate info defaults.
    let info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(Some(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    OpenApiBuilder::new().info(info).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_info_from_cargo() {
        let doc = openapi();
        assert_eq!(doc.info.title, env!("CARGO_PKG_NAME"));
        assert_eq!(doc.info.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(
            doc.info.description.as_deref(),
            Some(env!("CARGO_PKG_DESCRIPTION"))
        );
    }

    #[test]
    fn openapi_tags_and_paths() {
        let doc = openapi();
        let tags = doc.tags.clone().unwrap_or_default();
        assert!(tags.iter().any(|tag| tag.name == "auth"));
        assert!(tags.iter().any(|tag| tag.name == "recovery"));

        assert!(doc.paths.paths.contains_key("/login"));
        assert!(doc.paths.paths.contains_key("/register"));
        assert!(doc.paths.paths.contains_key("/password-reset/identify"));
        assert!(doc.paths.paths.contains_key("/password-reset/answers"));
        assert!(doc.paths.paths.contains_key("/password-reset/complete"));
        assert!(doc.paths.paths.contains_key("/health"));
    }
}
