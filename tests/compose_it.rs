mod common;

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
// self
use oauth2_relay::{
	config::{AuthDefaults, AuthProfile},
	cookie::CookieFilterRule,
	error::{Error, InvalidTokenResponseError},
	headers::{
		HeaderComposer, HeaderProvider, HeaderRequest, HeaderSet, ProfileHeaderProvider,
		RequestContext,
	},
	http::oauth2::http::HeaderMap,
};

#[tokio::test]
async fn missing_access_token_fails_composition_closed() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"token_type":"Bearer","expires_in":3600}"#);
		})
		.await;
	let composer = HeaderComposer::new(common::reqwest_store());
	let descriptor = common::descriptor(&server, None);
	let static_headers = HeaderSet::new().with("X-Team", "core");
	let err = composer
		.compose(
			HeaderRequest::new()
				.with_credential(&descriptor)
				.with_cookies("s=1")
				.with_static_headers(&static_headers),
		)
		.await
		.expect_err("A token response without a token must abort composition.");

	assert!(matches!(
		err,
		Error::InvalidTokenResponse(InvalidTokenResponseError::MissingAccessToken)
	));
	assert!(composer.store().stats().is_empty());

	mock.assert_async().await;
}

#[tokio::test]
async fn composed_headers_follow_precedence_and_convert_to_a_header_map() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body(common::token_body("T", 3_600));
		})
		.await;
	let composer = HeaderComposer::new(common::reqwest_store());
	let descriptor = common::descriptor(&server, Some("mcp:read"));
	let static_headers = HeaderSet::new()
		.with("user-agent", "downstream-probe/2")
		.with("Cookie", "static=1")
		.with("X-Request-Source", "relay");
	let rule = CookieFilterRule::names(["s"]);
	let headers = composer
		.compose(
			HeaderRequest::new()
				.with_credential(&descriptor)
				.with_cookies("s=1; tracker=abc")
				.with_cookie_rule(&rule)
				.with_static_headers(&static_headers),
		)
		.await
		.expect("Composition should succeed.");

	assert_eq!(headers.get("User-Agent"), Some("downstream-probe/2"));
	assert_eq!(headers.get("Accept"), Some("application/json"));
	assert_eq!(headers.get("X-Request-Source"), Some("relay"));
	assert_eq!(headers.get("Cookie"), Some("s=1"));
	assert_eq!(headers.get("Authorization"), Some("Bearer T"));

	let map = HeaderMap::try_from(&headers).expect("Composed headers should be valid HTTP.");

	assert_eq!(map.len(), 5);
	assert_eq!(map.get("authorization").map(|value| value.as_bytes()), Some(&b"Bearer T"[..]));
	assert_eq!(map.get("cookie").map(|value| value.as_bytes()), Some(&b"s=1"[..]));

	composer
		.compose(HeaderRequest::new().with_credential(&descriptor))
		.await
		.expect("The cached token should be reused.");

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn configured_profile_drives_the_header_provider() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/token")
				.form_urlencoded_tuple("client_id", common::CLIENT_ID)
				.form_urlencoded_tuple("client_secret", common::CLIENT_SECRET);
			then.status(200)
				.header("content-type", "application/json")
				.body(common::token_body("profile-token", 3_600));
		})
		.await;
	let defaults: AuthDefaults = serde_json::from_value(serde_json::json!({
		"default_oauth2": {
			"token_url": server.url("/token"),
			"client_id": common::CLIENT_ID,
			"client_secret": format!("${{{}}}", common::SECRET_KEY),
		},
		"default_headers": { "X-Team": "platform" },
	}))
	.expect("Defaults should deserialize.");
	let profile: AuthProfile = serde_json::from_value(serde_json::json!({
		"cookie_passthrough": { "cookie_prefix": "app_" },
		"static_headers": { "X-Target": "search" },
	}))
	.expect("Profile should deserialize.");
	let provider: Arc<dyn HeaderProvider> = Arc::new(ProfileHeaderProvider::new(
		HeaderComposer::new(common::reqwest_store()),
		profile.with_defaults(&defaults),
	));
	let headers = provider
		.headers(&RequestContext::with_cookies("app_session=42; theme=dark"))
		.await
		.expect("Profile composition should succeed.");

	assert_eq!(headers.get("Authorization"), Some("Bearer profile-token"));
	assert_eq!(headers.get("Cookie"), Some("app_session=42"));
	assert_eq!(headers.get("X-Target"), Some("search"));
	assert!(!headers.contains("X-Team"));

	mock.assert_async().await;
}
