//! Demonstrates caching a client-credentials token and composing outbound headers for a
//! downstream call with the default reqwest transport.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use oauth2_relay::{
	acquirer::{HttpTokenAcquirer, ReqwestTransportErrorMapper},
	cookie::CookieFilterRule,
	credential::{CredentialDescriptor, StaticCredentialResolver},
	headers::{HeaderComposer, HeaderRequest, HeaderSet},
	http::ReqwestHttpClient,
	reqwest::{Client, redirect::Policy},
	store::TokenStore,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"bearer\",\"expires_in\":900}",
			);
		})
		.await;
	let descriptor = CredentialDescriptor::builder()
		.token_endpoint(server.url("/token"))
		.client_id("demo-client")
		.client_secret("${DEMO_CLIENT_SECRET}")
		.scope("search.read profile.read")
		.build()?;
	// The mock server signs its TLS endpoint with a self-signed certificate.
	let http_client = ReqwestHttpClient::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.redirect(Policy::none())
			.build()?,
	);
	let acquirer = <HttpTokenAcquirer<ReqwestHttpClient, ReqwestTransportErrorMapper>>::new(
		http_client,
		ReqwestTransportErrorMapper,
		Arc::new(StaticCredentialResolver::default().with("DEMO_CLIENT_SECRET", "super-secret")),
	);
	let composer = HeaderComposer::new(TokenStore::new(Arc::new(acquirer)));
	let static_headers = HeaderSet::new().with("X-Request-Source", "demo");
	let cookie_rule = CookieFilterRule::prefix("app_");

	for _ in 0..3 {
		let headers = composer
			.compose(
				HeaderRequest::new()
					.with_credential(&descriptor)
					.with_cookies("app_session=42; theme=dark")
					.with_cookie_rule(&cookie_rule)
					.with_static_headers(&static_headers),
			)
			.await?;

		println!("Outbound headers: {headers:?}.");
	}

	for (key, entry) in composer.store().stats() {
		println!("Cached {key}: {}.", serde_json::to_string(&entry)?);
	}

	token_mock.assert_calls_async(1).await;

	Ok(())
}
