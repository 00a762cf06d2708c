//! Shared fixtures for integration tests.

#![allow(dead_code)]

// std
use std::{sync::Arc, time::Duration};
// crates.io
use httpmock::MockServer;
// self
use oauth2_relay::{
	acquirer::{HttpTokenAcquirer, ReqwestTransportErrorMapper},
	credential::{CredentialDescriptor, CredentialResolver, StaticCredentialResolver},
	http::ReqwestHttpClient,
	reqwest::{Client, redirect::Policy},
	store::TokenStore,
};

pub const CLIENT_ID: &str = "relay-client";
pub const CLIENT_SECRET: &str = "relay-secret";
pub const SECRET_KEY: &str = "RELAY_CLIENT_SECRET";

pub fn descriptor(server: &MockServer, scope: Option<&str>) -> CredentialDescriptor {
	descriptor_with_timeout(server, scope, Duration::from_secs(5))
}

pub fn descriptor_with_timeout(
	server: &MockServer,
	scope: Option<&str>,
	timeout: Duration,
) -> CredentialDescriptor {
	let mut builder = CredentialDescriptor::builder()
		.token_endpoint(server.url("/token"))
		.client_id(CLIENT_ID)
		.client_secret(format!("${{{SECRET_KEY}}}"))
		.request_timeout(timeout);

	if let Some(scope) = scope {
		builder = builder.scope(scope);
	}

	builder.build().expect("Test descriptor should build.")
}

pub fn resolver() -> Arc<dyn CredentialResolver> {
	Arc::new(StaticCredentialResolver::default().with(SECRET_KEY, CLIENT_SECRET))
}

/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
/// `httpmock` and never follows redirects.
pub fn test_reqwest_http_client() -> ReqwestHttpClient {
	let client = Client::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.redirect(Policy::none())
		.build()
		.expect("Failed to build insecure Reqwest client for tests.");

	ReqwestHttpClient::with_client(client)
}

pub fn reqwest_acquirer() -> HttpTokenAcquirer<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	HttpTokenAcquirer::new(test_reqwest_http_client(), ReqwestTransportErrorMapper, resolver())
}

pub fn reqwest_store() -> TokenStore {
	TokenStore::new(Arc::new(reqwest_acquirer()))
}

pub fn token_body(access_token: &str, expires_in: u64) -> String {
	format!(
		r#"{{"access_token":"{access_token}","token_type":"Bearer","expires_in":{expires_in}}}"#
	)
}
