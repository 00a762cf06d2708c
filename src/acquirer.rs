//! Client-credentials exchange against a token endpoint.
//!
//! [`HttpTokenAcquirer`] resolves the descriptor's placeholders, posts a form-encoded
//! `client_credentials` request through a [`TokenHttpClient`], and validates the JSON response
//! into a [`TokenRecord`]. It performs exactly one exchange per call; caching and stampede
//! protection live in [`TokenStore`](crate::store::TokenStore).

// crates.io
use oauth2::{
	AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse,
	http::{
		Method,
		header::{ACCEPT, CONTENT_TYPE, HeaderValue},
	},
};
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	credential::{CredentialDescriptor, CredentialResolver, ResolvedCredentials},
	error::{InvalidTokenResponseError, TokenRequestError},
	http::{ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
	obs::{self, Operation, OperationSpan, Outcome},
	token::{TokenRecord, TokenRecordBuilderError},
};
#[cfg(feature = "reqwest")]
use crate::{credential::EnvCredentialResolver, http::ReqwestHttpClient};

/// Boxed future returned by [`TokenAcquirer::acquire`].
pub type AcquireFuture<'a> = Pin<Box<dyn Future<Output = Result<TokenRecord>> + 'a + Send>>;

/// Performs one credential exchange and returns the validated record.
///
/// The token store depends on this trait only, so tests and embedders can substitute
/// any source of tokens.
pub trait TokenAcquirer
where
	Self: Send + Sync,
{
	/// Exchanges the descriptor's credentials for a fresh token.
	fn acquire<'a>(&'a self, descriptor: &'a CredentialDescriptor) -> AcquireFuture<'a>;
}

/// Maps HTTP transport failures into relay [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a relay error.
	///
	/// `timeout` is the bound that applied to the failed exchange, so mappers can report
	/// [`TokenRequestError::Timeout`] with the configured value.
	fn map_transport_error(
		&self,
		timeout: Duration,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		timeout: Duration,
		_: Option<&ResponseMetadata>,
		error: HttpClientError<ReqwestError>,
	) -> Error {
		match error {
			HttpClientError::Reqwest(inner) => map_reqwest_error(timeout, *inner),
			HttpClientError::Http(inner) => TokenRequestError::Build(inner).into(),
			HttpClientError::Io(inner) => TokenRequestError::Io(inner).into(),
			HttpClientError::Other(message) =>
				TokenRequestError::Network { source: message.into() }.into(),
			_ => TokenRequestError::Network {
				source: "HTTP client failed while calling the token endpoint".into(),
			}
			.into(),
		}
	}
}

/// [`TokenAcquirer`] that talks to the token endpoint over a [`TokenHttpClient`].
pub struct HttpTokenAcquirer<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	http_client: Arc<C>,
	transport_mapper: Arc<M>,
	resolver: Arc<dyn CredentialResolver>,
}
impl<C, M> HttpTokenAcquirer<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates an acquirer from a transport, its error mapper, and a credential resolver.
	pub fn new(
		http_client: impl Into<Arc<C>>,
		transport_mapper: impl Into<Arc<M>>,
		resolver: Arc<dyn CredentialResolver>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: transport_mapper.into(),
			resolver,
		}
	}

	/// Replaces the credential resolver.
	pub fn with_resolver(mut self, resolver: Arc<dyn CredentialResolver>) -> Self {
		self.resolver = resolver;

		self
	}

	async fn exchange(&self, descriptor: &CredentialDescriptor) -> Result<TokenRecord> {
		descriptor.validate()?;

		let credentials = descriptor.resolve(self.resolver.as_ref())?;
		let request = build_token_request(descriptor, &credentials)?;
		let slot = ResponseMetadataSlot::default();
		let handle = self.http_client.with_metadata(slot.clone(), descriptor.request_timeout);
		let acquired_at = Instant::now();
		let issued_at = OffsetDateTime::now_utc();
		let response = handle.call(request).await.map_err(|e| {
			self.transport_mapper.map_transport_error(
				descriptor.request_timeout,
				slot.take().as_ref(),
				e,
			)
		})?;

		parse_token_response(descriptor, response, slot.take(), acquired_at, issued_at)
	}
}
#[cfg(feature = "reqwest")]
impl HttpTokenAcquirer<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Builds a reqwest-backed acquirer (redirects disabled) that resolves placeholders from
	/// the process environment.
	pub fn reqwest() -> Result<Self> {
		Ok(Self::new(
			ReqwestHttpClient::no_redirects()?,
			ReqwestTransportErrorMapper,
			Arc::new(EnvCredentialResolver),
		))
	}
}
impl<C, M> TokenAcquirer for HttpTokenAcquirer<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn acquire<'a>(&'a self, descriptor: &'a CredentialDescriptor) -> AcquireFuture<'a> {
		const OPERATION: Operation = Operation::Acquire;

		Box::pin(async move {
			let span = OperationSpan::new(OPERATION, "client_credentials")
				.with_key(&descriptor.cache_key());

			obs::record_outcome(OPERATION, Outcome::Attempt);

			let started = Instant::now();
			let result = span.instrument(self.exchange(descriptor)).await;
			let outcome = if result.is_ok() { Outcome::Success } else { Outcome::Failure };

			obs::record_outcome(OPERATION, outcome);
			obs::record_exchange_duration(outcome, started.elapsed());

			result
		})
	}
}
impl<C, M> Debug for HttpTokenAcquirer<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("HttpTokenAcquirer").finish_non_exhaustive()
	}
}

#[derive(Deserialize)]
struct TokenResponseBody {
	#[serde(default)]
	access_token: Option<String>,
	#[serde(default)]
	token_type: Option<String>,
	#[serde(default)]
	expires_in: Option<serde_json::Number>,
	#[serde(default)]
	scope: Option<String>,
}

#[derive(Deserialize)]
struct OAuthErrorBody {
	error: String,
}

fn build_token_request(
	descriptor: &CredentialDescriptor,
	credentials: &ResolvedCredentials,
) -> Result<HttpRequest, TokenRequestError> {
	let mut form = form_urlencoded::Serializer::new(String::new());

	form.append_pair("grant_type", descriptor.grant_type.as_str());
	form.append_pair("client_id", &credentials.client_id);
	form.append_pair("client_secret", credentials.client_secret.expose());

	if let Some(scope) = descriptor.scope.as_deref() {
		form.append_pair("scope", scope);
	}

	let request = oauth2::http::Request::builder()
		.method(Method::POST)
		.uri(credentials.token_endpoint.as_str())
		.header(CONTENT_TYPE, HeaderValue::from_static("application/x-www-form-urlencoded"))
		.header(ACCEPT, HeaderValue::from_static("application/json"))
		.body(form.finish().into_bytes())?;

	Ok(request)
}

fn parse_token_response(
	descriptor: &CredentialDescriptor,
	response: HttpResponse,
	metadata: Option<ResponseMetadata>,
	acquired_at: Instant,
	issued_at: OffsetDateTime,
) -> Result<TokenRecord> {
	let status = response.status();

	if !status.is_success() {
		let body = String::from_utf8_lossy(response.body()).into_owned();
		let oauth_error =
			serde_json::from_slice::<OAuthErrorBody>(response.body()).ok().map(|body| body.error);

		return Err(TokenRequestError::Status {
			status: status.as_u16(),
			body,
			oauth_error,
			retry_after: metadata.and_then(|meta| meta.retry_after),
		}
		.into());
	}

	let mut deserializer = serde_json::Deserializer::from_slice(response.body());
	let body: TokenResponseBody = serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| InvalidTokenResponseError::Json { source, status: status.as_u16() })?;
	let access_token = body
		.access_token
		.filter(|token| !token.is_empty())
		.ok_or(InvalidTokenResponseError::MissingAccessToken)?;
	let lifetime = match &body.expires_in {
		Some(expires_in) => expires_in_duration(expires_in)?,
		None => descriptor.default_ttl,
	};
	let mut builder = TokenRecord::builder()
		.access_token(access_token)
		.acquired_at(acquired_at)
		.issued_at(issued_at)
		.expires_in(lifetime);

	if let Some(token_type) = body.token_type {
		builder = builder.token_type(token_type);
	}
	if let Some(scope) = body
		.scope
		.filter(|scope| !scope.trim().is_empty())
		.or_else(|| descriptor.scope.clone())
	{
		builder = builder.scope(scope);
	}

	builder.build().map_err(|e| Error::from(map_token_builder_error(e)))
}

fn expires_in_duration(
	expires_in: &serde_json::Number,
) -> Result<Duration, InvalidTokenResponseError> {
	let secs = expires_in.as_f64().ok_or(InvalidTokenResponseError::ExpiresInOutOfRange)?;

	if secs <= 0. {
		return Err(InvalidTokenResponseError::NonPositiveExpiresIn);
	}

	Duration::try_from_secs_f64(secs).map_err(|_| InvalidTokenResponseError::ExpiresInOutOfRange)
}

fn map_token_builder_error(e: TokenRecordBuilderError) -> InvalidTokenResponseError {
	match e {
		TokenRecordBuilderError::MissingAccessToken => InvalidTokenResponseError::MissingAccessToken,
		TokenRecordBuilderError::MissingExpiry | TokenRecordBuilderError::NonPositiveLifetime =>
			InvalidTokenResponseError::NonPositiveExpiresIn,
		TokenRecordBuilderError::LifetimeOutOfRange =>
			InvalidTokenResponseError::ExpiresInOutOfRange,
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(timeout: Duration, e: ReqwestError) -> Error {
	if e.is_timeout() {
		return TokenRequestError::Timeout { timeout }.into();
	}

	TokenRequestError::from(e).into()
}
