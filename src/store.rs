//! In-process token cache with per-key singleflight refreshes.
//!
//! [`TokenStore`] keeps one [`TokenRecord`] per [`CacheKey`]. Hits whose expiry lies beyond the
//! expiry buffer are served from a read lock without touching the key's refresh guard. Misses
//! and stale records take the key's async guard, re-check the cache, and only then call the
//! [`TokenAcquirer`], so N concurrent callers sharing a key cause at most one exchange per
//! refresh cycle. Distinct keys never contend.

// self
use crate::{
	_prelude::*,
	acquirer::TokenAcquirer,
	credential::{CacheKey, CredentialDescriptor},
	obs::{self, Operation, OperationSpan, Outcome},
	secret::Secret,
	token::{TokenRecord, TokenStatus},
};

type RecordMap = Arc<RwLock<HashMap<CacheKey, Arc<TokenRecord>>>>;
type GuardMap = Arc<Mutex<HashMap<CacheKey, Arc<AsyncMutex<()>>>>>;

/// Shared token cache; clones share the same entries and refresh guards.
///
/// Construct one store per process (or per test) and hand clones to every
/// [`HeaderComposer`](crate::headers::HeaderComposer).
#[derive(Clone)]
pub struct TokenStore {
	acquirer: Arc<dyn TokenAcquirer>,
	expiry_buffer: Duration,
	records: RecordMap,
	guards: GuardMap,
}
impl TokenStore {
	/// Refresh margin applied before a token's expiry.
	pub const DEFAULT_EXPIRY_BUFFER: Duration = Duration::from_secs(60);

	/// Creates an empty store that fills misses through `acquirer`.
	pub fn new(acquirer: Arc<dyn TokenAcquirer>) -> Self {
		Self {
			acquirer,
			expiry_buffer: Self::DEFAULT_EXPIRY_BUFFER,
			records: Default::default(),
			guards: Default::default(),
		}
	}

	/// Overrides the expiry buffer (defaults to 60 seconds).
	///
	/// The buffer applies to this handle; clones made afterwards inherit it.
	pub fn with_expiry_buffer(mut self, buffer: Duration) -> Self {
		self.expiry_buffer = buffer;

		self
	}

	/// Returns the configured expiry buffer.
	pub fn expiry_buffer(&self) -> Duration {
		self.expiry_buffer
	}

	/// Returns the access token for `descriptor`, acquiring a new one when needed.
	pub async fn get_token(&self, descriptor: &CredentialDescriptor) -> Result<Secret> {
		let record = self.get_record(descriptor).await?;

		Ok(record.access_token.clone())
	}

	/// Returns the full cached record for `descriptor`, acquiring a new one when needed.
	pub async fn get_record(&self, descriptor: &CredentialDescriptor) -> Result<Arc<TokenRecord>> {
		const OPERATION: Operation = Operation::GetToken;

		let span = OperationSpan::new(OPERATION, "get_token").with_key(&descriptor.cache_key());

		obs::record_outcome(OPERATION, Outcome::Attempt);

		let result = span.instrument(self.fetch_or_acquire(descriptor)).await;

		match &result {
			Ok(_) => obs::record_outcome(OPERATION, Outcome::Success),
			Err(_) => obs::record_outcome(OPERATION, Outcome::Failure),
		}

		result
	}

	/// Drops the entry for `descriptor`, or every entry when `None`; returns the number removed.
	///
	/// No network calls are made. Refresh guards are kept since key cardinality is bounded by
	/// configuration.
	pub fn clear(&self, descriptor: Option<&CredentialDescriptor>) -> usize {
		let mut records = self.records.write();
		let removed = match descriptor {
			Some(descriptor) => usize::from(records.remove(&descriptor.cache_key()).is_some()),
			None => {
				let removed = records.len();

				records.clear();

				removed
			},
		};

		obs::debug_event!(removed, scoped = descriptor.is_some(), "Token cache cleared.");

		removed
	}

	/// Diagnostic snapshot keyed by the cache key's display form.
	///
	/// Entries expose a truncated token preview only.
	pub fn stats(&self) -> BTreeMap<String, CacheEntryStats> {
		let now = Instant::now();

		self.records
			.read()
			.iter()
			.map(|(key, record)| {
				let stats = CacheEntryStats {
					token_type: record.token_type.clone(),
					expires_at: record.expires_at_utc,
					expired: record.is_expired_at(now, self.expiry_buffer),
					scope: record.scope.clone(),
					token_preview: record.access_token.preview(),
				};

				(key.to_string(), stats)
			})
			.collect()
	}

	async fn fetch_or_acquire(
		&self,
		descriptor: &CredentialDescriptor,
	) -> Result<Arc<TokenRecord>> {
		descriptor.validate()?;

		let key = descriptor.cache_key();
		let observed = self.cached(&key);

		if let Some(record) = observed.as_ref().filter(|record| self.is_fresh(record)) {
			obs::debug_event!(key = %key.fingerprint(), "Token cache hit.");
			obs::record_outcome(Operation::GetToken, Outcome::Hit);

			return Ok(Arc::clone(record));
		}

		let guard = self.guard(&key);
		let _singleflight = guard.lock().await;

		if let Some(record) = self.cached(&key).filter(|current| {
			self.is_fresh(current) || self.refreshed_since(observed.as_ref(), current)
		}) {
			obs::debug_event!(
				key = %key.fingerprint(),
				"Token refreshed by a concurrent caller while waiting."
			);
			obs::record_outcome(Operation::GetToken, Outcome::Hit);

			return Ok(record);
		}

		let record = Arc::new(self.acquirer.acquire(descriptor).await?);

		self.records.write().insert(key.clone(), Arc::clone(&record));

		obs::debug_event!(
			key = %key.fingerprint(),
			expires_at = %record.expires_at_utc,
			"Token acquired and cached."
		);

		Ok(record)
	}

	fn cached(&self, key: &CacheKey) -> Option<Arc<TokenRecord>> {
		self.records.read().get(key).cloned()
	}

	fn is_fresh(&self, record: &TokenRecord) -> bool {
		matches!(record.status_at(Instant::now(), self.expiry_buffer), TokenStatus::Active)
	}

	// A record swapped in while this caller waited on the guard belongs to the current refresh
	// cycle; it is reused unless already past its hard expiry.
	fn refreshed_since(
		&self,
		observed: Option<&Arc<TokenRecord>>,
		current: &Arc<TokenRecord>,
	) -> bool {
		let replaced = observed.is_none_or(|observed| !Arc::ptr_eq(observed, current));
		let status = current.status_at(Instant::now(), self.expiry_buffer);

		replaced && !matches!(status, TokenStatus::Expired)
	}

	/// Returns (and creates on demand) the singleflight guard for a cache key.
	fn guard(&self, key: &CacheKey) -> Arc<AsyncMutex<()>> {
		let mut guards = self.guards.lock();

		guards.entry(key.clone()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
	}
}
impl Debug for TokenStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenStore")
			.field("expiry_buffer", &self.expiry_buffer)
			.field("entries", &self.records.read().len())
			.finish_non_exhaustive()
	}
}

/// Per-entry diagnostics returned by [`TokenStore::stats`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CacheEntryStats {
	/// Token type (`Authorization` scheme).
	pub token_type: String,
	/// Wall-clock expiry, serialized as RFC 3339.
	#[serde(with = "time::serde::rfc3339")]
	pub expires_at: OffsetDateTime,
	/// Whether the token is expired or inside the expiry buffer.
	pub expired: bool,
	/// Granted scope, if any.
	pub scope: Option<String>,
	/// Truncated access token, never more than half of it.
	pub token_preview: String,
}
