//! Best-effort filtering of a raw `Cookie` header before it is forwarded downstream.

// self
use crate::_prelude::*;

/// Selects which user cookies are forwarded to a downstream service.
///
/// A disabled rule, or one without names or prefix, forwards the raw cookie string unchanged.
/// When both `names` and `prefix` are set, a cookie matching either is kept.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CookieFilterRule {
	/// Whether filtering (and, at the profile level, forwarding) is active.
	#[serde(default = "enabled_by_default")]
	pub enabled: bool,
	/// Exact cookie names to keep.
	#[serde(rename = "cookie_names", default, skip_serializing_if = "Option::is_none")]
	pub names: Option<BTreeSet<String>>,
	/// Cookie name prefix to keep.
	#[serde(rename = "cookie_prefix", default, skip_serializing_if = "Option::is_none")]
	pub prefix: Option<String>,
}
impl CookieFilterRule {
	/// Rule that forwards every cookie as received.
	pub const PASS_THROUGH: Self = Self { enabled: true, names: None, prefix: None };

	/// Keeps only the listed cookie names.
	pub fn names<I, S>(names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self { names: Some(names.into_iter().map(Into::into).collect()), ..Self::PASS_THROUGH }
	}

	/// Keeps only cookies whose name starts with `prefix`.
	pub fn prefix(prefix: impl Into<String>) -> Self {
		Self { prefix: Some(prefix.into()), ..Self::PASS_THROUGH }
	}

	/// Adds a prefix to an existing rule.
	pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.prefix = Some(prefix.into());

		self
	}

	/// Overrides the `enabled` flag.
	pub fn with_enabled(mut self, enabled: bool) -> Self {
		self.enabled = enabled;

		self
	}

	fn keeps(&self, name: &str) -> bool {
		let by_name = self.names.as_ref().is_some_and(|names| names.contains(name));
		let by_prefix = self
			.prefix
			.as_deref()
			.is_some_and(|prefix| !prefix.is_empty() && name.starts_with(prefix));

		by_name || by_prefix
	}

	fn is_selective(&self) -> bool {
		self.enabled
			&& (self.names.as_ref().is_some_and(|names| !names.is_empty())
				|| self.prefix.as_deref().is_some_and(|prefix| !prefix.is_empty()))
	}
}
impl Default for CookieFilterRule {
	fn default() -> Self {
		Self::PASS_THROUGH
	}
}

/// Filters `raw` (a `Cookie` header value) through `rule`.
///
/// Fragments are split on `;` and trimmed; empty fragments and fragments without `=` are
/// dropped. Kept fragments are rejoined with `"; "` in their original order. A rule that
/// selects nothing forwards `raw` untouched. Returns `None` for an empty input or when nothing
/// matches, never an empty string.
pub fn filter_cookies(raw: &str, rule: &CookieFilterRule) -> Option<String> {
	if raw.is_empty() {
		return None;
	}
	if !rule.is_selective() {
		return Some(raw.to_owned());
	}

	let kept = raw
		.split(';')
		.map(str::trim)
		.filter(|fragment| {
			fragment.split_once('=').is_some_and(|(name, _)| rule.keeps(name.trim()))
		})
		.collect::<Vec<_>>();

	if kept.is_empty() { None } else { Some(kept.join("; ")) }
}

fn enabled_by_default() -> bool {
	true
}
