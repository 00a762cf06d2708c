//! Redacting wrapper for client secrets and access tokens.

// self
use crate::_prelude::*;

/// Sensitive string that never shows up in `Debug` or `Display` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);
impl Secret {
	const PREVIEW_LIMIT: usize = 10;

	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns `true` when the secret is empty or whitespace only.
	pub fn is_blank(&self) -> bool {
		self.0.trim().is_empty()
	}

	/// Short diagnostic prefix followed by `...`.
	///
	/// At most ten characters and never more than half of the secret are revealed.
	pub fn preview(&self) -> String {
		let len = self.0.chars().count();
		let shown = Self::PREVIEW_LIMIT.min(len / 2);
		let mut buf = self.0.chars().take(shown).collect::<String>();

		buf.push_str("...");

		buf
	}
}
impl AsRef<str> for Secret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl From<String> for Secret {
	fn from(value: String) -> Self {
		Self(value)
	}
}
impl From<&str> for Secret {
	fn from(value: &str) -> Self {
		Self(value.to_owned())
	}
}
impl Debug for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("Secret").field(&"<redacted>").finish()
	}
}
impl Display for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = Secret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "Secret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
	}

	#[test]
	fn preview_never_reveals_more_than_half() {
		assert_eq!(Secret::new("abcdefghijklmnopqrstuvwxyz").preview(), "abcdefghij...");
		assert_eq!(Secret::new("abcdef").preview(), "abc...");
		assert_eq!(Secret::new("a").preview(), "...");
	}
}
