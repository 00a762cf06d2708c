//! Per-target authentication profiles and their process-wide defaults.
//!
//! Loading files or environment variables is left to the caller; the types only describe the
//! schema and deserialize from any serde format.

// self
use crate::{
	_prelude::*, cookie::CookieFilterRule, credential::CredentialDescriptor, headers::HeaderSet,
};

/// Authentication settings for one downstream target.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthProfile {
	/// Client-credentials descriptor used for the `Authorization` header.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub oauth2: Option<CredentialDescriptor>,
	/// Cookie forwarding rule; cookies are forwarded only when present and enabled.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub cookie_passthrough: Option<CookieFilterRule>,
	/// Static headers sent with every request, in configuration order.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub static_headers: Option<HeaderSet>,
}
impl AuthProfile {
	/// Fills every absent field from `defaults`; fields set on the profile always win.
	pub fn with_defaults(&self, defaults: &AuthDefaults) -> Self {
		Self {
			oauth2: self.oauth2.clone().or_else(|| defaults.default_oauth2.clone()),
			cookie_passthrough: self
				.cookie_passthrough
				.clone()
				.or_else(|| defaults.default_cookie_passthrough.clone()),
			static_headers: self
				.static_headers
				.clone()
				.or_else(|| defaults.default_headers.clone()),
		}
	}

	/// Cookie rule to apply when forwarding, or `None` when forwarding is off.
	pub fn cookie_rule(&self) -> Option<&CookieFilterRule> {
		self.cookie_passthrough.as_ref().filter(|rule| rule.enabled)
	}
}

/// Process-wide fallbacks for [`AuthProfile`] fields.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthDefaults {
	/// Fallback client-credentials descriptor.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub default_oauth2: Option<CredentialDescriptor>,
	/// Fallback cookie forwarding rule.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub default_cookie_passthrough: Option<CookieFilterRule>,
	/// Fallback static headers.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub default_headers: Option<HeaderSet>,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn profile_fields_override_defaults_per_field() {
		let defaults: AuthDefaults = serde_json::from_str(
			r#"{
				"default_oauth2": {
					"token_url": "https://auth.example.com/token",
					"client_id": "relay",
					"client_secret": "${RELAY_SECRET}"
				},
				"default_cookie_passthrough": {"cookie_prefix": "app_"},
				"default_headers": {"X-Team": "core"}
			}"#,
		)
		.expect("Defaults should deserialize.");
		let profile: AuthProfile =
			serde_json::from_str(r#"{"static_headers": {"X-Team": "edge", "X-Env": "prod"}}"#)
				.expect("Profile should deserialize.");
		let merged = profile.with_defaults(&defaults);

		assert_eq!(merged.oauth2, defaults.default_oauth2);
		assert_eq!(merged.cookie_passthrough, Some(CookieFilterRule::prefix("app_")));
		assert_eq!(
			merged.static_headers.as_ref().map(|headers| headers.iter().collect::<Vec<_>>()),
			Some(vec![("X-Team", "edge"), ("X-Env", "prod")]),
		);
	}

	#[test]
	fn disabled_passthrough_yields_no_cookie_rule() {
		let profile = AuthProfile {
			cookie_passthrough: Some(CookieFilterRule::PASS_THROUGH.with_enabled(false)),
			..Default::default()
		};

		assert!(profile.cookie_rule().is_none());
		assert!(AuthProfile::default().cookie_rule().is_none());
	}

	#[test]
	fn unknown_fields_are_rejected() {
		assert!(serde_json::from_str::<AuthProfile>(r#"{"headers": {}}"#).is_err());
	}
}
