// std
use std::{slice, vec};
// crates.io
use oauth2::http::{HeaderMap, HeaderName, HeaderValue};
use serde::{
	Deserializer, Serializer,
	de::{MapAccess, Visitor},
	ser::SerializeMap,
};
// self
use crate::{_prelude::*, error::ConfigError};

/// Ordered header collection with case-insensitive override semantics.
///
/// Inserting a name that already exists (in any letter case) replaces the existing entry in
/// place, keeping its position and adopting the new spelling, so the set never holds two case
/// variants of one header. `Debug` output redacts credential-bearing values.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct HeaderSet(Vec<(String, String)>);
impl HeaderSet {
	const SENSITIVE: [&'static str; 3] = ["authorization", "cookie", "proxy-authorization"];

	/// Creates an empty set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Base client-identification headers.
	pub fn base() -> Self {
		Self::new()
			.with("User-Agent", concat!("oauth2-relay/", env!("CARGO_PKG_VERSION")))
			.with("Accept", "application/json")
	}

	/// Builder-style [`insert`](Self::insert).
	pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.insert(name, value);

		self
	}

	/// Inserts or overrides a header; returns the previous value when one was replaced.
	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
		let name = name.into();
		let value = value.into();

		match self.position(&name) {
			Some(idx) => {
				let (_, previous) = std::mem::replace(&mut self.0[idx], (name, value));

				Some(previous)
			},
			None => {
				self.0.push((name, value));

				None
			},
		}
	}

	/// Applies every entry of `other` in order, overriding collisions.
	pub fn merge(&mut self, other: &HeaderSet) {
		for (name, value) in other {
			self.insert(name, value);
		}
	}

	/// Looks a header up case-insensitively.
	pub fn get(&self, name: &str) -> Option<&str> {
		self.position(name).map(|idx| self.0[idx].1.as_str())
	}

	/// Returns `true` when a header with this name (in any case) is present.
	pub fn contains(&self, name: &str) -> bool {
		self.position(name).is_some()
	}

	/// Removes a header case-insensitively, returning its value.
	pub fn remove(&mut self, name: &str) -> Option<String> {
		self.position(name).map(|idx| self.0.remove(idx).1)
	}

	/// Number of headers.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` when no header is present.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterates `(name, value)` pairs in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(name, value)| (name.as_str(), value.as_str()))
	}

	fn position(&self, name: &str) -> Option<usize> {
		self.0.iter().position(|(existing, _)| existing.eq_ignore_ascii_case(name))
	}
}
impl Debug for HeaderSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_map()
			.entries(self.iter().map(|(name, value)| {
				let sensitive =
					Self::SENSITIVE.iter().any(|header| header.eq_ignore_ascii_case(name));

				(name, if sensitive { "<redacted>" } else { value })
			}))
			.finish()
	}
}
impl<K, V> FromIterator<(K, V)> for HeaderSet
where
	K: Into<String>,
	V: Into<String>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut set = Self::new();

		for (name, value) in iter {
			set.insert(name, value);
		}

		set
	}
}
impl<'a> IntoIterator for &'a HeaderSet {
	type IntoIter = HeaderSetIter<'a>;
	type Item = (&'a str, &'a str);

	fn into_iter(self) -> Self::IntoIter {
		HeaderSetIter(self.0.iter())
	}
}
impl IntoIterator for HeaderSet {
	type IntoIter = vec::IntoIter<(String, String)>;
	type Item = (String, String);

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}
impl TryFrom<&HeaderSet> for HeaderMap {
	type Error = ConfigError;

	fn try_from(set: &HeaderSet) -> Result<Self, Self::Error> {
		let mut map = HeaderMap::with_capacity(set.len());

		for (name, value) in set {
			let header_name = HeaderName::from_bytes(name.as_bytes())
				.map_err(|_| ConfigError::InvalidHeaderName { name: name.to_owned() })?;
			let header_value = HeaderValue::from_str(value)
				.map_err(|_| ConfigError::InvalidHeaderValue { name: name.to_owned() })?;

			map.insert(header_name, header_value);
		}

		Ok(map)
	}
}
impl Serialize for HeaderSet {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut map = serializer.serialize_map(Some(self.len()))?;

		for (name, value) in self {
			map.serialize_entry(name, value)?;
		}

		map.end()
	}
}
impl<'de> Deserialize<'de> for HeaderSet {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		struct HeaderSetVisitor;
		impl<'de> Visitor<'de> for HeaderSetVisitor {
			type Value = HeaderSet;

			fn expecting(&self, f: &mut Formatter) -> FmtResult {
				f.write_str("a map of header names to string values")
			}

			fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
			where
				A: MapAccess<'de>,
			{
				let mut set = HeaderSet::new();

				while let Some((name, value)) = access.next_entry::<String, String>()? {
					set.insert(name, value);
				}

				Ok(set)
			}
		}

		deserializer.deserialize_map(HeaderSetVisitor)
	}
}

/// Borrowing iterator over a [`HeaderSet`].
#[derive(Clone, Debug)]
pub struct HeaderSetIter<'a>(slice::Iter<'a, (String, String)>);
impl<'a> Iterator for HeaderSetIter<'a> {
	type Item = (&'a str, &'a str);

	fn next(&mut self) -> Option<Self::Item> {
		self.0.next().map(|(name, value)| (name.as_str(), value.as_str()))
	}
}
