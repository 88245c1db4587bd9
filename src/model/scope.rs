//! Ordered OAuth scope list carried as a single space-delimited string on the wire.

// std
use std::slice::Iter;
// crates.io
use serde::{Deserializer, Serializer};
// self
use crate::_prelude::*;

/// Errors emitted when validating scope tokens.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ScopeValidationError {
	/// Empty scope entries are not allowed.
	#[error("Scope entries cannot be empty.")]
	Empty,
	/// Scopes cannot contain embedded whitespace characters.
	#[error("Scope contains whitespace: {scope}.")]
	ContainsWhitespace {
		/// The offending scope string.
		scope: String,
	},
}

/// Ordered scope tokens for a client registration.
///
/// Declaration order is preserved; duplicates are dropped on construction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ClientScope(Vec<String>);
impl ClientScope {
	/// Creates a scope list from any iterator of tokens.
	pub fn new<I, S>(scopes: I) -> Result<Self, ScopeValidationError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut tokens: Vec<String> = Vec::new();

		for scope in scopes {
			let owned: String = scope.into();

			if owned.is_empty() {
				return Err(ScopeValidationError::Empty);
			}
			if owned.chars().any(char::is_whitespace) {
				return Err(ScopeValidationError::ContainsWhitespace { scope: owned });
			}
			if !tokens.contains(&owned) {
				tokens.push(owned);
			}
		}

		Ok(Self(tokens))
	}

	/// Number of scope tokens.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true if no scopes are defined.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterator over scope tokens in declaration order.
	pub fn iter(&self) -> Iter<'_, String> {
		self.0.iter()
	}

	/// Returns the wire representation (space-delimited).
	pub fn joined(&self) -> String {
		self.0.join(" ")
	}

	/// Consumes the list and returns the tokens.
	pub fn into_inner(self) -> Vec<String> {
		self.0
	}
}
impl Display for ClientScope {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.joined())
	}
}
impl FromStr for ClientScope {
	type Err = ScopeValidationError;

	/// Splits on whitespace; runs of whitespace never yield empty tokens.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s.split_whitespace())
	}
}
impl<'a> IntoIterator for &'a ClientScope {
	type IntoIter = Iter<'a, String>;
	type Item = &'a String;

	fn into_iter(self) -> Self::IntoIter {
		self.0.iter()
	}
}
impl Serialize for ClientScope {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&self.joined())
	}
}
impl<'de> Deserialize<'de> for ClientScope {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = <Option<String>>::deserialize(deserializer)?;

		raw.as_deref().unwrap_or_default().parse::<Self>().map_err(serde::de::Error::custom)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn scope_round_trips_in_order() {
		let scope = ClientScope::new(["hydra.clients", "hydra.policies"])
			.expect("Scope fixture should be valid.");

		assert_eq!(scope.joined(), "hydra.clients hydra.policies");

		let parsed = ClientScope::from_str("hydra.clients hydra.policies")
			.expect("Joined scope should parse.");

		assert_eq!(parsed, scope);
		assert_eq!(parsed.into_inner(), vec!["hydra.clients", "hydra.policies"]);
	}

	#[test]
	fn order_is_preserved_and_duplicates_dropped() {
		let scope =
			ClientScope::new(["b", "a", "b"]).expect("Duplicate tokens should be tolerated.");

		assert_eq!(scope.iter().collect::<Vec<_>>(), vec!["b", "a"]);
	}

	#[test]
	fn invalid_tokens_error() {
		assert_eq!(ClientScope::new([""]), Err(ScopeValidationError::Empty));
		assert!(matches!(
			ClientScope::new(["contains space"]),
			Err(ScopeValidationError::ContainsWhitespace { .. })
		));
		assert!(ClientScope::from_str("").expect("Empty strings are empty scopes.").is_empty());
		assert_eq!(ClientScope::from_str("  a   b ").expect("Runs of spaces split.").len(), 2);
	}

	#[test]
	fn serde_uses_the_joined_string() {
		let scope = ClientScope::new(["openid", "offline"]).expect("Scope fixture is valid.");
		let payload = serde_json::to_string(&scope).expect("Scope should serialize.");

		assert_eq!(payload, "\"openid offline\"");

		let back: ClientScope = serde_json::from_str(&payload).expect("Scope should deserialize.");

		assert_eq!(back, scope);

		let null: ClientScope = serde_json::from_str("null").expect("Null scope is empty.");

		assert!(null.is_empty());
	}
}
