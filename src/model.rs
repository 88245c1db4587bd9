//! Admin API payloads for OAuth 2.0 clients and access policies.
//!
//! Outbound serialization omits empty fields so the server keeps generating defaults for
//! anything the caller did not declare. Inbound deserialization treats `null` like an absent
//! field.

mod enums;
mod scope;

pub use enums::*;
pub use scope::*;

// crates.io
use serde::Deserializer;
// self
use crate::{_prelude::*, auth::Secret, condition::Conditions};

/// OAuth 2.0 client registration as exchanged with the admin API.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OAuth2Client {
	/// Client identifier; generated by the server when empty.
	#[serde(default, skip_serializing_if = "String::is_empty", deserialize_with = "null_default")]
	pub client_id: String,
	/// Human-readable name.
	#[serde(default, skip_serializing_if = "String::is_empty", deserialize_with = "null_default")]
	pub client_name: String,
	/// Client secret; generated by the server when absent.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub client_secret: Option<Secret>,
	/// Whether the client is public (no secret).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub public: Option<bool>,
	/// Allowed redirect URIs, in order.
	#[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "null_default")]
	pub redirect_uris: Vec<String>,
	/// Space-delimited scope.
	#[serde(default, skip_serializing_if = "ClientScope::is_empty")]
	pub scope: ClientScope,
	/// Allowed response types.
	#[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "null_default")]
	pub response_types: Vec<String>,
	/// Allowed grant types.
	#[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "null_default")]
	pub grant_types: Vec<String>,
	/// Owner of the client.
	#[serde(default, skip_serializing_if = "String::is_empty", deserialize_with = "null_default")]
	pub owner: String,
	/// Privacy policy URL.
	#[serde(default, skip_serializing_if = "String::is_empty", deserialize_with = "null_default")]
	pub policy_uri: String,
	/// Terms of service URL.
	#[serde(default, skip_serializing_if = "String::is_empty", deserialize_with = "null_default")]
	pub tos_uri: String,
	/// Client home page URL.
	#[serde(default, skip_serializing_if = "String::is_empty", deserialize_with = "null_default")]
	pub client_uri: String,
	/// Logo URL.
	#[serde(default, skip_serializing_if = "String::is_empty", deserialize_with = "null_default")]
	pub logo_uri: String,
	/// Contact addresses.
	#[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "null_default")]
	pub contacts: Vec<String>,
	/// Token endpoint authentication method.
	#[serde(default, skip_serializing_if = "String::is_empty", deserialize_with = "null_default")]
	pub token_endpoint_auth_method: String,
}

/// Access-control policy as exchanged with the admin API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Policy {
	/// Policy identifier; generated by the server when empty.
	#[serde(default, skip_serializing_if = "String::is_empty", deserialize_with = "null_default")]
	pub id: String,
	/// Free-form description.
	#[serde(default, deserialize_with = "null_default")]
	pub description: String,
	/// Subjects the policy applies to.
	#[serde(default, deserialize_with = "null_default")]
	pub subjects: Vec<String>,
	/// Allow or deny.
	pub effect: Effect,
	/// Resources the policy applies to.
	#[serde(default, deserialize_with = "null_default")]
	pub resources: Vec<String>,
	/// Actions the policy applies to.
	#[serde(default, deserialize_with = "null_default")]
	pub actions: Vec<String>,
	/// Named conditions; always sent so an update clears removed entries.
	#[serde(default)]
	pub conditions: Conditions,
}

fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: Default + Deserialize<'de>,
{
	Ok(<Option<T>>::deserialize(deserializer)?.unwrap_or_default())
}
