// std
use std::net::IpAddr;
// self
use crate::{
	_prelude::*,
	condition::{AccessRequest, Condition},
};

/// Matches when the context value is an IP address inside `cidr`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CidrCondition {
	/// Network in `address/prefix` notation.
	pub cidr: String,
}
impl CidrCondition {
	/// Type tag used on the wire.
	pub const TAG: &'static str = "CIDRCondition";

	/// Creates a condition for the given network.
	pub fn new(cidr: impl Into<String>) -> Self {
		Self { cidr: cidr.into() }
	}
}
impl Condition for CidrCondition {
	fn name(&self) -> &str {
		Self::TAG
	}

	fn to_wire_body(&self) -> Result<JsonValue, serde_json::Error> {
		serde_json::to_value(self)
	}

	fn fulfills(&self, value: Option<&JsonValue>, _: &AccessRequest) -> bool {
		value
			.and_then(JsonValue::as_str)
			.and_then(|raw| raw.parse::<IpAddr>().ok())
			.and_then(|ip| cidr_contains(&self.cidr, ip))
			.unwrap_or(false)
	}
}

/// Matches when the context value equals a fixed string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StringEqualCondition {
	/// Expected value.
	pub equals: String,
}
impl StringEqualCondition {
	/// Type tag used on the wire.
	pub const TAG: &'static str = "StringEqualCondition";
}
impl Condition for StringEqualCondition {
	fn name(&self) -> &str {
		Self::TAG
	}

	fn to_wire_body(&self) -> Result<JsonValue, serde_json::Error> {
		serde_json::to_value(self)
	}

	fn fulfills(&self, value: Option<&JsonValue>, _: &AccessRequest) -> bool {
		value.and_then(JsonValue::as_str) == Some(self.equals.as_str())
	}
}

/// Matches when the context value equals the request subject. Carries no options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EqualsSubjectCondition;
impl EqualsSubjectCondition {
	/// Type tag used on the wire.
	pub const TAG: &'static str = "EqualsSubjectCondition";
}
impl Condition for EqualsSubjectCondition {
	fn name(&self) -> &str {
		Self::TAG
	}

	fn to_wire_body(&self) -> Result<JsonValue, serde_json::Error> {
		Ok(JsonValue::Object(JsonMap::new()))
	}

	fn fulfills(&self, value: Option<&JsonValue>, request: &AccessRequest) -> bool {
		value.and_then(JsonValue::as_str) == Some(request.subject.as_str())
	}
}

/// Opaque condition of any kind; the options pass through untouched.
///
/// Evaluation is left to the authorization server, so [`Condition::fulfills`] always
/// returns `false` here.
#[derive(Clone, Debug, PartialEq)]
pub struct JsonCondition {
	kind: String,
	options: JsonMap<String, JsonValue>,
}
impl JsonCondition {
	/// Wraps options for the given type tag.
	pub fn new(kind: impl Into<String>, options: JsonMap<String, JsonValue>) -> Self {
		Self { kind: kind.into(), options }
	}

	/// Borrows the options.
	pub fn options(&self) -> &JsonMap<String, JsonValue> {
		&self.options
	}
}
impl Condition for JsonCondition {
	fn name(&self) -> &str {
		&self.kind
	}

	fn to_wire_body(&self) -> Result<JsonValue, serde_json::Error> {
		Ok(JsonValue::Object(self.options.clone()))
	}

	fn fulfills(&self, _: Option<&JsonValue>, _: &AccessRequest) -> bool {
		false
	}
}

fn cidr_contains(cidr: &str, candidate: IpAddr) -> Option<bool> {
	let (network, prefix) = cidr.split_once('/')?;
	let network = network.parse::<IpAddr>().ok()?;
	let prefix = prefix.parse::<u32>().ok()?;

	match (network, candidate) {
		(IpAddr::V4(net), IpAddr::V4(ip)) => {
			if prefix > 32 {
				return None;
			}

			let mask = u32::MAX.checked_shl(32 - prefix).unwrap_or(0);

			Some(u32::from(net) & mask == u32::from(ip) & mask)
		},
		(IpAddr::V6(net), IpAddr::V6(ip)) => {
			if prefix > 128 {
				return None;
			}

			let mask = u128::MAX.checked_shl(128 - prefix).unwrap_or(0);

			Some(u128::from(net) & mask == u128::from(ip) & mask)
		},
		_ => Some(false),
	}
}
