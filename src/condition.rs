//! Polymorphic policy conditions and their wire codec.
//!
//! A policy carries a map of named conditions. On the wire each entry looks like
//! `{"<name>": {"type": "<tag>", "options": <body>}}`: the condition's own serialized body is
//! only its options object, and the type tag travels beside it. [`Condition::to_wire_body`]
//! must therefore never emit the tag, and decoding relies on the sibling `type` field to pick
//! a variant.
//!
//! Known tags decode into typed variants that can evaluate requests locally. Anything else is
//! kept as an opaque [`JsonCondition`] so unknown kinds round-trip unchanged.

mod kinds;

pub use kinds::*;

// std
use std::collections::btree_map::Iter as BTreeIter;
// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use serde::{Deserializer, Serializer, de::Error as DeError, ser::SerializeMap};
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, error::AttributeError, state::AttrValue};

/// Request shape evaluated by [`Condition::fulfills`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessRequest {
	/// Resource being accessed.
	pub resource: String,
	/// Action being performed.
	pub action: String,
	/// Subject performing the action.
	pub subject: String,
	/// Free-form context; each condition reads the entry stored under its own name.
	#[serde(default)]
	pub context: JsonMap<String, JsonValue>,
}

/// Capability shared by every condition kind.
pub trait Condition {
	/// Self-reported type tag, sent beside the body under `type`.
	fn name(&self) -> &str;

	/// Serialized body: the options object only, never the type tag.
	fn to_wire_body(&self) -> Result<JsonValue, serde_json::Error>;

	/// Evaluates the condition against the context `value` stored under its name.
	fn fulfills(&self, value: Option<&JsonValue>, request: &AccessRequest) -> bool;
}

/// Failures raised while decoding a condition body.
#[derive(Debug, ThisError)]
pub enum ConditionError {
	/// The options body is neither an object nor `null`.
	#[error("Condition options must be a JSON object, found {found}.")]
	NonObjectOptions {
		/// JSON kind actually received.
		found: &'static str,
	},
	/// The body could not be converted to or from JSON.
	#[error(transparent)]
	Json(#[from] serde_json::Error),
}

/// Closed set of condition kinds with static dispatch.
#[derive(Clone, Debug, PartialEq)]
pub enum AnyCondition {
	/// Matches IP addresses inside a CIDR block.
	Cidr(CidrCondition),
	/// Matches a context value equal to a fixed string.
	StringEqual(StringEqualCondition),
	/// Matches a context value equal to the request subject.
	EqualsSubject(EqualsSubjectCondition),
	/// Pass-through for kinds without a local implementation.
	Json(JsonCondition),
}
impl AnyCondition {
	/// Picks the variant for `kind` and decodes `body` into it.
	///
	/// A known tag whose body carries extra or malformed fields falls back to the opaque
	/// variant, so the options survive the next write unchanged.
	pub fn decode(kind: &str, body: JsonValue) -> Result<Self, ConditionError> {
		let options = into_options(body)?;
		let typed = match kind {
			CidrCondition::TAG =>
				serde_json::from_value(JsonValue::Object(options.clone())).ok().map(Self::Cidr),
			StringEqualCondition::TAG => serde_json::from_value(JsonValue::Object(options.clone()))
				.ok()
				.map(Self::StringEqual),
			EqualsSubjectCondition::TAG if options.is_empty() =>
				Some(Self::EqualsSubject(EqualsSubjectCondition)),
			_ => None,
		};

		Ok(typed.unwrap_or_else(|| Self::Json(JsonCondition::new(kind, options))))
	}

	/// Decodes the body back into a generic options mapping.
	pub fn options(&self) -> Result<JsonMap<String, JsonValue>, ConditionError> {
		into_options(self.to_wire_body()?)
	}
}
impl Condition for AnyCondition {
	fn name(&self) -> &str {
		match self {
			Self::Cidr(c) => c.name(),
			Self::StringEqual(c) => c.name(),
			Self::EqualsSubject(c) => c.name(),
			Self::Json(c) => c.name(),
		}
	}

	fn to_wire_body(&self) -> Result<JsonValue, serde_json::Error> {
		match self {
			Self::Cidr(c) => c.to_wire_body(),
			Self::StringEqual(c) => c.to_wire_body(),
			Self::EqualsSubject(c) => c.to_wire_body(),
			Self::Json(c) => c.to_wire_body(),
		}
	}

	fn fulfills(&self, value: Option<&JsonValue>, request: &AccessRequest) -> bool {
		match self {
			Self::Cidr(c) => c.fulfills(value, request),
			Self::StringEqual(c) => c.fulfills(value, request),
			Self::EqualsSubject(c) => c.fulfills(value, request),
			Self::Json(c) => c.fulfills(value, request),
		}
	}
}

/// Host-side record declaring one named condition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConditionDeclaration {
	/// Key under which the condition is attached to the policy.
	pub name: String,
	/// Condition type tag.
	#[serde(rename = "type")]
	pub kind: String,
	/// Open-ended options.
	#[serde(default)]
	pub options: JsonMap<String, JsonValue>,
}
impl ConditionDeclaration {
	/// Attribute key holding the declaration's name.
	pub const NAME: &'static str = "name";
	/// Attribute key holding the declaration's type tag.
	pub const TYPE: &'static str = "type";
	/// Attribute key holding the declaration's options.
	pub const OPTIONS: &'static str = "options";

	/// Creates a declaration.
	pub fn new(
		name: impl Into<String>,
		kind: impl Into<String>,
		options: JsonMap<String, JsonValue>,
	) -> Self {
		Self { name: name.into(), kind: kind.into(), options }
	}

	/// Stable identity used by hosts to deduplicate and diff declaration sets.
	///
	/// Derived from the name and type only; two declarations differing just in options
	/// share a fingerprint. The value is a base64 (no padding) SHA-256 digest.
	pub fn fingerprint(&self) -> String {
		let mut hasher = Sha256::new();

		hasher.update(self.name.as_bytes());
		hasher.update(b"-");
		hasher.update(self.kind.as_bytes());
		hasher.update(b"-");

		STANDARD_NO_PAD.encode(hasher.finalize())
	}

	/// Builds the condition this declaration describes.
	pub fn to_condition(&self) -> Result<AnyCondition, ConditionError> {
		AnyCondition::decode(&self.kind, JsonValue::Object(self.options.clone()))
	}

	/// Reads a declaration from a nested attribute record.
	pub fn from_attr(attribute: &str, value: &AttrValue) -> Result<Self, AttributeError> {
		let record = value.as_map().ok_or_else(|| AttributeError::UnexpectedKind {
			attribute: attribute.to_owned(),
			expected: "a condition record",
			found: value.kind(),
		})?;
		let text = |key: &'static str| match record.get(key) {
			Some(AttrValue::String(s)) if !s.is_empty() => Ok(s.clone()),
			Some(other) if !other.is_zero() => Err(AttributeError::UnexpectedKind {
				attribute: format!("{attribute}.{key}"),
				expected: "a string",
				found: other.kind(),
			}),
			_ => Err(AttributeError::Missing { attribute: key }),
		};
		let name = text(Self::NAME)?;
		let kind = text(Self::TYPE)?;
		let options = match record.get(Self::OPTIONS).map(AttrValue::to_json) {
			None | Some(JsonValue::Null) => JsonMap::new(),
			Some(JsonValue::Object(map)) => map,
			Some(other) =>
				return Err(AttributeError::UnexpectedKind {
					attribute: format!("{attribute}.{}", Self::OPTIONS),
					expected: "a map",
					found: json_kind(&other),
				}),
		};

		Ok(Self { name, kind, options })
	}

	/// Writes the declaration as a nested attribute record.
	pub fn to_attr(&self) -> AttrValue {
		let options = self
			.options
			.iter()
			.map(|(k, v)| (k.clone(), AttrValue::from_json(v.clone())))
			.collect::<BTreeMap<_, _>>();

		AttrValue::Map(BTreeMap::from([
			(Self::NAME.to_owned(), AttrValue::string(&*self.name)),
			(Self::TYPE.to_owned(), AttrValue::string(&*self.kind)),
			(Self::OPTIONS.to_owned(), AttrValue::Map(options)),
		]))
	}
}

/// Named conditions attached to a policy.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Conditions(BTreeMap<String, AnyCondition>);
impl Conditions {
	/// Builds the collection from host declarations; names must be unique.
	pub fn from_declarations<'a, I>(declarations: I) -> Result<Self>
	where
		I: IntoIterator<Item = &'a ConditionDeclaration>,
	{
		let mut conditions = BTreeMap::new();

		for declaration in declarations {
			if conditions.contains_key(&declaration.name) {
				return Err(AttributeError::DuplicateCondition { name: declaration.name.clone() }
					.into());
			}

			conditions.insert(declaration.name.clone(), declaration.to_condition()?);
		}

		Ok(Self(conditions))
	}

	/// Re-derives one declaration per condition: the map key becomes the name, the
	/// self-reported tag becomes the type, and the body becomes the options.
	pub fn to_declarations(&self) -> Result<Vec<ConditionDeclaration>, ConditionError> {
		self.0
			.iter()
			.map(|(name, condition)| {
				Ok(ConditionDeclaration::new(name, condition.name(), condition.options()?))
			})
			.collect()
	}

	/// Attaches `condition` under `name`, replacing any previous entry.
	pub fn insert(&mut self, name: impl Into<String>, condition: AnyCondition) {
		self.0.insert(name.into(), condition);
	}

	/// Looks up a condition by name.
	pub fn get(&self, name: &str) -> Option<&AnyCondition> {
		self.0.get(name)
	}

	/// Number of conditions.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true if no conditions are attached.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterator over `(name, condition)` pairs.
	pub fn iter(&self) -> BTreeIter<'_, String, AnyCondition> {
		self.0.iter()
	}

	/// Returns `true` when every condition is fulfilled by `request`.
	pub fn fulfilled_by(&self, request: &AccessRequest) -> bool {
		self.0
			.iter()
			.all(|(name, condition)| condition.fulfills(request.context.get(name), request))
	}
}
impl Serialize for Conditions {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		#[derive(Serialize)]
		struct Envelope<'a> {
			#[serde(rename = "type")]
			kind: &'a str,
			options: JsonValue,
		}

		let mut map = serializer.serialize_map(Some(self.0.len()))?;

		for (name, condition) in &self.0 {
			let options = condition.to_wire_body().map_err(serde::ser::Error::custom)?;

			map.serialize_entry(name, &Envelope { kind: condition.name(), options })?;
		}

		map.end()
	}
}
impl<'de> Deserialize<'de> for Conditions {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		#[derive(Deserialize)]
		struct Envelope {
			#[serde(rename = "type")]
			kind: String,
			#[serde(default)]
			options: JsonValue,
		}

		let raw = <Option<BTreeMap<String, Envelope>>>::deserialize(deserializer)?;
		let mut conditions = BTreeMap::new();

		for (name, envelope) in raw.unwrap_or_default() {
			let condition = AnyCondition::decode(&envelope.kind, envelope.options)
				.map_err(|e| DeError::custom(format!("condition `{name}`: {e}")))?;

			conditions.insert(name, condition);
		}

		Ok(Self(conditions))
	}
}

fn into_options(body: JsonValue) -> Result<JsonMap<String, JsonValue>, ConditionError> {
	match body {
		JsonValue::Object(map) => Ok(map),
		JsonValue::Null => Ok(JsonMap::new()),
		other => Err(ConditionError::NonObjectOptions { found: json_kind(&other) }),
	}
}

fn json_kind(value: &JsonValue) -> &'static str {
	match value {
		JsonValue::Null => "null",
		JsonValue::Bool(_) => "bool",
		JsonValue::Number(_) => "number",
		JsonValue::String(_) => "string",
		JsonValue::Array(_) => "array",
		JsonValue::Object(_) => "object",
	}
}
