//! Desired-state contracts shared between the host framework and the reconcilers.
//!
//! The host owns one attribute store per managed resource instance. Reconcilers only reach
//! into it through [`ResourceData`], reading declared values and writing back the
//! authoritative server state after every mutation.

pub mod memory;

pub use memory::MemoryResourceData;

// self
use crate::_prelude::*;

/// Loosely-typed attribute value stored by the host framework.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AttrValue {
	/// Boolean scalar.
	Bool(bool),
	/// Integer scalar.
	Int(i64),
	/// String scalar.
	String(String),
	/// Ordered sequence.
	List(Vec<AttrValue>),
	/// Unordered sequence without duplicates.
	Set(Vec<AttrValue>),
	/// Nested record or free-form mapping.
	Map(BTreeMap<String, AttrValue>),
	/// Arbitrary JSON that has no attribute-level counterpart (floats, `null`).
	Json(JsonValue),
}
impl AttrValue {
	/// Wraps a string scalar.
	pub fn string(value: impl Into<String>) -> Self {
		Self::String(value.into())
	}

	/// Builds an ordered list of strings.
	pub fn string_list<I, S>(values: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self::List(values.into_iter().map(|v| Self::String(v.into())).collect())
	}

	/// Builds a set of strings, keeping the first occurrence of each value.
	pub fn string_set<I, S>(values: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self::set(values.into_iter().map(|v| Self::String(v.into())))
	}

	/// Builds a set, keeping the first occurrence of each value.
	pub fn set<I>(values: I) -> Self
	where
		I: IntoIterator<Item = AttrValue>,
	{
		let mut items = Vec::new();

		for value in values {
			if !items.contains(&value) {
				items.push(value);
			}
		}

		Self::Set(items)
	}

	/// Stable label for the stored kind, used in error messages.
	pub const fn kind(&self) -> &'static str {
		match self {
			Self::Bool(_) => "bool",
			Self::Int(_) => "int",
			Self::String(_) => "string",
			Self::List(_) => "list",
			Self::Set(_) => "set",
			Self::Map(_) => "map",
			Self::Json(_) => "json",
		}
	}

	/// Returns `true` for the kind's zero value (empty string, `false`, `0`, empty
	/// collection, JSON `null`).
	pub fn is_zero(&self) -> bool {
		match self {
			Self::Bool(v) => !v,
			Self::Int(v) => *v == 0,
			Self::String(v) => v.is_empty(),
			Self::List(v) | Self::Set(v) => v.is_empty(),
			Self::Map(v) => v.is_empty(),
			Self::Json(v) => v.is_null(),
		}
	}

	/// Borrows the string scalar, if this is one.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::String(v) => Some(v),
			_ => None,
		}
	}

	/// Returns the boolean scalar, if this is one.
	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Self::Bool(v) => Some(*v),
			_ => None,
		}
	}

	/// Borrows the elements of a list or set.
	pub fn as_elements(&self) -> Option<&[AttrValue]> {
		match self {
			Self::List(v) | Self::Set(v) => Some(v),
			_ => None,
		}
	}

	/// Borrows the entries of a map.
	pub fn as_map(&self) -> Option<&BTreeMap<String, AttrValue>> {
		match self {
			Self::Map(v) => Some(v),
			_ => None,
		}
	}

	/// Converts a JSON value into the closest attribute shape.
	pub fn from_json(value: JsonValue) -> Self {
		match value {
			JsonValue::Bool(v) => Self::Bool(v),
			JsonValue::String(v) => Self::String(v),
			JsonValue::Number(n) => match n.as_i64() {
				Some(v) => Self::Int(v),
				None => Self::Json(JsonValue::Number(n)),
			},
			JsonValue::Array(items) => Self::List(items.into_iter().map(Self::from_json).collect()),
			JsonValue::Object(entries) =>
				Self::Map(entries.into_iter().map(|(k, v)| (k, Self::from_json(v))).collect()),
			JsonValue::Null => Self::Json(JsonValue::Null),
		}
	}

	/// Converts the attribute into JSON; sets become arrays.
	pub fn to_json(&self) -> JsonValue {
		match self {
			Self::Bool(v) => JsonValue::Bool(*v),
			Self::Int(v) => JsonValue::from(*v),
			Self::String(v) => JsonValue::String(v.clone()),
			Self::List(items) | Self::Set(items) =>
				JsonValue::Array(items.iter().map(Self::to_json).collect()),
			Self::Map(entries) => JsonValue::Object(
				entries.iter().map(|(k, v)| (k.clone(), v.to_json())).collect::<JsonMap<_, _>>(),
			),
			Self::Json(v) => v.clone(),
		}
	}
}
impl From<&str> for AttrValue {
	fn from(value: &str) -> Self {
		Self::String(value.to_owned())
	}
}
impl From<String> for AttrValue {
	fn from(value: String) -> Self {
		Self::String(value)
	}
}
impl From<bool> for AttrValue {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

/// Attribute store for one managed resource instance, owned by the host framework.
///
/// Implementations must be `Send` so reconciler futures holding `&mut dyn ResourceData`
/// can move between executor threads.
pub trait ResourceData
where
	Self: Send,
{
	/// External identifier of the instance; empty until the resource is created.
	fn id(&self) -> &str;

	/// Records the external identifier.
	fn set_id(&mut self, id: &str);

	/// Returns the stored value for `key`, whether or not it is a zero value.
	fn get(&self, key: &str) -> Option<&AttrValue>;

	/// Replaces the value stored for `key`.
	fn set(&mut self, key: &str, value: AttrValue);

	/// Returns the value for `key` only when it is present and not a zero value.
	fn get_ok(&self, key: &str) -> Option<&AttrValue> {
		self.get(key).filter(|value| !value.is_zero())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn zero_values_are_treated_as_absent() {
		let mut state = MemoryResourceData::default();

		state.set("name", AttrValue::string(""));
		state.set("public", AttrValue::Bool(false));
		state.set("contacts", AttrValue::string_list(Vec::<String>::new()));
		state.set("owner", AttrValue::string("ops"));

		assert!(state.get("name").is_some());
		assert!(state.get_ok("name").is_none());
		assert!(state.get_ok("public").is_none());
		assert!(state.get_ok("contacts").is_none());
		assert_eq!(state.get_ok("owner").and_then(AttrValue::as_str), Some("ops"));
		assert!(state.get_ok("missing").is_none());
	}

	#[test]
	fn sets_drop_duplicates_in_first_seen_order() {
		let set = AttrValue::string_set(["code", "token", "code"]);

		assert_eq!(set, AttrValue::Set(vec![AttrValue::string("code"), AttrValue::string("token")]));
	}

	#[test]
	fn json_conversion_round_trips_nested_values() {
		let json = serde_json::json!({
			"cidr": "127.0.0.1/24",
			"ports": [80, 443],
			"weight": 0.5,
			"strict": true,
		});
		let value = AttrValue::from_json(json.clone());

		assert_eq!(value.kind(), "map");
		assert_eq!(value.to_json(), json);
	}

	#[test]
	fn attr_values_serialize_with_kind_tags() {
		let payload = serde_json::to_string(&AttrValue::string_list(["a"]))
			.expect("Attribute values should serialize to JSON.");

		assert_eq!(payload, r#"{"kind":"list","value":[{"kind":"string","value":"a"}]}"#);
	}
}
