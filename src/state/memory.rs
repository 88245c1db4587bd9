//! In-memory [`ResourceData`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	state::{AttrValue, ResourceData},
};

/// Attribute store that keeps one resource instance in-process.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryResourceData {
	id: String,
	attributes: BTreeMap<String, AttrValue>,
}
impl MemoryResourceData {
	/// Creates a store for an already-managed instance.
	pub fn with_id(id: impl Into<String>) -> Self {
		Self { id: id.into(), attributes: BTreeMap::new() }
	}

	/// Borrows every stored attribute.
	pub fn attributes(&self) -> &BTreeMap<String, AttrValue> {
		&self.attributes
	}

	/// Borrows a string attribute, mostly useful in assertions.
	pub fn get_str(&self, key: &str) -> Option<&str> {
		self.attributes.get(key).and_then(AttrValue::as_str)
	}

	/// Collects a list or set attribute of strings, skipping anything else.
	pub fn get_strings(&self, key: &str) -> Vec<String> {
		self.attributes
			.get(key)
			.and_then(AttrValue::as_elements)
			.map(|items| items.iter().filter_map(AttrValue::as_str).map(str::to_owned).collect())
			.unwrap_or_default()
	}
}
impl ResourceData for MemoryResourceData {
	fn id(&self) -> &str {
		&self.id
	}

	fn set_id(&mut self, id: &str) {
		id.clone_into(&mut self.id);
	}

	fn get(&self, key: &str) -> Option<&AttrValue> {
		self.attributes.get(key)
	}

	fn set(&mut self, key: &str, value: AttrValue) {
		self.attributes.insert(key.to_owned(), value);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn set_replaces_previous_values() {
		let mut state = MemoryResourceData::with_id("client-1");

		state.set("name", AttrValue::string("first"));
		state.set("name", AttrValue::string("second"));
		state.set_id("client-2");

		assert_eq!(state.id(), "client-2");
		assert_eq!(state.get_str("name"), Some("second"));
		assert_eq!(state.attributes().len(), 1);
	}

	#[test]
	fn get_strings_reads_lists_and_sets() {
		let mut state = MemoryResourceData::default();

		state.set("scope", AttrValue::string_list(["openid", "offline"]));
		state.set("grant_types", AttrValue::string_set(["implicit"]));

		assert_eq!(state.get_strings("scope"), vec!["openid", "offline"]);
		assert_eq!(state.get_strings("grant_types"), vec!["implicit"]);
		assert!(state.get_strings("missing").is_empty());
	}
}
