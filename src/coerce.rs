//! Conversions between the host's loosely-typed attributes and typed payload fields.
//!
//! Every accessor here follows the same presence rule: an attribute counts as declared only
//! when it is present *and* not its kind's zero value, so undeclared fields stay out of the
//! outbound payload and the server keeps generating its own defaults for them.

// self
use crate::{
	_prelude::*,
	error::{AttributeError, StatusError, ValidationError},
	state::{AttrValue, ResourceData},
};

/// Closed set of string values accepted by an attribute.
pub trait Enumerated
where
	Self: 'static + Sized + Copy,
{
	/// Every accepted value, in declaration order.
	const VARIANTS: &'static [Self];

	/// Wire representation of the value.
	fn as_str(self) -> &'static str;

	/// Looks up the variant matching `value` exactly.
	fn lookup(value: &str) -> Option<Self> {
		Self::VARIANTS.iter().copied().find(|variant| variant.as_str() == value)
	}
}

/// Renders the accepted values of `E` for error messages, in declaration order.
pub fn enumeration_keys<E>() -> Vec<String>
where
	E: Enumerated,
{
	E::VARIANTS.iter().map(|variant| variant.as_str().to_owned()).collect()
}

/// Parses `value` into `E`, reporting the accepted values on failure.
pub fn parse_enumerated<E>(attribute: &str, value: &str) -> Result<E, ValidationError>
where
	E: Enumerated,
{
	E::lookup(value).ok_or_else(|| ValidationError {
		attribute: attribute.to_owned(),
		value: value.to_owned(),
		allowed: enumeration_keys::<E>(),
	})
}

/// Converts a sequence of attribute values into strings, failing on the first non-string
/// element.
pub fn to_string_list(attribute: &str, values: &[AttrValue]) -> Result<Vec<String>, AttributeError> {
	values
		.iter()
		.map(|value| match value {
			AttrValue::String(s) => Ok(s.clone()),
			other => Err(AttributeError::UnexpectedKind {
				attribute: attribute.to_owned(),
				expected: "string elements",
				found: other.kind(),
			}),
		})
		.collect()
}

/// Returns `true` for 2xx status codes.
pub fn http_status_ok(code: u16) -> bool {
	(200..300).contains(&code)
}

/// Builds the error for a non-2xx status code, or `None` when the status is fine.
pub fn http_status_error(code: u16) -> Option<StatusError> {
	if http_status_ok(code) { None } else { Some(StatusError::new(code)) }
}

/// Fails with a [`StatusError`] unless `code` is 2xx.
pub fn ensure_status(code: u16) -> Result<(), StatusError> {
	match http_status_error(code) {
		Some(err) => Err(err),
		None => Ok(()),
	}
}

/// Reads an optional string attribute.
pub fn optional_string(
	state: &dyn ResourceData,
	attribute: &'static str,
) -> Result<Option<String>, AttributeError> {
	match state.get_ok(attribute) {
		None => Ok(None),
		Some(AttrValue::String(s)) => Ok(Some(s.clone())),
		Some(other) => Err(unexpected(attribute, "a string", other)),
	}
}

/// Reads a required string attribute.
pub fn required_string(
	state: &dyn ResourceData,
	attribute: &'static str,
) -> Result<String, AttributeError> {
	optional_string(state, attribute)?.ok_or(AttributeError::Missing { attribute })
}

/// Reads an optional boolean attribute; `false` counts as undeclared.
pub fn optional_bool(
	state: &dyn ResourceData,
	attribute: &'static str,
) -> Result<Option<bool>, AttributeError> {
	match state.get_ok(attribute) {
		None => Ok(None),
		Some(AttrValue::Bool(b)) => Ok(Some(*b)),
		Some(other) => Err(unexpected(attribute, "a bool", other)),
	}
}

/// Reads an optional list or set attribute of strings.
pub fn optional_string_list(
	state: &dyn ResourceData,
	attribute: &'static str,
) -> Result<Option<Vec<String>>, AttributeError> {
	match state.get_ok(attribute) {
		None => Ok(None),
		Some(value) => match value.as_elements() {
			Some(items) => to_string_list(attribute, items).map(Some),
			None => Err(unexpected(attribute, "a list", value)),
		},
	}
}

/// Reads a required, non-empty list or set attribute of strings.
pub fn required_string_list(
	state: &dyn ResourceData,
	attribute: &'static str,
) -> Result<Vec<String>, AttributeError> {
	optional_string_list(state, attribute)?.ok_or(AttributeError::Missing { attribute })
}

/// Reads an optional set of enumerated values.
pub fn optional_enum_set<E>(
	state: &dyn ResourceData,
	attribute: &'static str,
) -> Result<Option<Vec<E>>>
where
	E: Enumerated,
{
	let Some(raw) = optional_string_list(state, attribute)? else {
		return Ok(None);
	};
	let mut parsed = Vec::with_capacity(raw.len());

	for value in raw {
		let variant = parse_enumerated::<E>(attribute, &value)?;

		if !parsed.iter().any(|v: &E| v.as_str() == variant.as_str()) {
			parsed.push(variant);
		}
	}

	Ok(Some(parsed))
}

fn unexpected(attribute: &str, expected: &'static str, found: &AttrValue) -> AttributeError {
	AttributeError::UnexpectedKind { attribute: attribute.to_owned(), expected, found: found.kind() }
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{model::Effect, state::MemoryResourceData};

	#[test]
	fn status_boundaries_follow_the_2xx_range() {
		for ok in [200, 204, 299] {
			assert!(http_status_ok(ok), "{ok} should be treated as success.");
			assert!(ensure_status(ok).is_ok());
		}
		for failed in [199, 300, 404, 500] {
			let err = ensure_status(failed).expect_err("Non-2xx codes must fail.");

			assert_eq!(err.status, failed);
			assert!(err.to_string().contains(&failed.to_string()));
		}
	}

	#[test]
	fn string_lists_reject_foreign_elements() {
		let values = vec![AttrValue::string("a"), AttrValue::Int(1)];
		let err = to_string_list("subjects", &values).expect_err("Integers are not strings.");

		assert_eq!(err, AttributeError::UnexpectedKind {
			attribute: "subjects".into(),
			expected: "string elements",
			found: "int",
		});
		assert_eq!(
			to_string_list("subjects", &[AttrValue::string("a"), AttrValue::string("b")])
				.expect("String lists should coerce."),
			vec!["a", "b"],
		);
	}

	#[test]
	fn enumeration_rejection_lists_allowed_values() {
		let err = parse_enumerated::<Effect>("effect", "maybe")
			.expect_err("Unknown effects must be rejected.");

		assert_eq!(err.allowed, vec!["allow", "deny"]);
		assert!(err.to_string().contains("\"maybe\""));
		assert_eq!(enumeration_keys::<Effect>(), vec!["allow", "deny"]);
	}

	#[test]
	fn accessors_honor_presence() {
		let mut state = MemoryResourceData::default();

		state.set("owner", AttrValue::string(""));
		state.set("name", AttrValue::string("app"));
		state.set("public", AttrValue::Bool(true));
		state.set("scope", AttrValue::string("not-a-list"));

		assert_eq!(optional_string(&state, "owner").expect("Empty strings are absent."), None);
		assert_eq!(required_string(&state, "name").expect("Name is declared."), "app");
		assert_eq!(
			required_string(&state, "owner").expect_err("Empty required strings fail."),
			AttributeError::Missing { attribute: "owner" },
		);
		assert_eq!(optional_bool(&state, "public").expect("Bool is declared."), Some(true));
		assert!(optional_string_list(&state, "scope").is_err());
	}
}
