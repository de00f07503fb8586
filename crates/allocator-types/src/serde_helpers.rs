//! Serde helpers for lenient deserialization at the persistence edge.

/// Deserializes a count that upstream systems store as a free-form string.
///
/// Accepts a string, a number, or null; empty or unparseable values fall back
/// to 0. Serializes back as a string to match the upstream representation.
pub mod count_string {
	use serde::{Deserialize, Deserializer, Serializer};

	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Raw {
		Number(u64),
		Text(String),
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
	where
		D: Deserializer<'de>,
	{
		Ok(match Option::<Raw>::deserialize(deserializer)? {
			Some(Raw::Number(n)) => n,
			Some(Raw::Text(s)) => s.trim().parse().unwrap_or(0),
			None => 0,
		})
	}

	pub fn serialize<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&value.to_string())
	}
}
