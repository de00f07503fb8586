//! Token capacity configuration.

use crate::serde_helpers::count_string;
use serde::{Deserialize, Serialize};

/// Capacity configuration for one token address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
	/// Token address, the lookup key.
	pub address: String,
	/// Hard ceiling on total admissions. Upstream stores this as a free-form
	/// string; empty or unparseable values deserialize as 0, which closes the
	/// token to admissions.
	#[serde(default, with = "count_string")]
	pub max_mint_count: u64,
	/// Once true the token accepts no further admissions regardless of
	/// remaining capacity.
	#[serde(default)]
	pub pool_created: bool,
	/// Externally reported count of finalized mints. May lag or exceed the
	/// internal bookkeeping; the capacity evaluator trusts whichever source
	/// reports more.
	#[serde(default)]
	pub mint_count: u64,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_max_mint_count_from_string() {
		let token: Token =
			serde_json::from_str(r#"{"address": "0xt", "max_mint_count": "500"}"#).unwrap();
		assert_eq!(token.max_mint_count, 500);
		assert!(!token.pool_created);
		assert_eq!(token.mint_count, 0);
	}

	#[test]
	fn test_max_mint_count_lenient_parsing() {
		let cases = [
			(r#"{"address": "0xt", "max_mint_count": ""}"#, 0),
			(r#"{"address": "0xt", "max_mint_count": "garbage"}"#, 0),
			(r#"{"address": "0xt", "max_mint_count": null}"#, 0),
			(r#"{"address": "0xt"}"#, 0),
			(r#"{"address": "0xt", "max_mint_count": 42}"#, 42),
			(r#"{"address": "0xt", "max_mint_count": " 7 "}"#, 7),
		];
		for (json, expected) in cases {
			let token: Token = serde_json::from_str(json).unwrap();
			assert_eq!(token.max_mint_count, expected, "input: {}", json);
		}
	}

	#[test]
	fn test_round_trip() {
		let token = Token {
			address: "0xtoken".to_string(),
			max_mint_count: 1000,
			pool_created: true,
			mint_count: 12,
		};
		let json = serde_json::to_string(&token).unwrap();
		let back: Token = serde_json::from_str(&json).unwrap();
		assert_eq!(back.max_mint_count, 1000);
		assert!(back.pool_created);
		assert_eq!(back.mint_count, 12);
	}
}
