//! URL rewrite strategies applied to outbound calls.
//!
//! Implementations only transform the target URL (for instance to prefix a CORS relay); status
//! handling, fallbacks, and error normalization stay with the executor.

// self
use crate::_prelude::*;

/// Pure URL transform applied right before a request leaves the broker.
pub trait UrlRewrite: Send + Sync {
	/// Returns the URL the request should actually be sent to.
	fn rewrite(&self, target: Url) -> Url;
}

/// Default strategy that leaves every URL untouched.
#[derive(Clone, Copy, Debug, Default)]
pub struct DirectUrl;
impl UrlRewrite for DirectUrl {
	fn rewrite(&self, target: Url) -> Url {
		target
	}
}

/// Routes requests through a query-style CORS relay (`https://relay/?<encoded target>`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CorsRelayPrefix {
	relay: Url,
}
impl CorsRelayPrefix {
	/// Creates a strategy that prefixes every target with `relay`.
	pub fn new(relay: Url) -> Self {
		Self { relay }
	}
}
impl UrlRewrite for CorsRelayPrefix {
	fn rewrite(&self, target: Url) -> Url {
		let mut rewritten = self.relay.clone();

		rewritten.set_query(None);
		rewritten.query_pairs_mut().append_key_only(target.as_str());

		rewritten
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn direct_strategy_is_identity() {
		let target = Url::parse("https://xubio.com/API/1.1/cliente").expect("Fixture URL parses.");

		assert_eq!(DirectUrl.rewrite(target.clone()), target);
	}

	#[test]
	fn cors_prefix_encodes_target_into_query() {
		let relay = CorsRelayPrefix::new(Url::parse("https://corsproxy.io/").expect("Relay URL parses."));
		let rewritten =
			relay.rewrite(Url::parse("https://xubio.com/API/1.1/cliente").expect("Target parses."));

		assert_eq!(rewritten.host_str(), Some("corsproxy.io"));
		assert_eq!(rewritten.query(), Some("https%3A%2F%2Fxubio.com%2FAPI%2F1.1%2Fcliente"));
	}
}
