//! Token issuance with caching + singleflight guards.
//!
//! [`Broker::access_token`] hands out the cached bearer token while it is outside the store's
//! safety margin and only contacts the token endpoint when the token is missing, expiring, or
//! forced. Exchanges run under the broker's issuance guard and re-check the cache after the
//! guard is acquired, so concurrent callers piggy-back on the token the first caller stored
//! instead of stampeding the endpoint.
//!
//! Cached tokens remember whether their exchange asked for the relay's deployment pair. A
//! request preferring server credentials only reuses a token issued that way; a plain request
//! reuses whichever token is cached.

// self
use crate::{
	_prelude::*,
	auth::{CredentialPair, Secret, TokenOrigin},
	error::ConfigError,
	flows::{Broker, common::TokenRequest},
	http::HttpTransport,
	oauth::{self, AuthExchangeRequest, TokenResponse, TransportErrorMapper},
	obs::{self, FlowKind},
	provider::ExchangeTransport,
};

impl<C, M> Broker<C, M>
where
	C: HttpTransport + ?Sized,
	M: TransportErrorMapper<C::TransportError> + ?Sized,
{
	/// Returns a usable bearer token, exchanging the saved credential pair when needed.
	pub async fn access_token(&self) -> Result<Secret> {
		self.access_token_with(TokenRequest::default()).await
	}

	/// Returns a usable bearer token honoring the provided [`TokenRequest`] options.
	pub async fn access_token_with(&self, request: TokenRequest) -> Result<Secret> {
		const KIND: FlowKind = FlowKind::TokenExchange;

		if !request.force {
			if let Some(token) = self.cached_token_for(request).await? {
				return Ok(token);
			}
		}
		if request.prefer_server_credentials && self.descriptor.exchange.relay_endpoint().is_none()
		{
			return Err(ConfigError::ServerCredentialsRequireRelay.into());
		}

		obs::observe(KIND, "access_token", async move {
			let _singleflight = self.issuance_guard.lock().await;

			if !request.force {
				if let Some(token) = self.cached_token_for(request).await? {
					return Ok(token);
				}
			}

			let credentials = self.store.get_credentials().await?;
			let http_request = match &self.descriptor.exchange {
				ExchangeTransport::Direct => {
					let pair = credentials.ok_or(ConfigError::NoCredentials)?;

					oauth::direct_exchange_request(&self.descriptor.token_endpoint, &pair)?
				},
				ExchangeTransport::Relay(relay) => {
					let body = match credentials {
						Some(pair) =>
							AuthExchangeRequest::from_pair(&pair, request.prefer_server_credentials),
						None if request.prefer_server_credentials =>
							AuthExchangeRequest::server_only(),
						None => return Err(ConfigError::NoCredentials.into()),
					};

					oauth::relay_exchange_request(relay, &body)?
				},
			};
			let response = self.execute(KIND, http_request).await?;
			let token = oauth::parse_token_response(response)?;
			let cached = self
				.store
				.store_token_from(
					origin_of(request),
					token.access_token.clone(),
					token.token_type_or_default(),
					token.expires_in_or_default(),
				)
				.await?;

			Ok(cached.access_token)
		})
		.await
	}

	async fn cached_token_for(&self, request: TokenRequest) -> Result<Option<Secret>> {
		let token = if request.prefer_server_credentials {
			self.store.get_stored_token_from(TokenOrigin::ServerCredentials).await?
		} else {
			self.store.get_stored_token().await?
		};

		Ok(token)
	}

	/// Exchanges `pair` directly against the token endpoint without touching the cache.
	///
	/// The relay uses this to serve `POST /api/auth`; the caller owns the returned token.
	pub async fn exchange_credentials(&self, pair: &CredentialPair) -> Result<TokenResponse> {
		const KIND: FlowKind = FlowKind::TokenExchange;

		obs::observe(KIND, "exchange_credentials", async move {
			let request =
				oauth::direct_exchange_request(&self.descriptor.token_endpoint, pair)?;
			let response = self.execute(KIND, request).await?;

			oauth::parse_token_response(response)
		})
		.await
	}
}

fn origin_of(request: TokenRequest) -> TokenOrigin {
	if request.prefer_server_credentials {
		TokenOrigin::ServerCredentials
	} else {
		TokenOrigin::UserCredentials
	}
}
