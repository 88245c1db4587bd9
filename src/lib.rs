//! Reconcile declared OAuth 2.0 clients and access policies against an ORY Hydra admin API.
//!
//! A host framework (a declarative infrastructure tool) owns one attribute store per managed
//! resource and drives the four lifecycle entry points exposed by [`resource::Resource`]. The
//! reconcilers map those loosely-typed attributes into Hydra's admin payloads, push them through
//! an [`api::AdminApi`], and re-read the authoritative server state afterwards.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod auth;
pub mod coerce;
pub mod condition;
pub mod config;
pub mod error;
pub mod http;
pub mod model;
pub mod obs;
pub mod provider;
pub mod resource;
pub mod state;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		api::ReqwestAdminApi,
		config::AdminConfig,
		resource::{ClientResource, PolicyResource},
		state::MemoryResourceData,
	};

	/// Builds an admin API handle pointed at `base_url` that accepts the self-signed
	/// certificates produced by `httpmock` during tests.
	pub fn test_admin_api(base_url: &str) -> Arc<ReqwestAdminApi> {
		let config = AdminConfig::builder(
			Url::parse(base_url).expect("Failed to parse the mock admin URL."),
		)
		.skip_tls_verify(true)
		.build()
		.expect("Mock admin configuration should be valid.");

		Arc::new(
			ReqwestAdminApi::from_config(&config)
				.expect("Failed to build the reqwest admin API for tests."),
		)
	}

	/// Constructs both reconcilers sharing one admin API handle.
	pub fn build_test_resources(base_url: &str) -> (ClientResource, PolicyResource) {
		let api = test_admin_api(base_url);

		(ClientResource::new(api.clone()), PolicyResource::new(api))
	}

	/// Fresh in-memory desired state seeded with `entries`.
	pub fn seeded_state<I, K>(entries: I) -> MemoryResourceData
	where
		I: IntoIterator<Item = (K, crate::state::AttrValue)>,
		K: Into<String>,
	{
		let mut state = MemoryResourceData::default();

		for (key, value) in entries {
			crate::state::ResourceData::set(&mut state, &key.into(), value);
		}

		state
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::Mutex;
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::{Map as JsonMap, Value as JsonValue};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tokio as _};
