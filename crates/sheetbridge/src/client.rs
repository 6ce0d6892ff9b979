//! One round-trip: read config, snapshot, post, apply.

use sheetbridge_protocol::{AlertMode, Buttons};
use tracing::{info, warn};

use crate::callbacks::Callbacks;
use crate::config::{read_config, resolve, RunOptions};
use crate::dispatch::Dispatcher;
use crate::error::{Error, Result};
use crate::host::Host;
use crate::payload::build_payload;
use crate::transport::{HttpTransport, Transport};

/// Client-wide settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend URL used when neither the run options nor the config sheet name one
    pub url: Option<String>,
    /// Overrides the host's client name in the payload
    pub client_name: Option<String>,
    /// Version reported to the backend
    pub version: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: None,
            client_name: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// What a successful run did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub actions_applied: usize,
}

/// Drives round-trips between a host and a backend.
pub struct Client<T: Transport = HttpTransport> {
    config: ClientConfig,
    transport: T,
    callbacks: Callbacks,
}

impl Client<HttpTransport> {
    /// Client posting over HTTP
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self::with_transport(config, HttpTransport::new()?))
    }
}

impl<T: Transport> Client<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            callbacks: Callbacks::new(),
        }
    }

    pub fn with_callbacks(mut self, callbacks: Callbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn callbacks_mut(&mut self) -> &mut Callbacks {
        &mut self.callbacks
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Run one round-trip.
    ///
    /// Fails before any request on a configuration conflict or missing URL.
    /// If an action fails, the ones before it stay applied.
    pub fn run(&self, host: &mut dyn Host, options: &RunOptions) -> Result<RunSummary> {
        let config = read_config(host)?;
        let sheet_names = host.sheet_names()?;
        let settings = resolve(&config, options, &sheet_names)?;

        let url = settings
            .url
            .or_else(|| self.config.url.clone())
            .ok_or_else(|| Error::InvalidArgument("no backend URL configured".to_string()))?;

        let client_name = self
            .config
            .client_name
            .clone()
            .unwrap_or_else(|| host.client_name().to_string());
        let payload = build_payload(host, &settings.exclude, &client_name, &self.config.version)?;

        let response = self.transport.post(&url, &settings.headers, &payload)?;
        info!(url = %url, actions = response.actions.len(), "backend responded");

        let actions_applied = Dispatcher::new(&self.callbacks).apply_all(host, &response.actions)?;
        Ok(RunSummary { actions_applied })
    }

    /// Like [`run`](Self::run), also showing any error to the user as a critical alert.
    ///
    /// The original error is returned either way.
    pub fn run_and_report(&self, host: &mut dyn Host, options: &RunOptions) -> Result<RunSummary> {
        self.run(host, options).map_err(|err| {
            if let Err(alert_err) =
                host.alert(&err.to_string(), "Error", Buttons::Ok, AlertMode::Critical)
            {
                warn!(error = %alert_err, "could not show error alert");
            }
            err
        })
    }
}
