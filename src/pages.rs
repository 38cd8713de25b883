#![forbid(unsafe_code)]

use std::sync::Arc;

use anyhow::Result;
use log::error;
use poem::http::Method;
use poem::Request;
use tera::Tera;

use crate::utils::config::Config;
use crate::utils::errors::PageError;
use crate::utils::render::load_templates;
use crate::utils::upstream::{GroupieClient, UpstreamClient};

pub mod artist;
pub mod home;

// ***************************************************************************
//                              Application State
// ***************************************************************************
/** Shared, read-only state handed to every request. */
pub struct AppState {
    pub config: Config,
    pub upstream: Arc<dyn UpstreamClient>,
    pub tera: Tera,
}

impl AppState {
    pub fn new(config: Config, upstream: Arc<dyn UpstreamClient>, tera: Tera) -> Self {
        Self { config, upstream, tera }
    }

    /// Build the state the server runs with: the real upstream client and
    /// the templates from the configured directory.
    pub fn from_config(config: &Config) -> Result<Self> {
        let upstream = GroupieClient::from_config(config)?;
        let tera = load_templates(&config.templates_dir)?;
        Ok(Self::new(config.clone(), Arc::new(upstream), tera))
    }
}

// ***************************************************************************
//                             Shared Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// check_method:
// ---------------------------------------------------------------------------
/** The pages are read-only; anything but GET (or HEAD) is rejected. */
pub fn check_method(http_req: &Request) -> Result<(), PageError> {
    let m = http_req.method();
    if m == Method::GET || m == Method::HEAD {
        Ok(())
    } else {
        Err(PageError::MethodNotAllowed)
    }
}

// ---------------------------------------------------------------------------
// log_page_error:
// ---------------------------------------------------------------------------
pub fn log_page_error(http_req: &Request, e: PageError) -> PageError {
    match e {
        PageError::NotFound | PageError::MethodNotAllowed => (),
        _ => error!("{} {}: {}", http_req.method(), http_req.uri(), e),
    }
    e
}
