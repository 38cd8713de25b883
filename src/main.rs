#![forbid(unsafe_code)]

use std::sync::Arc;

use lazy_static::lazy_static;
use log::{error, info};
use poem::endpoint::StaticFilesEndpoint;
use poem::error::{NotFoundError, ResponseError, StaticFileError};
use poem::listener::{Listener, RustlsCertificate, RustlsConfig, TcpListener};
use poem::{Endpoint, EndpointExt, Route, Server};
use poem_openapi::OpenApiService;

// Groupie Utilities
use crate::pages::{artist::artist, home::home, AppState};
use crate::utils::config::{init_log, init_runtime_context, RuntimeCtx, GROUPIE_ARGS, GROUPIE_DIRS};
use crate::utils::errors::{Errors, PageError};
use crate::utils::groupie_utils::{get_absolute_path, BUILD_INFO};
use crate::v1::api::search::SearchApi;
use crate::v1::api::version::VersionApi;

// Modules
mod pages;
mod utils;
mod v1;

// ***************************************************************************
//                                Constants
// ***************************************************************************
const SERVER_NAME : &str = "GroupieServer"; // for poem logging

// ***************************************************************************
//                             Static Variables
// ***************************************************************************
// Lazily initialize the parameters variable so that is has a 'static lifetime.
// We exit if we can't read our parameters.
lazy_static! {
    static ref RUNTIME_CTX: RuntimeCtx = init_runtime_context();
}

// ---------------------------------------------------------------------------
// main:
// ---------------------------------------------------------------------------
#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    // --------------- Initialize Groupie -------------
    // Announce ourselves.
    println!("Starting groupie_server!");

    // Only create the data directories if requested.
    if GROUPIE_ARGS.create_dirs_only {
        println!("Data directories ready under {}.", GROUPIE_DIRS.root_dir);
        return Ok(());
    }

    // Initialize the server.
    groupie_init();

    // --------------- Main Loop Set Up ---------------
    let config = &RUNTIME_CTX.parms.config;
    let state = match AppState::from_config(config) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            error!("{}", e);
            return Err(std::io::Error::other(e.to_string()));
        }
    };
    let app = build_app(state);

    let addr = format!("{}{}", "0.0.0.0:", config.http_port);
    println!("go to -->  {}:{}/ ", config.http_addr, config.http_port);

    // ------------------ Main Loop -------------------
    // TLS is used only when both the certificate and key are configured.
    match (&config.tls_cert_file, &config.tls_key_file) {
        (Some(cert), Some(key)) => {
            Server::new(
                TcpListener::bind(addr).rustls(
                    RustlsConfig::new().fallback(
                        RustlsCertificate::new()
                            .key(std::fs::read(get_absolute_path(key))?)
                            .cert(std::fs::read(get_absolute_path(cert))?),
                    ),
                ),
            )
            .name(SERVER_NAME)
            .run(app)
            .await
        },
        _ => {
            Server::new(TcpListener::bind(addr))
                .name(SERVER_NAME)
                .run(app)
                .await
        },
    }
}

// ***************************************************************************
//                             Public Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// build_app:
// ---------------------------------------------------------------------------
/** Wire the HTML pages, the static directories and the JSON api.  Unknown
 * paths get the not-found page.
 */
pub fn build_app(state: Arc<AppState>) -> impl Endpoint {
    let config = &state.config;

    // Assign base URL.
    let api_url = format!("{}:{}{}", config.http_addr, config.http_port, "/v1");
    let endpoints = (SearchApi::new(state.clone()), VersionApi);
    let api_service =
        OpenApiService::new(endpoints, "Groupie Server", BUILD_INFO.version).server(api_url);

    // Allow the generated openapi specs to be retrieved from the server.
    let spec = api_service.spec_endpoint();
    let spec_yaml = api_service.spec_endpoint_yaml();
    let ui = api_service.swagger_ui();

    Route::new()
        .at("/", home)
        .at("/index.html", home)
        .at("/artist", artist)
        .nest("/templates", StaticFilesEndpoint::new(get_absolute_path(&config.templates_dir)))
        .nest("/HTML", StaticFilesEndpoint::new(get_absolute_path(&config.html_dir)))
        .nest("/v1", api_service)
        .nest("/swagger", ui)
        .at("/spec", spec)
        .at("/spec_yaml", spec_yaml)
        .data(state)
        .catch_error(|_: NotFoundError| async move { PageError::NotFound.as_response() })
        .catch_error(|e: StaticFileError| async move { static_file_error(e) })
}

// ---------------------------------------------------------------------------
// static_file_error:
// ---------------------------------------------------------------------------
// Missing files share the not-found page with unknown routes.
fn static_file_error(e: StaticFileError) -> poem::Response {
    match e {
        StaticFileError::NotFound => PageError::NotFound.as_response(),
        StaticFileError::MethodNotAllowed(_) => PageError::MethodNotAllowed.as_response(),
        other => other.as_response(),
    }
}

// ***************************************************************************
//                             Private Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// groupie_init:
// ---------------------------------------------------------------------------
/** Initialize logging and force the reading of the configuration. */
fn groupie_init() {
    // Configure out log.
    init_log();

    // Force the reading of input parameters and initialization of runtime context.
    info!("{}", Errors::InputParms(format!("{:#?}", *RUNTIME_CTX)));

    // Log build info.
    print_version_info();
}

// ---------------------------------------------------------------------------
// print_version_info:
// ---------------------------------------------------------------------------
fn print_version_info() {
    info!("\n*** Running {}.", BUILD_INFO);
}
