#![forbid(unsafe_code)]

use anyhow::{Result, anyhow};
use log::{info, error, LevelFilter};
use serde::Deserialize;
use std::{env, fs, path::Path};
use toml;
use fs_mistrust::Mistrust;
use std::os::unix::fs::PermissionsExt;
use lazy_static::lazy_static;
use structopt::StructOpt;

use log4rs::append::console::ConsoleAppender;
use log4rs::encode::pattern::PatternEncoder;

// Groupie Utilities
use crate::utils::{groupie_utils, errors::Errors};
use crate::utils::matcher::{MatchOptions, DEFAULT_SUGGESTION_LIMIT};
use crate::utils::upstream::DEFAULT_UPSTREAM_BASE_URL;

use super::groupie_utils::get_absolute_path;

// ***************************************************************************
//                                Constants
// ***************************************************************************
// Directory and file locations. Unless otherwise noted, all files and directories
// are relative to the root directory.
const ENV_GROUPIE_ROOT_DIR : &str = "GROUPIE_ROOT_DIR";
const DEFAULT_ROOT_DIR     : &str = "~/.groupie";
const CONFIG_DIR           : &str = "/config";
const LOGS_DIR             : &str = "/logs";
const LOG4RS_CONFIG_FILE   : &str = "/log4rs.yml";   // relative to config dir
const GROUPIE_CONFIG_FILE  : &str = "/groupie.toml"; // relative to config dir

// Console log format used when no log4rs file is installed.
const DEFAULT_LOG_PATTERN  : &str = "{d(%Y-%m-%dT%H:%M:%S%.3f)} {h({l})} {t} - {m}{n}";

// Networking.
const DEFAULT_HTTP_ADDR    : &str = "http://localhost";
const DEFAULT_HTTP_PORT    : u16  = 5500;

// Upstream.
const DEFAULT_UPSTREAM_TIMEOUT_SECS         : u64 = 30;
const DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS : u64 = 10;

// The upstream dataset holds artists 1 through 52.
const DEFAULT_MAX_ARTIST_ID : i32 = 52;

// Content locations, relative to the working directory.
const DEFAULT_TEMPLATES_DIR : &str = "templates";
const DEFAULT_HTML_DIR      : &str = "HTML";

// ***************************************************************************
//                             Static Variables
// ***************************************************************************
// Assign the command line arguments BEFORE RUNTIME_CTX is initialized in main.
lazy_static! {
    pub static ref GROUPIE_ARGS: GroupieArgs = init_groupie_args();
}

// Calculate the data directories BEFORE RUNTIME_CTX is initialized in main.
lazy_static! {
    pub static ref GROUPIE_DIRS: GroupieDirs = init_groupie_dirs();
}

// ***************************************************************************
//                             Directory Structs
// ***************************************************************************
// ---------------------------------------------------------------------------
// GroupieDirs:
// ---------------------------------------------------------------------------
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
pub struct GroupieDirs {
    pub root_dir: String,
    pub config_dir: String,
    pub logs_dir: String,
}

// ***************************************************************************
//                               Config Structs
// ***************************************************************************
// ---------------------------------------------------------------------------
// GroupieArgs:
// ---------------------------------------------------------------------------
#[derive(Debug, StructOpt)]
#[structopt(name = "groupie_args", about = "Command line arguments for the Groupie server.")]
pub struct GroupieArgs {
    /// Specify the server's root data directory.
    ///
    /// This directory contains the configuration and log files.
    #[structopt(short, long)]
    pub root_dir: Option<String>,

    /// Create the data directories and then exit.
    ///
    /// The data directories will be rooted at a root directory calculated
    /// using the following priority order:
    ///
    ///   1. If set, the value of the GROUPIE_ROOT_DIR environment,
    ///
    ///   2. Otherwise, if set, the value of the --root_dir command line argument,
    ///
    ///   3. Otherwise, ~/.groupie
    ///
    #[structopt(short, long)]
    pub create_dirs_only: bool,
}

// ---------------------------------------------------------------------------
// Parms:
// ---------------------------------------------------------------------------
#[derive(Debug)]
#[allow(dead_code)]
pub struct Parms {
    pub config_file: String,
    pub config: Config,
}

// ---------------------------------------------------------------------------
// RuntimeCtx:
// ---------------------------------------------------------------------------
#[derive(Debug)]
#[allow(dead_code)]
pub struct RuntimeCtx {
    pub parms: Parms,
    pub groupie_args: &'static GroupieArgs,
    pub groupie_dirs: &'static GroupieDirs,
}

// ---------------------------------------------------------------------------
// Config:
// ---------------------------------------------------------------------------
/** Contents of groupie.toml.  Every key is optional. */
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub title: String,
    pub http_addr: String,
    pub http_port: u16,
    pub upstream_base_url: String,
    pub upstream_timeout_secs: u64,
    pub upstream_connect_timeout_secs: u64,
    /// Largest artist id accepted by the detail page, 0 disables the check.
    pub max_artist_id: i32,
    pub suggestion_limit: usize,
    pub fuzzy_match: bool,
    pub templates_dir: String,
    pub html_dir: String,
    pub tls_cert_file: Option<String>,
    pub tls_key_file: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Config::default()
    }

    pub fn match_options(&self) -> MatchOptions {
        MatchOptions { fuzzy: self.fuzzy_match, suggestion_limit: self.suggestion_limit }
    }

    /// Whether the artist id falls inside the accepted range.
    pub fn artist_id_in_range(&self, id: i32) -> bool {
        id >= 1 && (self.max_artist_id <= 0 || id <= self.max_artist_id)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: "Groupie Trackers".to_string(),
            http_addr: DEFAULT_HTTP_ADDR.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            upstream_base_url: DEFAULT_UPSTREAM_BASE_URL.to_string(),
            upstream_timeout_secs: DEFAULT_UPSTREAM_TIMEOUT_SECS,
            upstream_connect_timeout_secs: DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS,
            max_artist_id: DEFAULT_MAX_ARTIST_ID,
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
            fuzzy_match: false,
            templates_dir: DEFAULT_TEMPLATES_DIR.to_string(),
            html_dir: DEFAULT_HTML_DIR.to_string(),
            tls_cert_file: None,
            tls_key_file: None,
        }
    }
}

// ***************************************************************************
//                            Directory Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// init_groupie_args:
// ---------------------------------------------------------------------------
/** Get the command line arguments. */
fn init_groupie_args() -> GroupieArgs {
    let args = GroupieArgs::from_args();
    println!("{:?}", args);
    args
}

// ---------------------------------------------------------------------------
// init_groupie_dirs:
// ---------------------------------------------------------------------------
/** Calculate the external data directories. */
fn init_groupie_dirs() -> GroupieDirs {
    // Initialize the mistrust object.
    let mistrust = get_mistrust();

    // Check that each path is absolute and is a directory with the
    // proper permission assign if it exists.  If it doesn't exist,
    // create it.
    let root_dir = get_root_dir();
    check_groupie_dir(&root_dir, "root directory", &mistrust);

    let config_dir = root_dir.clone() + CONFIG_DIR;
    check_groupie_dir(&config_dir, "config directory", &mistrust);

    let logs_dir = root_dir.clone() + LOGS_DIR;
    check_groupie_dir(&logs_dir, "logs directory", &mistrust);

    // Package up and return the directories.
    GroupieDirs { root_dir, config_dir, logs_dir }
}

// ---------------------------------------------------------------------------
// check_groupie_dir:
// ---------------------------------------------------------------------------
/** Check that the path is absolute and, if it exists, that is has the proper
 * permissions assigned.  If it doesn't exist, create it.  The mistrust package
 * creates directories with 0o700 permissions.
 *
 * Any failure results in a panic.
 */
fn check_groupie_dir(dir: &String, msgname: &str, mistrust: &Mistrust ) {
    let path = Path::new(dir);
    if !path.is_absolute() {
        panic!("The Groupie {} path must be absolute: {}", msgname, dir);
    }
    if path.exists() {
        if !path.is_dir() {
            panic!("The Groupie {} path must be a directory: {}", msgname, dir);
        }

        // Make sure the directory had rwx for owner only.
        let meta = path.metadata().unwrap_or_else(|_| panic!("Unable to read metadata for {}: {}", msgname, dir));
        let perm = meta.permissions().mode();
        if perm & 0o777 != 0o700 {
            panic!("The Groupie {} path must be have 0o700 permissions: {}", msgname, dir);
        }
    } else if let Err(e) = mistrust.make_directory(path) {
        panic!("Make directory error for {:?}: {}", path, &e.to_string());
    }
}

// ---------------------------------------------------------------------------
// get_mistrust:
// ---------------------------------------------------------------------------
/** Configure a new mistrust object for initial directory processing. */
fn get_mistrust() -> Mistrust {
    match Mistrust::builder()
        .ignore_prefix(get_absolute_path("~"))
        .trust_group(0)
        .build() {
            Ok(m) => m,
            Err(e) => {
                panic!("Mistrust configuration error: {}", &e.to_string());
            }
        }
}

// ---------------------------------------------------------------------------
// get_root_dir:
// ---------------------------------------------------------------------------
fn get_root_dir() -> String {
    // Order of precedence:
    //  1. Environment variable
    //  2. Command line --root-dir argument
    //  3. Default location
    //
    let root_dir = env::var(ENV_GROUPIE_ROOT_DIR).unwrap_or_else(
        |_| {
            match GROUPIE_ARGS.root_dir.clone() {
                Some(r) => r,
                None => DEFAULT_ROOT_DIR.to_string(),
            }
        });

    // Canonicalize the path.
    get_absolute_path(&root_dir)
}

// ***************************************************************************
//                               Log Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// init_log:
// ---------------------------------------------------------------------------
/** Initialize log4rs from the config directory's log4rs.yml.  Without that
 * file a console logger at info level is installed.
 */
pub fn init_log() {
    let logconfig = init_log_config();
    if !Path::new(&logconfig).exists() {
        init_console_log();
        info!("No Log4rs file at {}, logging to the console.", logconfig);
        return;
    }

    match log4rs::init_file(logconfig.clone(), Default::default()) {
        Ok(_) => (),
        Err(e) => {
            println!("{}", e);
            let s = format!("{}", Errors::Log4rsInitialization(logconfig));
            panic!("{}", s);
        },
    }
    info!("Log4rs initialized using: {}", logconfig);
}

// ---------------------------------------------------------------------------
// init_console_log:
// ---------------------------------------------------------------------------
fn init_console_log() {
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(DEFAULT_LOG_PATTERN)))
        .build();
    let config = log4rs::config::Config::builder()
        .appender(log4rs::config::Appender::builder().build("stdout", Box::new(stdout)))
        .build(log4rs::config::Root::builder().appender("stdout").build(LevelFilter::Info));

    let result = match config {
        Ok(c) => log4rs::init_config(c).map(|_| ()).map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };
    if let Err(e) = result {
        panic!("{}: {}", Errors::Log4rsInitialization("console".to_string()), e);
    }
}

// ---------------------------------------------------------------------------
// init_log_config:
// ---------------------------------------------------------------------------
fn init_log_config() -> String {
    GROUPIE_DIRS.config_dir.clone() + LOG4RS_CONFIG_FILE
}

// ***************************************************************************
//                             Parms Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// get_parms:
// ---------------------------------------------------------------------------
/** Retrieve the application parameters from the configuration file in the
 * config data directory.  If the file does not exist the default values are
 * used.
 */
fn get_parms() -> Result<Parms> {
    // Get the config file path from its data directory.
    let config_file = GROUPIE_DIRS.config_dir.clone() + GROUPIE_CONFIG_FILE;

    // Read the cofiguration file.
    let config_file_abs = groupie_utils::get_absolute_path(&config_file);
    info!("{}", Errors::ReadingConfigFile(config_file_abs.clone()));
    let contents = match fs::read_to_string(&config_file_abs) {
        Ok(c) => c,
        Err(_) => {
            println!("Unable to read configuration at {}. Using default values.", config_file);
            return Ok(Parms { config_file: Default::default(), config: Config::new() });
        }
    };

    let config = parse_config(&contents).map_err(|e| {
        let msg = format!("{}\n   {}", Errors::TOMLParseError(config_file_abs.clone()), e);
        error!("{}", msg);
        anyhow!(msg)
    })?;

    Ok(Parms { config_file: config_file_abs, config })
}

// ---------------------------------------------------------------------------
// parse_config:
// ---------------------------------------------------------------------------
pub fn parse_config(contents: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(contents)
}

// ***************************************************************************
//                             Config Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// init_runtime_context:
// ---------------------------------------------------------------------------
pub fn init_runtime_context() -> RuntimeCtx {
    // The application aborts if the configuration cannot be read.
    let parms = get_parms().expect("FAILED to read configuration file.");
    RuntimeCtx {parms, groupie_args: &GROUPIE_ARGS, groupie_dirs: &GROUPIE_DIRS}
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use crate::utils::config::{parse_config, Config};

    #[test]
    fn defaults() {
        let c = Config::new();
        assert_eq!(c.http_port, 5500);
        assert_eq!(c.max_artist_id, 52);
        assert_eq!(c.suggestion_limit, 10);
        assert!(!c.fuzzy_match);
        assert!(c.upstream_base_url.starts_with("https://groupietrackers"));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = parse_config("http_port = 8080\nfuzzy_match = true\n").unwrap();
        assert_eq!(c.http_port, 8080);
        assert!(c.fuzzy_match);
        assert_eq!(c.suggestion_limit, 10);
        assert_eq!(c.templates_dir, "templates");
    }

    #[test]
    fn bad_toml_is_an_error() {
        assert!(parse_config("http_port = \"eighty\"").is_err());
    }

    #[test]
    fn artist_id_range() {
        let mut c = Config::new();
        for id in [0, 53, -1] {
            assert!(!c.artist_id_in_range(id));
        }
        assert!(c.artist_id_in_range(1));
        assert!(c.artist_id_in_range(52));

        c.max_artist_id = 0;
        assert!(c.artist_id_in_range(5000));
        assert!(!c.artist_id_in_range(0));
    }
}
