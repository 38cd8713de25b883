#![forbid(unsafe_code)]

use std::collections::HashMap;

use anyhow::{Result, anyhow};
use log::info;
use serde::Serialize;
use tera::{Context, Tera, Value};

use crate::utils::errors::{Errors, PageError};
use crate::utils::groupie_utils::get_absolute_path;

pub const INDEX_TEMPLATE: &str = "index.html";
pub const INFO_TEMPLATE: &str = "info.html";

// ---------------------------------------------------------------------------
// load_templates:
// ---------------------------------------------------------------------------
/** Compile every html template in the directory.  Both page templates must
 * be present.
 */
pub fn load_templates(dir: &str) -> Result<Tera> {
    let dir = get_absolute_path(dir);
    let pattern = format!("{}/**/*.html", dir.trim_end_matches('/'));
    let mut tera = Tera::new(&pattern)
        .map_err(|e| anyhow!(Errors::TemplateInit(dir.clone(), format!("{:?}", e))))?;

    for name in [INDEX_TEMPLATE, INFO_TEMPLATE] {
        if !tera.get_template_names().any(|n| n == name) {
            return Err(anyhow!(Errors::TemplateInit(dir, format!("missing {}", name))));
        }
    }
    tera.register_filter("place", place_filter);

    info!("Templates loaded from {}.", dir);
    Ok(tera)
}

// ---------------------------------------------------------------------------
// render:
// ---------------------------------------------------------------------------
pub fn render(tera: &Tera, template: &str, data: &impl Serialize) -> Result<String, PageError> {
    let ctx = Context::from_serialize(data)?;
    Ok(tera.render(template, &ctx)?)
}

// ---------------------------------------------------------------------------
// display_place:
// ---------------------------------------------------------------------------
/** Upstream locations look like "north_carolina-usa".  Render them as
 * "North Carolina, USA".
 */
pub fn display_place(raw: &str) -> String {
    let mut parts = raw.rsplitn(2, '-');
    let last = parts.next().unwrap_or_default();
    let (city, country) = match parts.next() {
        Some(city) => (city, Some(last)),
        None => (last, None),
    };

    let city = city.split('_')
        .filter(|w| !w.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ");
    match country {
        Some(c) if c.len() <= 3 => format!("{}, {}", city, c.replace('_', " ").to_uppercase()),
        Some(c) => format!("{}, {}", city, c.split('_').map(capitalize).collect::<Vec<_>>().join(" ")),
        None => city,
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(f) => f.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn place_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    match value.as_str() {
        Some(s) => Ok(Value::String(display_place(s))),
        None => Err(tera::Error::msg("place filter expects a string")),
    }
}
