pub mod dialect;
pub mod enrich;
pub mod format;
pub mod model;
pub mod relationships;
pub mod render;
pub mod resolve;
pub mod snapshot;

use wasm_bindgen::prelude::*;

use render::{PlantUmlRenderer, RenderOptions};
use snapshot::{CatalogSnapshot, LoadOptions, SnapshotError};

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Render a catalog snapshot (JSON) to PlantUML.
pub fn render_snapshot(
    json: &str,
    load: &LoadOptions,
    render: RenderOptions,
) -> Result<String, SnapshotError> {
    let schemas = CatalogSnapshot::from_json(json)?.into_schemas(load)?;
    let document = PlantUmlRenderer::new(render).render(&schemas);
    tracing::debug!(bytes = document.len(), "diagram rendered");
    Ok(document)
}

/// Render a catalog snapshot to PlantUML from JS
#[wasm_bindgen(js_name = "catalogToPlantUml")]
pub fn render_catalog(
    json: &str,
    title: Option<String>,
    short_types: Option<bool>,
) -> Result<String, String> {
    let load = LoadOptions {
        database: None,
        short_types: short_types.unwrap_or(false),
    };
    let render = RenderOptions {
        title,
        ..RenderOptions::default()
    };
    render_snapshot(json, &load, render).map_err(|e| e.to_string())
}
