/// Terrastl Web - WASM bindings for terrain export in the browser
///
/// Builds terrain scenes from page controls, exports them as STL and hands
/// the finished bytes to the browser as a download.
use terrastl_core::{
    terrain_scene, Error, ExportOptions, StlBuffer, StlExporter, TerrainConfig, TerrainKind,
};
use tracing::{info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, HtmlCanvasElement, Url, WebGl2RenderingContext};

#[wasm_bindgen]
pub struct TerrainExport {
    config: TerrainConfig,
}

#[wasm_bindgen]
impl TerrainExport {
    #[wasm_bindgen(constructor)]
    pub fn new(
        width: usize,
        height: usize,
        max_height: f32,
        kind: &str,
    ) -> Result<TerrainExport, JsValue> {
        let mut config = build_config(width, height, max_height, kind).map_err(to_js)?;
        if config.kind == TerrainKind::Random {
            config.seed = Some((js_sys::Math::random() * u32::MAX as f64) as u64);
        }
        Ok(TerrainExport { config })
    }

    /// Elevation multiplier used when building the mesh
    pub fn set_scale(&mut self, scale: f32) -> Result<(), JsValue> {
        let config = TerrainConfig {
            scale,
            ..self.config.clone()
        };
        config.validate().map_err(to_js)?;
        self.config = config;
        Ok(())
    }

    pub fn set_seed(&mut self, seed: u32) {
        self.config.seed = Some(u64::from(seed));
    }

    /// STL bytes for the current terrain
    pub fn export(&self, binary: bool) -> Result<Vec<u8>, JsValue> {
        export_buffer(&self.config, binary)
            .map(StlBuffer::into_bytes)
            .map_err(to_js)
    }

    /// Exports and offers the result as a file download
    pub fn download(&self, file_name: &str, binary: bool) -> Result<(), JsValue> {
        let buffer = export_buffer(&self.config, binary).map_err(to_js)?;
        let file_name = download_name(file_name);
        save_download(&buffer, &file_name)?;
        info!(file = %file_name, bytes = buffer.len(), "terrain download started");
        Ok(())
    }
}

/// Fails with a readable message when the canvas cannot give a WebGL2 context.
///
/// Export works without one; the page uses this to explain a blank viewport.
#[wasm_bindgen]
pub fn check_rendering_context(canvas_id: &str) -> Result<(), JsValue> {
    probe_webgl2(canvas_id).map_err(|e| {
        warn!("{}", e);
        to_js(e)
    })
}

fn build_config(
    width: usize,
    height: usize,
    max_height: f32,
    kind: &str,
) -> terrastl_core::Result<TerrainConfig> {
    let config = TerrainConfig {
        width,
        height,
        max_height,
        kind: kind.parse()?,
        ..TerrainConfig::default()
    };
    config.validate()?;
    Ok(config)
}

fn export_buffer(config: &TerrainConfig, binary: bool) -> terrastl_core::Result<StlBuffer> {
    let options = if binary {
        ExportOptions::binary()
    } else {
        ExportOptions::ascii()
    };
    let scene = terrain_scene(config)?;
    let export = StlExporter::new(options).export(&scene)?.require_triangles()?;
    Ok(export.buffer)
}

fn download_name(requested: &str) -> String {
    let name = requested.trim();
    if name.is_empty() {
        return "terrain.stl".to_string();
    }
    if name.to_ascii_lowercase().ends_with(".stl") {
        name.to_string()
    } else {
        format!("{}.stl", name)
    }
}

fn save_download(buffer: &StlBuffer, file_name: &str) -> Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document to attach the download to"))?;

    let bytes = js_sys::Uint8Array::from(buffer.as_bytes());
    let parts = js_sys::Array::of1(&bytes);
    let options = BlobPropertyBag::new();
    options.set_type(buffer.mime_type());
    let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)?;

    let url = Url::create_object_url_with_blob(&blob)?;
    let anchor: HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
    anchor.set_href(&url);
    anchor.set_download(file_name);
    anchor.click();
    Url::revoke_object_url(&url)
}

fn probe_webgl2(canvas_id: &str) -> terrastl_core::Result<()> {
    let unsupported = |reason: &str| Error::UnsupportedRenderingContext(reason.to_string());

    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| unsupported("no browser document"))?;
    let canvas: HtmlCanvasElement = document
        .get_element_by_id(canvas_id)
        .ok_or_else(|| unsupported(&format!("no element with id `{}`", canvas_id)))?
        .dyn_into()
        .map_err(|_| unsupported(&format!("`{}` is not a canvas", canvas_id)))?;

    match canvas.get_context("webgl2") {
        Ok(Some(context)) if context.is_instance_of::<WebGl2RenderingContext>() => Ok(()),
        _ => Err(unsupported("WebGL2 is not available in this browser")),
    }
}

fn to_js(err: Error) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();
    Ok(())
}
