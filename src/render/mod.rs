//! Figure output: SVG documents, PNG rasters and JSON dumps

pub mod orbit;
pub mod skyview;

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use resvg::tiny_skia;
use resvg::usvg::{Options, Tree, fontdb};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::RenderConfig;
use crate::models::{OrbitScene, SkyView};
use crate::{AstroViewError, Result};

pub use orbit::OrbitView;

pub(crate) const FONT_FAMILY: &str = "DejaVu Sans, Arial, Helvetica, sans-serif";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Svg,
    Png,
    Json,
}

impl OutputFormat {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Svg => "svg",
            OutputFormat::Png => "png",
            OutputFormat::Json => "json",
        }
    }

    /// Guess the format from a file extension
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = AstroViewError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "svg" => Ok(OutputFormat::Svg),
            "png" => Ok(OutputFormat::Png),
            "json" => Ok(OutputFormat::Json),
            other => Err(AstroViewError::validation(format!(
                "unknown output format '{other}' (expected svg, png or json)"
            ))),
        }
    }
}

pub fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Rasterise an SVG document with the system fonts
pub fn svg_to_png(svg: &str) -> Result<Vec<u8>> {
    let mut fontdb = fontdb::Database::new();
    fontdb.load_system_fonts();
    debug!("Loaded {} font faces for rasterising", fontdb.len());

    let mut options = Options::default();
    options.fontdb = Arc::new(fontdb);

    let tree = Tree::from_str(svg, &options)
        .map_err(|e| AstroViewError::render(format!("Failed to parse SVG: {e}")))?;
    let size = tree.size().to_int_size();
    let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| AstroViewError::render("Failed to create pixmap"))?;

    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    pixmap
        .encode_png()
        .map_err(|e| AstroViewError::render(format!("Failed to encode PNG: {e}")))
}

fn to_json<T: Serialize>(figure: &T) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(figure)
        .map_err(|e| AstroViewError::render(format!("Failed to serialise figure: {e}")))
}

/// Turns figure models into output bytes
#[derive(Debug, Clone)]
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    #[must_use]
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn orbit_view(&self) -> OrbitView {
        OrbitView {
            width: self.config.orbit_width,
            height: self.config.orbit_height,
            elevation_deg: self.config.view_elevation_deg,
            azimuth_deg: self.config.view_azimuth_deg,
        }
    }

    #[must_use]
    pub fn orbit_svg(&self, scene: &OrbitScene) -> String {
        orbit::render_svg(scene, &self.orbit_view())
    }

    #[must_use]
    pub fn sky_svg(&self, view: &SkyView) -> String {
        skyview::render_svg(view, self.config.skyview_width, self.config.skyview_height)
    }

    pub fn encode_orbit(&self, scene: &OrbitScene, format: OutputFormat) -> Result<Vec<u8>> {
        match format {
            OutputFormat::Svg => Ok(self.orbit_svg(scene).into_bytes()),
            OutputFormat::Png => svg_to_png(&self.orbit_svg(scene)),
            OutputFormat::Json => to_json(scene),
        }
    }

    pub fn encode_sky(&self, view: &SkyView, format: OutputFormat) -> Result<Vec<u8>> {
        match format {
            OutputFormat::Svg => Ok(self.sky_svg(view).into_bytes()),
            OutputFormat::Png => svg_to_png(&self.sky_svg(view)),
            OutputFormat::Json => to_json(view),
        }
    }
}

/// Write rendered bytes, creating parent directories as needed
pub async fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await?;
    info!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Trace3d;
    use rstest::rstest;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn scene() -> OrbitScene {
        OrbitScene {
            title: "Orbit Around the Sun: Earth and <Ceres>".into(),
            axis_titles: ["X (AU)".into(), "Y (AU)".into(), "Z (AU)".into()],
            traces: vec![Trace3d::marker("Sun", [0.0, 0.0, 0.0], "yellow", 6.0)],
        }
    }

    #[rstest]
    #[case("svg", OutputFormat::Svg)]
    #[case("PNG", OutputFormat::Png)]
    #[case(" json ", OutputFormat::Json)]
    fn test_output_format_parse(#[case] input: &str, #[case] expected: OutputFormat) {
        assert_eq!(input.parse::<OutputFormat>().unwrap(), expected);
    }

    #[test]
    fn test_output_format_from_path() {
        assert_eq!(
            OutputFormat::from_path(&PathBuf::from("out/orbit.png")),
            Some(OutputFormat::Png)
        );
        assert_eq!(OutputFormat::from_path(&PathBuf::from("orbit")), None);
        assert!("gif".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml(r#"<a & "b">"#), "&lt;a &amp; &quot;b&quot;&gt;");
    }

    #[test]
    fn test_svg_escapes_title() {
        let renderer = Renderer::new(RenderConfig::default());
        let svg = renderer.orbit_svg(&scene());
        assert!(svg.contains("Earth and &lt;Ceres&gt;"));
    }

    #[test]
    fn test_png_has_signature() {
        let renderer = Renderer::new(RenderConfig::default());
        let png = renderer.encode_orbit(&scene(), OutputFormat::Png).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_json_round_trips_title() {
        let renderer = Renderer::new(RenderConfig::default());
        let bytes = renderer.encode_orbit(&scene(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["traces"][0]["mode"], "markers");
    }

    #[tokio::test]
    async fn test_write_output_creates_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("orbit.svg");
        write_output(&path, b"<svg/>").await.unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"<svg/>");
    }
}
