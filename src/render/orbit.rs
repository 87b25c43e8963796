//! Orthographic SVG rendering of heliocentric orbit scenes

use super::{FONT_FAMILY, escape_xml};
use crate::models::{OrbitScene, TraceMode};

const MARGIN: f64 = 60.0;
const TITLE_HEIGHT: f64 = 50.0;
const LEGEND_WIDTH: f64 = 220.0;
const AXIS_COLOR: &str = "#9aa0a6";

/// Camera orientation and canvas size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitView {
    pub width: u32,
    pub height: u32,
    /// Camera elevation above the ecliptic plane, degrees
    pub elevation_deg: f64,
    /// Camera azimuth around the ecliptic pole, degrees
    pub azimuth_deg: f64,
}

/// Orthographic projection onto the screen plane
#[derive(Debug, Clone, Copy)]
struct Projection {
    sin_az: f64,
    cos_az: f64,
    sin_el: f64,
    cos_el: f64,
}

impl Projection {
    fn new(view: &OrbitView) -> Self {
        let (sin_az, cos_az) = view.azimuth_deg.to_radians().sin_cos();
        let (sin_el, cos_el) = view.elevation_deg.to_radians().sin_cos();
        Self {
            sin_az,
            cos_az,
            sin_el,
            cos_el,
        }
    }

    /// Screen-plane coordinates (right, up) in scene units
    fn project(&self, [x, y, z]: [f64; 3]) -> (f64, f64) {
        let right = -x * self.sin_az + y * self.cos_az;
        let toward = x * self.cos_az + y * self.sin_az;
        let up = -toward * self.sin_el + z * self.cos_el;
        (right, up)
    }
}

/// Maps scene units to pixels with one scale factor for every axis
struct Viewport {
    projection: Projection,
    scale: f64,
    center_x: f64,
    center_y: f64,
}

impl Viewport {
    fn to_screen(&self, point: [f64; 3]) -> (f64, f64) {
        let (right, up) = self.projection.project(point);
        (
            self.center_x + right * self.scale,
            self.center_y - up * self.scale,
        )
    }
}

fn axis_endpoints(extent: f64) -> [([f64; 3], [f64; 3]); 3] {
    [
        ([-extent, 0.0, 0.0], [extent, 0.0, 0.0]),
        ([0.0, -extent, 0.0], [0.0, extent, 0.0]),
        ([0.0, 0.0, -extent], [0.0, 0.0, extent]),
    ]
}

fn viewport(scene: &OrbitScene, view: &OrbitView, extent: f64) -> Viewport {
    let projection = Projection::new(view);
    let plot_width = f64::from(view.width) - LEGEND_WIDTH - 2.0 * MARGIN;
    let plot_height = f64::from(view.height) - TITLE_HEIGHT - 2.0 * MARGIN;

    let axis_points = axis_endpoints(extent)
        .into_iter()
        .flat_map(|(from, to)| [from, to]);
    let scene_points = scene.traces.iter().flat_map(|t| t.points.iter().copied());
    let (max_right, max_up) = axis_points
        .chain(scene_points)
        .map(|p| projection.project(p))
        .fold((0.0_f64, 0.0_f64), |(r, u), (pr, pu)| {
            (r.max(pr.abs()), u.max(pu.abs()))
        });

    let scale_x = if max_right > 0.0 {
        plot_width / 2.0 / max_right
    } else {
        1.0
    };
    let scale_y = if max_up > 0.0 {
        plot_height / 2.0 / max_up
    } else {
        1.0
    };

    Viewport {
        projection,
        scale: scale_x.min(scale_y).max(f64::MIN_POSITIVE),
        center_x: MARGIN + plot_width / 2.0,
        center_y: TITLE_HEIGHT + MARGIN + plot_height / 2.0,
    }
}

/// Render the scene as a standalone SVG document
#[must_use]
pub fn render_svg(scene: &OrbitScene, view: &OrbitView) -> String {
    let extent = {
        let e = scene.extent();
        if e > 0.0 { e * 1.1 } else { 1.0 }
    };
    let vp = viewport(scene, view, extent);
    let mut svg = String::new();

    svg.push_str(&format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="{FONT_FAMILY}">
<rect width="100%" height="100%" fill="#ffffff"/>
<text x="{tx:.1}" y="32" font-size="20" text-anchor="middle" fill="#202124">{title}</text>
"##,
        w = view.width,
        h = view.height,
        tx = f64::from(view.width) / 2.0,
        title = escape_xml(&scene.title),
    ));

    for ((from, to), axis_title) in axis_endpoints(extent).into_iter().zip(&scene.axis_titles) {
        let (x1, y1) = vp.to_screen(from);
        let (x2, y2) = vp.to_screen(to);
        svg.push_str(&format!(
            r##"<line x1="{x1:.2}" y1="{y1:.2}" x2="{x2:.2}" y2="{y2:.2}" stroke="{AXIS_COLOR}" stroke-width="1" stroke-dasharray="4 3"/>
<text x="{x2:.2}" y="{ly:.2}" font-size="12" text-anchor="middle" fill="#5f6368">{label}</text>
<text x="{x2:.2}" y="{ty:.2}" font-size="10" text-anchor="middle" fill="#5f6368">{tick:.1}</text>
"##,
            ly = y2 - 8.0,
            ty = y2 + 14.0,
            label = escape_xml(axis_title),
            tick = extent,
        ));
    }

    for trace in &scene.traces {
        match trace.mode {
            TraceMode::Lines => {
                let points = trace
                    .points
                    .iter()
                    .map(|p| {
                        let (x, y) = vp.to_screen(*p);
                        format!("{x:.2},{y:.2}")
                    })
                    .collect::<Vec<_>>()
                    .join(" ");
                svg.push_str(&format!(
                    r#"<polyline points="{points}" fill="none" stroke="{color}" stroke-width="2"/>
"#,
                    color = escape_xml(&trace.color),
                ));
            }
            TraceMode::Markers => {
                for point in &trace.points {
                    let (x, y) = vp.to_screen(*point);
                    svg.push_str(&format!(
                        r#"<circle cx="{x:.2}" cy="{y:.2}" r="{r:.1}" fill="{color}"/>
"#,
                        r = trace.marker_size,
                        color = escape_xml(&trace.color),
                    ));
                }
            }
        }
    }

    svg.push_str(&legend(scene, view));
    svg.push_str("</svg>\n");
    svg
}

fn legend(scene: &OrbitScene, view: &OrbitView) -> String {
    let x = f64::from(view.width) - LEGEND_WIDTH;
    let mut out = String::new();
    for (i, trace) in scene.traces.iter().enumerate() {
        let y = TITLE_HEIGHT + MARGIN + 22.0 * i as f64;
        let color = escape_xml(&trace.color);
        let swatch = match trace.mode {
            TraceMode::Lines => format!(
                r#"<line x1="{x:.1}" y1="{y:.1}" x2="{x2:.1}" y2="{y:.1}" stroke="{color}" stroke-width="2"/>"#,
                x2 = x + 20.0,
            ),
            TraceMode::Markers => format!(
                r#"<circle cx="{cx:.1}" cy="{y:.1}" r="4" fill="{color}"/>"#,
                cx = x + 10.0,
            ),
        };
        out.push_str(&format!(
            r##"{swatch}
<text x="{tx:.1}" y="{ty:.1}" font-size="12" fill="#202124">{name}</text>
"##,
            tx = x + 28.0,
            ty = y + 4.0,
            name = escape_xml(&trace.name),
        ));
    }
    out
}
