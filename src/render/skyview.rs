//! Two-panel polar sky charts

use super::{FONT_FAMILY, escape_xml};
use crate::models::{SkyMarker, SkyView};

pub const ABOVE_TITLE: &str = "Above Horizon";
pub const BELOW_TITLE: &str = "Below Horizon";
pub const ABOVE_BACKGROUND: &str = "#f5faff";
pub const BELOW_BACKGROUND: &str = "#eaeaea";

const HEADER_HEIGHT: f64 = 70.0;
const FOOTER_HEIGHT: f64 = 40.0;
const PANEL_TITLE_HEIGHT: f64 = 30.0;
const LEGEND_HEIGHT: f64 = 90.0;
const MARKER_RADIUS: f64 = 6.0;
const COMPASS: [(&str, f64); 8] = [
    ("N", 0.0),
    ("NE", 45.0),
    ("E", 90.0),
    ("SE", 135.0),
    ("S", 180.0),
    ("SW", 225.0),
    ("W", 270.0),
    ("NW", 315.0),
];

/// Geometry of one polar panel
#[derive(Debug, Clone, Copy)]
struct Panel {
    center_x: f64,
    center_y: f64,
    radius: f64,
}

impl Panel {
    /// North up, azimuth increasing clockwise, radius 0..90 degrees
    fn to_screen(&self, theta_rad: f64, radius_deg: f64) -> (f64, f64) {
        let r = self.radius * radius_deg.clamp(0.0, 90.0) / 90.0;
        (
            self.center_x + r * theta_rad.sin(),
            self.center_y - r * theta_rad.cos(),
        )
    }
}

fn panels(width: u32, height: u32) -> [Panel; 2] {
    let half = f64::from(width) / 2.0;
    let usable =
        f64::from(height) - HEADER_HEIGHT - FOOTER_HEIGHT - PANEL_TITLE_HEIGHT - LEGEND_HEIGHT;
    let radius = (half * 0.8 / 2.0).min(usable / 2.0).max(10.0);
    let center_y = HEADER_HEIGHT + PANEL_TITLE_HEIGHT + usable / 2.0;
    [
        Panel {
            center_x: half / 2.0,
            center_y,
            radius,
        },
        Panel {
            center_x: half + half / 2.0,
            center_y,
            radius,
        },
    ]
}

fn render_panel(panel: &Panel, title: &str, background: &str, markers: &[SkyMarker]) -> String {
    let Panel {
        center_x: cx,
        center_y: cy,
        radius: r,
    } = *panel;
    let mut out = format!(
        r##"<text x="{cx:.1}" y="{ty:.1}" font-size="16" text-anchor="middle" fill="#202124">{title}</text>
<circle cx="{cx:.1}" cy="{cy:.1}" r="{r:.1}" fill="{background}"/>
"##,
        ty = cy - r - PANEL_TITLE_HEIGHT + 6.0,
        title = escape_xml(title),
    );

    for ring in [30.0, 60.0] {
        out.push_str(&format!(
            r##"<circle cx="{cx:.1}" cy="{cy:.1}" r="{rr:.1}" fill="none" stroke="#c8ccd0" stroke-width="0.8"/>
<text x="{lx:.1}" y="{ly:.1}" font-size="9" fill="#80868b">{alt:.0}°</text>
"##,
            rr = r * ring / 90.0,
            lx = cx + 3.0,
            ly = cy - r * ring / 90.0 - 2.0,
            alt = 90.0 - ring,
        ));
    }
    out.push_str(&format!(
        r##"<circle cx="{cx:.1}" cy="{cy:.1}" r="{r:.1}" fill="none" stroke="gray" stroke-width="1.2" stroke-dasharray="6 4"/>
"##
    ));

    for (label, azimuth) in COMPASS {
        let theta = f64::to_radians(azimuth);
        let (x, y) = panel.to_screen(theta, 90.0);
        let lx = cx + (r + 14.0) * theta.sin();
        let ly = cy - (r + 14.0) * theta.cos();
        out.push_str(&format!(
            r##"<line x1="{cx:.1}" y1="{cy:.1}" x2="{x:.1}" y2="{y:.1}" stroke="#dadce0" stroke-width="0.6"/>
<text x="{lx:.1}" y="{ty:.1}" font-size="11" text-anchor="middle" fill="#5f6368">{label}</text>
"##,
            ty = ly + 4.0,
        ));
    }

    for marker in markers {
        let (x, y) = panel.to_screen(marker.theta_rad, marker.radius_deg);
        out.push_str(&format!(
            r##"<circle cx="{x:.1}" cy="{y:.1}" r="{MARKER_RADIUS}" fill="{color}" stroke="#202124" stroke-width="0.5"/>
<text x="{tx:.1}" y="{ty:.1}" font-size="11" fill="#202124">{label}</text>
"##,
            color = escape_xml(&marker.color),
            tx = x + MARKER_RADIUS + 3.0,
            ty = y + 4.0,
            label = escape_xml(&marker.label),
        ));
    }

    let legend_top = cy + r + 28.0;
    for (i, marker) in markers.iter().enumerate() {
        let y = legend_top + 18.0 * i as f64;
        out.push_str(&format!(
            r##"<circle cx="{lx:.1}" cy="{y:.1}" r="5" fill="{color}"/>
<text x="{tx:.1}" y="{ty:.1}" font-size="11" fill="#202124">{label} (alt {alt:.1}°, az {az:.1}°)</text>
"##,
            lx = cx - r,
            tx = cx - r + 12.0,
            ty = y + 4.0,
            color = escape_xml(&marker.color),
            label = escape_xml(&marker.label),
            alt = marker.altitude_deg,
            az = marker.azimuth_deg,
        ));
    }
    out
}

/// Render the sky view as a standalone SVG document
#[must_use]
pub fn render_svg(view: &SkyView, width: u32, height: u32) -> String {
    let [above, below] = panels(width, height);
    let mut svg = format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}" font-family="{FONT_FAMILY}">
<rect width="100%" height="100%" fill="#ffffff"/>
<text x="{tx:.1}" y="36" font-size="20" text-anchor="middle" fill="#202124">{title}</text>
"##,
        tx = f64::from(width) / 2.0,
        title = escape_xml(&view.title),
    );

    svg.push_str(&render_panel(&above, ABOVE_TITLE, ABOVE_BACKGROUND, &view.above));
    svg.push_str(&render_panel(&below, BELOW_TITLE, BELOW_BACKGROUND, &view.below));

    if let Some(events) = &view.sun_events {
        svg.push_str(&format!(
            r##"<text x="{tx:.1}" y="{ty:.1}" font-size="12" text-anchor="middle" fill="#5f6368">Sunrise {rise} UTC | Sunset {set} UTC</text>
"##,
            tx = f64::from(width) / 2.0,
            ty = f64::from(height) - FOOTER_HEIGHT / 2.0,
            rise = events.sunrise.format("%H:%M"),
            set = events.sunset.format("%H:%M"),
        ));
    }

    svg.push_str("</svg>\n");
    svg
}
