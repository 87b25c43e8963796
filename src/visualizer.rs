//! High level operations: heliocentric positions, orbit scenes and sky views

use chrono::{DateTime, Utc};
use futures::future::{try_join, try_join_all};
use tracing::{info, instrument, warn};

use crate::coords;
use crate::horizons::{Center, EphemerisSource, ObserverQuery, VectorsQuery};
use crate::models::{
    HorizontalCoords, IdType, ObserverRow, ObservingSite, OrbitScene, SkyMarker, SkyView,
    StateVector, SunEvents, Target, Trace3d,
};
use crate::observatory;
use crate::time::{Epochs, TimeSpan, from_ymd, julian_date};
use crate::{AstroViewError, Result};

const EARTH_ID: &str = "399";
const EARTH_COLOR: &str = "blue";
const OBJECT_COLOR: &str = "red";
const SUN_COLOR: &str = "yellow";
const EARTH_ORBIT_COLOR: &str = "#1f77b4";
const OBJECT_ORBIT_COLOR: &str = "#ff7f0e";
const START_MARKER_SIZE: f64 = 4.0;
const SUN_MARKER_SIZE: f64 = 6.0;

/// Colour of a sky-view marker, keyed on the object identifier
#[must_use]
pub fn marker_color(object: &str) -> &'static str {
    match object.trim().to_ascii_lowercase().as_str() {
        "sun" | "10" => "orange",
        "301" | "moon" => "gray",
        _ => "red",
    }
}

/// Place an object on the polar sky chart
#[must_use]
pub fn sky_marker(label: &str, horizontal: HorizontalCoords) -> SkyMarker {
    SkyMarker {
        label: label.to_string(),
        altitude_deg: horizontal.altitude_deg,
        azimuth_deg: horizontal.azimuth_deg,
        theta_rad: horizontal.azimuth_deg.to_radians(),
        radius_deg: 90.0 - horizontal.altitude_deg.abs(),
        color: marker_color(label).to_string(),
        equatorial: None,
    }
}

/// Ephemeris-backed figure builder
pub struct AsteroidVisualizer<S> {
    source: S,
}

impl<S: EphemerisSource> AsteroidVisualizer<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Sun-centred ecliptic positions of `target` at midnight UTC of each date
    #[instrument(skip(self, dates), fields(dates = dates.len()))]
    pub async fn heliocentric_positions(
        &self,
        target: &str,
        dates: &[(i32, u32, u32)],
        id_type: IdType,
    ) -> Result<Vec<StateVector>> {
        if dates.is_empty() {
            return Err(AstroViewError::validation("at least one date is required"));
        }
        let jds = dates
            .iter()
            .map(|&(y, m, d)| from_ymd(y, m, d).map(julian_date))
            .collect::<Result<Vec<f64>>>()?;

        let query = VectorsQuery {
            target: Target::new(target, id_type)?,
            center: Center::Sun,
            epochs: Epochs::list(jds)?,
        };
        self.source.vectors(&query).await
    }

    /// Orbit of a small body next to Earth's over the same span
    pub async fn orbit_scene(&self, object_id: &str, span: &TimeSpan) -> Result<OrbitScene> {
        self.orbit_scene_for(&Target::small_body(object_id)?, span).await
    }

    #[instrument(skip(self, span), fields(object = %object))]
    pub async fn orbit_scene_for(&self, object: &Target, span: &TimeSpan) -> Result<OrbitScene> {
        let object_query = VectorsQuery {
            target: object.clone(),
            center: Center::Sun,
            epochs: Epochs::Range(span.clone()),
        };
        let earth_query = VectorsQuery {
            target: Target::major_body(EARTH_ID)?,
            center: Center::Sun,
            epochs: Epochs::Range(span.clone()),
        };

        let (object_vectors, earth_vectors) = try_join(
            self.source.vectors(&object_query),
            self.source.vectors(&earth_query),
        )
        .await?;

        let (Some(object_start), Some(earth_start)) =
            (object_vectors.first(), earth_vectors.first())
        else {
            return Err(AstroViewError::no_data(format!(
                "no orbit samples for '{}' between {} and {}",
                object.id, span.start, span.stop
            )));
        };
        info!(
            "Building orbit scene from {} object and {} Earth samples",
            object_vectors.len(),
            earth_vectors.len()
        );

        let id = &object.id;
        let traces = vec![
            Trace3d::line("Earth Orbit", positions(&earth_vectors), EARTH_ORBIT_COLOR),
            Trace3d::line(format!("{id} Orbit"), positions(&object_vectors), OBJECT_ORBIT_COLOR),
            Trace3d::marker("Sun", [0.0, 0.0, 0.0], SUN_COLOR, SUN_MARKER_SIZE),
            Trace3d::marker(
                "Earth (Start of Year)",
                earth_start.position,
                EARTH_COLOR,
                START_MARKER_SIZE,
            ),
            Trace3d::marker(
                format!("{id} (Start of Year)"),
                object_start.position,
                OBJECT_COLOR,
                START_MARKER_SIZE,
            ),
        ];

        Ok(OrbitScene {
            title: format!("Orbit Around the Sun: Earth and {id}"),
            axis_titles: ["X (AU)".into(), "Y (AU)".into(), "Z (AU)".into()],
            traces,
        })
    }

    /// Where each object sits in the sky of `site` at `time`
    #[instrument(skip(self, objects), fields(site = %site, objects = objects.len()))]
    pub async fn sky_view(
        &self,
        objects: &[String],
        site: &ObservingSite,
        time: DateTime<Utc>,
    ) -> Result<SkyView> {
        if objects.is_empty() {
            return Err(AstroViewError::validation("at least one object is required"));
        }
        if site.is_geocentric() {
            return Err(AstroViewError::validation(
                "the geocenter has no horizon; choose an observatory code, name or coordinates",
            ));
        }

        let markers =
            try_join_all(objects.iter().map(|object| self.locate(object, site, time))).await?;

        let (above, below): (Vec<SkyMarker>, Vec<SkyMarker>) = markers
            .into_iter()
            .partition(|marker| marker.altitude_deg >= 0.0);

        let sun_events = site.location().and_then(|location| {
            match observatory::night_window(location, time.date_naive()) {
                Ok((sunrise, sunset)) => Some(SunEvents { sunrise, sunset }),
                Err(e) => {
                    warn!("No sunrise/sunset for {}: {}", site, e);
                    None
                }
            }
        });

        Ok(SkyView {
            title: format!(
                "Sky View from Observatory {} – {}",
                site.label(),
                time.format("%Y-%m-%dT%H:%M:%S")
            ),
            site: site.label(),
            time,
            above,
            below,
            sun_events,
        })
    }

    async fn locate(
        &self,
        object: &str,
        site: &ObservingSite,
        time: DateTime<Utc>,
    ) -> Result<SkyMarker> {
        let query = ObserverQuery {
            target: Target::new(object, IdType::Auto)?,
            site: site.clone(),
            epochs: Epochs::single(time),
        };
        let rows = self.source.observer(&query).await?;
        let row = rows.into_iter().next().ok_or_else(|| {
            AstroViewError::no_data(format!("no observer ephemeris for '{object}'"))
        })?;

        let horizontal = horizontal_for(&row, site).ok_or_else(|| {
            AstroViewError::no_data(format!("no altitude/azimuth for '{object}' from {site}"))
        })?;

        let mut marker = sky_marker(object, horizontal);
        marker.equatorial = row.equatorial;
        Ok(marker)
    }
}

/// Horizontal coordinates from the service, or derived locally from RA/Dec
/// when the site coordinates are known
fn horizontal_for(row: &ObserverRow, site: &ObservingSite) -> Option<HorizontalCoords> {
    if let Some(horizontal) = row.horizontal {
        return Some(horizontal);
    }
    let equatorial = row.equatorial?;
    let location = site.location()?;
    Some(coords::equatorial_to_horizontal(equatorial, location, row.time))
}

fn positions(vectors: &[StateVector]) -> Vec<[f64; 3]> {
    vectors.iter().map(|v| v.position).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EquatorialCoords, GeoLocation, TraceMode};
    use crate::time::parse_datetime;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Canned ephemerides keyed on the requested target
    #[derive(Default)]
    struct MockSource {
        observer_queries: Mutex<Vec<ObserverQuery>>,
        vector_queries: Mutex<Vec<VectorsQuery>>,
    }

    #[async_trait]
    impl EphemerisSource for MockSource {
        async fn vectors(&self, query: &VectorsQuery) -> Result<Vec<StateVector>> {
            self.vector_queries.lock().unwrap().push(query.clone());
            match query.target.id.as_str() {
                "399" => Ok(vec![
                    StateVector::new(2_460_676.5, [-0.17, 0.97, 0.0]),
                    StateVector::new(2_460_677.5, [-0.19, 0.96, 0.0]),
                ]),
                "Nothing" => Ok(Vec::new()),
                _ => Ok(vec![
                    StateVector::new(2_460_676.5, [-1.5, 2.5, 0.5]),
                    StateVector::new(2_460_677.5, [-1.4, 2.6, 0.4]),
                ]),
            }
        }

        async fn observer(&self, query: &ObserverQuery) -> Result<Vec<ObserverRow>> {
            self.observer_queries.lock().unwrap().push(query.clone());
            let time = parse_datetime("2025-08-05 10:00").unwrap();
            let horizontal = match query.target.id.as_str() {
                "Sun" => Some(HorizontalCoords {
                    altitude_deg: 30.0,
                    azimuth_deg: 120.0,
                }),
                "301" => Some(HorizontalCoords {
                    altitude_deg: -15.0,
                    azimuth_deg: 280.0,
                }),
                "Planet Nine" => {
                    return Err(AstroViewError::TargetNotFound {
                        target: query.target.id.clone(),
                    });
                }
                _ => None,
            };
            Ok(vec![ObserverRow {
                time,
                equatorial: Some(EquatorialCoords {
                    ra_deg: 23.662,
                    dec_deg: 10.342,
                }),
                horizontal,
            }])
        }
    }

    fn span() -> TimeSpan {
        TimeSpan::parse("2025-01-01", "2025-01-02", "1d").unwrap()
    }

    #[tokio::test]
    async fn test_heliocentric_positions() {
        let visualizer = AsteroidVisualizer::new(MockSource::default());
        let vectors = visualizer
            .heliocentric_positions("Ceres", &[(2025, 1, 1), (2025, 1, 2)], IdType::SmallBody)
            .await
            .unwrap();

        let (x, y, z) = crate::models::split_xyz(&vectors);
        assert_eq!(x, vec![-1.5, -1.4]);
        assert_eq!(y, vec![2.5, 2.6]);
        assert_eq!(z, vec![0.5, 0.4]);

        let queries = visualizer.source().vector_queries.lock().unwrap();
        assert_eq!(queries[0].center, Center::Sun);
        assert_eq!(
            queries[0].epochs,
            Epochs::List(vec![2_460_676.5, 2_460_677.5])
        );
    }

    #[tokio::test]
    async fn test_heliocentric_positions_requires_dates() {
        let visualizer = AsteroidVisualizer::new(MockSource::default());
        let result = visualizer
            .heliocentric_positions("Ceres", &[], IdType::SmallBody)
            .await;
        assert!(matches!(result, Err(AstroViewError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_orbit_scene_traces() {
        let visualizer = AsteroidVisualizer::new(MockSource::default());
        let scene = visualizer.orbit_scene("Ceres", &span()).await.unwrap();

        assert_eq!(scene.title, "Orbit Around the Sun: Earth and Ceres");
        assert_eq!(scene.axis_titles, ["X (AU)", "Y (AU)", "Z (AU)"].map(String::from));
        let names: Vec<&str> = scene.traces.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Earth Orbit",
                "Ceres Orbit",
                "Sun",
                "Earth (Start of Year)",
                "Ceres (Start of Year)"
            ]
        );
        assert_eq!(scene.traces[0].mode, TraceMode::Lines);
        assert_eq!(scene.traces[1].points[1], [-1.4, 2.6, 0.4]);
        assert_eq!(scene.traces[2].points, vec![[0.0, 0.0, 0.0]]);
        assert_eq!(scene.traces[2].color, "yellow");
        assert_eq!(scene.traces[3].points, vec![[-0.17, 0.97, 0.0]]);
        assert_eq!(scene.traces[4].points, vec![[-1.5, 2.5, 0.5]]);
        assert_eq!(scene.traces[4].color, "red");
    }

    #[tokio::test]
    async fn test_orbit_scene_without_samples() {
        let visualizer = AsteroidVisualizer::new(MockSource::default());
        let result = visualizer.orbit_scene("Nothing", &span()).await;
        assert!(matches!(result, Err(AstroViewError::NoData { .. })));
    }

    #[tokio::test]
    async fn test_sky_view_splits_panels() {
        let visualizer = AsteroidVisualizer::new(MockSource::default());
        let site = observatory::lookup("568").unwrap().site();
        let time = parse_datetime("2025-08-05 10:00").unwrap();
        let objects = vec!["Sun".to_string(), "301".to_string()];

        let view = visualizer.sky_view(&objects, &site, time).await.unwrap();

        assert_eq!(view.title, "Sky View from Observatory 568 – 2025-08-05T10:00:00");
        assert_eq!(view.above.len(), 1);
        assert_eq!(view.below.len(), 1);

        let sun = &view.above[0];
        assert_eq!(sun.label, "Sun");
        assert_eq!(sun.color, "orange");
        assert!((sun.theta_rad - 120_f64.to_radians()).abs() < 1e-12);
        assert_eq!(sun.radius_deg, 60.0);

        let moon = &view.below[0];
        assert_eq!(moon.color, "gray");
        assert_eq!(moon.radius_deg, 75.0);
        assert!((moon.theta_rad - 280_f64.to_radians()).abs() < 1e-12);

        assert!(view.sun_events.is_some());
        assert_eq!(visualizer.source().observer_queries.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_sky_view_computes_missing_altaz() {
        let visualizer = AsteroidVisualizer::new(MockSource::default());
        let location = GeoLocation::new(19.8261, -155.4719, 4205.0, "Maunakea".into()).unwrap();
        let site = ObservingSite::Geodetic(location);
        let time = parse_datetime("2025-08-05 10:00").unwrap();

        let view = visualizer
            .sky_view(&["Ceres".to_string()], &site, time)
            .await
            .unwrap();
        let marker = view.above.iter().chain(view.below.iter()).next().unwrap();
        assert_eq!(marker.color, "red");
        assert!(marker.equatorial.is_some());
        assert!((-90.0..=90.0).contains(&marker.altitude_deg));
        assert!((0.0..360.0).contains(&marker.azimuth_deg));
    }

    #[tokio::test]
    async fn test_sky_view_rejects_geocenter() {
        let visualizer = AsteroidVisualizer::new(MockSource::default());
        let result = visualizer
            .sky_view(&["Sun".to_string()], &ObservingSite::geocenter(), Utc::now())
            .await;
        assert!(matches!(result, Err(AstroViewError::Validation { .. })));
        assert!(visualizer.source().observer_queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sky_view_without_site_coordinates_needs_service_altaz() {
        let visualizer = AsteroidVisualizer::new(MockSource::default());
        let site = ObservingSite::Mpc {
            code: "Z99".to_string(),
            location: None,
        };
        let result = visualizer
            .sky_view(&["Ceres".to_string()], &site, Utc::now())
            .await;
        assert!(matches!(result, Err(AstroViewError::NoData { .. })));
    }

    #[tokio::test]
    async fn test_sky_view_propagates_lookup_errors() {
        let visualizer = AsteroidVisualizer::new(MockSource::default());
        let site = observatory::lookup("568").unwrap().site();
        let objects = vec!["Sun".to_string(), "Planet Nine".to_string()];
        let result = visualizer.sky_view(&objects, &site, Utc::now()).await;
        assert!(matches!(result, Err(AstroViewError::TargetNotFound { .. })));
    }

    #[test]
    fn test_marker_color() {
        assert_eq!(marker_color("Sun"), "orange");
        assert_eq!(marker_color("301"), "gray");
        assert_eq!(marker_color("Ceres"), "red");
    }
}
