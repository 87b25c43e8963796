//! Named observing sites
//!
//! A small built-in table of Minor Planet Center observatory codes, with
//! lookup by code, by (fuzzy) name and by proximity, plus resolution of
//! free-form user input into an [`ObservingSite`].

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use haversine::{Location as HaversineLocation, Units, distance};
use sunrise::{Coordinates, SolarDay, SolarEvent};
use tracing::debug;

use crate::models::{GeoLocation, ObservingSite};
use crate::{AstroViewError, Result};

const FUZZY_THRESHOLD: f64 = 0.85;

/// Geodetic position of a table entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SitePosition {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation_m: f64,
}

/// One entry of the observatory table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observatory {
    pub code: &'static str,
    pub name: &'static str,
    /// `None` for the geocenter
    pub position: Option<SitePosition>,
}

impl Observatory {
    #[must_use]
    pub fn location(&self) -> Option<GeoLocation> {
        self.position.map(|position| GeoLocation {
            latitude: position.latitude,
            longitude: position.longitude,
            elevation_m: position.elevation_m,
            name: self.name.to_string(),
        })
    }

    #[must_use]
    pub fn site(&self) -> ObservingSite {
        ObservingSite::Mpc {
            code: self.code.to_string(),
            location: self.location(),
        }
    }
}

macro_rules! observatory {
    ($code:literal, $name:literal) => {
        Observatory {
            code: $code,
            name: $name,
            position: None,
        }
    };
    ($code:literal, $name:literal, $lat:literal, $lon:literal, $elev:literal) => {
        Observatory {
            code: $code,
            name: $name,
            position: Some(SitePosition {
                latitude: $lat,
                longitude: $lon,
                elevation_m: $elev,
            }),
        }
    };
}

/// Built-in observatories, ordered by MPC code
pub const OBSERVATORIES: &[Observatory] = &[
    observatory!("000", "Greenwich", 51.4769, -0.0005, 46.0),
    observatory!("024", "Heidelberg-Konigstuhl", 49.3980, 8.7216, 570.0),
    observatory!("304", "Las Campanas Observatory", -29.0146, -70.6926, 2380.0),
    observatory!("309", "Cerro Paranal", -24.6272, -70.4044, 2635.0),
    observatory!("500", "Geocentric"),
    observatory!("511", "Haute Provence", 43.9317, 5.7125, 650.0),
    observatory!("568", "Maunakea", 19.8261, -155.4719, 4205.0),
    observatory!("675", "Palomar Mountain", 33.3564, -116.8650, 1706.0),
    observatory!("691", "Steward Observatory, Kitt Peak-Spacewatch", 31.9633, -111.6000, 2089.0),
    observatory!("695", "Kitt Peak", 31.9583, -111.5967, 2120.0),
    observatory!("703", "Catalina Sky Survey", 32.4175, -110.7325, 2510.0),
    observatory!("807", "Cerro Tololo Observatory, La Serena", -30.1653, -70.8150, 2207.0),
    observatory!("950", "La Palma", 28.7603, -17.8814, 2333.0),
    observatory!("F51", "Pan-STARRS 1, Haleakala", 20.7075, -156.2569, 3055.0),
    observatory!("G96", "Mt. Lemmon Survey", 32.4425, -110.7890, 2790.0),
    observatory!("I11", "Gemini South Observatory, Cerro Pachon", -30.2408, -70.7367, 2722.0),
    observatory!("T05", "ATLAS-HKO, Haleakala", 20.7075, -156.2561, 3055.0),
    observatory!("W84", "Cerro Tololo-DECam", -30.1690, -70.8063, 2200.0),
    observatory!("X05", "Rubin Observatory, Cerro Pachon", -30.2446, -70.7494, 2663.0),
];

/// Find an observatory by MPC code
#[must_use]
pub fn lookup(code: &str) -> Option<&'static Observatory> {
    let code = code.trim();
    OBSERVATORIES
        .iter()
        .find(|obs| obs.code.eq_ignore_ascii_case(code))
}

/// Search the table by code or name, best matches first
#[must_use]
pub fn search(query: &str) -> Vec<&'static Observatory> {
    let query = query.trim();
    if query.is_empty() {
        return OBSERVATORIES.iter().collect();
    }
    if let Some(obs) = lookup(query) {
        return vec![obs];
    }

    let needle = query.to_lowercase();
    if let Some(obs) = OBSERVATORIES
        .iter()
        .find(|obs| obs.name.to_lowercase() == needle)
    {
        return vec![obs];
    }

    let substring: Vec<&Observatory> = OBSERVATORIES
        .iter()
        .filter(|obs| obs.name.to_lowercase().contains(&needle))
        .collect();
    if !substring.is_empty() {
        return substring;
    }

    let mut scored: Vec<(f64, &Observatory)> = OBSERVATORIES
        .iter()
        .map(|obs| (name_similarity(&needle, obs.name), obs))
        .filter(|(score, _)| *score >= FUZZY_THRESHOLD)
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    debug!("Fuzzy observatory search for '{}': {} hits", query, scored.len());
    scored.into_iter().map(|(_, obs)| obs).collect()
}

/// Best Jaro-Winkler score of the query against the full name and each of
/// its comma separated parts
fn name_similarity(needle: &str, name: &str) -> f64 {
    let name = name.to_lowercase();
    name.split(',')
        .map(str::trim)
        .chain(std::iter::once(name.as_str()))
        .map(|part| strsim::jaro_winkler(needle, part))
        .fold(0.0, f64::max)
}

/// Closest observatory to a location, with the distance in kilometres
#[must_use]
pub fn nearest(location: &GeoLocation) -> Option<(&'static Observatory, f64)> {
    OBSERVATORIES
        .iter()
        .filter_map(|obs| {
            let position = obs.position?;
            let here = HaversineLocation {
                latitude: location.latitude,
                longitude: location.longitude,
            };
            let there = HaversineLocation {
                latitude: position.latitude,
                longitude: position.longitude,
            };
            Some((obs, distance(here, there, Units::Kilometers)))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

/// Turn user input into an observing site.
///
/// Accepts `lat,lon[,elev_m]`, an MPC code or an observatory name.
pub fn resolve_site(input: &str) -> Result<ObservingSite> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AstroViewError::validation("observing site cannot be empty"));
    }

    if input.contains(',') {
        if let Some(location) = parse_coordinates(input)? {
            return Ok(ObservingSite::Geodetic(location));
        }
    }

    if let Some(obs) = lookup(input) {
        return Ok(obs.site());
    }
    if is_mpc_code(input) {
        debug!("'{}' is not in the built-in table, passing it through as an MPC code", input);
        return Ok(ObservingSite::Mpc {
            code: input.to_ascii_uppercase(),
            location: None,
        });
    }

    search(input)
        .first()
        .map(|obs| obs.site())
        .ok_or_else(|| AstroViewError::SiteNotFound {
            query: input.to_string(),
        })
}

fn is_mpc_code(input: &str) -> bool {
    input.len() == 3 && input.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Parse `lat,lon[,elev_m]`; `Ok(None)` when the text is not numeric at all
fn parse_coordinates(input: &str) -> Result<Option<GeoLocation>> {
    let parts: Vec<&str> = input.split(',').map(str::trim).collect();
    if !(2..=3).contains(&parts.len()) {
        return Ok(None);
    }
    let numbers: Vec<f64> = match parts.iter().map(|p| p.parse::<f64>()).collect() {
        Ok(numbers) => numbers,
        Err(_) => return Ok(None),
    };
    let elevation = numbers.get(2).copied().unwrap_or(0.0);
    let location = GeoLocation::new(
        numbers[0],
        numbers[1],
        elevation,
        format!("{:.4}, {:.4}", numbers[0], numbers[1]),
    )?;
    Ok(Some(location))
}

/// Sunrise and sunset at a location on a given date (UTC).
///
/// Polar day or night falls back to 06:00 / 18:00 UTC.
pub fn night_window(
    location: &GeoLocation,
    date: NaiveDate,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let coordinates = Coordinates::new(location.latitude, location.longitude).ok_or_else(|| {
        AstroViewError::validation(format!(
            "Invalid coordinates: lat={}, lng={}",
            location.latitude, location.longitude
        ))
    })?;

    let solar_day = SolarDay::new(coordinates, date);

    let sunrise = solar_day
        .event_time(SolarEvent::Sunrise)
        .unwrap_or_else(|| at_hour(date, 6));
    let sunset = solar_day
        .event_time(SolarEvent::Sunset)
        .unwrap_or_else(|| at_hour(date, 18));

    Ok((sunrise, sunset))
}

fn at_hour(date: NaiveDate, hour: u32) -> DateTime<Utc> {
    let time = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN);
    date.and_time(time).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_table_is_consistent() {
        for obs in OBSERVATORIES {
            assert_eq!(obs.code.len(), 3);
            if let Some(p) = obs.position {
                let location =
                    GeoLocation::new(p.latitude, p.longitude, p.elevation_m, obs.name.into());
                assert!(location.is_ok(), "{} has invalid coordinates", obs.code);
            }
        }
    }

    #[rstest]
    #[case("568", "568")]
    #[case("f51", "F51")]
    #[case("Maunakea", "568")]
    #[case("palomar", "675")]
    #[case("Mauna Kea", "568")]
    fn test_search(#[case] query: &str, #[case] expected_code: &str) {
        let hits = search(query);
        assert!(!hits.is_empty(), "no hits for {query}");
        assert_eq!(hits[0].code, expected_code);
    }

    #[test]
    fn test_search_unknown() {
        assert!(search("Atlantis Deep Space Array").is_empty());
    }

    #[test]
    fn test_geocenter_is_listed_without_coordinates() {
        let geocenter = lookup("500").unwrap();
        assert!(geocenter.location().is_none());
        assert_eq!(geocenter.site(), ObservingSite::geocenter());
        assert!(search("").contains(&geocenter));
    }

    #[test]
    fn test_nearest() {
        let hilo = GeoLocation::new(19.72, -155.08, 0.0, "Hilo".into()).unwrap();
        let (obs, km) = nearest(&hilo).unwrap();
        assert_eq!(obs.code, "568");
        assert!(km < 60.0);
    }

    #[test]
    fn test_resolve_site_variants() {
        let site = resolve_site("19.8,-155.5,4200").unwrap();
        assert!(matches!(site, ObservingSite::Geodetic(ref loc) if loc.elevation_m == 4200.0));

        let site = resolve_site("500").unwrap();
        assert!(site.is_geocentric());

        let site = resolve_site("Z99").unwrap();
        assert!(matches!(site, ObservingSite::Mpc { ref code, location: None } if code == "Z99"));

        let site = resolve_site("abc").unwrap();
        assert!(matches!(site, ObservingSite::Mpc { ref code, location: None } if code == "ABC"));

        let site = resolve_site("Cerro Paranal").unwrap();
        assert_eq!(site.label(), "309");
    }

    #[test]
    fn test_resolve_site_errors() {
        assert!(resolve_site("").is_err());
        assert!(resolve_site("95,10").is_err());
        assert!(matches!(
            resolve_site("Nowhere Special"),
            Err(AstroViewError::SiteNotFound { .. })
        ));
    }

    #[test]
    fn test_night_window_orders_events() {
        let paranal = lookup("309").unwrap().location().unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 8, 5).unwrap();
        let (sunrise, sunset) = night_window(&paranal, date).unwrap();
        assert_ne!(sunrise, sunset);
        assert_eq!(sunrise.date_naive(), date);
    }
}
