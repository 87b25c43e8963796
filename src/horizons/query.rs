//! Horizons API query parameters

use serde::{Deserialize, Serialize};

use crate::models::{ObservingSite, Target};
use crate::time::{Epochs, TimeSpan};

/// Origin of a vector table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Center {
    /// Heliocentric (body center of the Sun)
    Sun,
    Geocenter,
    /// Any other Horizons `CENTER` expression
    Custom(String),
}

impl Center {
    #[must_use]
    pub fn as_param(&self) -> String {
        match self {
            Center::Sun => "500@10".to_string(),
            Center::Geocenter => "500".to_string(),
            Center::Custom(center) => center.clone(),
        }
    }
}

/// Cartesian state-vector request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorsQuery {
    pub target: Target,
    pub center: Center,
    pub epochs: Epochs,
}

/// Observer-table request (RA/Dec and apparent Az/El)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObserverQuery {
    pub target: Target,
    pub site: ObservingSite,
    pub epochs: Epochs,
}

/// Ordered list of API parameters (unquoted values)
pub type Params = Vec<(&'static str, String)>;

fn common_params(target: &Target, ephem_type: &str) -> Params {
    vec![
        ("COMMAND", target.command()),
        ("OBJ_DATA", "NO".to_string()),
        ("MAKE_EPHEM", "YES".to_string()),
        ("EPHEM_TYPE", ephem_type.to_string()),
        ("CSV_FORMAT", "YES".to_string()),
    ]
}

fn epoch_params(epochs: &Epochs) -> Params {
    match epochs {
        Epochs::Range(TimeSpan { start, stop, step }) => vec![
            ("START_TIME", start.format("%Y-%m-%d %H:%M:%S").to_string()),
            ("STOP_TIME", stop.format("%Y-%m-%d %H:%M:%S").to_string()),
            ("STEP_SIZE", step.to_string()),
        ],
        Epochs::List(jds) => vec![
            (
                "TLIST",
                jds.iter()
                    .map(|jd| format!("{jd:.9}"))
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
            ("TLIST_TYPE", "JD".to_string()),
        ],
    }
}

impl VectorsQuery {
    #[must_use]
    pub fn params(&self) -> Params {
        let mut params = common_params(&self.target, "VECTORS");
        params.extend([
            ("CENTER", self.center.as_param()),
            ("REF_PLANE", "ECLIPTIC".to_string()),
            ("REF_SYSTEM", "ICRF".to_string()),
            ("VEC_TABLE", "2".to_string()),
            ("OUT_UNITS", "AU-D".to_string()),
        ]);
        params.extend(epoch_params(&self.epochs));
        params
    }

    #[must_use]
    pub fn cache_key(&self) -> String {
        cache_key("vectors", &self.params())
    }
}

impl ObserverQuery {
    #[must_use]
    pub fn params(&self) -> Params {
        let mut params = common_params(&self.target, "OBSERVER");
        params.extend(self.site.horizons_params());
        params.extend([
            ("QUANTITIES", "1,4".to_string()),
            ("ANG_FORMAT", "DEG".to_string()),
            ("TIME_TYPE", "UT".to_string()),
        ]);
        params.extend(epoch_params(&self.epochs));
        params
    }

    /// Cache key with the site reduced to its rounded form, so sites that
    /// differ below the rounding share entries
    #[must_use]
    pub fn cache_key(&self) -> String {
        let params: Params = self
            .params()
            .into_iter()
            .filter(|(key, _)| !SITE_PARAMS.contains(key))
            .collect();
        format!("{}&SITE={}", cache_key("observer", &params), self.site.cache_key())
    }
}

const SITE_PARAMS: [&str; 3] = ["CENTER", "COORD_TYPE", "SITE_COORD"];

/// Build the query string: `format=json` plus each value single-quoted and
/// percent-encoded
#[must_use]
pub fn encode_params(params: &Params) -> String {
    let mut query = String::from("format=json");
    for (key, value) in params {
        query.push('&');
        query.push_str(key);
        query.push('=');
        query.push_str(&urlencoding::encode(&format!("'{value}'")));
    }
    query
}

/// Canonical cache key for a parameter set
#[must_use]
pub fn cache_key(kind: &str, params: &Params) -> String {
    let body = params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");
    format!("{kind}:{body}")
}
