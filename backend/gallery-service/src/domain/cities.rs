//! The fixed universe of selectable cities.
//!
//! Independent of which cities have posts. Facet output is padded from this
//! list, and its order breaks ties between equally popular cities.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::services::normalize::normalize_city;

const KNOWN_CITIES: &[&str] = &[
    "Wellesley", "Boston", "Tokyo", "Jakarta", "Delhi", "Guangzhou", "Mumbai", "Manila",
    "Shanghai", "São Paulo", "Seoul", "Mexico City", "Cairo", "New York City", "Beijing",
    "Bangkok", "Shenzhen", "Moscow", "Buenos Aires", "Lagos", "Istanbul", "Milan", "Bangalore",
    "Osaka", "Chengdu", "Tehran", "Rio de Janeiro", "Toronto", "Athens", "Chennai",
    "Los Angeles", "London", "Paris", "Rome", "Prague", "Sydney", "Lima", "Wuhan", "Nanyang",
    "Hangzhou", "Amsterdam", "Dubai", "Dublin", "Stockholm", "Cairo", "Nagoya", "Taipei",
    "Berlin", "Washington D.C.", "Vienna", "Lisbon", "Edinburgh", "Chicago", "Nanjing",
    "Fuyang", "Montreal", "Vilnius", "Frankfurt", "Vancouver", "Johannesburg", "Bogotá",
    "Shenyang", "Shangqiu", "Melbourne", "Venice", "Hong Kong", "Santiago", "Orlando",
    "Las Vegas", "Miami", "Orlando", "Madrid", "Baghdad", "Singapore", "San Francisco",
    "Honolulu", "Munich", "Houston", "Barcelona", "Copenhagen",
];

/// Normalized city names in universe order, first occurrence wins.
static UNIVERSE: LazyLock<Vec<String>> = LazyLock::new(|| {
    let mut seen = std::collections::HashSet::new();
    KNOWN_CITIES
        .iter()
        .map(|city| normalize_city(city))
        .filter(|city| seen.insert(city.clone()))
        .collect()
});

static POSITIONS: LazyLock<HashMap<String, usize>> = LazyLock::new(|| {
    UNIVERSE
        .iter()
        .enumerate()
        .map(|(idx, city)| (city.clone(), idx))
        .collect()
});

/// Ordered, deduplicated, normalized city universe
#[derive(Debug, Clone)]
pub struct CityUniverse {
    cities: Vec<String>,
    positions: HashMap<String, usize>,
}

impl CityUniverse {
    /// The built-in list of known cities.
    pub fn known() -> Self {
        Self {
            cities: UNIVERSE.clone(),
            positions: POSITIONS.clone(),
        }
    }

    /// A custom universe; names are normalized and deduplicated.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut cities: Vec<String> = Vec::new();
        let mut positions = HashMap::new();
        for name in names {
            let city = normalize_city(name.as_ref());
            if city.is_empty() || positions.contains_key(&city) {
                continue;
            }
            positions.insert(city.clone(), cities.len());
            cities.push(city);
        }
        Self { cities, positions }
    }

    pub fn position(&self, normalized: &str) -> Option<usize> {
        self.positions.get(normalized).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.cities.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }
}

impl Default for CityUniverse {
    fn default() -> Self {
        Self::known()
    }
}
