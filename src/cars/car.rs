//! Car record and query parameters.

use serde::{Deserialize, Serialize};

/// Default upper price bound for [`CarFilter`].
pub const DEFAULT_MAX_PRICE: f64 = 1_000_000.0;

/// A car in the rental catalog.
///
/// Field names are camelCase on the wire. Missing fields take their default
/// value, which is how the worker treats partial records too.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Car {
    /// Unique key used by update and delete.
    pub name: String,
    pub available: bool,
    /// Body type, e.g. "SUV" or "Sedan".
    #[serde(rename = "type")]
    pub car_type: String,
    pub rating: f64,
    /// Image location; see [`PathRewrite`](super::PathRewrite).
    pub image_path: String,
    pub mileage: String,
    pub max_speed: String,
    pub seats: String,
    pub transmission: String,
    pub vehicle_class: String,
    pub price: f64,
    pub release_date: String,
}

impl Car {
    /// Create a car with a name and everything else defaulted.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Field a text search is run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchField {
    Name,
    Type,
    VehicleClass,
    Transmission,
    Mileage,
    MaxSpeed,
    Seats,
    ReleaseDate,
}

impl SearchField {
    pub const ALL: [SearchField; 8] = [
        SearchField::Name,
        SearchField::Type,
        SearchField::VehicleClass,
        SearchField::Transmission,
        SearchField::Mileage,
        SearchField::MaxSpeed,
        SearchField::Seats,
        SearchField::ReleaseDate,
    ];

    /// Parse a wire name (e.g. `vehicleClass`).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == s)
    }

    /// Wire name of the field.
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchField::Name => "name",
            SearchField::Type => "type",
            SearchField::VehicleClass => "vehicleClass",
            SearchField::Transmission => "transmission",
            SearchField::Mileage => "mileage",
            SearchField::MaxSpeed => "maxSpeed",
            SearchField::Seats => "seats",
            SearchField::ReleaseDate => "releaseDate",
        }
    }

    /// The value of this field on `car`.
    pub fn value_of<'a>(&self, car: &'a Car) -> &'a str {
        match self {
            SearchField::Name => &car.name,
            SearchField::Type => &car.car_type,
            SearchField::VehicleClass => &car.vehicle_class,
            SearchField::Transmission => &car.transmission,
            SearchField::Mileage => &car.mileage,
            SearchField::MaxSpeed => &car.max_speed,
            SearchField::Seats => &car.seats,
            SearchField::ReleaseDate => &car.release_date,
        }
    }
}

/// Sort order key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Name,
    Price,
    Rating,
}

impl SortKey {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "name" => Some(SortKey::Name),
            "price" => Some(SortKey::Price),
            "rating" => Some(SortKey::Rating),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::Price => "price",
            SortKey::Rating => "rating",
        }
    }
}

/// Criteria for `FILTER_CARS`. All conditions must hold.
#[derive(Debug, Clone, PartialEq)]
pub struct CarFilter {
    /// Exact body type; `None` matches any.
    pub car_type: Option<String>,
    pub min_rating: f64,
    pub max_price: f64,
    pub available_only: bool,
}

impl Default for CarFilter {
    fn default() -> Self {
        Self {
            car_type: None,
            min_rating: 0.0,
            max_price: DEFAULT_MAX_PRICE,
            available_only: false,
        }
    }
}

impl CarFilter {
    /// Check a single car against the criteria.
    pub fn matches(&self, car: &Car) -> bool {
        let type_ok = self
            .car_type
            .as_deref()
            .map_or(true, |wanted| wanted.is_empty() || car.car_type == wanted);

        type_ok
            && car.rating >= self.min_rating
            && car.price <= self.max_price
            && (!self.available_only || car.available)
    }
}
