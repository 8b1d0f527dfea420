//! Conversion between [`Car`] and wire payloads.

use serde_json::Value;

use super::car::Car;
use crate::bridge::codec::{self, Payload};
use crate::bridge::{BridgeError, BridgeResult};

/// Prefix the worker stores image paths under.
pub const SOURCE_IMAGE_PREFIX: &str = "src/Images/";

/// Prefix the UI resolves images from.
pub const RESOURCE_IMAGE_PREFIX: &str = "/Images/";

/// Rewrites the leading prefix of received image paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRewrite {
    from_prefix: String,
    to_prefix: String,
}

impl Default for PathRewrite {
    fn default() -> Self {
        Self::new(SOURCE_IMAGE_PREFIX, RESOURCE_IMAGE_PREFIX)
    }
}

impl PathRewrite {
    pub fn new(from_prefix: impl Into<String>, to_prefix: impl Into<String>) -> Self {
        Self {
            from_prefix: from_prefix.into(),
            to_prefix: to_prefix.into(),
        }
    }

    /// Rewrite `path`, or `None` if it does not start with the prefix.
    pub fn apply(&self, path: &str) -> Option<String> {
        path.strip_prefix(&self.from_prefix)
            .map(|rest| format!("{}{}", self.to_prefix, rest))
    }

    /// Rewrite the car's image path in place. Returns whether it changed.
    pub fn rewrite(&self, car: &mut Car) -> bool {
        match self.apply(&car.image_path) {
            Some(rewritten) => {
                car.image_path = rewritten;
                true
            }
            None => false,
        }
    }
}

/// Maps cars to and from the generic payload shape.
///
/// Image paths are rewritten only on the way in; outgoing records are sent
/// exactly as given.
#[derive(Debug, Clone, Default)]
pub struct CarAdapter {
    rewrite: PathRewrite,
}

impl CarAdapter {
    pub fn new(rewrite: PathRewrite) -> Self {
        Self { rewrite }
    }

    pub fn rewrite(&self) -> &PathRewrite {
        &self.rewrite
    }

    /// Convert a car to a payload object.
    pub fn to_wire(&self, car: &Car) -> BridgeResult<Payload> {
        codec::to_payload(car)
    }

    /// Convert a received record to a car, rewriting its image path.
    pub fn from_wire(&self, value: Value) -> BridgeResult<Car> {
        let mut car: Car = serde_json::from_value(value).map_err(BridgeError::InvalidData)?;
        self.rewrite.rewrite(&mut car);
        Ok(car)
    }

    /// Convert response data to cars.
    ///
    /// Accepts a list of records, a single record, or nothing.
    pub fn cars_from_data(&self, data: Option<Value>) -> BridgeResult<Vec<Car>> {
        match data {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .into_iter()
                .map(|item| self.from_wire(item))
                .collect(),
            Some(record) => Ok(vec![self.from_wire(record)?]),
        }
    }
}
