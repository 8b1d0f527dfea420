//! Maps worker requests onto inventory operations.

use serde_json::Value;

use super::inventory::{Inventory, InventoryError};
use crate::bridge::{Request, Response};
use crate::cars::{operations, Car, CarFilter, SearchField, SortKey, DEFAULT_MAX_PRICE};

/// Response to a request, plus whether the inventory changed.
#[derive(Debug, Clone, PartialEq)]
pub struct Handled {
    pub response: Response,
    pub modified: bool,
}

impl Handled {
    fn read(response: Response) -> Self {
        Self {
            response,
            modified: false,
        }
    }

    fn write(response: Response) -> Self {
        Self {
            response,
            modified: true,
        }
    }
}

/// Execute one request against the inventory.
pub fn handle(inventory: &mut Inventory, request: &Request) -> Handled {
    let id = request.correlation_id.as_str();

    match request.operation.as_str() {
        operations::GET_ALL_CARS => Handled::read(list_response(id, inventory.cars().to_vec())),

        operations::ADD_CAR => match car_field(request) {
            Ok(car) => match inventory.add(car) {
                Ok(()) => Handled::write(
                    Response::success(id, None).with_message("Car added successfully."),
                ),
                Err(InventoryError::DuplicateCar(_)) => {
                    Handled::read(Response::error(id, "Car with this name already exists."))
                }
                Err(err) => {
                    Handled::read(Response::error(id, format!("Error adding car: {}", err)))
                }
            },
            Err(reason) => Handled::read(Response::error(id, format!("Error adding car: {}", reason))),
        },

        operations::UPDATE_CAR => match car_field(request) {
            Ok(car) => match inventory.update(car) {
                Ok(()) => Handled::write(
                    Response::success(id, None).with_message("Car updated successfully."),
                ),
                Err(InventoryError::NotFound(_)) => {
                    Handled::read(Response::error(id, "Car not found for update."))
                }
                Err(err) => {
                    Handled::read(Response::error(id, format!("Error updating car: {}", err)))
                }
            },
            Err(reason) => {
                Handled::read(Response::error(id, format!("Error updating car: {}", reason)))
            }
        },

        operations::DELETE_CAR => {
            let name = request.str_field("carName").unwrap_or_default();
            if name.is_empty() {
                Handled::read(Response::error(id, "Car name for deletion cannot be empty."))
            } else if inventory.delete(name) {
                Handled::write(Response::success(id, None).with_message("Car deleted successfully."))
            } else {
                Handled::read(Response::error(id, "Car not found for deletion."))
            }
        }

        operations::SEARCH_CARS => {
            let query = request.str_field("query").unwrap_or_default();
            let field = request
                .str_field("searchField")
                .and_then(SearchField::from_str);
            Handled::read(list_response(id, inventory.search(query, field)))
        }

        operations::FILTER_CARS => {
            let car_type = request
                .str_field("typeFilter")
                .filter(|value| !value.is_empty())
                .map(str::to_string);
            let filter = CarFilter {
                car_type,
                min_rating: request.f64_field("minRating").unwrap_or(0.0),
                max_price: request.f64_field("maxPrice").unwrap_or(DEFAULT_MAX_PRICE),
                available_only: request.bool_field("availableOnly").unwrap_or(false),
            };
            Handled::read(list_response(id, inventory.filter(&filter)))
        }

        operations::SORT_CARS => {
            let key = request.str_field("sortBy").and_then(SortKey::from_str);
            let ascending = request.bool_field("ascending").unwrap_or(true);
            Handled::read(list_response(id, inventory.sorted(key, ascending)))
        }

        other => {
            tracing::warn!(operation = other, "unknown operation");
            Handled::read(Response::error(
                id,
                "Unknown action or invalid command structure.",
            ))
        }
    }
}

fn car_field(request: &Request) -> Result<Car, String> {
    let value = request
        .payload
        .get("car")
        .cloned()
        .unwrap_or(Value::Null);
    if !value.is_object() {
        return Err("missing car record".to_string());
    }
    serde_json::from_value(value).map_err(|err| err.to_string())
}

fn list_response(id: &str, cars: Vec<Car>) -> Response {
    match serde_json::to_value(cars) {
        Ok(data) => Response::success(id, Some(data)),
        Err(err) => Response::error(id, format!("Failed to serialize cars: {}", err)),
    }
}
