//! CarCatalog implementation backed by the exchange engine.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::adapter::CarAdapter;
use super::car::{Car, CarFilter, SearchField, SortKey};
use super::operations;
use crate::bridge::{BridgeError, BridgeResult, ExchangeEngine, Payload, Status};

/// Catalog operations the UI layer depends on.
///
/// # Example
///
/// ```ignore
/// async fn show_suvs(catalog: &impl CarCatalog) -> BridgeResult<()> {
///     let filter = CarFilter { car_type: Some("SUV".into()), ..Default::default() };
///     for car in catalog.filter_cars(&filter).await? {
///         println!("{} ({})", car.name, car.price);
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait CarCatalog: Send + Sync {
    /// List every car.
    async fn get_all_cars(&self) -> BridgeResult<Vec<Car>>;

    /// Add a car. Fails remotely if the name is taken.
    async fn add_car(&self, car: &Car) -> BridgeResult<()>;

    /// Replace the car with the same name.
    async fn update_car(&self, car: &Car) -> BridgeResult<()>;

    /// Delete a car by name.
    async fn delete_car(&self, name: &str) -> BridgeResult<()>;

    /// Case-insensitive substring search on one field.
    async fn search_cars(&self, query: &str, field: SearchField) -> BridgeResult<Vec<Car>>;

    async fn filter_cars(&self, filter: &CarFilter) -> BridgeResult<Vec<Car>>;

    async fn sort_cars(&self, key: SortKey, ascending: bool) -> BridgeResult<Vec<Car>>;
}

/// [`CarCatalog`] that forwards each call to the worker.
pub struct CarService {
    engine: Arc<ExchangeEngine>,
    adapter: CarAdapter,
}

impl CarService {
    /// Create a service over a shared engine.
    pub fn new(engine: Arc<ExchangeEngine>, adapter: CarAdapter) -> Self {
        Self { engine, adapter }
    }

    /// Create a service that owns its engine, with the default path rewrite.
    pub fn with_engine(engine: ExchangeEngine) -> Self {
        Self::new(Arc::new(engine), CarAdapter::default())
    }

    pub fn engine(&self) -> &ExchangeEngine {
        &self.engine
    }

    /// Run an exchange and unwrap the worker's status.
    async fn call(&self, operation: &str, payload: Payload) -> BridgeResult<Option<Value>> {
        let response = self.engine.exchange(operation, payload).await?;
        match response.status {
            Status::Success => Ok(response.data),
            Status::Error => {
                let message = response
                    .message
                    .unwrap_or_else(|| "worker reported an error".to_string());
                tracing::warn!(operation, %message, "worker rejected request");
                Err(BridgeError::remote(message))
            }
        }
    }

    async fn list(&self, operation: &str, payload: Payload) -> BridgeResult<Vec<Car>> {
        let data = self.call(operation, payload).await?;
        self.adapter.cars_from_data(data)
    }

    async fn mutate(&self, operation: &str, payload: Payload) -> BridgeResult<()> {
        self.call(operation, payload).await.map(|_| ())
    }

    fn car_payload(&self, car: &Car) -> BridgeResult<Payload> {
        let record = self.adapter.to_wire(car)?;
        Ok(fields([("car", Value::Object(record))]))
    }
}

#[async_trait]
impl CarCatalog for CarService {
    async fn get_all_cars(&self) -> BridgeResult<Vec<Car>> {
        self.list(operations::GET_ALL_CARS, Payload::new()).await
    }

    async fn add_car(&self, car: &Car) -> BridgeResult<()> {
        let payload = self.car_payload(car)?;
        self.mutate(operations::ADD_CAR, payload).await
    }

    async fn update_car(&self, car: &Car) -> BridgeResult<()> {
        let payload = self.car_payload(car)?;
        self.mutate(operations::UPDATE_CAR, payload).await
    }

    async fn delete_car(&self, name: &str) -> BridgeResult<()> {
        self.mutate(operations::DELETE_CAR, fields([("carName", name.into())]))
            .await
    }

    async fn search_cars(&self, query: &str, field: SearchField) -> BridgeResult<Vec<Car>> {
        self.list(
            operations::SEARCH_CARS,
            fields([("query", query.into()), ("searchField", field.as_str().into())]),
        )
        .await
    }

    async fn filter_cars(&self, filter: &CarFilter) -> BridgeResult<Vec<Car>> {
        self.list(
            operations::FILTER_CARS,
            fields([
                ("typeFilter", filter.car_type.clone().unwrap_or_default().into()),
                ("minRating", filter.min_rating.into()),
                ("maxPrice", filter.max_price.into()),
                ("availableOnly", filter.available_only.into()),
            ]),
        )
        .await
    }

    async fn sort_cars(&self, key: SortKey, ascending: bool) -> BridgeResult<Vec<Car>> {
        self.list(
            operations::SORT_CARS,
            fields([("sortBy", key.as_str().into()), ("ascending", ascending.into())]),
        )
        .await
    }
}

fn fields<const N: usize>(entries: [(&str, Value); N]) -> Payload {
    entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}
