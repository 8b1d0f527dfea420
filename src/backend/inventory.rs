//! In-memory car inventory with a pipe-delimited file format.
//!
//! Each line holds one car with 12 `|`-separated fields, in this order:
//!
//! ```text
//! name|available|type|rating|imagePath|mileage|maxSpeed|seats|transmission|vehicleClass|price|releaseDate
//! ```
//!
//! `available` is `1` or `0`.

use std::cmp::Ordering;

use crate::cars::{Car, CarFilter, SearchField, SortKey};

const FIELD_COUNT: usize = 12;

/// Rejected inventory changes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InventoryError {
    #[error("car '{0}' already exists")]
    DuplicateCar(String),

    #[error("car '{0}' not found")]
    NotFound(String),

    /// The value would break the line format on the next load.
    #[error("field '{0}' must not contain '|' or line breaks")]
    InvalidField(&'static str),
}

/// The worker's car list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inventory {
    cars: Vec<Car>,
}

impl Inventory {
    pub fn new(cars: Vec<Car>) -> Self {
        Self { cars }
    }

    /// Inventory used when no data file exists yet.
    pub fn default_fleet() -> Self {
        #[rustfmt::skip]
        let rows: [(&str, bool, &str, f64, &str, &str, &str, &str, &str, &str, f64, &str); 16] = [
            ("Haval H6", true, "SUV", 4.2, "src/Images/hav.jpg", "12 km/l", "180 km/h", "5", "Automatic", "SUV", 35000.0, "2023-01-15"),
            ("Fortuner", true, "SUV", 4.6, "src/Images/fort.jpg", "9 km/l", "190 km/h", "7", "Automatic", "SUV", 55000.0, "2022-03-20"),
            ("Toyota Corolla", true, "Sedan", 4.4, "src/Images/tc.jpg", "14 km/l", "195 km/h", "5", "Manual", "Sedan", 28000.0, "2023-05-10"),
            ("Toyota Yaris", false, "Sedan", 4.0, "src/Images/y.jpg", "17 km/l", "170 km/h", "5", "Automatic", "Sedan", 22000.0, "2021-11-01"),
            ("Honda Vezel", true, "SUV", 4.5, "src/Images/v.jpg", "18 km/l", "185 km/h", "5", "Automatic", "Compact SUV", 32000.0, "2024-02-28"),
            ("Honda City", true, "Sedan", 4.3, "src/Images/hcity.jpg", "16 km/l", "175 km/h", "5", "Manual", "Sedan", 24000.0, "2023-07-22"),
            ("Honda Civic", false, "Sedan", 4.7, "src/Images/hcivic.jpg", "13 km/l", "200 km/h", "5", "Automatic", "Sport Sedan", 38000.0, "2024-01-05"),
            ("Changan Alsvin", false, "Sedan", 4.1, "src/Images/alsvin.jpg", "15 km/l", "180 km/h", "5", "Manual", "Subcompact", 18000.0, "2022-09-10"),
            ("Suzuki Swift", true, "Hatchback", 4.0, "src/Images/s_swift.jpg", "19 km/l", "160 km/h", "5", "Manual", "Hatchback", 19000.0, "2023-04-01"),
            ("Hyundai Tucson", true, "SUV", 4.3, "src/Images/h_tucson.jpg", "11 km/l", "185 km/h", "5", "Automatic", "Mid-size SUV", 40000.0, "2023-09-18"),
            ("Kia Sportage", true, "SUV", 4.5, "src/Images/k_sportage.jpg", "10 km/l", "190 km/h", "5", "Automatic", "Mid-size SUV", 42000.0, "2024-03-01"),
            ("Audi A4", true, "Luxury Sedan", 4.8, "src/Images/a_a4.jpg", "10 km/l", "220 km/h", "5", "Automatic", "Luxury Sedan", 65000.0, "2023-11-20"),
            ("BMW X5", false, "Luxury SUV", 4.9, "src/Images/bmw_x5.jpg", "8 km/l", "240 km/h", "5", "Automatic", "Luxury SUV", 85000.0, "2022-07-15"),
            ("Mercedes C-Class", true, "Luxury Sedan", 4.7, "src/Images/merc_c.jpg", "11 km/l", "210 km/h", "5", "Automatic", "Luxury Sedan", 70000.0, "2024-01-10"),
            ("Tesla Model 3", true, "Electric", 4.9, "src/Images/tesla_m3.jpg", "400 km range", "225 km/h", "5", "Automatic", "Electric Sedan", 60000.0, "2023-06-01"),
            ("Ford Mustang", true, "Sports Car", 4.7, "src/Images/Ford_Mustang.jpg", "9 km/l", "250 km/h", "2", "Manual", "Muscle Car", 50000.0, "2023-02-14"),
        ];

        let cars = rows
            .into_iter()
            .map(
                |(name, available, car_type, rating, image, mileage, speed, seats, gearbox, class, price, date)| Car {
                    name: name.to_string(),
                    available,
                    car_type: car_type.to_string(),
                    rating,
                    image_path: image.to_string(),
                    mileage: mileage.to_string(),
                    max_speed: speed.to_string(),
                    seats: seats.to_string(),
                    transmission: gearbox.to_string(),
                    vehicle_class: class.to_string(),
                    price,
                    release_date: date.to_string(),
                },
            )
            .collect();

        Self { cars }
    }

    /// Parse the data file format. Malformed lines are skipped.
    pub fn parse(content: &str) -> Self {
        let cars = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| {
                let car = parse_line(line);
                if car.is_none() {
                    tracing::warn!(line, "skipping malformed inventory line");
                }
                car
            })
            .collect();
        Self { cars }
    }

    /// Render the data file format.
    pub fn render(&self) -> String {
        self.cars
            .iter()
            .map(|car| {
                format!(
                    "{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}\n",
                    car.name,
                    if car.available { "1" } else { "0" },
                    car.car_type,
                    car.rating,
                    car.image_path,
                    car.mileage,
                    car.max_speed,
                    car.seats,
                    car.transmission,
                    car.vehicle_class,
                    car.price,
                    car.release_date,
                )
            })
            .collect()
    }

    pub fn cars(&self) -> &[Car] {
        &self.cars
    }

    pub fn len(&self) -> usize {
        self.cars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cars.is_empty()
    }

    /// Append a car unless the name is taken.
    pub fn add(&mut self, car: Car) -> Result<(), InventoryError> {
        check_storable(&car)?;
        if self.cars.iter().any(|existing| existing.name == car.name) {
            return Err(InventoryError::DuplicateCar(car.name));
        }
        self.cars.push(car);
        Ok(())
    }

    /// Replace the car with the same name.
    pub fn update(&mut self, car: Car) -> Result<(), InventoryError> {
        check_storable(&car)?;
        match self.cars.iter_mut().find(|existing| existing.name == car.name) {
            Some(existing) => {
                *existing = car;
                Ok(())
            }
            None => Err(InventoryError::NotFound(car.name)),
        }
    }

    /// Remove every car with this name. Returns false if none matched.
    pub fn delete(&mut self, name: &str) -> bool {
        let before = self.cars.len();
        self.cars.retain(|car| car.name != name);
        self.cars.len() != before
    }

    /// Case-insensitive substring search.
    ///
    /// With no field, every car has an empty value, so only an empty query
    /// matches.
    pub fn search(&self, query: &str, field: Option<SearchField>) -> Vec<Car> {
        let needle = query.to_lowercase();
        self.cars
            .iter()
            .filter(|car| {
                let value = field.map_or("", |field| field.value_of(car));
                value.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect()
    }

    pub fn filter(&self, filter: &CarFilter) -> Vec<Car> {
        self.cars
            .iter()
            .filter(|car| filter.matches(car))
            .cloned()
            .collect()
    }

    /// Sorted copy. An unknown key keeps inventory order.
    pub fn sorted(&self, key: Option<SortKey>, ascending: bool) -> Vec<Car> {
        let mut cars = self.cars.clone();
        let Some(key) = key else {
            return cars;
        };

        cars.sort_by(|a, b| {
            let ordering = match key {
                SortKey::Name => a.name.cmp(&b.name),
                SortKey::Price => a.price.partial_cmp(&b.price).unwrap_or(Ordering::Equal),
                SortKey::Rating => a.rating.partial_cmp(&b.rating).unwrap_or(Ordering::Equal),
            };
            if ascending {
                ordering
            } else {
                ordering.reverse()
            }
        });
        cars
    }
}

fn check_storable(car: &Car) -> Result<(), InventoryError> {
    let text_fields = [
        ("name", &car.name),
        ("type", &car.car_type),
        ("imagePath", &car.image_path),
        ("mileage", &car.mileage),
        ("maxSpeed", &car.max_speed),
        ("seats", &car.seats),
        ("transmission", &car.transmission),
        ("vehicleClass", &car.vehicle_class),
        ("releaseDate", &car.release_date),
    ];
    match text_fields
        .iter()
        .find(|(_, value)| value.contains(['|', '\n', '\r']))
    {
        Some((field, _)) => Err(InventoryError::InvalidField(*field)),
        None => Ok(()),
    }
}

fn parse_line(line: &str) -> Option<Car> {
    let fields: Vec<&str> = line.split('|').collect();
    if fields.len() != FIELD_COUNT {
        return None;
    }

    Some(Car {
        name: fields[0].to_string(),
        available: fields[1] == "1",
        car_type: fields[2].to_string(),
        rating: fields[3].trim().parse().unwrap_or(0.0),
        image_path: fields[4].to_string(),
        mileage: fields[5].to_string(),
        max_speed: fields[6].to_string(),
        seats: fields[7].to_string(),
        transmission: fields[8].to_string(),
        vehicle_class: fields[9].to_string(),
        price: fields[10].trim().parse().unwrap_or(0.0),
        release_date: fields[11].to_string(),
    })
}
