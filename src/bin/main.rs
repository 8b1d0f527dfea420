//! carbridge CLI - Query and edit the car catalog through the worker
//!
//! Usage:
//!   carbridge [--config <file>] list
//!   carbridge search <query> [--field <field>]
//!   carbridge filter [--type <type>] [--min-rating <n>] [--max-price <n>] [--available]
//!   carbridge sort [--by <key>] [--desc]
//!   carbridge add <record.json>
//!   carbridge update <record.json>
//!   carbridge delete <name>
//!
//! Examples:
//!   carbridge search civic --field name
//!   carbridge filter --type SUV --max-price 50000 --available
//!   carbridge sort --by price --desc

use carbridge::cars::{Car, CarCatalog, CarFilter, SearchField, SortKey, DEFAULT_MAX_PRICE};
use carbridge::config::Settings;
use carbridge::logging;
use carbridge::session::Session;
use carbridge::BridgeResult;
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "carbridge")]
#[command(about = "carbridge - Talk to the car data worker through its file mailbox")]
#[command(version)]
struct Cli {
    /// Path to a carbridge.toml (defaults to the standard search locations)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log bridge activity at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every car
    List,

    /// Case-insensitive substring search on one field
    Search {
        /// Text to look for
        query: String,

        /// Field to search
        #[arg(short, long, default_value = "name")]
        field: FieldArg,
    },

    /// Keep cars matching all criteria
    Filter {
        /// Exact body type (e.g. SUV, Sedan)
        #[arg(short = 't', long = "type")]
        car_type: Option<String>,

        /// Minimum rating
        #[arg(long, default_value_t = 0.0)]
        min_rating: f64,

        /// Maximum price
        #[arg(long, default_value_t = DEFAULT_MAX_PRICE)]
        max_price: f64,

        /// Only cars that are available
        #[arg(short, long)]
        available: bool,
    },

    /// Sort the catalog
    Sort {
        /// Sort key
        #[arg(short, long, default_value = "name")]
        by: SortArg,

        /// Sort descending
        #[arg(long)]
        desc: bool,
    },

    /// Add a car from a JSON record file
    Add {
        /// Path to the JSON record
        file: PathBuf,
    },

    /// Replace the car with the same name from a JSON record file
    Update {
        /// Path to the JSON record
        file: PathBuf,
    },

    /// Delete a car by name
    Delete {
        /// Name of the car
        name: String,
    },
}

#[derive(Clone, ValueEnum)]
enum FieldArg {
    Name,
    Type,
    VehicleClass,
    Transmission,
    Mileage,
    MaxSpeed,
    Seats,
    ReleaseDate,
}

impl From<FieldArg> for SearchField {
    fn from(arg: FieldArg) -> Self {
        match arg {
            FieldArg::Name => SearchField::Name,
            FieldArg::Type => SearchField::Type,
            FieldArg::VehicleClass => SearchField::VehicleClass,
            FieldArg::Transmission => SearchField::Transmission,
            FieldArg::Mileage => SearchField::Mileage,
            FieldArg::MaxSpeed => SearchField::MaxSpeed,
            FieldArg::Seats => SearchField::Seats,
            FieldArg::ReleaseDate => SearchField::ReleaseDate,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum SortArg {
    Name,
    Price,
    Rating,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Name => SortKey::Name,
            SortArg::Price => SortKey::Price,
            SortArg::Rating => SortKey::Rating,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let directive = if cli.verbose { "carbridge=debug" } else { "warn" };
    if let Err(e) = logging::init_logging(directive) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    let settings = match settings {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Read record files before starting the worker
    let record = match &cli.command {
        Commands::Add { file } | Commands::Update { file } => match read_record(file) {
            Ok(car) => Some(car),
            Err(e) => {
                eprintln!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        _ => None,
    };

    let session = match Session::launch(&settings).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to start worker: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let code = run(&cli.command, record, session.catalog()).await;
    session.shutdown().await;
    code
}

async fn run(command: &Commands, record: Option<Car>, catalog: &impl CarCatalog) -> ExitCode {
    let result = match (command, record) {
        (Commands::List, _) => print_cars(catalog.get_all_cars().await),
        (Commands::Search { query, field }, _) => {
            print_cars(catalog.search_cars(query, field.clone().into()).await)
        }
        (
            Commands::Filter {
                car_type,
                min_rating,
                max_price,
                available,
            },
            _,
        ) => {
            let filter = CarFilter {
                car_type: car_type.clone(),
                min_rating: *min_rating,
                max_price: *max_price,
                available_only: *available,
            };
            print_cars(catalog.filter_cars(&filter).await)
        }
        (Commands::Sort { by, desc }, _) => {
            print_cars(catalog.sort_cars(by.clone().into(), !desc).await)
        }
        (Commands::Add { .. }, Some(car)) => {
            print_done(catalog.add_car(&car).await, "added", &car.name)
        }
        (Commands::Update { .. }, Some(car)) => {
            print_done(catalog.update_car(&car).await, "updated", &car.name)
        }
        (Commands::Delete { name }, _) => {
            print_done(catalog.delete_car(name).await, "deleted", name)
        }
        (Commands::Add { .. } | Commands::Update { .. }, None) => {
            eprintln!("No car record given");
            return ExitCode::FAILURE;
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if e.is_remote() {
                eprintln!("Worker error: {}", e);
            } else {
                eprintln!("Bridge error: {}", e);
            }
            ExitCode::FAILURE
        }
    }
}

fn read_record(file: &Path) -> Result<Car, String> {
    let source = fs::read_to_string(file)
        .map_err(|e| format!("Error reading file '{}': {}", file.display(), e))?;
    serde_json::from_str(&source)
        .map_err(|e| format!("Invalid car record in '{}': {}", file.display(), e))
}

fn print_cars(result: BridgeResult<Vec<Car>>) -> BridgeResult<()> {
    let cars = result?;
    match serde_json::to_string_pretty(&cars) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to format cars: {}", e),
    }
    Ok(())
}

fn print_done(result: BridgeResult<()>, verb: &str, name: &str) -> BridgeResult<()> {
    result?;
    println!("Car '{}' {}", name, verb);
    Ok(())
}
