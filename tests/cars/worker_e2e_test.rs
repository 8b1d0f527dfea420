//! End to end: Session launches the car-worker binary and talks to it.

use carbridge::bridge::ShutdownOutcome;
use carbridge::cars::{Car, CarCatalog, SortKey};
use carbridge::config::Settings;
use carbridge::session::Session;
use std::path::Path;

fn settings(dir: &Path) -> Settings {
    let mut settings = Settings::default();
    settings.worker.path = Some(env!("CARGO_BIN_EXE_car-worker").to_string());
    settings.worker.working_dir = dir.to_string_lossy().into_owned();
    settings.worker.args = vec!["--poll-interval-ms".to_string(), "20".to_string()];
    settings.exchange.timeout_ms = 10_000;
    settings.exchange.poll_interval_ms = 20;
    settings
}

#[tokio::test]
async fn test_session_against_worker_binary() {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::launch(&settings(dir.path())).await.unwrap();
    let catalog = session.catalog();

    let cars = catalog.get_all_cars().await.unwrap();
    assert_eq!(cars.len(), 16);
    assert!(cars.iter().all(|car| car.image_path.starts_with("/Images/")));

    let mut car = Car::named("Nissan Leaf");
    car.car_type = "Electric".to_string();
    car.rating = 4.1;
    car.price = 30000.0;
    car.image_path = "src/Images/leaf.jpg".to_string();
    catalog.add_car(&car).await.unwrap();

    let by_rating = catalog.sort_cars(SortKey::Rating, true).await.unwrap();
    assert_eq!(by_rating.len(), 17);
    assert_eq!(by_rating[0].name, "Toyota Yaris");

    let leaf = by_rating
        .iter()
        .find(|car| car.name == "Nissan Leaf")
        .unwrap();
    assert_eq!(leaf.image_path, "/Images/leaf.jpg");

    let err = catalog.delete_car("").await.unwrap_err();
    assert!(err.is_remote());

    assert_eq!(session.shutdown().await, ShutdownOutcome::Graceful);

    let saved = std::fs::read_to_string(dir.path().join("cars_data.txt")).unwrap();
    assert!(saved.contains("Nissan Leaf|0|Electric|4.1|src/Images/leaf.jpg"));
}

#[tokio::test]
async fn test_inventory_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    let session = Session::launch(&settings(dir.path())).await.unwrap();
    session.catalog().delete_car("Ford Mustang").await.unwrap();
    session.shutdown().await;

    let session = Session::launch(&settings(dir.path())).await.unwrap();
    let cars = session.catalog().get_all_cars().await.unwrap();
    session.shutdown().await;

    assert_eq!(cars.len(), 15);
    assert!(cars.iter().all(|car| car.name != "Ford Mustang"));
}

#[tokio::test]
async fn test_custom_mailbox_file_names_reach_worker() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = settings(dir.path());
    settings.mailbox.command_file = "request.json".to_string();
    settings.mailbox.result_file = "answer.json".to_string();

    let session = Session::launch(&settings).await.unwrap();
    let cars = session.catalog().get_all_cars().await.unwrap();
    session.shutdown().await;

    assert_eq!(cars.len(), 16);
    assert!(dir.path().join("answer.json").exists());
    assert!(!dir.path().join("result.json").exists());
}
