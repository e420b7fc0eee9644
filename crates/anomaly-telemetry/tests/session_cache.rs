//! Exported sessions served through a persistent store

use anomaly_core::ErrorKind;
use anomaly_telemetry::{
    fetch_driver_channel, CachedProvider, CarSample, Channel, DirectoryProvider, DirectoryStore,
    Lap, Session, SessionKey, SessionKind, SessionStore, TelemetryProvider,
};
use std::sync::Arc;

fn lap(driver: &str, number: u32, lap_time: Option<f64>) -> Lap {
    Lap {
        driver: driver.to_string(),
        lap_number: number,
        lap_time,
        samples: (0..40)
            .map(|i| CarSample {
                time: i as f64 * 0.25,
                speed: Some(120.0 + (i % 8) as f64 * 5.0),
                throttle: Some(if i % 10 < 7 { 100.0 } else { 0.0 }),
                brake: Some(if i % 10 < 7 { 0.0 } else { 1.0 }),
                gear: Some(3 + (i % 5) as u8),
                distance: None,
            })
            .collect(),
    }
}

fn silverstone() -> Session {
    Session {
        year: 2024,
        event: "British Grand Prix".to_string(),
        kind: SessionKind::Race,
        laps: vec![
            lap("HAM", 1, Some(91.3)),
            lap("HAM", 2, Some(89.8)),
            lap("NOR", 1, Some(90.1)),
        ],
    }
}

#[test]
fn test_directory_store_serves_repeat_loads() {
    let source = tempfile::tempdir().unwrap();
    let cache = tempfile::tempdir().unwrap();
    let exporter = DirectoryProvider::new(source.path());
    exporter.save_session(&silverstone()).unwrap();

    let store: Arc<dyn SessionStore> = Arc::new(DirectoryStore::open(cache.path()).unwrap());
    let provider = CachedProvider::new(DirectoryProvider::new(source.path()), Arc::clone(&store));
    let key = SessionKey::new(2024, "British Grand Prix", SessionKind::Race, "ham");

    let first = fetch_driver_channel(&provider, &key, Channel::Speed).unwrap();
    assert_eq!(first.name(), "HAM Speed");
    assert_eq!(first.len(), 40);

    // The source disappears; the stored copy keeps answering.
    drop(exporter);
    source.close().unwrap();
    let second = fetch_driver_channel(&provider, &key, Channel::Speed).unwrap();
    assert_eq!(first, second);

    let stats = store.stats();
    assert_eq!(stats.entries, 1);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
}

#[test]
fn test_unknown_driver_and_event_are_unavailable() {
    let source = tempfile::tempdir().unwrap();
    DirectoryProvider::new(source.path())
        .save_session(&silverstone())
        .unwrap();
    let cache = tempfile::tempdir().unwrap();
    let provider = CachedProvider::new(
        DirectoryProvider::new(source.path()),
        DirectoryStore::open(cache.path()).unwrap(),
    );

    let key = SessionKey::new(2024, "British Grand Prix", SessionKind::Race, "VER");
    let err = fetch_driver_channel(&provider, &key, Channel::Throttle).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataUnavailable);

    let key = SessionKey::new(2024, "British Grand Prix", SessionKind::Sprint, "HAM");
    let err = fetch_driver_channel(&provider, &key, Channel::Throttle).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataUnavailable);
    assert_eq!(provider.store().stats().entries, 1);

    assert_eq!(
        provider.event_names(2024).unwrap(),
        vec!["British Grand Prix".to_string()]
    );
}
