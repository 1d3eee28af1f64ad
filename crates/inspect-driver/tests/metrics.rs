//! Metric snapshots through the driver

mod common;

use anyhow::Result;
use common::{next_event, three_events};
use inspect_driver::{Driver, DriverConfig, Metric, Status};
use inspect_plugins::{COUNTDOWN, TALLY};

fn metric(name: &str, value: u64) -> Metric {
    Metric {
        name: name.to_string(),
        value,
    }
}

#[test]
fn test_no_plugins_no_metrics() -> Result<()> {
    let mut driver = Driver::new()?;
    assert!(driver.get_metrics().is_empty());

    let dir = tempfile::tempdir()?;
    driver.open_capture_file(three_events(dir.path())?)?;
    driver.next();
    assert!(driver.get_metrics().is_empty());
    Ok(())
}

#[test]
fn test_countdown_metrics() -> Result<()> {
    let mut driver = Driver::new()?;
    driver.register_plugin(&COUNTDOWN, r#"{"remaining": 3, "batch_size": 2}"#)?;
    driver.open_plugin_source("countdown", "", false)?;

    assert_eq!(
        driver.get_metrics(),
        vec![
            metric("countdown.next_batch_call_count", 0),
            metric("countdown.events_produced", 0),
        ]
    );

    assert_eq!(driver.next().0, Status::Ok);
    assert_eq!(
        driver.get_metrics(),
        vec![
            metric("countdown.next_batch_call_count", 1),
            metric("countdown.events_produced", 2),
        ]
    );

    while next_event(&mut driver).0 == Status::Ok {}
    assert_eq!(
        driver.get_metrics(),
        vec![
            metric("countdown.next_batch_call_count", 3),
            metric("countdown.events_produced", 3),
        ]
    );
    Ok(())
}

#[test]
fn test_engine_counters_follow_config() -> Result<()> {
    let config = DriverConfig::from_str("metrics:\n  plugins: false\n  engine: true\n")?;
    let mut driver = Driver::with_config(&config)?;
    driver.register_plugin(&COUNTDOWN, r#"{"remaining": 2, "batch_size": 2}"#)?;
    driver.register_plugin(&TALLY, "")?;
    driver.open_plugin_source("countdown", "", false)?;
    while driver.next().0 == Status::Ok {}

    assert_eq!(
        driver.get_metrics(),
        vec![
            metric("engine.n_evts", 2),
            metric("engine.n_timeouts", 0),
            metric("engine.n_drops", 0),
        ]
    );
    Ok(())
}

#[test]
fn test_metrics_are_prefixed_by_plugin() -> Result<()> {
    let mut driver = Driver::new()?;
    driver.register_plugin(&COUNTDOWN, r#"{"remaining": 1, "batch_size": 1}"#)?;
    driver.register_plugin(&TALLY, "")?;
    driver.open_plugin_source("countdown", "", false)?;
    driver.next();

    let names: Vec<String> = driver.get_metrics().into_iter().map(|m| m.name).collect();
    assert_eq!(
        names,
        vec![
            "countdown.next_batch_call_count",
            "countdown.events_produced",
            "tally.events_parsed",
            "tally.sources",
        ]
    );
    Ok(())
}
