//! Capture file replay through the driver

mod common;

use anyhow::Result;
use common::{three_events, write_capture};
use inspect_driver::{CaptureState, Driver, Error, Status};
use std::io::Write;

#[test]
fn test_three_events_then_eof() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = three_events(dir.path())?;

    let mut driver = Driver::new()?;
    driver.open_capture_file(&path)?;
    assert_eq!(driver.capture_state(), CaptureState::Capturing);

    let expected_seq = [("10", 9), ("11", 9), ("12", 10)];
    for (i, (seq, start)) in expected_seq.iter().enumerate() {
        let (status, event) = driver.next();
        assert_eq!(status, Status::Ok);
        assert!(!event.is_null());
        assert_eq!(event.seq(), Some(i as u64));

        assert_eq!(
            driver.extract_field_as_string("evt.num", &event)?,
            i.to_string()
        );
        assert_eq!(
            driver.extract_field_with_offsets("evt.arg[seq]", &event)?,
            (seq.to_string(), *start, 2)
        );
    }

    let (status, event) = driver.next();
    assert_eq!(status, Status::Eof);
    assert!(event.is_null());
    assert_eq!(event.seq(), None);

    for _ in 0..3 {
        assert_eq!(driver.next().0, Status::Eof);
    }
    Ok(())
}

#[test]
fn test_string_and_offset_extraction_agree() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = three_events(dir.path())?;

    let mut driver = Driver::new()?;
    driver.open_capture_file(&path)?;
    let (_, event) = driver.next();

    for field in [
        "evt.num",
        "evt.time",
        "evt.rawtime",
        "evt.source",
        "evt.type",
        "evt.buflen",
        "evt.data",
        "evt.plugininfo",
        "evt.arg[fd]",
    ] {
        let plain = driver.extract_field_as_string(field, &event)?;
        let (with_offsets, _, _) = driver.extract_field_with_offsets(field, &event)?;
        assert_eq!(plain, with_offsets, "field {}", field);
    }

    assert_eq!(
        driver.extract_field_as_string("evt.time", &event)?,
        "2023-11-14T22:13:20.000000000Z"
    );
    assert_eq!(driver.extract_field_as_string("evt.source", &event)?, "syscall");
    Ok(())
}

#[test]
fn test_offset_sentinel_and_full_data_range() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = three_events(dir.path())?;

    let mut driver = Driver::new()?;
    driver.open_capture_file(&path)?;
    let (_, event) = driver.next();

    assert_eq!(
        driver.extract_field_with_offsets("evt.num", &event)?,
        ("0".to_string(), 0, 0)
    );
    assert_eq!(
        driver.extract_field_with_offsets("evt.data", &event)?,
        ("open seq=10 fd=3".to_string(), 0, 16)
    );
    Ok(())
}

#[test]
fn test_unknown_fields_are_invalid() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = three_events(dir.path())?;

    let mut driver = Driver::new()?;
    driver.open_capture_file(&path)?;
    let (_, event) = driver.next();

    assert!(matches!(
        driver.extract_field_as_string("evt.nonexistent", &event),
        Err(Error::InvalidField(_))
    ));
    assert_eq!(driver.extract_field_as_string("evt.num", &event)?, "0");
    assert!(matches!(
        driver.extract_field_with_offsets("evt.nonexistent", &event),
        Err(Error::InvalidField(_))
    ));
    assert!(matches!(
        driver.extract_field_as_string("evt..num", &event),
        Err(Error::InvalidField(_))
    ));
    assert!(matches!(
        driver.extract_field_as_string("evt.num[3]", &event),
        Err(Error::InvalidField(_))
    ));
    Ok(())
}

#[test]
fn test_missing_values() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = three_events(dir.path())?;

    let mut driver = Driver::new()?;
    driver.open_capture_file(&path)?;
    let (_, event) = driver.next();

    assert!(matches!(
        driver.extract_field_as_string("evt.arg[len]", &event),
        Err(Error::NullValue(field)) if field == "evt.arg[len]"
    ));
    assert!(matches!(
        driver.extract_field_as_string("platform.hostname", &event),
        Err(Error::NullValue(_))
    ));
    Ok(())
}

#[test]
fn test_null_and_stale_handles() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = write_capture(dir.path(), "two.cap", &["a=1", "a=2"])?;

    let mut driver = Driver::new()?;
    let (status, idle) = driver.next();
    assert_eq!(status, Status::Error);
    assert!(idle.is_null());
    assert!(matches!(
        driver.extract_field_as_string("evt.num", &idle),
        Err(Error::NullEvent)
    ));

    driver.open_capture_file(&path)?;
    let (_, first) = driver.next();
    assert_eq!(driver.extract_field_as_string("evt.arg[a]", &first)?, "1");

    let (_, second) = driver.next();
    assert!(matches!(
        driver.extract_field_as_string("evt.arg[a]", &first),
        Err(Error::StaleEvent)
    ));
    assert_eq!(driver.extract_field_as_string("evt.arg[a]", &second)?, "2");

    let (status, end) = driver.next();
    assert_eq!(status, Status::Eof);
    assert!(matches!(
        driver.extract_field_with_offsets("evt.num", &end),
        Err(Error::NullEvent)
    ));
    Ok(())
}

#[test]
fn test_handles_are_bound_to_their_driver() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = three_events(dir.path())?;

    let mut left = Driver::new()?;
    let mut right = Driver::new()?;
    left.open_capture_file(&path)?;
    right.open_capture_file(&path)?;

    let (_, from_left) = left.next();
    let (_, _from_right) = right.next();
    assert!(matches!(
        right.extract_field_as_string("evt.num", &from_left),
        Err(Error::StaleEvent)
    ));
    Ok(())
}

#[test]
fn test_second_open_is_rejected() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = three_events(dir.path())?;

    let mut driver = Driver::new()?;
    driver.open_capture_file(&path)?;
    match driver.open_capture_file(&path) {
        Err(Error::InvalidStateTransition { from, to }) => {
            assert_eq!(from, CaptureState::Capturing);
            assert_eq!(to, CaptureState::Capturing);
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(matches!(
        driver.open_plugin_source("countdown", "", false),
        Err(Error::InvalidStateTransition { .. })
    ));

    assert_eq!(driver.next().0, Status::Ok);
    Ok(())
}

#[test]
fn test_open_failures_leave_driver_idle() -> Result<()> {
    let dir = tempfile::tempdir()?;

    let mut driver = Driver::new()?;
    assert!(matches!(
        driver.open_capture_file(dir.path().join("missing.cap")),
        Err(Error::Io(_))
    ));

    let bogus = dir.path().join("bogus.cap");
    let mut file = std::fs::File::create(&bogus)?;
    writeln!(file, "this is not a capture")?;
    drop(file);
    assert!(matches!(
        driver.open_capture_file(&bogus),
        Err(Error::Open(_))
    ));
    assert_eq!(driver.capture_state(), CaptureState::Idle);

    let good = three_events(dir.path())?;
    driver.open_capture_file(&good)?;
    assert_eq!(driver.next().0, Status::Ok);
    Ok(())
}
