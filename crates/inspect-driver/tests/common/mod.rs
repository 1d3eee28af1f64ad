//! Shared helpers for driver integration tests

#![allow(dead_code)]

use anyhow::Result;
use inspect_driver::{Driver, EventHandle, Status};
use inspect_engine::{CaptureRecord, CaptureWriter};
use std::path::{Path, PathBuf};

/// Write a capture file with one `syscall` event per entry of `data`
pub fn write_capture(dir: &Path, name: &str, data: &[&str]) -> Result<PathBuf> {
    let path = dir.join(name);
    let mut writer = CaptureWriter::create(&path)?;
    for (i, line) in data.iter().enumerate() {
        writer.write(&CaptureRecord::new(
            1_700_000_000_000_000_000 + i as u64 * 1_000,
            "syscall",
            1,
            *line,
        ))?;
    }
    writer.finish()?;
    Ok(path)
}

/// The three-event capture used by most tests
pub fn three_events(dir: &Path) -> Result<PathBuf> {
    write_capture(
        dir,
        "three.cap",
        &[
            "open seq=10 fd=3",
            "read seq=11 fd=3 len=512",
            "close seq=12 fd=3",
        ],
    )
}

/// Advance until the next event, skipping timeouts
pub fn next_event(driver: &mut Driver) -> (Status, EventHandle) {
    loop {
        let (status, handle) = driver.next();
        if status != Status::Timeout {
            return (status, handle);
        }
    }
}
