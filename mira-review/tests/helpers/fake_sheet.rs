//! In-memory stand-ins for the Google Sheets backend

use async_trait::async_trait;
use mira_review::sync::{SheetBackend, SyncBridge, SyncError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Sheet held in memory; optionally fails after a number of row writes
#[derive(Default)]
pub struct FakeSheet {
    pub values: Mutex<Vec<Vec<String>>>,
    pub fetches: AtomicUsize,
    writes_left: Mutex<Option<usize>>,
}

impl FakeSheet {
    pub fn new(values: Vec<Vec<String>>) -> Arc<Self> {
        Arc::new(Self {
            values: Mutex::new(values),
            ..Default::default()
        })
    }

    /// Row writes beyond `n` fail with `Unreachable`
    pub fn failing_after(values: Vec<Vec<String>>, n: usize) -> Arc<Self> {
        Arc::new(Self {
            values: Mutex::new(values),
            writes_left: Mutex::new(Some(n)),
            ..Default::default()
        })
    }

    pub fn snapshot(&self) -> Vec<Vec<String>> {
        self.values.lock().unwrap().clone()
    }

    fn take_write(&self) -> Result<(), SyncError> {
        let mut left = self.writes_left.lock().unwrap();
        match left.as_mut() {
            Some(0) => Err(SyncError::Unreachable("connection reset".to_string())),
            Some(n) => {
                *n -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SheetBackend for FakeSheet {
    async fn fetch_values(&self) -> Result<Vec<Vec<String>>, SyncError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.snapshot())
    }

    async fn update_header(&self, header: &[String]) -> Result<(), SyncError> {
        let mut values = self.values.lock().unwrap();
        if values.is_empty() {
            values.push(header.to_vec());
        } else {
            values[0] = header.to_vec();
        }
        Ok(())
    }

    async fn update_row(&self, row_number: usize, row: &[String]) -> Result<(), SyncError> {
        self.take_write()?;
        let mut values = self.values.lock().unwrap();
        if values.len() < row_number {
            values.resize(row_number, Vec::new());
        }
        values[row_number - 1] = row.to_vec();
        Ok(())
    }

    async fn append_row(&self, row: &[String]) -> Result<(), SyncError> {
        self.take_write()?;
        self.values.lock().unwrap().push(row.to_vec());
        Ok(())
    }
}

/// Backend whose every call fails as a network error
pub struct UnreachableSheet;

#[async_trait]
impl SheetBackend for UnreachableSheet {
    async fn fetch_values(&self) -> Result<Vec<Vec<String>>, SyncError> {
        Err(SyncError::Unreachable("connection refused".to_string()))
    }

    async fn update_header(&self, _header: &[String]) -> Result<(), SyncError> {
        Err(SyncError::Unreachable("connection refused".to_string()))
    }

    async fn update_row(&self, _row_number: usize, _row: &[String]) -> Result<(), SyncError> {
        Err(SyncError::Unreachable("connection refused".to_string()))
    }

    async fn append_row(&self, _row: &[String]) -> Result<(), SyncError> {
        Err(SyncError::Unreachable("connection refused".to_string()))
    }
}

pub fn bridge(backend: Arc<dyn SheetBackend>) -> SyncBridge {
    SyncBridge::new(backend, Duration::from_secs(300))
}

pub fn strings(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}
