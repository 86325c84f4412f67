//! Test doubles: a scripted decoder engine and an in-memory catalog.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use stockroom_core::{NewProduct, Product, Symbology};

use crate::catalog::{Catalog, CatalogError};
use crate::decoder::{
    CameraHandle, DecoderConfig, DecoderEngine, DetectionSink, OpenRequest, RawDetection,
};
use crate::error::CameraError;

// =============================================================================
// Fake Engine
// =============================================================================

#[derive(Default)]
struct FakeState {
    sink: Option<DetectionSink>,
    opened: usize,
    released: usize,
    deny: Option<CameraError>,
    last_config: Option<DecoderConfig>,
}

/// Decoder engine driven by the test: `detect` plays the part of a decoded frame.
#[derive(Default)]
pub(crate) struct FakeEngine {
    state: Arc<Mutex<FakeState>>,
}

struct FakeHandle {
    state: Arc<Mutex<FakeState>>,
}

impl CameraHandle for FakeHandle {
    fn release(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.released += 1;
        state.sink = None;
    }
}

impl DecoderEngine for FakeEngine {
    fn open(&self, request: OpenRequest) -> Result<Box<dyn CameraHandle>, CameraError> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.deny.clone() {
            return Err(err);
        }
        state.opened += 1;
        state.sink = Some(request.sink);
        state.last_config = Some(request.config);
        Ok(Box::new(FakeHandle {
            state: Arc::clone(&self.state),
        }))
    }

    fn name(&self) -> &str {
        "fake"
    }
}

impl FakeEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(FakeEngine::default())
    }

    /// Makes every following `open` fail.
    pub fn deny(&self, err: CameraError) {
        self.state.lock().unwrap().deny = Some(err);
    }

    /// Pushes a detection as if the camera decoded a frame.
    pub fn detect(&self, code: &str, symbology: Symbology) -> bool {
        let sink = self.state.lock().unwrap().sink.clone();
        sink.is_some_and(|sink| sink.push(RawDetection::new(code, symbology)))
    }

    /// Forgets the sink without releasing, as a crashed driver would.
    pub fn unplug(&self) {
        self.state.lock().unwrap().sink = None;
    }

    pub fn opened(&self) -> usize {
        self.state.lock().unwrap().opened
    }

    pub fn released(&self) -> usize {
        self.state.lock().unwrap().released
    }

    /// Handles opened and not yet released.
    pub fn open_handles(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.opened - state.released
    }

    pub fn last_config(&self) -> Option<DecoderConfig> {
        self.state.lock().unwrap().last_config.clone()
    }
}

// =============================================================================
// Memory Catalog
// =============================================================================

/// Catalog backed by a Vec, counting every call.
#[derive(Default)]
pub(crate) struct MemoryCatalog {
    products: Mutex<Vec<Product>>,
    lookups: AtomicUsize,
    creates: AtomicUsize,
    broken: Mutex<bool>,
}

impl MemoryCatalog {
    pub fn new() -> Arc<Self> {
        Arc::new(MemoryCatalog::default())
    }

    pub fn with_product(sku: &str, name: &str, quantity: i64) -> Arc<Self> {
        let catalog = MemoryCatalog::default();
        catalog.products.lock().unwrap().push(product(sku, name, quantity));
        Arc::new(catalog)
    }

    /// Makes every following call fail as if the database were gone.
    pub fn break_storage(&self) {
        *self.broken.lock().unwrap() = true;
    }

    pub fn len(&self) -> usize {
        self.products.lock().unwrap().len()
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), CatalogError> {
        if *self.broken.lock().unwrap() {
            return Err(CatalogError::Unavailable("storage offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn lookup(&self, code: &str) -> Result<Option<Product>, CatalogError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let sku = code.trim();
        Ok(self
            .products
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.sku == sku)
            .cloned())
    }

    async fn create(&self, new: NewProduct) -> Result<Product, CatalogError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let mut products = self.products.lock().unwrap();
        if products.iter().any(|p| p.sku == new.sku.trim()) {
            return Err(CatalogError::Duplicate {
                field: "sku".to_string(),
                value: new.sku,
            });
        }
        let mut created = product(new.sku.trim(), &new.name, new.quantity);
        created.category = new.category;
        products.push(created.clone());
        Ok(created)
    }
}

pub(crate) fn product(sku: &str, name: &str, quantity: i64) -> Product {
    Product {
        id: uuid::Uuid::new_v4().to_string(),
        sku: sku.to_string(),
        name: name.to_string(),
        quantity,
        category: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}
