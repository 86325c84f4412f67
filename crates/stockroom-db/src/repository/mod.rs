//! # Repository Module
//!
//! Database repository implementations for Stockroom.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Scan workflow (Catalog trait)        Station CLI                      │
//! │       │  lookup / create                   │  list / adjust / report    │
//! │       └──────────────┬─────────────────────┘                            │
//! │                      ▼                                                  │
//! │  ProductRepository                                                     │
//! │  ├── get_by_sku(&self, sku)                                            │
//! │  ├── insert(&self, product)                                            │
//! │  ├── list(&self, query)                                                │
//! │  └── low_stock(&self, threshold)                                       │
//! │                      │                                                  │
//! │                      │  SQL Query                                       │
//! │                      ▼                                                  │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Product CRUD, listing and reports

pub mod product;
