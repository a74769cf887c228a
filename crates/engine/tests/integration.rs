#![allow(unused_crate_dependencies)]

#[path = "integration/common/mod.rs"]
mod common;

#[path = "integration/ex.rs"]
mod ex;

#[path = "integration/insert.rs"]
mod insert;

#[path = "integration/properties.rs"]
mod properties;

#[path = "integration/registers.rs"]
mod registers;

#[path = "integration/scenarios.rs"]
mod scenarios;

#[path = "integration/visual.rs"]
mod visual;
