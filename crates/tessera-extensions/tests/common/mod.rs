//! Common test utilities for tessera-extensions
//!
//! This module provides shared test infrastructure including:
//! - Temp install roots and real .tar.gz archive fixtures
//! - Metadata builders for descriptor fields
//! - A recording observer for asserting notification order

#![allow(dead_code)]
#![allow(unused_imports)]

pub mod builders;
pub mod fixtures;
pub mod observers;

pub use builders::*;
pub use fixtures::*;
pub use observers::*;
