//! # DynamoDB Value Mapper
//!
//! Value mapping and request orchestration between application records and a DynamoDB
//! style store, with support for:
//! - Typed attribute codec with per-field type hints and custom transforms
//! - Batch get and write with automatic chunking and unprocessed-item retry
//! - Pagination, streaming and parallel (segmented) scans
//! - Key conditions, expected values and secondary index routing
//! - Table definitions and lifecycle
//!
//! ## Features
//!
//! - **Explicit transport**: every [`Table`] is built around a [`StoreClient`]; an
//!   implementation for `aws_sdk_dynamodb::Client` lives in [`aws`]
//! - **Async-first**: built on `tokio`, concurrent chunks and segments are bounded
//! - **No empty attributes**: empty values are never written, they are omitted or
//!   turned into attribute deletes
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dynamo_mapper::{
//!     DerivedKind, Error, GetOptions, PutOptions, Record, Table, Value, WireType, aws,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     let users = Table::builder("users", aws::connect().await)
//!         .mapping("user_id", WireType::S)
//!         .mapping("created", DerivedKind::IsoDate)
//!         .key(["user_id"])
//!         .build()?;
//!
//!     let mut user = Record::new();
//!     user.insert("user_id".into(), Value::from("123"));
//!     user.insert("name".into(), Value::from("John Doe"));
//!     users.put(&user, PutOptions::default()).await?;
//!
//!     let retrieved = users.get("123", GetOptions::default()).await?;
//!     println!("{retrieved:?}");
//!     Ok(())
//! }
//! ```
#![warn(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    unused_allocation,
    unused_comparisons,
    unused_parens,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_results,
    deprecated,
    unreachable_code,
    unused_mut
)]

mod error;
pub use error::{BoxError, Error, TransportError};

/// Production store client over the AWS SDK
pub mod aws;

pub mod client;

/// Attribute codec: native values to and from wire attributes
pub mod codec;

/// Table definitions and lifecycle
pub mod setup;

/// Table handle and its operations
pub mod table;

/// Native value model
pub mod value;

pub mod wire;

// Re-export main types for convenience
pub use client::{Operation, Payload, StoreClient};
pub use codec::{CustomTransform, DerivedKind, FieldMapping, FromWireFn, ToWireFn, TypeHint};
pub use table::{
    BatchGetGroup, BatchGetOptions, BatchLimits, BatchReadOutput, BatchWriteGroup,
    BatchWriteOutput, Comparator, Condition, ConditionSet, CreateTableOptions, DeleteOptions,
    GetOptions, GlobalIndex, ItemHook, ItemMapper, Key, KeySpec, LocalIndex, Page, Projection,
    PutOptions, QueryOptions, RecordHook, RetryConfig, ReturnValues, ScanOptions, Table,
    TableBuilder, UpdateActions, UpdateOptions, conditions,
};
pub use value::{Record, Value};
pub use wire::{Cursor, Item, RawItem, TableDescription, WireAttribute, WireType};

// Re-export aws-config types for configuration
pub use aws_config::{BehaviorVersion, Region, SdkConfig};
