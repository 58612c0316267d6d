//! The store collaborator: one asynchronous request operation.

use serde_json::Value as Json;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::Error;

/// Wire-shaped request or response body (DynamoDB JSON protocol)
pub type Payload = Json;

/// Operations this crate shapes requests for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `GetItem`
    GetItem,
    /// `PutItem`
    PutItem,
    /// `DeleteItem`
    DeleteItem,
    /// `UpdateItem`
    UpdateItem,
    /// `Query`
    Query,
    /// `Scan`
    Scan,
    /// `BatchGetItem`
    BatchGetItem,
    /// `BatchWriteItem`
    BatchWriteItem,
    /// `CreateTable`
    CreateTable,
    /// `DescribeTable`
    DescribeTable,
    /// `UpdateTable`
    UpdateTable,
    /// `DeleteTable`
    DeleteTable,
    /// `ListTables`
    ListTables,
}

impl Operation {
    /// Protocol name of the operation
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::GetItem => "GetItem",
            Operation::PutItem => "PutItem",
            Operation::DeleteItem => "DeleteItem",
            Operation::UpdateItem => "UpdateItem",
            Operation::Query => "Query",
            Operation::Scan => "Scan",
            Operation::BatchGetItem => "BatchGetItem",
            Operation::BatchWriteItem => "BatchWriteItem",
            Operation::CreateTable => "CreateTable",
            Operation::DescribeTable => "DescribeTable",
            Operation::UpdateTable => "UpdateTable",
            Operation::DeleteTable => "DeleteTable",
            Operation::ListTables => "ListTables",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport to the remote store
///
/// Implementations perform exactly one network call per `request` and own their
/// retry, throttling, authentication and timeout policy. Errors should be returned
/// as [`Error::Transport`]; this crate never inspects them.
///
/// An implementation for `aws_sdk_dynamodb::Client` is provided in [`crate::aws`].
pub trait StoreClient: Send + Sync {
    /// Send `payload` as `operation` and return the parsed response body
    fn request(
        &self,
        operation: Operation,
        payload: Payload,
    ) -> impl Future<Output = Result<Payload, Error>> + Send;
}

impl<C: StoreClient> StoreClient for Arc<C> {
    fn request(
        &self,
        operation: Operation,
        payload: Payload,
    ) -> impl Future<Output = Result<Payload, Error>> + Send {
        (**self).request(operation, payload)
    }
}

impl<C: StoreClient> StoreClient for &C {
    fn request(
        &self,
        operation: Operation,
        payload: Payload,
    ) -> impl Future<Output = Result<Payload, Error>> + Send {
        (**self).request(operation, payload)
    }
}
