// reqbind - request argument binding and validation
// Declarative field rules, catalog-backed error descriptors and envelope shaping

pub mod catalog;
pub mod config;
pub mod request_context;
pub mod response;
pub mod validation;
pub mod value;

// Re-export core types
pub use catalog::{codes, CatalogError, Catalogs, ErrorCatalog, ErrorDescriptor, ErrorKey};
pub use config::Config;
pub use request_context::{Bucket, Location, SourceBuckets};
pub use response::{Envelope, ValidationError};
pub use validation::{
    validators, BoundData, FieldRule, Filter, Transform, ValidationSession, ValueType,
};
pub use value::Value;
