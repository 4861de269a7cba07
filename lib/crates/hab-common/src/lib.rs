pub mod bind;
pub mod error;
pub mod ident;
pub mod request;
pub mod types;

pub use bind::Bind;
pub use error::ModelError;
pub use ident::{PackageIdent, service_key_name};
pub use request::{ProvisioningRequest, ServiceDeclaration};
pub use types::*;
