pub mod account;
pub mod donor;
pub mod enums;
pub mod filters;
pub mod urgent_request;

pub use account::*;
pub use donor::*;
pub use filters::*;
pub use urgent_request::*;
