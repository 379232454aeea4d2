pub mod dispatch;
pub mod export;
pub mod load;
pub mod schema;
pub mod validate;
