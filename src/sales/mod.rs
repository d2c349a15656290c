//! Sale records: the model and its SQLite store.

pub mod model;
pub mod store;

pub use model::{Money, NewSale, Sale, MONEY_MAX_CENTS, PRODUCT_NAME_MAX_LEN};
pub use store::{SaleFilter, SaleStore, SALES_TABLE};
