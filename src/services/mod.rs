pub mod account_service;
pub mod account_service_impl;
pub mod password;
pub mod token;

pub use account_service::{AccountError, AccountInfo, AccountService, NewAccount, ProfileUpdate};
pub use account_service_impl::SeaOrmAccountService;
