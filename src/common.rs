pub mod cache;
pub mod db_utils;
pub mod error;
pub mod formatting;
pub mod i18n;
pub mod validation;
