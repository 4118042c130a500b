pub mod auth;
pub mod lead_service;
pub mod property_service;
pub mod report_service;
pub mod storage;
