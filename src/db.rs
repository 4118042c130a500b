pub mod user_repo;
pub use user_repo::UserRepository;
pub mod lead_repo;
pub use lead_repo::LeadRepository;
pub mod interaction_repo;
pub use interaction_repo::InteractionRepository;
pub mod property_repo;
pub use property_repo::PropertyRepository;
