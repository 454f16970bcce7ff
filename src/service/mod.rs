pub mod preference_service;
