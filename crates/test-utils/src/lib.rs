pub mod builders;
pub mod fake_launcher;
