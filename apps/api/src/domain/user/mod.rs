// User domain module
// Contains the user aggregate and its value objects

pub mod profile;
pub mod value_objects;

pub use profile::{
    ContactCounter, EditMarkers, NewUser, PasswordResetState, PremiumState, UserProfile,
};
pub use value_objects::{Email, Grade, Location, Phone, SalaryLevel, Sector};
