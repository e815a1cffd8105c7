// Governance rules over the user record.
// Every function here is pure: callers pass the snapshot and the instant.

pub mod compatibility;
pub mod contact_throttle;
pub mod edit_policy;
pub mod password_reset;
pub mod premium;

pub use compatibility::{classify, compute_compatibility, MatchBucket};
pub use contact_throttle::{ContactPolicy, ContactQuotas, ContactUsage};
pub use edit_policy::{apply_edit, evaluate_edit, EditCategory, EditDecision, ProfileEdit};
pub use premium::{PlanState, PremiumDuration};
