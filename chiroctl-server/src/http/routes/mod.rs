//! Route handlers organized by resource
//!
//! Every handler runs its use-case inside one unit of work and commits only
//! when the use-case succeeds.

pub mod events;
pub mod groups;
pub mod health;
pub mod members;
pub mod memberships;
pub mod sponsors;
pub mod work_years;
