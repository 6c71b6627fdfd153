//! Use-cases: multi-step operations over one unit of work
//!
//! Every function takes `&mut dyn UnitOfWork` and leaves committing to the
//! caller, so a failure part-way through rolls back everything:
//!
//! ```no_run
//! # use chiroctl_core::{usecases, MemoryStore, Store};
//! # async fn demo(form: chiroctl_core::domain::RegistrationForm) -> anyhow::Result<()> {
//! let store = MemoryStore::new();
//! let mut uow = store.begin().await?;
//! let today = chrono::Utc::now().date_naive();
//! let outcome = usecases::register_member(uow.as_mut(), &form, today).await?;
//! uow.commit().await?;
//! # let _ = outcome;
//! # Ok(())
//! # }
//! ```
//!
//! Dates that depend on "today" are passed in; callers resolve them in the
//! organization's time zone (see [`crate::ChiroConfig::today`]).

mod address;
mod event;
mod group;
mod member;
mod membership;
mod parent;
mod sponsor;
mod work_year;

pub use address::{create_or_get_address, ensure_address, release_address};
pub use event::{create_event, delete_event, get_event, list_events, update_event};
pub use group::{
    create_group, delete_group, get_group, list_groups, resolve_group, update_group,
};
pub use member::{
    delete_member, list_members, member_details, register_member, renew_membership,
    update_member,
};
pub use membership::{change_group, clear_payment, record_payment, Enrollment};
pub use parent::{create_or_update_parent, upsert_parent};
pub use sponsor::{
    add_agreement, create_sponsor, delete_sponsor, get_sponsor, list_sponsors,
    mark_agreement_paid, remove_agreement, update_sponsor,
};
pub use work_year::{
    create_work_year, current_work_year, delete_work_year, get_work_year, list_work_years,
    update_work_year, work_year_for_date,
};
