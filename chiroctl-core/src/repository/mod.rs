//! Repository interfaces
//!
//! Each aggregate gets its own trait; [`UnitOfWork`] bundles them behind one
//! transaction and [`Store`] opens units of work. Patterns every
//! implementation follows:
//! - inserts on a natural key report [`RepoError::UniqueViolation`] and leave
//!   the unit of work usable, so callers can fall back to "update existing"
//! - `delete_*` is idempotent; referenced rows fail with
//!   [`RepoError::ForeignKeyViolation`] instead of cascading
//! - dropping a unit of work without `commit` discards its writes

pub mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::{
    Address, EmailAddress, EmergencyContact, Event, EventFilter, Group, MedicalInformation,
    Member, MemberFilter, MemberSummary, Membership, NewAddress, NewAgreement,
    NewEmergencyContact, NewEvent, NewGroup, NewMedicalInformation, NewMember, NewMembership,
    NewPerson, NewSponsor, NewWorkYear, Parent, ParentRelation, PaymentState, Person, Sponsor,
    SponsorshipAgreement, WorkYear,
};
use crate::pagination::{Paginated, Pagination};

pub use memory::MemoryStore;

/// Names of the unique and foreign-key constraints shared by all stores
pub mod constraints {
    pub const ADDRESS_NATURAL_KEY: &str = "addresses_natural_key";
    pub const MEMBER_PERSON: &str = "members_person_id_key";
    pub const PARENT_EMAIL: &str = "parents_email_key";
    pub const PARENT_PERSON: &str = "parents_person_id_key";
    pub const GROUP_NAME: &str = "groups_name_key";
    pub const MEMBERSHIP_PER_YEAR: &str = "memberships_member_work_year_key";
    pub const SPONSOR_NAME: &str = "sponsors_company_name_key";
    pub const AGREEMENT_PER_YEAR: &str = "agreements_sponsor_work_year_key";
    /// Exclusion constraint; PostgreSQL reports it as SQLSTATE 23P01
    pub const WORK_YEAR_OVERLAP: &str = "work_years_no_overlap";

    pub const ADDRESS_IN_USE: &str = "address_referenced";
    pub const PERSON_IN_USE: &str = "person_referenced";
    pub const MEMBER_IN_USE: &str = "member_referenced";
    pub const PARENT_IN_USE: &str = "parent_referenced";
    pub const GROUP_IN_USE: &str = "group_referenced";
    pub const WORK_YEAR_IN_USE: &str = "work_year_referenced";
    pub const SPONSOR_IN_USE: &str = "sponsor_referenced";
}

/// Repository error type
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    #[error("foreign key constraint violated: {constraint}")]
    ForeignKeyViolation { constraint: String },

    #[error("storage error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl RepoError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn unique(constraint: impl Into<String>) -> Self {
        Self::UniqueViolation {
            constraint: constraint.into(),
        }
    }

    pub fn foreign_key(constraint: impl Into<String>) -> Self {
        Self::ForeignKeyViolation {
            constraint: constraint.into(),
        }
    }

    pub fn backend(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Backend(err.into())
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation { .. })
    }
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Rows still pointing at a work-year
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkYearUsage {
    pub memberships: i64,
    pub events: i64,
    pub agreements: i64,
}

impl WorkYearUsage {
    pub fn is_unused(&self) -> bool {
        self.memberships == 0 && self.events == 0 && self.agreements == 0
    }
}

#[async_trait]
pub trait AddressRepository: Send {
    /// Look up an address by its natural key (case-insensitive).
    async fn find_address(&mut self, address: &NewAddress) -> RepoResult<Option<Address>>;
    async fn insert_address(&mut self, address: &NewAddress) -> RepoResult<Address>;
    async fn get_address(&mut self, id: Uuid) -> RepoResult<Option<Address>>;
    /// Number of persons and sponsors pointing at the address.
    async fn address_references(&mut self, id: Uuid) -> RepoResult<i64>;
    async fn delete_address(&mut self, id: Uuid) -> RepoResult<()>;
}

#[async_trait]
pub trait PersonRepository: Send {
    async fn insert_person(&mut self, person: &NewPerson) -> RepoResult<Person>;
    async fn update_person(&mut self, id: Uuid, person: &NewPerson) -> RepoResult<Person>;
    async fn get_person(&mut self, id: Uuid) -> RepoResult<Option<Person>>;
    async fn delete_person(&mut self, id: Uuid) -> RepoResult<()>;
}

#[async_trait]
pub trait MemberRepository: Send {
    /// Find a member by first name, last name (case-insensitive) and birth date.
    async fn find_member_by_identity(
        &mut self,
        first_name: &str,
        last_name: &str,
        birth_date: NaiveDate,
    ) -> RepoResult<Option<Member>>;
    async fn insert_member(&mut self, member: &NewMember) -> RepoResult<Member>;
    async fn update_member(&mut self, id: Uuid, member: &NewMember) -> RepoResult<Member>;
    async fn get_member(&mut self, id: Uuid) -> RepoResult<Option<Member>>;
    /// Members ordered by last name, first name.
    ///
    /// Each row shows the membership of the latest work-year that passes the
    /// filter; with a work-year or group filter, members without such a
    /// membership are left out.
    async fn list_members(
        &mut self,
        filter: MemberFilter,
        page: Pagination,
    ) -> RepoResult<Paginated<MemberSummary>>;
    async fn delete_member(&mut self, id: Uuid) -> RepoResult<()>;

    /// Link a parent; returns `false` when the link already existed.
    async fn link_parent(&mut self, member_id: Uuid, parent_id: Uuid) -> RepoResult<bool>;
    /// Remove all parent links of a member, returning the unlinked parent ids.
    async fn unlink_parents(&mut self, member_id: Uuid) -> RepoResult<Vec<Uuid>>;
    async fn parents_of(&mut self, member_id: Uuid) -> RepoResult<Vec<Parent>>;
    async fn parent_link_count(&mut self, parent_id: Uuid) -> RepoResult<i64>;
}

#[async_trait]
pub trait ParentRepository: Send {
    async fn find_parent_by_email(&mut self, email: &EmailAddress) -> RepoResult<Option<Parent>>;
    async fn insert_parent(
        &mut self,
        person_id: Uuid,
        email: &EmailAddress,
        relation: ParentRelation,
    ) -> RepoResult<Parent>;
    async fn update_parent_relation(
        &mut self,
        id: Uuid,
        relation: ParentRelation,
    ) -> RepoResult<Parent>;
    async fn get_parent(&mut self, id: Uuid) -> RepoResult<Option<Parent>>;
    async fn delete_parent(&mut self, id: Uuid) -> RepoResult<()>;
}

/// Emergency contacts and medical information
#[async_trait]
pub trait CareRepository: Send {
    /// Insert or replace the member's emergency contact.
    async fn upsert_emergency_contact(
        &mut self,
        member_id: Uuid,
        contact: &NewEmergencyContact,
    ) -> RepoResult<EmergencyContact>;
    async fn emergency_contact_of(&mut self, member_id: Uuid)
        -> RepoResult<Option<EmergencyContact>>;
    /// Insert or replace the member's medical information.
    async fn upsert_medical(
        &mut self,
        member_id: Uuid,
        medical: &NewMedicalInformation,
    ) -> RepoResult<MedicalInformation>;
    async fn medical_of(&mut self, member_id: Uuid) -> RepoResult<Option<MedicalInformation>>;
    async fn delete_care_of(&mut self, member_id: Uuid) -> RepoResult<()>;
}

#[async_trait]
pub trait WorkYearRepository: Send {
    async fn insert_work_year(&mut self, work_year: &NewWorkYear) -> RepoResult<WorkYear>;
    async fn update_work_year(&mut self, id: Uuid, work_year: &NewWorkYear)
        -> RepoResult<WorkYear>;
    async fn get_work_year(&mut self, id: Uuid) -> RepoResult<Option<WorkYear>>;
    /// All work-years, newest first.
    async fn list_work_years(&mut self) -> RepoResult<Vec<WorkYear>>;
    async fn work_year_containing(&mut self, date: NaiveDate) -> RepoResult<Option<WorkYear>>;
    async fn overlapping_work_years(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepoResult<Vec<WorkYear>>;
    async fn work_year_usage(&mut self, id: Uuid) -> RepoResult<WorkYearUsage>;
    async fn delete_work_year(&mut self, id: Uuid) -> RepoResult<()>;
}

#[async_trait]
pub trait GroupRepository: Send {
    async fn insert_group(&mut self, group: &NewGroup) -> RepoResult<Group>;
    async fn update_group(&mut self, id: Uuid, group: &NewGroup) -> RepoResult<Group>;
    async fn get_group(&mut self, id: Uuid) -> RepoResult<Option<Group>>;
    /// Groups ordered by minimum age, then name.
    async fn list_groups(&mut self, active_only: bool) -> RepoResult<Vec<Group>>;
    async fn group_membership_count(&mut self, id: Uuid) -> RepoResult<i64>;
    /// Delete a group and drop it from event targets.
    async fn delete_group(&mut self, id: Uuid) -> RepoResult<()>;
}

#[async_trait]
pub trait MembershipRepository: Send {
    async fn find_membership(
        &mut self,
        member_id: Uuid,
        work_year_id: Uuid,
    ) -> RepoResult<Option<Membership>>;
    async fn insert_membership(&mut self, membership: &NewMembership) -> RepoResult<Membership>;
    async fn get_membership(&mut self, id: Uuid) -> RepoResult<Option<Membership>>;
    async fn set_membership_group(&mut self, id: Uuid, group_id: Uuid) -> RepoResult<Membership>;
    async fn set_payment(&mut self, id: Uuid, payment: PaymentState) -> RepoResult<Membership>;
    /// Memberships of a member, newest first.
    async fn memberships_of(&mut self, member_id: Uuid) -> RepoResult<Vec<Membership>>;
    async fn delete_memberships_of(&mut self, member_id: Uuid) -> RepoResult<u64>;
}

#[async_trait]
pub trait EventRepository: Send {
    async fn insert_event(&mut self, work_year_id: Uuid, event: &NewEvent) -> RepoResult<Event>;
    async fn update_event(
        &mut self,
        id: Uuid,
        work_year_id: Uuid,
        event: &NewEvent,
    ) -> RepoResult<Event>;
    async fn get_event(&mut self, id: Uuid) -> RepoResult<Option<Event>>;
    /// Matching events ordered by start.
    async fn list_events(&mut self, filter: EventFilter) -> RepoResult<Vec<Event>>;
    async fn delete_event(&mut self, id: Uuid) -> RepoResult<()>;
}

#[async_trait]
pub trait SponsorRepository: Send {
    async fn insert_sponsor(&mut self, sponsor: &NewSponsor) -> RepoResult<Sponsor>;
    async fn update_sponsor(&mut self, id: Uuid, sponsor: &NewSponsor) -> RepoResult<Sponsor>;
    async fn get_sponsor(&mut self, id: Uuid) -> RepoResult<Option<Sponsor>>;
    /// Sponsors ordered by company name.
    async fn list_sponsors(&mut self) -> RepoResult<Vec<Sponsor>>;
    async fn delete_sponsor(&mut self, id: Uuid) -> RepoResult<()>;

    async fn insert_agreement(&mut self, agreement: &NewAgreement)
        -> RepoResult<SponsorshipAgreement>;
    async fn get_agreement(&mut self, id: Uuid) -> RepoResult<Option<SponsorshipAgreement>>;
    async fn agreements_of(&mut self, sponsor_id: Uuid) -> RepoResult<Vec<SponsorshipAgreement>>;
    async fn set_agreement_paid(&mut self, id: Uuid, paid: bool)
        -> RepoResult<SponsorshipAgreement>;
    async fn delete_agreement(&mut self, id: Uuid) -> RepoResult<()>;
    async fn delete_agreements_of(&mut self, sponsor_id: Uuid) -> RepoResult<()>;
}

/// All repositories behind one transaction
#[async_trait]
pub trait UnitOfWork:
    AddressRepository
    + PersonRepository
    + MemberRepository
    + ParentRepository
    + CareRepository
    + WorkYearRepository
    + GroupRepository
    + MembershipRepository
    + EventRepository
    + SponsorRepository
    + Send
{
    async fn commit(self: Box<Self>) -> RepoResult<()>;
}

/// Opens units of work
#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> RepoResult<Box<dyn UnitOfWork>>;
}
