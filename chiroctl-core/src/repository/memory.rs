//! In-process store for tests and `serve --in-memory`
//!
//! A unit of work holds the store lock from `begin` until it commits or is
//! dropped, so units of work run one after another. It edits a copy of the
//! tables that replaces the shared ones on commit. Unique and foreign-key
//! rules mirror the PostgreSQL schema so use-cases behave the same on both.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{
    constraints, AddressRepository, CareRepository, EventRepository, GroupRepository,
    MemberRepository, MembershipRepository, ParentRepository, PersonRepository, RepoError,
    RepoResult, SponsorRepository, Store, UnitOfWork, WorkYearRepository, WorkYearUsage,
};
use crate::domain::{
    Address, EmailAddress, EmergencyContact, Event, EventFilter, Group, MedicalInformation,
    Member, MemberFilter, MemberSummary, Membership, NewAddress, NewAgreement,
    NewEmergencyContact, NewEvent, NewGroup, NewMedicalInformation, NewMember, NewMembership,
    NewPerson, NewSponsor, NewWorkYear, Parent, ParentRelation, PaymentState, Person, Sponsor,
    SponsorshipAgreement, WorkYear,
};
use crate::domain::validation::same_text;
use crate::pagination::{Paginated, Pagination};

#[derive(Debug, Clone, Default)]
struct Tables {
    addresses: BTreeMap<Uuid, Address>,
    persons: BTreeMap<Uuid, Person>,
    members: BTreeMap<Uuid, Member>,
    parents: BTreeMap<Uuid, Parent>,
    member_parents: BTreeSet<(Uuid, Uuid)>,
    emergency_contacts: BTreeMap<Uuid, EmergencyContact>,
    medical: BTreeMap<Uuid, MedicalInformation>,
    work_years: BTreeMap<Uuid, WorkYear>,
    groups: BTreeMap<Uuid, Group>,
    memberships: BTreeMap<Uuid, Membership>,
    events: BTreeMap<Uuid, Event>,
    sponsors: BTreeMap<Uuid, Sponsor>,
    agreements: BTreeMap<Uuid, SponsorshipAgreement>,
}

/// Shared in-memory tables
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Exclusive access to the store plus the tables as this unit of work sees them
pub struct MemoryUnitOfWork {
    shared: OwnedMutexGuard<Tables>,
    working: Tables,
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> RepoResult<Box<dyn UnitOfWork>> {
        let shared = Arc::clone(&self.tables).lock_owned().await;
        let working = shared.clone();
        Ok(Box::new(MemoryUnitOfWork { shared, working }))
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn commit(self: Box<Self>) -> RepoResult<()> {
        let MemoryUnitOfWork { mut shared, working } = *self;
        *shared = working;
        Ok(())
    }
}

fn fetch<T: Clone>(table: &BTreeMap<Uuid, T>, resource: &'static str, id: Uuid) -> RepoResult<T> {
    table
        .get(&id)
        .cloned()
        .ok_or_else(|| RepoError::not_found(resource, id))
}

fn entry<'a, T>(
    table: &'a mut BTreeMap<Uuid, T>,
    resource: &'static str,
    id: Uuid,
) -> RepoResult<&'a mut T> {
    table
        .get_mut(&id)
        .ok_or_else(|| RepoError::not_found(resource, id))
}

impl MemoryUnitOfWork {
    /// Same rule as the `work_years_no_overlap` exclusion constraint
    fn reject_overlap(&self, work_year: &NewWorkYear, except: Option<Uuid>) -> RepoResult<()> {
        let clash = self.working.work_years.values().any(|wy| {
            Some(wy.id) != except && wy.overlaps(work_year.start_date, work_year.end_date)
        });
        if clash {
            return Err(RepoError::unique(constraints::WORK_YEAR_OVERLAP));
        }
        Ok(())
    }
}

#[async_trait]
impl AddressRepository for MemoryUnitOfWork {
    async fn find_address(&mut self, address: &NewAddress) -> RepoResult<Option<Address>> {
        Ok(self
            .working
            .addresses
            .values()
            .find(|a| address.same_place(a))
            .cloned())
    }

    async fn insert_address(&mut self, address: &NewAddress) -> RepoResult<Address> {
        if self.working.addresses.values().any(|a| address.same_place(a)) {
            return Err(RepoError::unique(constraints::ADDRESS_NATURAL_KEY));
        }
        let row = Address::from_new(Uuid::new_v4(), address);
        self.working.addresses.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_address(&mut self, id: Uuid) -> RepoResult<Option<Address>> {
        Ok(self.working.addresses.get(&id).cloned())
    }

    async fn address_references(&mut self, id: Uuid) -> RepoResult<i64> {
        let persons = self
            .working
            .persons
            .values()
            .filter(|p| p.address_id == Some(id))
            .count();
        let sponsors = self
            .working
            .sponsors
            .values()
            .filter(|s| s.address_id == Some(id))
            .count();
        Ok((persons + sponsors) as i64)
    }

    async fn delete_address(&mut self, id: Uuid) -> RepoResult<()> {
        if self.address_references(id).await? > 0 {
            return Err(RepoError::foreign_key(constraints::ADDRESS_IN_USE));
        }
        self.working.addresses.remove(&id);
        Ok(())
    }
}

impl MemoryUnitOfWork {
    fn check_address(&self, address_id: Option<Uuid>) -> RepoResult<()> {
        match address_id {
            Some(id) if !self.working.addresses.contains_key(&id) => {
                Err(RepoError::foreign_key("persons_address_id_fkey"))
            }
            _ => Ok(()),
        }
    }

    fn summary(&self, member: &Member, membership: Option<&Membership>) -> Option<MemberSummary> {
        let person = self.working.persons.get(&member.person_id)?;
        Some(MemberSummary {
            member_id: member.id,
            first_name: person.first_name.clone(),
            last_name: person.last_name.clone(),
            gender: member.gender,
            birth_date: member.birth_date,
            membership_id: membership.map(|m| m.id),
            group_id: membership.map(|m| m.group_id),
            group_name: membership
                .and_then(|m| self.working.groups.get(&m.group_id))
                .map(|g| g.name.clone()),
            paid: membership.map(|m| m.paid),
        })
    }

    fn work_year_start(&self, id: Uuid) -> Option<NaiveDate> {
        self.working.work_years.get(&id).map(|wy| wy.start_date)
    }
}

#[async_trait]
impl PersonRepository for MemoryUnitOfWork {
    async fn insert_person(&mut self, person: &NewPerson) -> RepoResult<Person> {
        self.check_address(person.address_id)?;
        let row = Person::from_new(Uuid::new_v4(), person);
        self.working.persons.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_person(&mut self, id: Uuid, person: &NewPerson) -> RepoResult<Person> {
        self.check_address(person.address_id)?;
        let row = entry(&mut self.working.persons, "person", id)?;
        *row = Person::from_new(id, person);
        Ok(row.clone())
    }

    async fn get_person(&mut self, id: Uuid) -> RepoResult<Option<Person>> {
        Ok(self.working.persons.get(&id).cloned())
    }

    async fn delete_person(&mut self, id: Uuid) -> RepoResult<()> {
        let referenced = self.working.members.values().any(|m| m.person_id == id)
            || self.working.parents.values().any(|p| p.person_id == id);
        if referenced {
            return Err(RepoError::foreign_key(constraints::PERSON_IN_USE));
        }
        self.working.persons.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl MemberRepository for MemoryUnitOfWork {
    async fn find_member_by_identity(
        &mut self,
        first_name: &str,
        last_name: &str,
        birth_date: NaiveDate,
    ) -> RepoResult<Option<Member>> {
        let persons = &self.working.persons;
        Ok(self
            .working
            .members
            .values()
            .find(|m| {
                m.birth_date == birth_date
                    && persons.get(&m.person_id).is_some_and(|p| {
                        p.first_name.to_lowercase() == first_name.to_lowercase()
                            && p.last_name.to_lowercase() == last_name.to_lowercase()
                    })
            })
            .cloned())
    }

    async fn insert_member(&mut self, member: &NewMember) -> RepoResult<Member> {
        if !self.working.persons.contains_key(&member.person_id) {
            return Err(RepoError::foreign_key("members_person_id_fkey"));
        }
        if self
            .working
            .members
            .values()
            .any(|m| m.person_id == member.person_id)
        {
            return Err(RepoError::unique(constraints::MEMBER_PERSON));
        }
        let row = Member {
            id: Uuid::new_v4(),
            person_id: member.person_id,
            gender: member.gender,
            birth_date: member.birth_date,
            photo_permission: member.photo_permission,
            created_at: Utc::now(),
        };
        self.working.members.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_member(&mut self, id: Uuid, member: &NewMember) -> RepoResult<Member> {
        let row = entry(&mut self.working.members, "member", id)?;
        row.gender = member.gender;
        row.birth_date = member.birth_date;
        row.photo_permission = member.photo_permission;
        Ok(row.clone())
    }

    async fn get_member(&mut self, id: Uuid) -> RepoResult<Option<Member>> {
        Ok(self.working.members.get(&id).cloned())
    }

    async fn list_members(
        &mut self,
        filter: MemberFilter,
        page: Pagination,
    ) -> RepoResult<Paginated<MemberSummary>> {
        let filtering = filter.work_year_id.is_some() || filter.group_id.is_some();
        let mut rows: Vec<MemberSummary> = self
            .working
            .members
            .values()
            .filter_map(|member| {
                let latest = self
                    .working
                    .memberships
                    .values()
                    .filter(|ms| ms.member_id == member.id)
                    .filter(|ms| filter.work_year_id.map_or(true, |wy| ms.work_year_id == wy))
                    .filter(|ms| filter.group_id.map_or(true, |g| ms.group_id == g))
                    .max_by_key(|ms| self.work_year_start(ms.work_year_id));
                if filtering && latest.is_none() {
                    return None;
                }
                self.summary(member, latest)
            })
            .collect();
        rows.sort_by(|a, b| {
            a.last_name
                .to_lowercase()
                .cmp(&b.last_name.to_lowercase())
                .then_with(|| a.first_name.to_lowercase().cmp(&b.first_name.to_lowercase()))
                .then(a.member_id.cmp(&b.member_id))
        });
        Ok(page.slice(rows))
    }

    async fn delete_member(&mut self, id: Uuid) -> RepoResult<()> {
        let referenced = self.working.memberships.values().any(|m| m.member_id == id)
            || self.working.emergency_contacts.contains_key(&id)
            || self.working.medical.contains_key(&id)
            || self.working.member_parents.iter().any(|(m, _)| *m == id);
        if referenced {
            return Err(RepoError::foreign_key(constraints::MEMBER_IN_USE));
        }
        self.working.members.remove(&id);
        Ok(())
    }

    async fn link_parent(&mut self, member_id: Uuid, parent_id: Uuid) -> RepoResult<bool> {
        if !self.working.members.contains_key(&member_id)
            || !self.working.parents.contains_key(&parent_id)
        {
            return Err(RepoError::foreign_key("member_parents_fkey"));
        }
        Ok(self.working.member_parents.insert((member_id, parent_id)))
    }

    async fn unlink_parents(&mut self, member_id: Uuid) -> RepoResult<Vec<Uuid>> {
        let linked: Vec<(Uuid, Uuid)> = self
            .working
            .member_parents
            .iter()
            .filter(|(m, _)| *m == member_id)
            .copied()
            .collect();
        for link in &linked {
            self.working.member_parents.remove(link);
        }
        Ok(linked.into_iter().map(|(_, p)| p).collect())
    }

    async fn parents_of(&mut self, member_id: Uuid) -> RepoResult<Vec<Parent>> {
        Ok(self
            .working
            .member_parents
            .iter()
            .filter(|(m, _)| *m == member_id)
            .filter_map(|(_, p)| self.working.parents.get(p).cloned())
            .collect())
    }

    async fn parent_link_count(&mut self, parent_id: Uuid) -> RepoResult<i64> {
        Ok(self
            .working
            .member_parents
            .iter()
            .filter(|(_, p)| *p == parent_id)
            .count() as i64)
    }
}

#[async_trait]
impl ParentRepository for MemoryUnitOfWork {
    async fn find_parent_by_email(&mut self, email: &EmailAddress) -> RepoResult<Option<Parent>> {
        Ok(self
            .working
            .parents
            .values()
            .find(|p| p.email == email.as_str())
            .cloned())
    }

    async fn insert_parent(
        &mut self,
        person_id: Uuid,
        email: &EmailAddress,
        relation: ParentRelation,
    ) -> RepoResult<Parent> {
        if !self.working.persons.contains_key(&person_id) {
            return Err(RepoError::foreign_key("parents_person_id_fkey"));
        }
        if self.working.parents.values().any(|p| p.email == email.as_str()) {
            return Err(RepoError::unique(constraints::PARENT_EMAIL));
        }
        if self.working.parents.values().any(|p| p.person_id == person_id) {
            return Err(RepoError::unique(constraints::PARENT_PERSON));
        }
        let row = Parent {
            id: Uuid::new_v4(),
            person_id,
            email: email.as_str().to_owned(),
            relation,
        };
        self.working.parents.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_parent_relation(
        &mut self,
        id: Uuid,
        relation: ParentRelation,
    ) -> RepoResult<Parent> {
        let row = entry(&mut self.working.parents, "parent", id)?;
        row.relation = relation;
        Ok(row.clone())
    }

    async fn get_parent(&mut self, id: Uuid) -> RepoResult<Option<Parent>> {
        Ok(self.working.parents.get(&id).cloned())
    }

    async fn delete_parent(&mut self, id: Uuid) -> RepoResult<()> {
        if self.working.member_parents.iter().any(|(_, p)| *p == id) {
            return Err(RepoError::foreign_key(constraints::PARENT_IN_USE));
        }
        self.working.parents.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl CareRepository for MemoryUnitOfWork {
    async fn upsert_emergency_contact(
        &mut self,
        member_id: Uuid,
        contact: &NewEmergencyContact,
    ) -> RepoResult<EmergencyContact> {
        if !self.working.members.contains_key(&member_id) {
            return Err(RepoError::foreign_key("emergency_contacts_member_id_fkey"));
        }
        let id = self
            .working
            .emergency_contacts
            .get(&member_id)
            .map_or_else(Uuid::new_v4, |c| c.id);
        let row = EmergencyContact::from_new(id, member_id, contact);
        self.working.emergency_contacts.insert(member_id, row.clone());
        Ok(row)
    }

    async fn emergency_contact_of(
        &mut self,
        member_id: Uuid,
    ) -> RepoResult<Option<EmergencyContact>> {
        Ok(self.working.emergency_contacts.get(&member_id).cloned())
    }

    async fn upsert_medical(
        &mut self,
        member_id: Uuid,
        medical: &NewMedicalInformation,
    ) -> RepoResult<MedicalInformation> {
        if !self.working.members.contains_key(&member_id) {
            return Err(RepoError::foreign_key("medical_information_member_id_fkey"));
        }
        let id = self
            .working
            .medical
            .get(&member_id)
            .map_or_else(Uuid::new_v4, |m| m.id);
        let row = MedicalInformation::from_new(id, member_id, medical);
        self.working.medical.insert(member_id, row.clone());
        Ok(row)
    }

    async fn medical_of(&mut self, member_id: Uuid) -> RepoResult<Option<MedicalInformation>> {
        Ok(self.working.medical.get(&member_id).cloned())
    }

    async fn delete_care_of(&mut self, member_id: Uuid) -> RepoResult<()> {
        self.working.emergency_contacts.remove(&member_id);
        self.working.medical.remove(&member_id);
        Ok(())
    }
}

#[async_trait]
impl WorkYearRepository for MemoryUnitOfWork {
    async fn insert_work_year(&mut self, work_year: &NewWorkYear) -> RepoResult<WorkYear> {
        self.reject_overlap(work_year, None)?;
        let row = WorkYear::from_new(Uuid::new_v4(), work_year);
        self.working.work_years.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_work_year(
        &mut self,
        id: Uuid,
        work_year: &NewWorkYear,
    ) -> RepoResult<WorkYear> {
        self.reject_overlap(work_year, Some(id))?;
        let row = entry(&mut self.working.work_years, "work-year", id)?;
        *row = WorkYear::from_new(id, work_year);
        Ok(row.clone())
    }

    async fn get_work_year(&mut self, id: Uuid) -> RepoResult<Option<WorkYear>> {
        Ok(self.working.work_years.get(&id).cloned())
    }

    async fn list_work_years(&mut self) -> RepoResult<Vec<WorkYear>> {
        let mut rows: Vec<WorkYear> = self.working.work_years.values().cloned().collect();
        rows.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(rows)
    }

    async fn work_year_containing(&mut self, date: NaiveDate) -> RepoResult<Option<WorkYear>> {
        Ok(self
            .working
            .work_years
            .values()
            .filter(|wy| wy.contains(date))
            .max_by_key(|wy| wy.start_date)
            .cloned())
    }

    async fn overlapping_work_years(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepoResult<Vec<WorkYear>> {
        Ok(self
            .working
            .work_years
            .values()
            .filter(|wy| wy.overlaps(start, end))
            .cloned()
            .collect())
    }

    async fn work_year_usage(&mut self, id: Uuid) -> RepoResult<WorkYearUsage> {
        let t = &self.working;
        Ok(WorkYearUsage {
            memberships: t.memberships.values().filter(|m| m.work_year_id == id).count() as i64,
            events: t.events.values().filter(|e| e.work_year_id == id).count() as i64,
            agreements: t.agreements.values().filter(|a| a.work_year_id == id).count() as i64,
        })
    }

    async fn delete_work_year(&mut self, id: Uuid) -> RepoResult<()> {
        if !self.work_year_usage(id).await?.is_unused() {
            return Err(RepoError::foreign_key(constraints::WORK_YEAR_IN_USE));
        }
        self.working.work_years.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl GroupRepository for MemoryUnitOfWork {
    async fn insert_group(&mut self, group: &NewGroup) -> RepoResult<Group> {
        if self.working.groups.values().any(|g| same_text(&g.name, &group.name)) {
            return Err(RepoError::unique(constraints::GROUP_NAME));
        }
        let row = Group::from_new(Uuid::new_v4(), group);
        self.working.groups.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_group(&mut self, id: Uuid, group: &NewGroup) -> RepoResult<Group> {
        if self
            .working
            .groups
            .values()
            .any(|g| g.id != id && same_text(&g.name, &group.name))
        {
            return Err(RepoError::unique(constraints::GROUP_NAME));
        }
        let row = entry(&mut self.working.groups, "group", id)?;
        *row = Group::from_new(id, group);
        Ok(row.clone())
    }

    async fn get_group(&mut self, id: Uuid) -> RepoResult<Option<Group>> {
        Ok(self.working.groups.get(&id).cloned())
    }

    async fn list_groups(&mut self, active_only: bool) -> RepoResult<Vec<Group>> {
        let mut rows: Vec<Group> = self
            .working
            .groups
            .values()
            .filter(|g| !active_only || g.active)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.min_age.cmp(&b.min_age).then_with(|| a.name.cmp(&b.name)));
        Ok(rows)
    }

    async fn group_membership_count(&mut self, id: Uuid) -> RepoResult<i64> {
        Ok(self
            .working
            .memberships
            .values()
            .filter(|m| m.group_id == id)
            .count() as i64)
    }

    async fn delete_group(&mut self, id: Uuid) -> RepoResult<()> {
        if self.group_membership_count(id).await? > 0 {
            return Err(RepoError::foreign_key(constraints::GROUP_IN_USE));
        }
        for event in self.working.events.values_mut() {
            event.group_ids.retain(|g| *g != id);
        }
        self.working.groups.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl MembershipRepository for MemoryUnitOfWork {
    async fn find_membership(
        &mut self,
        member_id: Uuid,
        work_year_id: Uuid,
    ) -> RepoResult<Option<Membership>> {
        Ok(self
            .working
            .memberships
            .values()
            .find(|m| m.member_id == member_id && m.work_year_id == work_year_id)
            .cloned())
    }

    async fn insert_membership(&mut self, membership: &NewMembership) -> RepoResult<Membership> {
        let t = &self.working;
        if !t.members.contains_key(&membership.member_id)
            || !t.work_years.contains_key(&membership.work_year_id)
            || !t.groups.contains_key(&membership.group_id)
        {
            return Err(RepoError::foreign_key("memberships_fkey"));
        }
        if self
            .find_membership(membership.member_id, membership.work_year_id)
            .await?
            .is_some()
        {
            return Err(RepoError::unique(constraints::MEMBERSHIP_PER_YEAR));
        }
        let row = Membership {
            id: Uuid::new_v4(),
            member_id: membership.member_id,
            work_year_id: membership.work_year_id,
            group_id: membership.group_id,
            paid: false,
            paid_on: None,
            payment_method: None,
            created_at: Utc::now(),
        };
        self.working.memberships.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_membership(&mut self, id: Uuid) -> RepoResult<Option<Membership>> {
        Ok(self.working.memberships.get(&id).cloned())
    }

    async fn set_membership_group(&mut self, id: Uuid, group_id: Uuid) -> RepoResult<Membership> {
        if !self.working.groups.contains_key(&group_id) {
            return Err(RepoError::foreign_key("memberships_group_id_fkey"));
        }
        let row = entry(&mut self.working.memberships, "membership", id)?;
        row.group_id = group_id;
        Ok(row.clone())
    }

    async fn set_payment(&mut self, id: Uuid, payment: PaymentState) -> RepoResult<Membership> {
        let row = entry(&mut self.working.memberships, "membership", id)?;
        row.paid = payment.paid;
        row.paid_on = payment.paid_on;
        row.payment_method = payment.payment_method;
        Ok(row.clone())
    }

    async fn memberships_of(&mut self, member_id: Uuid) -> RepoResult<Vec<Membership>> {
        let mut rows: Vec<Membership> = self
            .working
            .memberships
            .values()
            .filter(|m| m.member_id == member_id)
            .cloned()
            .collect();
        rows.sort_by_key(|m| std::cmp::Reverse(self.work_year_start(m.work_year_id)));
        Ok(rows)
    }

    async fn delete_memberships_of(&mut self, member_id: Uuid) -> RepoResult<u64> {
        let before = self.working.memberships.len();
        self.working.memberships.retain(|_, m| m.member_id != member_id);
        Ok((before - self.working.memberships.len()) as u64)
    }
}

#[async_trait]
impl EventRepository for MemoryUnitOfWork {
    async fn insert_event(&mut self, work_year_id: Uuid, event: &NewEvent) -> RepoResult<Event> {
        if !self.working.work_years.contains_key(&work_year_id) {
            return Err(RepoError::foreign_key("events_work_year_id_fkey"));
        }
        let row = Event::from_new(Uuid::new_v4(), work_year_id, event);
        self.working.events.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_event(
        &mut self,
        id: Uuid,
        work_year_id: Uuid,
        event: &NewEvent,
    ) -> RepoResult<Event> {
        if !self.working.work_years.contains_key(&work_year_id) {
            return Err(RepoError::foreign_key("events_work_year_id_fkey"));
        }
        let row = entry(&mut self.working.events, "event", id)?;
        *row = Event::from_new(id, work_year_id, event);
        Ok(row.clone())
    }

    async fn get_event(&mut self, id: Uuid) -> RepoResult<Option<Event>> {
        Ok(self.working.events.get(&id).cloned())
    }

    async fn list_events(&mut self, filter: EventFilter) -> RepoResult<Vec<Event>> {
        let mut rows: Vec<Event> = self
            .working
            .events
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.starts_at.cmp(&b.starts_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn delete_event(&mut self, id: Uuid) -> RepoResult<()> {
        self.working.events.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl SponsorRepository for MemoryUnitOfWork {
    async fn insert_sponsor(&mut self, sponsor: &NewSponsor) -> RepoResult<Sponsor> {
        self.check_address(sponsor.address_id)?;
        if self
            .working
            .sponsors
            .values()
            .any(|s| same_text(&s.company_name, &sponsor.company_name))
        {
            return Err(RepoError::unique(constraints::SPONSOR_NAME));
        }
        let row = Sponsor::from_new(Uuid::new_v4(), sponsor);
        self.working.sponsors.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_sponsor(&mut self, id: Uuid, sponsor: &NewSponsor) -> RepoResult<Sponsor> {
        self.check_address(sponsor.address_id)?;
        if self
            .working
            .sponsors
            .values()
            .any(|s| s.id != id && same_text(&s.company_name, &sponsor.company_name))
        {
            return Err(RepoError::unique(constraints::SPONSOR_NAME));
        }
        let row = entry(&mut self.working.sponsors, "sponsor", id)?;
        *row = Sponsor::from_new(id, sponsor);
        Ok(row.clone())
    }

    async fn get_sponsor(&mut self, id: Uuid) -> RepoResult<Option<Sponsor>> {
        Ok(self.working.sponsors.get(&id).cloned())
    }

    async fn list_sponsors(&mut self) -> RepoResult<Vec<Sponsor>> {
        let mut rows: Vec<Sponsor> = self.working.sponsors.values().cloned().collect();
        rows.sort_by(|a, b| a.company_name.cmp(&b.company_name));
        Ok(rows)
    }

    async fn delete_sponsor(&mut self, id: Uuid) -> RepoResult<()> {
        if self.working.agreements.values().any(|a| a.sponsor_id == id) {
            return Err(RepoError::foreign_key(constraints::SPONSOR_IN_USE));
        }
        self.working.sponsors.remove(&id);
        Ok(())
    }

    async fn insert_agreement(
        &mut self,
        agreement: &NewAgreement,
    ) -> RepoResult<SponsorshipAgreement> {
        if !self.working.sponsors.contains_key(&agreement.sponsor_id)
            || !self.working.work_years.contains_key(&agreement.work_year_id)
        {
            return Err(RepoError::foreign_key("agreements_fkey"));
        }
        if self.working.agreements.values().any(|a| {
            a.sponsor_id == agreement.sponsor_id && a.work_year_id == agreement.work_year_id
        }) {
            return Err(RepoError::unique(constraints::AGREEMENT_PER_YEAR));
        }
        let row = SponsorshipAgreement::from_new(Uuid::new_v4(), agreement);
        self.working.agreements.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_agreement(&mut self, id: Uuid) -> RepoResult<Option<SponsorshipAgreement>> {
        Ok(self.working.agreements.get(&id).cloned())
    }

    async fn agreements_of(&mut self, sponsor_id: Uuid) -> RepoResult<Vec<SponsorshipAgreement>> {
        let mut rows: Vec<SponsorshipAgreement> = self
            .working
            .agreements
            .values()
            .filter(|a| a.sponsor_id == sponsor_id)
            .cloned()
            .collect();
        rows.sort_by_key(|a| std::cmp::Reverse(self.work_year_start(a.work_year_id)));
        Ok(rows)
    }

    async fn set_agreement_paid(
        &mut self,
        id: Uuid,
        paid: bool,
    ) -> RepoResult<SponsorshipAgreement> {
        let row = entry(&mut self.working.agreements, "agreement", id)?;
        row.paid = paid;
        Ok(row.clone())
    }

    async fn delete_agreement(&mut self, id: Uuid) -> RepoResult<()> {
        self.working.agreements.remove(&id);
        Ok(())
    }

    async fn delete_agreements_of(&mut self, sponsor_id: Uuid) -> RepoResult<()> {
        self.working.agreements.retain(|_, a| a.sponsor_id != sponsor_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AddressForm;

    fn address() -> NewAddress {
        AddressForm {
            street: "Kerkstraat".into(),
            house_number: "12".into(),
            bus: None,
            postal_code: "9000".into(),
            municipality: "Gent".into(),
        }
        .validate()
        .unwrap()
    }

    fn dorpsstraat() -> NewAddress {
        AddressForm {
            street: "Dorpsstraat".into(),
            house_number: "3".into(),
            bus: None,
            postal_code: "2000".into(),
            municipality: "Antwerpen".into(),
        }
        .validate()
        .unwrap()
    }

    #[tokio::test]
    async fn uncommitted_writes_are_discarded() {
        let store = MemoryStore::new();
        {
            let mut uow = store.begin().await.unwrap();
            uow.insert_address(&address()).await.unwrap();
        }
        let mut uow = store.begin().await.unwrap();
        assert!(uow.find_address(&address()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn committed_writes_are_visible() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        let inserted = uow.insert_address(&address()).await.unwrap();
        uow.commit().await.unwrap();

        let mut uow = store.begin().await.unwrap();
        assert_eq!(uow.find_address(&address()).await.unwrap(), Some(inserted));
    }

    #[tokio::test]
    async fn overlapping_units_of_work_keep_both_commits() {
        let store = MemoryStore::new();
        let mut first = store.begin().await.unwrap();
        first.insert_address(&address()).await.unwrap();

        let other = store.clone();
        let second = tokio::spawn(async move {
            let mut uow = other.begin().await.unwrap();
            let inserted = uow.insert_address(&dorpsstraat()).await.unwrap();
            uow.commit().await.unwrap();
            inserted
        });
        tokio::task::yield_now().await;
        first.commit().await.unwrap();
        let dorpsstraat_row = second.await.unwrap();

        let mut uow = store.begin().await.unwrap();
        assert!(uow.find_address(&address()).await.unwrap().is_some());
        assert_eq!(
            uow.find_address(&dorpsstraat()).await.unwrap(),
            Some(dorpsstraat_row)
        );
    }

    #[tokio::test]
    async fn concurrent_duplicate_insert_is_unique_violation() {
        let store = MemoryStore::new();
        let mut first = store.begin().await.unwrap();
        first.insert_address(&address()).await.unwrap();

        let other = store.clone();
        let second = tokio::spawn(async move {
            let mut uow = other.begin().await.unwrap();
            uow.insert_address(&address()).await
        });
        tokio::task::yield_now().await;
        first.commit().await.unwrap();

        assert!(second.await.unwrap().unwrap_err().is_unique_violation());
    }

    #[tokio::test]
    async fn overlapping_work_year_is_unique_violation() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        let year = |start: i32| NewWorkYear {
            name: format!("{start}-{}", start + 1),
            start_date: NaiveDate::from_ymd_opt(start, 9, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(start + 1, 8, 31).unwrap(),
            membership_fee: crate::domain::Amount::default(),
        };
        let current = uow.insert_work_year(&year(2025)).await.unwrap();
        uow.insert_work_year(&year(2026)).await.unwrap();

        let mut shifted = year(2026);
        shifted.start_date = NaiveDate::from_ymd_opt(2026, 8, 31).unwrap();
        assert!(matches!(
            uow.insert_work_year(&shifted).await.unwrap_err(),
            RepoError::UniqueViolation { constraint } if constraint == constraints::WORK_YEAR_OVERLAP
        ));
        // the row itself is not a clash
        uow.update_work_year(current.id, &year(2025)).await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_address_is_unique_violation() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        uow.insert_address(&address()).await.unwrap();
        let err = uow.insert_address(&address()).await.unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn referenced_address_cannot_be_deleted() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        let address = uow.insert_address(&address()).await.unwrap();
        uow.insert_person(&NewPerson {
            first_name: crate::domain::PersonName::new("Jan").unwrap(),
            last_name: crate::domain::PersonName::new("Peeters").unwrap(),
            email: None,
            phone: None,
            address_id: Some(address.id),
        })
        .await
        .unwrap();

        assert!(matches!(
            uow.delete_address(address.id).await.unwrap_err(),
            RepoError::ForeignKeyViolation { .. }
        ));
    }
}
