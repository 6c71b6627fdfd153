//! Domain models with validation at construction
//!
//! All user input arrives as `*Form` structs and is validated into the
//! `New*` / `*Profile` types the repositories accept. Invalid input returns
//! `ValidationError`, not panic.

pub mod address;
pub mod care;
pub mod contact;
pub mod event;
pub mod group;
pub mod kinds;
pub mod membership;
pub mod money;
pub mod person;
pub mod registration;
pub mod sponsor;
pub mod validation;
pub mod work_year;

pub use address::{Address, AddressForm, HouseNumber, NewAddress, PostalCode};
pub use care::{
    EmergencyContact, EmergencyContactForm, MedicalForm, MedicalInformation,
    NewEmergencyContact, NewMedicalInformation,
};
pub use contact::{EmailAddress, PersonName, PhoneNumber};
pub use event::{Event, EventFilter, EventForm, NewEvent};
pub use group::{resolve_group, Group, GroupForm, NewGroup};
pub use kinds::{Gender, ParentRelation, PaymentMethod, SponsorshipKind};
pub use membership::{
    MemberFilter, MemberSummary, Membership, NewMembership, PaymentForm, PaymentState,
};
pub use money::Amount;
pub use person::{
    Member, MemberForm, MemberProfile, NewMember, NewPerson, Parent, ParentForm, ParentProfile,
    ParentView, Person,
};
pub use registration::{MemberDetails, Registration, RegistrationForm, RegistrationOutcome};
pub use sponsor::{
    AgreementForm, NewAgreement, NewSponsor, Sponsor, SponsorForm, SponsorProfile, SponsorView,
    SponsorshipAgreement,
};
pub use validation::ValidationError;
pub use work_year::{NewWorkYear, WorkYear, WorkYearForm};
