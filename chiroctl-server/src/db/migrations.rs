//! Schema migrations
//!
//! Every statement is idempotent, so `run` is safe on each start-up.
//! Unique constraints carry the names in `chiroctl_core::repository::constraints`.

use sqlx::PgPool;

const TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS addresses (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        street TEXT NOT NULL,
        house_number TEXT NOT NULL,
        bus TEXT,
        postal_code TEXT NOT NULL,
        municipality TEXT NOT NULL
    )
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS addresses_natural_key ON addresses (
        lower(street), lower(house_number), lower(coalesce(bus, '')),
        postal_code, lower(municipality)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS persons (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        email TEXT,
        phone TEXT,
        address_id UUID REFERENCES addresses(id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS members (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        person_id UUID NOT NULL REFERENCES persons(id),
        gender TEXT NOT NULL,
        birth_date DATE NOT NULL,
        photo_permission BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CONSTRAINT members_person_id_key UNIQUE (person_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS parents (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        person_id UUID NOT NULL REFERENCES persons(id),
        email TEXT NOT NULL,
        relation TEXT NOT NULL,
        CONSTRAINT parents_person_id_key UNIQUE (person_id),
        CONSTRAINT parents_email_key UNIQUE (email)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS member_parents (
        member_id UUID NOT NULL REFERENCES members(id),
        parent_id UUID NOT NULL REFERENCES parents(id),
        PRIMARY KEY (member_id, parent_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS emergency_contacts (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        member_id UUID NOT NULL UNIQUE REFERENCES members(id),
        name TEXT NOT NULL,
        phone TEXT NOT NULL,
        relation TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS medical_information (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        member_id UUID NOT NULL UNIQUE REFERENCES members(id),
        doctor_name TEXT NOT NULL,
        doctor_phone TEXT NOT NULL,
        allergies TEXT,
        medication TEXT,
        diet TEXT,
        conditions TEXT,
        tetanus_vaccinated BOOLEAN NOT NULL DEFAULT FALSE,
        paracetamol_allowed BOOLEAN NOT NULL DEFAULT FALSE,
        remarks TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS work_years (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name TEXT NOT NULL,
        start_date DATE NOT NULL,
        end_date DATE NOT NULL,
        membership_fee_cents BIGINT NOT NULL DEFAULT 0,
        CONSTRAINT work_years_dates_check CHECK (start_date < end_date),
        CONSTRAINT work_years_no_overlap
            EXCLUDE USING gist (daterange(start_date, end_date, '[]') WITH &&)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS groups (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name TEXT NOT NULL,
        min_age INTEGER NOT NULL,
        max_age INTEGER NOT NULL,
        gender TEXT,
        description TEXT,
        active BOOLEAN NOT NULL DEFAULT TRUE,
        CONSTRAINT groups_age_check CHECK (min_age <= max_age)
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS groups_name_key ON groups (lower(name))",
    r#"
    CREATE TABLE IF NOT EXISTS memberships (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        member_id UUID NOT NULL REFERENCES members(id),
        work_year_id UUID NOT NULL REFERENCES work_years(id),
        group_id UUID NOT NULL REFERENCES groups(id),
        paid BOOLEAN NOT NULL DEFAULT FALSE,
        paid_on DATE,
        payment_method TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CONSTRAINT memberships_member_work_year_key UNIQUE (member_id, work_year_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS events (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        work_year_id UUID NOT NULL REFERENCES work_years(id),
        title TEXT NOT NULL,
        description TEXT,
        location TEXT,
        starts_at TIMESTAMP NOT NULL,
        ends_at TIMESTAMP NOT NULL,
        CONSTRAINT events_period_check CHECK (starts_at <= ends_at)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS event_groups (
        event_id UUID NOT NULL REFERENCES events(id) ON DELETE CASCADE,
        group_id UUID NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
        PRIMARY KEY (event_id, group_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sponsors (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        company_name TEXT NOT NULL,
        contact_name TEXT,
        email TEXT,
        phone TEXT,
        website TEXT,
        address_id UUID REFERENCES addresses(id)
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS sponsors_company_name_key ON sponsors (lower(company_name))",
    r#"
    CREATE TABLE IF NOT EXISTS sponsorship_agreements (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        sponsor_id UUID NOT NULL REFERENCES sponsors(id),
        work_year_id UUID NOT NULL REFERENCES work_years(id),
        amount_cents BIGINT NOT NULL,
        kind TEXT NOT NULL,
        paid BOOLEAN NOT NULL DEFAULT FALSE,
        notes TEXT,
        CONSTRAINT agreements_sponsor_work_year_key UNIQUE (sponsor_id, work_year_id),
        CONSTRAINT agreements_amount_check CHECK (amount_cents >= 0)
    )
    "#,
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_persons_name ON persons (lower(last_name), lower(first_name))",
    "CREATE INDEX IF NOT EXISTS idx_persons_address ON persons (address_id)",
    "CREATE INDEX IF NOT EXISTS idx_member_parents_parent ON member_parents (parent_id)",
    "CREATE INDEX IF NOT EXISTS idx_work_years_period ON work_years (start_date, end_date)",
    "CREATE INDEX IF NOT EXISTS idx_memberships_work_year ON memberships (work_year_id, group_id)",
    "CREATE INDEX IF NOT EXISTS idx_events_starts_at ON events (starts_at)",
    "CREATE INDEX IF NOT EXISTS idx_event_groups_group ON event_groups (group_id)",
    "CREATE INDEX IF NOT EXISTS idx_sponsors_address ON sponsors (address_id)",
];

/// Create all tables and indexes.
pub async fn run(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Running migrations...");

    for statement in TABLES {
        sqlx::query(statement).execute(pool).await?;
    }
    create_indexes(pool).await?;

    tracing::info!("Migrations complete");
    Ok(())
}

async fn create_indexes(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in INDEXES {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
