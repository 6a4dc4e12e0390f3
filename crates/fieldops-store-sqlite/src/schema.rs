//! SQL schema for the FieldOps SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.
//!
//! Conventions: ids are hyphenated lowercase UUID text; timestamps are
//! RFC 3339 UTC text with microseconds (lexically sortable); dates are
//! `YYYY-MM-DD`; booleans are 0/1; enums are their snake_case names.
//! Tenant-owned records are soft-deleted via `is_deleted`/`deleted_at`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- ─── Tenancy ────────────────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS tenants (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    slug        TEXT NOT NULL UNIQUE,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    id             TEXT PRIMARY KEY,
    tenant_id      TEXT NOT NULL REFERENCES tenants(id),
    username       TEXT NOT NULL,
    display_name   TEXT NOT NULL,
    email          TEXT,
    role           TEXT NOT NULL,
    employee_id    TEXT,
    password_hash  TEXT NOT NULL,
    is_active      INTEGER NOT NULL DEFAULT 1,
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL,
    is_deleted     INTEGER NOT NULL DEFAULT 0,
    deleted_at     TEXT
);
CREATE UNIQUE INDEX IF NOT EXISTS users_username_idx
    ON users(tenant_id, username) WHERE is_deleted = 0;

-- Only the SHA-256 digest of a bearer token is stored.
CREATE TABLE IF NOT EXISTS api_tokens (
    token_hash  TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL REFERENCES users(id),
    created_at  TEXT NOT NULL,
    expires_at  TEXT NOT NULL,
    revoked_at  TEXT
);
CREATE INDEX IF NOT EXISTS api_tokens_user_idx ON api_tokens(user_id);

-- ─── Directory ──────────────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS companies (
    id          TEXT PRIMARY KEY,
    tenant_id   TEXT NOT NULL REFERENCES tenants(id),
    name        TEXT NOT NULL,
    kind        TEXT NOT NULL,   -- 'client' | 'supplier' | 'subcontractor' | 'other'
    phone       TEXT,
    email       TEXT,
    address     TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    is_deleted  INTEGER NOT NULL DEFAULT 0,
    deleted_at  TEXT
);

CREATE TABLE IF NOT EXISTS contacts (
    id          TEXT PRIMARY KEY,
    tenant_id   TEXT NOT NULL REFERENCES tenants(id),
    company_id  TEXT REFERENCES companies(id),
    first_name  TEXT NOT NULL,
    last_name   TEXT NOT NULL,
    email       TEXT,
    phone       TEXT,
    job_title   TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    is_deleted  INTEGER NOT NULL DEFAULT 0,
    deleted_at  TEXT
);

CREATE TABLE IF NOT EXISTS sites (
    id          TEXT PRIMARY KEY,
    tenant_id   TEXT NOT NULL REFERENCES tenants(id),
    name        TEXT NOT NULL,
    code        TEXT,
    address     TEXT,
    postcode    TEXT,
    is_active   INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    is_deleted  INTEGER NOT NULL DEFAULT 0,
    deleted_at  TEXT
);

CREATE TABLE IF NOT EXISTS employees (
    id             TEXT PRIMARY KEY,
    tenant_id      TEXT NOT NULL REFERENCES tenants(id),
    employee_code  TEXT,
    first_name     TEXT NOT NULL,
    last_name      TEXT NOT NULL,
    email          TEXT,
    phone          TEXT,
    job_title      TEXT,
    site_id        TEXT REFERENCES sites(id),
    is_active      INTEGER NOT NULL DEFAULT 1,
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL,
    is_deleted     INTEGER NOT NULL DEFAULT 0,
    deleted_at     TEXT
);

-- ─── Catalogue & stock ──────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS categories (
    id           TEXT PRIMARY KEY,
    tenant_id    TEXT NOT NULL REFERENCES tenants(id),
    name         TEXT NOT NULL,
    description  TEXT,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL,
    is_deleted   INTEGER NOT NULL DEFAULT 0,
    deleted_at   TEXT
);

CREATE TABLE IF NOT EXISTS suppliers (
    id            TEXT PRIMARY KEY,
    tenant_id     TEXT NOT NULL REFERENCES tenants(id),
    name          TEXT NOT NULL,
    contact_name  TEXT,
    email         TEXT,
    phone         TEXT,
    account_ref   TEXT,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL,
    is_deleted    INTEGER NOT NULL DEFAULT 0,
    deleted_at    TEXT
);

CREATE TABLE IF NOT EXISTS products (
    id             TEXT PRIMARY KEY,
    tenant_id      TEXT NOT NULL REFERENCES tenants(id),
    sku            TEXT NOT NULL,
    name           TEXT NOT NULL,
    description    TEXT,
    category_id    TEXT REFERENCES categories(id),
    supplier_id    TEXT REFERENCES suppliers(id),
    unit           TEXT NOT NULL,
    unit_cost      INTEGER NOT NULL DEFAULT 0,   -- pence
    reorder_level  INTEGER NOT NULL DEFAULT 0,
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL,
    is_deleted     INTEGER NOT NULL DEFAULT 0,
    deleted_at     TEXT
);
CREATE UNIQUE INDEX IF NOT EXISTS products_sku_idx
    ON products(tenant_id, sku) WHERE is_deleted = 0;

CREATE TABLE IF NOT EXISTS stock_locations (
    id          TEXT PRIMARY KEY,
    tenant_id   TEXT NOT NULL REFERENCES tenants(id),
    name        TEXT NOT NULL,
    code        TEXT,
    is_active   INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    is_deleted  INTEGER NOT NULL DEFAULT 0,
    deleted_at  TEXT
);

CREATE TABLE IF NOT EXISTS stock_levels (
    id                 TEXT PRIMARY KEY,
    tenant_id          TEXT NOT NULL REFERENCES tenants(id),
    product_id         TEXT NOT NULL REFERENCES products(id),
    location_id        TEXT NOT NULL REFERENCES stock_locations(id),
    quantity_on_hand   INTEGER NOT NULL DEFAULT 0,
    quantity_reserved  INTEGER NOT NULL DEFAULT 0,
    updated_at         TEXT NOT NULL,
    UNIQUE (product_id, location_id),
    CHECK  (quantity_reserved >= 0 AND quantity_reserved <= quantity_on_hand)
);

-- Levels joined with the product fields used for display and low-stock checks.
CREATE VIEW IF NOT EXISTS stock_level_view AS
    SELECT l.*,
           p.sku,
           p.name AS product_name,
           p.reorder_level,
           loc.name AS location_name,
           l.quantity_on_hand - l.quantity_reserved AS available
    FROM stock_levels l
    JOIN products p ON p.id = l.product_id
    JOIN stock_locations loc ON loc.id = l.location_id
    WHERE p.is_deleted = 0;

-- Append-only.
CREATE TABLE IF NOT EXISTS stock_transactions (
    id           TEXT PRIMARY KEY,
    tenant_id    TEXT NOT NULL REFERENCES tenants(id),
    product_id   TEXT NOT NULL REFERENCES products(id),
    location_id  TEXT NOT NULL REFERENCES stock_locations(id),
    kind         TEXT NOT NULL,   -- 'receipt' | 'issue' | 'adjustment' | 'reservation' | 'release'
    quantity     INTEGER NOT NULL,
    reference    TEXT,
    created_by   TEXT,
    created_at   TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS stock_transactions_product_idx
    ON stock_transactions(tenant_id, product_id);

CREATE TABLE IF NOT EXISTS stock_orders (
    id                   TEXT PRIMARY KEY,
    tenant_id            TEXT NOT NULL REFERENCES tenants(id),
    order_number         TEXT NOT NULL,
    site_id              TEXT NOT NULL REFERENCES sites(id),
    location_id          TEXT NOT NULL REFERENCES stock_locations(id),
    required_date        TEXT,
    status               TEXT NOT NULL,
    notes                TEXT,
    requested_by         TEXT,
    approved_by          TEXT,
    approved_at          TEXT,
    collected_at         TEXT,
    rejection_reason     TEXT,
    cancellation_reason  TEXT,
    stock_reserved       INTEGER NOT NULL DEFAULT 0,
    created_at           TEXT NOT NULL,
    updated_at           TEXT NOT NULL,
    is_deleted           INTEGER NOT NULL DEFAULT 0,
    deleted_at           TEXT,
    UNIQUE (tenant_id, order_number)
);

CREATE TABLE IF NOT EXISTS stock_order_lines (
    id          TEXT PRIMARY KEY,
    order_id    TEXT NOT NULL REFERENCES stock_orders(id) ON DELETE CASCADE,
    product_id  TEXT NOT NULL REFERENCES products(id),
    quantity    INTEGER NOT NULL CHECK (quantity > 0),
    line_no     INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS stock_order_lines_order_idx ON stock_order_lines(order_id);

-- ─── Purchasing ─────────────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS purchase_orders (
    id             TEXT PRIMARY KEY,
    tenant_id      TEXT NOT NULL REFERENCES tenants(id),
    order_number   TEXT NOT NULL,
    supplier_id    TEXT NOT NULL REFERENCES suppliers(id),
    location_id    TEXT NOT NULL REFERENCES stock_locations(id),
    expected_date  TEXT,
    status         TEXT NOT NULL,
    notes          TEXT,
    created_by     TEXT,
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL,
    is_deleted     INTEGER NOT NULL DEFAULT 0,
    deleted_at     TEXT,
    UNIQUE (tenant_id, order_number)
);

CREATE TABLE IF NOT EXISTS purchase_order_lines (
    id                 TEXT PRIMARY KEY,
    order_id           TEXT NOT NULL REFERENCES purchase_orders(id) ON DELETE CASCADE,
    product_id         TEXT NOT NULL REFERENCES products(id),
    quantity_ordered   INTEGER NOT NULL CHECK (quantity_ordered > 0),
    quantity_received  INTEGER NOT NULL DEFAULT 0,
    unit_cost          INTEGER NOT NULL DEFAULT 0,
    line_no            INTEGER NOT NULL,
    CHECK (quantity_received BETWEEN 0 AND quantity_ordered)
);
CREATE INDEX IF NOT EXISTS purchase_order_lines_order_idx ON purchase_order_lines(order_id);

-- ─── Proposals ──────────────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS proposals (
    id                TEXT PRIMARY KEY,
    tenant_id         TEXT NOT NULL REFERENCES tenants(id),
    reference         TEXT NOT NULL,
    title             TEXT NOT NULL,
    company_id        TEXT NOT NULL REFERENCES companies(id),
    contact_id        TEXT REFERENCES contacts(id),
    site_id           TEXT REFERENCES sites(id),
    valid_until       TEXT,
    status            TEXT NOT NULL,
    discount_percent  REAL NOT NULL DEFAULT 0,
    vat_percent       REAL NOT NULL DEFAULT 20,
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL,
    is_deleted        INTEGER NOT NULL DEFAULT 0,
    deleted_at        TEXT,
    UNIQUE (tenant_id, reference)
);

CREATE TABLE IF NOT EXISTS proposal_sections (
    id           TEXT PRIMARY KEY,
    proposal_id  TEXT NOT NULL REFERENCES proposals(id) ON DELETE CASCADE,
    title        TEXT NOT NULL,
    sort_order   INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS proposal_items (
    id           TEXT PRIMARY KEY,
    section_id   TEXT NOT NULL REFERENCES proposal_sections(id) ON DELETE CASCADE,
    description  TEXT NOT NULL,
    quantity     INTEGER NOT NULL,
    unit_price   INTEGER NOT NULL,
    sort_order   INTEGER NOT NULL
);

-- ─── RAMS ───────────────────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS rams_documents (
    id                TEXT PRIMARY KEY,
    tenant_id         TEXT NOT NULL REFERENCES tenants(id),
    reference         TEXT NOT NULL,
    title             TEXT NOT NULL,
    site_id           TEXT REFERENCES sites(id),
    scope             TEXT,
    revision          INTEGER NOT NULL DEFAULT 1,
    status            TEXT NOT NULL,
    submitted_at      TEXT,
    approved_by       TEXT,
    approved_at       TEXT,
    rejection_reason  TEXT,
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL,
    is_deleted        INTEGER NOT NULL DEFAULT 0,
    deleted_at        TEXT,
    UNIQUE (tenant_id, reference)
);

CREATE TABLE IF NOT EXISTS rams_risk_assessments (
    id                   TEXT PRIMARY KEY,
    rams_id              TEXT NOT NULL REFERENCES rams_documents(id) ON DELETE CASCADE,
    hazard               TEXT NOT NULL,
    who_at_risk          TEXT,
    likelihood           INTEGER NOT NULL CHECK (likelihood BETWEEN 1 AND 5),
    severity             INTEGER NOT NULL CHECK (severity BETWEEN 1 AND 5),
    residual_likelihood  INTEGER NOT NULL CHECK (residual_likelihood BETWEEN 1 AND 5),
    residual_severity    INTEGER NOT NULL CHECK (residual_severity BETWEEN 1 AND 5),
    sort_order           INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS rams_controls (
    id             TEXT PRIMARY KEY,
    assessment_id  TEXT NOT NULL REFERENCES rams_risk_assessments(id) ON DELETE CASCADE,
    description    TEXT NOT NULL,
    sort_order     INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS rams_method_steps (
    id           TEXT PRIMARY KEY,
    rams_id      TEXT NOT NULL REFERENCES rams_documents(id) ON DELETE CASCADE,
    step_number  INTEGER NOT NULL,
    description  TEXT NOT NULL,
    responsible  TEXT
);

-- ─── Toolbox talks ──────────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS toolbox_talks (
    id          TEXT PRIMARY KEY,
    tenant_id   TEXT NOT NULL REFERENCES tenants(id),
    title       TEXT NOT NULL,
    summary     TEXT,
    category    TEXT,
    pass_mark   INTEGER NOT NULL DEFAULT 80,
    is_active   INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    is_deleted  INTEGER NOT NULL DEFAULT 0,
    deleted_at  TEXT
);

CREATE TABLE IF NOT EXISTS talk_sections (
    id          TEXT PRIMARY KEY,
    talk_id     TEXT NOT NULL REFERENCES toolbox_talks(id) ON DELETE CASCADE,
    heading     TEXT NOT NULL,
    body        TEXT NOT NULL,
    sort_order  INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS talk_questions (
    id              TEXT PRIMARY KEY,
    talk_id         TEXT NOT NULL REFERENCES toolbox_talks(id) ON DELETE CASCADE,
    text            TEXT NOT NULL,
    options         TEXT NOT NULL,   -- JSON array of strings
    correct_option  INTEGER NOT NULL,
    sort_order      INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS toolbox_schedules (
    id             TEXT PRIMARY KEY,
    tenant_id      TEXT NOT NULL REFERENCES tenants(id),
    talk_id        TEXT NOT NULL REFERENCES toolbox_talks(id),
    frequency      TEXT NOT NULL,   -- 'once' | 'weekly' | 'monthly'
    start_date     TEXT NOT NULL,
    next_run_date  TEXT NOT NULL,
    end_date       TEXT,
    last_run_date  TEXT,
    due_days       INTEGER NOT NULL DEFAULT 7,
    status         TEXT NOT NULL,   -- 'active' | 'completed' | 'cancelled'
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL,
    is_deleted     INTEGER NOT NULL DEFAULT 0,
    deleted_at     TEXT
);
CREATE INDEX IF NOT EXISTS toolbox_schedules_due_idx
    ON toolbox_schedules(status, next_run_date);

CREATE TABLE IF NOT EXISTS schedule_employees (
    schedule_id  TEXT NOT NULL REFERENCES toolbox_schedules(id) ON DELETE CASCADE,
    employee_id  TEXT NOT NULL REFERENCES employees(id),
    PRIMARY KEY (schedule_id, employee_id)
);

CREATE TABLE IF NOT EXISTS scheduled_talks (
    id              TEXT PRIMARY KEY,
    tenant_id       TEXT NOT NULL REFERENCES tenants(id),
    schedule_id     TEXT REFERENCES toolbox_schedules(id),
    talk_id         TEXT NOT NULL REFERENCES toolbox_talks(id),
    employee_id     TEXT NOT NULL REFERENCES employees(id),
    scheduled_date  TEXT NOT NULL,
    due_date        TEXT NOT NULL,
    status          TEXT NOT NULL,   -- 'pending' | 'in_progress' | 'completed'
    attempts        INTEGER NOT NULL DEFAULT 0,
    score           INTEGER,
    completed_at    TEXT,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL,
    UNIQUE (schedule_id, employee_id, scheduled_date)
);
CREATE INDEX IF NOT EXISTS scheduled_talks_employee_idx
    ON scheduled_talks(tenant_id, employee_id);

PRAGMA user_version = 1;
";
