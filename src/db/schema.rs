//! SQL DDL for initializing the agency tables.
//! SQLite-first design; column sizes are declarative only under SQLite.

/// Schema with:
/// - `User.username` UNIQUE
/// - `User.password_hash` holding an Argon2 PHC string
/// - `Policy.contact_id` referencing `Contact(id)` without cascade
/// - `isadmin` BOOLEAN (stored as INTEGER 0/1)
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS "User" (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    first VARCHAR(15) NOT NULL,
    last VARCHAR(25) NOT NULL,
    username VARCHAR(80) NOT NULL UNIQUE,
    password_hash VARCHAR(255) NOT NULL,
    phonenumber VARCHAR(45) NOT NULL,
    dob DATE NOT NULL,
    isadmin INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS "Contact" (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    first VARCHAR(15) NOT NULL,
    last VARCHAR(25) NOT NULL,
    street VARCHAR(80) NOT NULL,
    city VARCHAR(80) NOT NULL,
    state VARCHAR(80) NOT NULL,
    zipcode VARCHAR(80) NOT NULL,
    phonenumber VARCHAR(45) NOT NULL
);

CREATE TABLE IF NOT EXISTS "Policy" (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    policy_number INTEGER NULL,
    policy_type VARCHAR(25) NULL,
    contact_id INTEGER NULL REFERENCES "Contact"(id)
);

CREATE INDEX IF NOT EXISTS idx_policy_contact_id ON "Policy"(contact_id);

CREATE TABLE IF NOT EXISTS "Letter" (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title VARCHAR(25) NULL,
    description VARCHAR(80) NULL,
    template TEXT NULL
);
"#;
