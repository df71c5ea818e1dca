//! SQL text of the staging store.

pub const DROP_TABLES: &str = "
DROP TABLE IF EXISTS reconciliation_map;
DROP TABLE IF EXISTS system_trx;
DROP TABLE IF EXISTS bank_trx;
DROP TABLE IF EXISTS banks;
DROP TABLE IF EXISTS arguments;
";

pub const CREATE_TABLES: &str = "
CREATE TABLE arguments (
    from_date TEXT NOT NULL,
    to_date   TEXT NOT NULL
);

CREATE TABLE banks (
    banks TEXT NOT NULL
);

CREATE TABLE system_trx (
    id               INTEGER PRIMARY KEY,
    trx_id           TEXT NOT NULL,
    transaction_time TEXT NOT NULL,
    trx_date         TEXT NOT NULL,
    trx_type         TEXT NOT NULL,
    amount           TEXT NOT NULL,
    amount_value     REAL NOT NULL,
    source_file      TEXT NOT NULL
);

CREATE INDEX system_trx_match_idx ON system_trx (amount_value, trx_date, trx_type);

CREATE TABLE bank_trx (
    id                INTEGER PRIMARY KEY,
    unique_identifier TEXT NOT NULL,
    bank              TEXT NOT NULL,
    trx_date          TEXT NOT NULL,
    trx_type          TEXT NOT NULL,
    amount            TEXT NOT NULL,
    amount_value      REAL NOT NULL,
    abs_amount        REAL NOT NULL,
    source_file       TEXT NOT NULL
);

CREATE INDEX bank_trx_match_idx ON bank_trx (abs_amount, trx_date, trx_type);

CREATE TABLE reconciliation_map (
    system_id INTEGER NOT NULL UNIQUE REFERENCES system_trx (id),
    bank_id   INTEGER NOT NULL UNIQUE REFERENCES bank_trx (id)
);
";

pub const INSERT_ARGUMENTS: &str = "INSERT INTO arguments (from_date, to_date) VALUES (?1, ?2)";

pub const INSERT_BANKS: &str = "INSERT INTO banks (banks) VALUES (?1)";

pub const COUNT_STAGING_TABLES: &str = "
SELECT COUNT(*) FROM sqlite_master
WHERE type = 'table'
  AND name IN ('arguments', 'banks', 'system_trx', 'bank_trx', 'reconciliation_map')
";

/// Inserts one chunk, passed as a JSON array in `?1`.
pub const INSERT_SYSTEM_TRX: &str = "
INSERT INTO system_trx (trx_id, transaction_time, trx_date, trx_type, amount, amount_value, source_file)
SELECT
    json_extract(j.value, '$.trx_id'),
    json_extract(j.value, '$.transaction_time'),
    json_extract(j.value, '$.trx_date'),
    json_extract(j.value, '$.trx_type'),
    json_extract(j.value, '$.amount'),
    json_extract(j.value, '$.amount_value'),
    json_extract(j.value, '$.source_file')
FROM json_each(?1) AS j
";

/// Inserts one chunk, passed as a JSON array in `?1`.
pub const INSERT_BANK_TRX: &str = "
INSERT INTO bank_trx (unique_identifier, bank, trx_date, trx_type, amount, amount_value, abs_amount, source_file)
SELECT
    json_extract(j.value, '$.unique_identifier'),
    json_extract(j.value, '$.bank'),
    json_extract(j.value, '$.trx_date'),
    json_extract(j.value, '$.trx_type'),
    json_extract(j.value, '$.amount'),
    json_extract(j.value, '$.amount_value'),
    abs(json_extract(j.value, '$.amount_value')),
    json_extract(j.value, '$.source_file')
FROM json_each(?1) AS j
";

/// Restricts reads to the window and bank list persisted by `pre`.
macro_rules! scoped {
    ($select:literal) => {
        concat!(
            "WITH args AS (SELECT from_date, to_date FROM arguments LIMIT 1),
accepted AS (SELECT UPPER(j.value) AS bank FROM banks, json_each(banks.banks) AS j),
scoped_system AS (
    SELECT s.* FROM system_trx s, args
    WHERE s.trx_date BETWEEN args.from_date AND args.to_date
),
scoped_bank AS (
    SELECT b.* FROM bank_trx b, args
    WHERE b.trx_date BETWEEN args.from_date AND args.to_date
      AND UPPER(b.bank) IN (SELECT bank FROM accepted)
)
",
            $select
        )
    };
}

/// Pairs still-unmatched system and bank rows whose amount falls in
/// `[?1, ?2)`. Only rows inside the persisted window and bank list take
/// part. Within one (amount, date, direction) group the k-th system row by
/// `trx_id` takes the k-th bank row by `unique_identifier`.
pub const INSERT_RECONCILIATION_MAP: &str = scoped!(
    ",
sys AS (
    SELECT
        s.id,
        s.amount_value,
        s.trx_date,
        s.trx_type,
        ROW_NUMBER() OVER (
            PARTITION BY s.amount_value, s.trx_date, s.trx_type
            ORDER BY s.trx_id, s.id
        ) AS rn
    FROM scoped_system s
    WHERE s.amount_value >= ?1
      AND s.amount_value < ?2
      AND NOT EXISTS (SELECT 1 FROM reconciliation_map m WHERE m.system_id = s.id)
),
bank AS (
    SELECT
        b.id,
        b.abs_amount,
        b.trx_date,
        b.trx_type,
        ROW_NUMBER() OVER (
            PARTITION BY b.abs_amount, b.trx_date, b.trx_type
            ORDER BY b.unique_identifier, b.id
        ) AS rn
    FROM scoped_bank b
    WHERE b.abs_amount >= ?1
      AND b.abs_amount < ?2
      AND NOT EXISTS (SELECT 1 FROM reconciliation_map m WHERE m.bank_id = b.id)
)
INSERT INTO reconciliation_map (system_id, bank_id)
SELECT sys.id, bank.id
FROM sys
JOIN bank
  ON bank.abs_amount = sys.amount_value
 AND bank.trx_date = sys.trx_date
 AND bank.trx_type <> sys.trx_type
 AND bank.rn = sys.rn"
);

/// Counts only; amount sums are folded in exact decimal arithmetic from
/// [`GET_SYSTEM_AMOUNTS`].
pub const GET_RECONCILIATION_SUMMARY: &str = scoped!(
    ",
matched AS (
    SELECT m.system_id, m.bank_id
    FROM reconciliation_map m
    JOIN scoped_bank b ON b.id = m.bank_id
)
SELECT
    COUNT(s.id) AS total_system_trx,
    COUNT(m.system_id) AS total_matched_trx,
    COUNT(s.id) - COUNT(m.system_id) AS total_not_matched_trx,
    (SELECT COUNT(*) FROM scoped_bank) AS total_bank_trx,
    (SELECT COUNT(*) FROM scoped_bank b
        WHERE NOT EXISTS (SELECT 1 FROM matched bm WHERE bm.bank_id = b.id)) AS total_not_matched_bank_trx
FROM scoped_system s
LEFT JOIN matched m ON m.system_id = s.id"
);

/// Exact amount text of every scoped system row and whether it is matched.
pub const GET_SYSTEM_AMOUNTS: &str = scoped!(
    ",
matched AS (
    SELECT m.system_id
    FROM reconciliation_map m
    JOIN scoped_bank b ON b.id = m.bank_id
)
SELECT s.amount, m.system_id IS NOT NULL AS is_matched
FROM scoped_system s
LEFT JOIN matched m ON m.system_id = s.id"
);

pub const GET_MATCHED_TRX: &str = scoped!(
    "SELECT
    s.trx_id,
    b.unique_identifier,
    s.transaction_time,
    b.trx_date,
    s.trx_type,
    b.bank,
    s.amount,
    b.amount
FROM reconciliation_map m
JOIN scoped_system s ON s.id = m.system_id
JOIN scoped_bank b ON b.id = m.bank_id
ORDER BY s.trx_id, s.id"
);

pub const GET_NOT_MATCHED_SYSTEM_TRX: &str = scoped!(
    "SELECT s.trx_id, s.transaction_time, s.trx_type, s.amount
FROM scoped_system s
WHERE NOT EXISTS (SELECT 1 FROM reconciliation_map m WHERE m.system_id = s.id)
ORDER BY s.trx_id, s.id"
);

pub const GET_NOT_MATCHED_BANK_TRX: &str = scoped!(
    "SELECT b.unique_identifier, b.trx_date, b.bank, b.trx_type, b.amount
FROM scoped_bank b
WHERE NOT EXISTS (SELECT 1 FROM reconciliation_map m WHERE m.bank_id = b.id)
ORDER BY b.bank, b.unique_identifier, b.id"
);
