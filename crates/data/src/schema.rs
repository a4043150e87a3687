//! DDL for the three bar tables.
//!
//! Every statement is idempotent so `ensure_schema` can run on each startup.

pub const EQUITY_TABLE: &str = "nse_equity_data";
pub const FUTURES_TABLE: &str = "nse_futures_data";
pub const OPTIONS_TABLE: &str = "nse_options_data";

/// Advisory lock key held while DDL runs, so concurrent startups do not race
/// on `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA_LOCK_KEY: i64 = 0x4f48_4c43_5653;

pub const EQUITY_DDL: &[&str] = &[
    r"
    CREATE TABLE IF NOT EXISTS nse_equity_data (
        id SERIAL PRIMARY KEY,
        symbol VARCHAR(50) NOT NULL,
        date DATE NOT NULL,
        open_price DECIMAL(10,2),
        high_price DECIMAL(10,2),
        low_price DECIMAL(10,2),
        close_price DECIMAL(10,2),
        volume BIGINT,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
        UNIQUE (symbol, date)
    )
    ",
    r"
    CREATE INDEX IF NOT EXISTS idx_nse_equity_symbol_date
    ON nse_equity_data (symbol, date)
    ",
    r"
    CREATE INDEX IF NOT EXISTS idx_nse_equity_date
    ON nse_equity_data (date)
    ",
];

pub const DERIVATIVES_DDL: &[&str] = &[
    r"
    CREATE TABLE IF NOT EXISTS nse_futures_data (
        id SERIAL PRIMARY KEY,
        symbol VARCHAR(50) NOT NULL,
        expiry_date DATE NOT NULL,
        date DATE NOT NULL,
        open_price DECIMAL(10,2),
        high_price DECIMAL(10,2),
        low_price DECIMAL(10,2),
        close_price DECIMAL(10,2),
        volume BIGINT,
        open_interest BIGINT,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
        UNIQUE (symbol, expiry_date, date)
    )
    ",
    r"
    CREATE INDEX IF NOT EXISTS idx_nse_futures_symbol_expiry_date
    ON nse_futures_data (symbol, expiry_date, date)
    ",
    r"
    CREATE INDEX IF NOT EXISTS idx_nse_futures_date
    ON nse_futures_data (date)
    ",
    r"
    CREATE TABLE IF NOT EXISTS nse_options_data (
        id SERIAL PRIMARY KEY,
        symbol VARCHAR(50) NOT NULL,
        expiry_date DATE NOT NULL,
        strike_price DECIMAL(10,2) NOT NULL,
        option_type VARCHAR(2) NOT NULL CHECK (option_type IN ('CE', 'PE')),
        date DATE NOT NULL,
        open_price DECIMAL(10,2),
        high_price DECIMAL(10,2),
        low_price DECIMAL(10,2),
        close_price DECIMAL(10,2),
        volume BIGINT,
        open_interest BIGINT,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
        UNIQUE (symbol, expiry_date, strike_price, option_type, date)
    )
    ",
    r"
    CREATE INDEX IF NOT EXISTS idx_nse_options_symbol_expiry_strike
    ON nse_options_data (symbol, expiry_date, strike_price, option_type)
    ",
    r"
    CREATE INDEX IF NOT EXISTS idx_nse_options_date
    ON nse_options_data (date)
    ",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_statements_are_idempotent() {
        for stmt in EQUITY_DDL.iter().chain(DERIVATIVES_DDL) {
            assert!(stmt.contains("IF NOT EXISTS"), "not idempotent: {stmt}");
        }
    }

    #[test]
    fn test_tables_declare_natural_keys() {
        assert!(EQUITY_DDL[0].contains(EQUITY_TABLE));
        assert!(EQUITY_DDL[0].contains("UNIQUE (symbol, date)"));
        assert!(DERIVATIVES_DDL[0].contains(FUTURES_TABLE));
        assert!(DERIVATIVES_DDL[0].contains("UNIQUE (symbol, expiry_date, date)"));
        assert!(DERIVATIVES_DDL[3].contains(OPTIONS_TABLE));
        assert!(DERIVATIVES_DDL[3]
            .contains("UNIQUE (symbol, expiry_date, strike_price, option_type, date)"));
    }

    #[test]
    fn test_prices_are_two_decimal_fixed_point() {
        for stmt in [EQUITY_DDL[0], DERIVATIVES_DDL[0], DERIVATIVES_DDL[3]] {
            assert!(stmt.contains("close_price DECIMAL(10,2)"));
            assert!(stmt.contains("created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP"));
            assert!(stmt.contains("id SERIAL PRIMARY KEY"));
        }
    }
}
