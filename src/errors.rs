use chrono::NaiveDate;
use fractic_server_error::define_client_error;

// IO-related.
define_client_error!(ReadError, "Error reading file.");

// Parsing-related.
define_client_error!(InvalidCsv, "Invalid CSV format.");
define_client_error!(InvalidIsoDate, "Invalid ISO date: {date}.", { date: &str });
define_client_error!(InvalidMoneyAmount, "Invalid monetary amount: '{value}'.", { value: &str });
define_client_error!(
    MissingRequiredColumn,
    "Missing required column '{column}' in {file}.",
    { column: &str, file: &str }
);
define_client_error!(
    DuplicatePrimaryKey,
    "Duplicate {entity} id '{id}' (first seen at row {first_row}, repeated at row {row}).",
    { entity: &str, id: &str, first_row: usize, row: usize }
);
define_client_error!(
    UnknownForeignKey,
    "{entity} row {row} references unknown {target} id '{id}'.",
    { entity: &str, row: usize, target: &str, id: &str }
);
define_client_error!(
    InvalidInvoicePeriod,
    "Invoice '{invoice_id}' has period_end ({end}) before period_start ({start}).",
    { invoice_id: &str, start: &NaiveDate, end: &NaiveDate }
);

// Session-settings related.
define_client_error!(UnknownSettingKey, "Unrecognized session setting '{key}'.", { key: &str });
define_client_error!(
    InvalidPeriodBounds,
    "Invalid reporting period: period_end ({end}) precedes period_start ({start}).",
    { start: &NaiveDate, end: &NaiveDate }
);
define_client_error!(MissingSetting, "Required session setting '{key}' was not provided.", { key: &str });
define_client_error!(InvalidCurrencyCode, "'{code}' is not a recognized ISO 4217 currency code.", { code: &str });

// Identity-resolution related.
define_client_error!(
    IdentityReviewRequired,
    "{count} identity match(es) are still pending review; decide or bypass them before running analysis.",
    { count: usize }
);
define_client_error!(
    UnknownMatchId,
    "No pending review entry with match id '{match_id}'.",
    { match_id: &str }
);

// Host/infrastructure.
define_client_error!(SessionNotFound, "No session with id '{session_id}'.", { session_id: &str });
define_client_error!(
    SessionNotReady,
    "Session '{session_id}' is not in a state that allows this operation (status: {status}).",
    { session_id: &str, status: &str }
);
