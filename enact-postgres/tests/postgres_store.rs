use enact_core::EnactError;
use enact_core::ports::DatabaseStore;
use enact_postgres::PostgresStore;

// Everything in this file must pass without a PostgreSQL server to talk
// to. Round trips against a live database are exercised by the host
// application's staging environment, not by `cargo test`.

#[test]
fn test_open_rejects_a_malformed_url() {
    let store = PostgresStore::new();
    let err = store.open("not-a-connection-string").unwrap_err();
    assert!(matches!(err, EnactError::Infrastructure(_)), "{err}");
    assert!(err.to_string().contains("Database Store Error"), "{err}");
}

#[test]
fn test_open_rejects_an_out_of_range_port() {
    // 99999 does not fit a TCP port; this fails at parse time, before any
    // network round trip.
    let store = PostgresStore::new();
    assert!(store.open("postgres://app@localhost:99999/plans").is_err());
}

#[test]
fn test_failed_connections_do_not_wedge_the_store() {
    let store = PostgresStore::new();
    // A failed connection must not leave a poisoned lock or a half-open
    // entry behind; the next attempt gets a clean slate.
    assert!(store.open("not-a-connection-string").is_err());
    assert!(store.open("not-a-connection-string").is_err());
}
