use super::*;

#[test]
fn test_no_content() {
    let outcome: SearchOutcome<u8> = SearchOutcome::NoContent;
    assert!(outcome.is_no_content());
    assert!(outcome.into_hits().is_empty());
}

#[test]
fn test_hits() {
    let outcome = SearchOutcome::Hits(vec![1, 2]);
    assert!(!outcome.is_no_content());
    assert_eq!(outcome.into_hits(), vec![1, 2]);
}
