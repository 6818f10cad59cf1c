//! End-to-end narrowing scenarios driven through the public session API.

use memscan::access::mock::MockProcess;
use memscan::{Address, ScanCondition, ScanMatch, ScanSession, ScanWidth};
use pretty_assertions::assert_eq;

fn u32_region(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_ne_bytes()).collect()
}

#[test]
fn test_unknown_value_hunt() {
    // One 16-byte writable region, four 32-bit slots
    let process = MockProcess::new();
    process.add_region(0x1000, u32_region(&[1, 2, 3, 4]));

    let mut session = ScanSession::start(
        process.clone(),
        ScanWidth::U32,
        ScanCondition::Unconditional,
    )
    .unwrap();
    assert_eq!(session.total_matches(), 4);

    // The target writes 100 into the second slot; an exact pass finds it
    process.set_bytes(0x1004, &100u32.to_ne_bytes());
    session.narrow(ScanCondition::Equals(100)).unwrap();
    assert_eq!(session.total_matches(), 1);

    let found: Vec<ScanMatch> = session.matches().map(|m| m.unwrap()).collect();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].address, Address::new(0x1004));
    assert_eq!(found[0].value, 100);

    // It rises to 150: still the sole survivor of an increased pass
    process.set_bytes(0x1004, &150u32.to_ne_bytes());
    session.narrow(ScanCondition::Increased).unwrap();
    assert_eq!(session.total_matches(), 1);

    // Then drops to 90
    process.set_bytes(0x1004, &90u32.to_ne_bytes());
    session.narrow(ScanCondition::Decreased).unwrap();
    assert_eq!(session.total_matches(), 1);

    // A value nothing holds empties the set, and it stays empty
    session.narrow(ScanCondition::Equals(999)).unwrap();
    assert_eq!(session.total_matches(), 0);

    process.set_bytes(0x1004, &999u32.to_ne_bytes());
    session.narrow(ScanCondition::Equals(999)).unwrap();
    assert_eq!(session.total_matches(), 0);
}

#[test]
fn test_find_then_edit() {
    let process = MockProcess::new();
    process.add_region(0x4000, u32_region(&[7, 1000, 7]));

    let session =
        ScanSession::start(process.clone(), ScanWidth::U32, ScanCondition::Equals(1000)).unwrap();
    assert_eq!(session.total_matches(), 1);

    let target = session.matches().next().unwrap().unwrap();
    session.poke(target.address, 99999).unwrap();

    assert_eq!(session.peek(target.address).unwrap(), 99999);
    assert_eq!(process.get_bytes(0x4004, 4), 99999u32.to_ne_bytes().to_vec());
}

#[test]
fn test_matches_span_regions_in_address_order() {
    let process = MockProcess::new();
    process.add_region(0x9000, u32_region(&[100]));
    process.add_region(0x1000, u32_region(&[100, 2]));
    // Non-writable and uncommitted regions never enter the scan
    process.add_region_with(0x5000, u32_region(&[100]), true, false);
    process.add_region_with(0x6000, u32_region(&[100]), false, true);

    let session =
        ScanSession::start(process.clone(), ScanWidth::U32, ScanCondition::Equals(100)).unwrap();
    assert_eq!(session.total_matches(), 2);

    let addresses: Vec<Address> = session
        .matches()
        .map(|m| m.unwrap().address)
        .collect();
    assert_eq!(addresses, vec![Address::new(0x1000), Address::new(0x9000)]);
}

#[test]
fn test_region_shrink_degrades_without_error() {
    let process = MockProcess::new();
    process.add_region(0x1000, u32_region(&[42, 42, 42, 42]));

    let mut session =
        ScanSession::start(process.clone(), ScanWidth::U32, ScanCondition::Equals(42)).unwrap();
    assert_eq!(session.total_matches(), 4);

    // The tail of the region becomes unreadable between passes
    process.shrink_region(0x1000, 8);
    session.narrow(ScanCondition::Equals(42)).unwrap();
    assert_eq!(session.total_matches(), 2);
    assert_eq!(session.blocks()[0].size(), 8);

    // Surviving candidates are all inside the truncated prefix
    for result in session.matches() {
        let found = result.unwrap();
        assert!(found.address.as_usize() < 0x1008);
    }
}

#[test]
fn test_unreadable_survivor_reports_fault_lazily() {
    let process = MockProcess::new();
    process.add_region(0x1000, u32_region(&[100, 100]));

    let session =
        ScanSession::start(process.clone(), ScanWidth::U32, ScanCondition::Equals(100)).unwrap();

    // The second element's bytes vanish after the pass; its point read
    // fails during enumeration while the first still yields a value
    process.shrink_region(0x1000, 4);
    let results: Vec<_> = session.matches().collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(results[1].is_err());
}

#[test]
fn test_empty_process_scans_to_zero() {
    let process = MockProcess::new();
    let session =
        ScanSession::start(process, ScanWidth::U32, ScanCondition::Unconditional).unwrap();
    assert_eq!(session.blocks().len(), 0);
    assert_eq!(session.total_matches(), 0);
    assert_eq!(session.matches().count(), 0);
}
