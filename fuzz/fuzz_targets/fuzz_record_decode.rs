#![no_main]

use libfuzzer_sys::fuzz_target;

use tfgov_governance::Tally;
use tfgov_store::{BoardMemberRecord, CandidateRecord, NomineeRecord};
use tfgov_types::{AccountName, GovernanceConfig};

fuzz_target!(|data: &[u8]| {
    // Stored records must never panic on decode, whatever is on disk.
    let _ = bincode::deserialize::<GovernanceConfig>(data);
    let _ = bincode::deserialize::<NomineeRecord>(data);
    let _ = bincode::deserialize::<CandidateRecord>(data);
    let _ = bincode::deserialize::<BoardMemberRecord>(data);

    // Names that decode are always valid names.
    if let Ok(name) = bincode::deserialize::<AccountName>(data) {
        assert!(AccountName::is_valid(name.as_str()));
    }

    // Operator-supplied tallies for `tfgov resolve`.
    let _ = serde_json::from_slice::<Tally>(data);
});
