#![no_main]

use libfuzzer_sys::fuzz_target;

use tfgov_governance::{resolve, ResolverInput, Tally, TiePolicy};
use tfgov_types::AccountName;

fn candidate_name(i: usize) -> String {
    let hi = (b'a' + (i / 26) as u8) as char;
    let lo = (b'a' + (i % 26) as u8) as char;
    format!("c{hi}{lo}")
}

// Layout: [seats, divisor, policy, total_raw_weight (8 bytes), weights (2 bytes each)...]
fuzz_target!(|data: &[u8]| {
    if data.len() < 11 {
        return;
    }
    let seats = data[0] as u32 % 16;
    let divisor = data[1] as u32;
    let tie_policy = if data[2] % 2 == 0 {
        TiePolicy::ExcludeTied
    } else {
        TiePolicy::BoundaryOnly
    };
    let total_raw_weight = u64::from_le_bytes([
        data[3], data[4], data[5], data[6],
        data[7], data[8], data[9], data[10],
    ]) as u128;

    let mut candidates = Vec::new();
    let mut tally = Tally {
        total_raw_weight,
        ..Tally::default()
    };
    for (i, pair) in data[11..].chunks_exact(2).take(40).enumerate() {
        let Ok(name) = AccountName::parse(&candidate_name(i)) else {
            continue;
        };
        let weight = u16::from_le_bytes([pair[0], pair[1]]) as u128;
        tally.per_option_weight.insert(name.clone(), weight);
        candidates.push(name);
    }

    let outcome = resolve(&ResolverInput {
        tally: &tally,
        candidates: &candidates,
        open_seats: seats,
        holder_quorum_divisor: divisor,
        tie_policy,
    });
    assert!(outcome.winners().len() <= seats as usize);
    for winner in outcome.winners() {
        assert!(tally.weight_of(winner) > 0);
    }
});
