use crate::{
    game::{
        game_question::Letter,
        hints::{HintEngine, HintKind, HintValue},
    },
    tests::fixtures::rng,
};

#[test]
fn fifty_fifty_always_keeps_correct_letter() {
    for seed in 0..200 {
        let mut rng = rng(seed);
        for correct in Letter::ALL {
            let kept = HintEngine::fifty_fifty(correct, &mut rng);

            assert!(kept.contains(&correct), "seed {} dropped {}", seed, correct);
            assert_ne!(kept[0], kept[1]);
        }
    }
}

#[test]
fn fifty_fifty_picks_every_wrong_letter_eventually() {
    let mut rng = rng(11);
    let mut others = std::collections::HashSet::new();

    for _ in 0..500 {
        let kept = HintEngine::fifty_fifty(Letter::A, &mut rng);
        others.extend(kept.into_iter().filter(|l| *l != Letter::A));
    }

    assert_eq!(others.len(), 3);
}

#[test]
fn audience_help_votes_every_letter() {
    let votes = HintEngine::audience_help(&mut rng(3));

    assert_eq!(votes.keys().copied().collect::<Vec<_>>(), Letter::ALL.to_vec());
    assert!(votes.values().all(|v| *v < 100));
}

#[test]
fn friend_call_names_a_letter() {
    let text = HintEngine::friend_call(Letter::C, &mut rng(5));

    assert!(text.contains("thinks the right answer is"));
    assert!(["A", "B", "C", "D"].iter().any(|l| text.ends_with(l)));
}

#[test]
fn friend_is_mostly_right() {
    let mut rng = rng(9);
    let right = (0..1_000)
        .filter(|_| HintEngine::friend_call(Letter::B, &mut rng).ends_with('B'))
        .count();

    assert!((700..=900).contains(&right), "friend was right {} times", right);
}

#[test]
fn generate_matches_requested_kind() {
    let mut rng = rng(1);
    for kind in [
        HintKind::AudienceHelp,
        HintKind::FiftyFifty,
        HintKind::FriendCall,
    ] {
        let value = HintEngine::generate(kind, Letter::D, &mut rng);
        assert_eq!(value.kind(), kind);
    }

    assert!(matches!(
        HintEngine::generate(HintKind::FiftyFifty, Letter::D, &mut rng),
        HintValue::FiftyFifty(kept) if kept.contains(&Letter::D)
    ));
}
